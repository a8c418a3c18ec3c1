//! Plain-text report log.

use super::{open_append, ReportSink};
use crate::error::SinkResult;
use crate::scanner::ScanReport;
use chrono::SecondsFormat;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Appends a readable block per report.
#[derive(Debug, Clone)]
pub struct TextSink {
    path: PathBuf,
}

impl TextSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for TextSink {
    fn submit(&mut self, report: &ScanReport) -> SinkResult<()> {
        let mut out = BufWriter::new(open_append(&self.path)?);
        write_block(&mut out, report)?;
        out.flush()?;
        Ok(())
    }
}

fn write_block<W: Write>(out: &mut W, report: &ScanReport) -> std::io::Result<()> {
    writeln!(
        out,
        "Scan result for {} ({})",
        report.target.raw, report.target.address
    )?;
    writeln!(
        out,
        "  started_at: {}",
        report.started_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    )?;
    writeln!(
        out,
        "  finished_at: {}",
        report.finished_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    )?;

    let open: Vec<String> = report.open_ports.iter().map(|p| p.to_string()).collect();
    if open.is_empty() {
        writeln!(out, "  open_ports: none")?;
    } else {
        writeln!(out, "  open_ports: {}", open.join(", "))?;
    }

    if !report.banners.is_empty() {
        writeln!(out, "  banners:")?;
        for port in report.banners.keys() {
            writeln!(out, "    {}: {}", port, report.banner_line(*port).unwrap_or("None"))?;
        }
    }
    if !report.detected_services.is_empty() {
        writeln!(out, "  detected_services:")?;
        for (port, service) in &report.detected_services {
            writeln!(out, "    {}: {}", port, service)?;
        }
    }
    if report.interrupted {
        writeln!(
            out,
            "  interrupted: {}/{} ports probed",
            report.ports_completed, report.ports_total
        )?;
    }

    writeln!(out, "{}", "-".repeat(40))
}

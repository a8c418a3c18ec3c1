//! CSV output.

use super::{open_append, ReportSink};
use crate::error::SinkResult;
use crate::scanner::ScanReport;
use std::path::PathBuf;

const HEADER: [&str; 5] = ["target", "addr", "port", "service", "banner"];

/// Appends one row per open port.
///
/// The header row is written whenever the file is empty at submit time.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for CsvSink {
    fn submit(&mut self, report: &ScanReport) -> SinkResult<()> {
        let file = open_append(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut wtr = csv::Writer::from_writer(file);

        if needs_header {
            wtr.write_record(HEADER)?;
        }

        let address = report.target.address.to_string();
        for port in &report.open_ports {
            let port_number = port.to_string();
            wtr.write_record([
                report.target.raw.as_str(),
                address.as_str(),
                port_number.as_str(),
                report
                    .detected_services
                    .get(port)
                    .map(String::as_str)
                    .unwrap_or(""),
                report.banner_line(*port).unwrap_or(""),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

//! Console output.
//!
//! Styled summaries and status lines for a terminal. Colors follow the
//! `console` crate's global setting, so `--no-color` and non-tty output get
//! plain text.

use super::ReportSink;
use crate::error::SinkResult;
use crate::scanner::ScanReport;
use crate::services;
use chrono::SecondsFormat;
use console::style;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Prints a summary block per report.
pub struct ConsoleSink<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for ConsoleSink<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn submit(&mut self, report: &ScanReport) -> SinkResult<()> {
        write_summary(&mut self.out, report)?;
        self.out.flush()?;
        Ok(())
    }
}

fn write_summary<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "  {} {}", style("Target:").bold(), report.target.raw)?;
    writeln!(
        out,
        "  {} {} ({})",
        style("Address:").bold(),
        report.target.address,
        report.target.family
    )?;
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        report.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(
        out,
        "  {} {}",
        style("Finished:").bold(),
        report.finished_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(
        out,
        "  {} {}/{} ports probed in {:.2}s, {} open, {} closed, {} errors",
        style("Statistics:").bold(),
        report.ports_completed,
        report.ports_total,
        report.duration().num_milliseconds() as f64 / 1000.0,
        style(report.open_ports.len()).green().bold(),
        style(report.closed_ports).red(),
        style(report.errored_ports).yellow()
    )?;
    if report.interrupted {
        writeln!(out, "  {}", style("Scan interrupted; results are partial.").yellow())?;
    }
    writeln!(out)?;

    if report.open_ports.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
    } else {
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:>6}  {:<20}  {}",
            style("PORT").bold(),
            style("SERVICE").bold(),
            style("BANNER").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for port in &report.open_ports {
            let service = report
                .detected_services
                .get(port)
                .cloned()
                .unwrap_or_else(|| services::service_description(port.as_u16()).to_string());
            let banner = report
                .banner_line(*port)
                .map(|b| truncate_string(b, 35))
                .unwrap_or_default();
            writeln!(
                out,
                "  {:>6}  {:<20}  {}",
                style(port).green().bold(),
                service,
                style(banner).dim()
            )?;
        }
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    writeln!(out, "{}", style(RULE).cyan())
}

/// Print the program banner before scanning begins.
pub fn print_banner(targets: usize, ports: &str) {
    println!("{}", style(RULE).cyan());
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("portsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Targets: {}", style("•").dim(), style(targets).white().bold());
    println!("{} Ports: {}", style("•").dim(), style(ports).yellow());
    println!("{}", style(RULE).cyan());
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate to `max_len` characters, adding an ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

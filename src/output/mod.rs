//! Output module - where finished scan reports go.
//!
//! Every destination implements [`ReportSink`]. File sinks always append and
//! create missing parent directories.

mod csv_format;
mod json_format;
mod plain;
mod text;

pub use csv_format::CsvSink;
pub use json_format::JsonSink;
pub use plain::{print_banner, print_error, print_info, print_success, print_warning, ConsoleSink};
pub use text::TextSink;

use crate::error::SinkResult;
use crate::scanner::ScanReport;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Receives one report per scanned target, in processing order.
pub trait ReportSink {
    fn submit(&mut self, report: &ScanReport) -> SinkResult<()>;
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn submit(&mut self, report: &ScanReport) -> SinkResult<()> {
        (**self).submit(report)
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable blocks
    #[default]
    Text,
    /// One JSON object per line
    Json,
    /// One row per open port
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Build the file sink for `format` writing to `path`.
pub fn file_sink(format: OutputFormat, path: impl Into<PathBuf>) -> Box<dyn ReportSink> {
    let path = path.into();
    match format {
        OutputFormat::Text => Box::new(TextSink::new(path)),
        OutputFormat::Json => Box::new(JsonSink::new(path)),
        OutputFormat::Csv => Box::new(CsvSink::new(path)),
    }
}

/// Open `path` for appending, creating it and its parent directories.
pub(crate) fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Vec<ScanReport>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[ScanReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<ScanReport> {
        self.reports
    }
}

impl ReportSink for MemorySink {
    fn submit(&mut self, report: &ScanReport) -> SinkResult<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Forwards each report to several sinks.
///
/// Every sink sees every report even when an earlier one fails; the first
/// failure is returned.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for FanOut {
    fn submit(&mut self, report: &ScanReport) -> SinkResult<()> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.submit(report) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

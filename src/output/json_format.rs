//! NDJSON output.

use super::{open_append, ReportSink};
use crate::error::SinkResult;
use crate::scanner::ScanReport;
use std::io::Write;
use std::path::PathBuf;

/// Appends one JSON object per report, one per line.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonSink {
    fn submit(&mut self, report: &ScanReport) -> SinkResult<()> {
        let mut line = serde_json::to_vec(report)?;
        line.push(b'\n');
        let mut file = open_append(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::{empty_report, sample_report};
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_one_object_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.ndjson");
        let mut sink = JsonSink::new(&path);
        sink.submit(&sample_report()).unwrap();
        sink.submit(&empty_report()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let objects: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(objects.len(), 2);

        let first = &objects[0];
        assert_eq!(first["target"], "scanme.test");
        assert_eq!(first["addr"], "192.0.2.44");
        assert_eq!(first["family"], "ipv4");
        assert_eq!(first["open_ports"], json!([22, 80]));
        assert_eq!(first["banners"]["22"], "SSH-2.0-OpenSSH_9.6\r\nsecond line");
        assert_eq!(first["banners"]["80"], Value::Null);
        assert_eq!(first["detected_services"]["22"], "ssh (ssh)");
        assert_eq!(first["closed_ports"], 1);
        assert!(first["started_at"].as_str().unwrap().ends_with('Z'));

        assert_eq!(objects[1]["open_ports"], json!([]));
        assert_eq!(objects[1]["banners"], json!({}));
    }
}

//! Target list collection.

use std::fs;
use std::path::Path;
use tracing::warn;

/// Gather targets from an optional targets file and `-t` values.
///
/// File targets come first, then the command-line ones. Values may be
/// comma-separated; blanks are dropped.
pub fn collect_targets(values: &[String], file: Option<&Path>) -> Vec<String> {
    let mut targets = file.map(load_targets_file).unwrap_or_default();
    targets.extend(
        values
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from),
    );
    targets
}

/// One target per line; blank lines and `#` comments are skipped.
///
/// An unreadable file is logged and contributes nothing.
pub fn load_targets_file(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read targets file");
            Vec::new()
        }
    }
}

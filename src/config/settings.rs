//! Application settings and paths.
//!
//! Settings come from a JSON file in the XDG config directory, or from an
//! explicit `--config` path. Command-line flags override them.

use crate::banner::{HTTP_PORTS, TLS_PORTS};
use crate::error::{ConfigError, ConfigResult};
use crate::output::OutputFormat;
use crate::scanner::ScanConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application directory paths following the XDG Base Directory layout.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portsweep)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the per-user directories.
    pub fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("io", "portsweep", "portsweep")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Connect timeout in seconds.
    pub timeout: f64,
    /// Banner read timeout in seconds.
    pub banner_timeout: f64,
    /// Concurrent probes per target.
    pub threads: usize,
    /// Networks with more usable hosts than this need confirmation.
    pub max_hosts: u64,
    pub grab_banners: bool,
    pub detect_services: bool,
    pub verbose: bool,
    /// Format used for `--output-file` when none is given.
    pub output_format: OutputFormat,
    /// Ports where banner grabbing attempts TLS first.
    pub tls_ports: Vec<u16>,
    /// Plaintext ports that get an HTTP request before reading.
    pub http_ports: Vec<u16>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            timeout: 1.0,
            banner_timeout: 2.0,
            threads: 100,
            max_hosts: 256,
            grab_banners: false,
            detect_services: false,
            verbose: false,
            output_format: OutputFormat::Text,
            tls_ports: TLS_PORTS.to_vec(),
            http_ports: HTTP_PORTS.to_vec(),
        }
    }
}

impl AppSettings {
    /// Load settings from `explicit` if given, else from the default
    /// location. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let file = match Paths::new() {
            Ok(paths) => paths.settings_file(),
            Err(e) => {
                debug!(error = %e, "no config directory, using defaults");
                return Ok(Self::default());
            }
        };

        if !file.exists() {
            debug!(path = %file.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load and validate settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Reject values no scan can run with.
    pub fn validate(&self) -> ConfigResult<()> {
        seconds("timeout", self.timeout)?;
        seconds("banner_timeout", self.banner_timeout)?;
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Runtime scan configuration for these settings.
    pub fn scan_config(&self) -> ConfigResult<ScanConfig> {
        let config = ScanConfig::default()
            .with_connect_timeout(seconds("timeout", self.timeout)?)
            .with_banner_timeout(seconds("banner_timeout", self.banner_timeout)?)
            .with_concurrency(self.threads)
            .with_banners(self.grab_banners)
            .with_service_detection(self.detect_services);
        config.validate()?;
        Ok(config)
    }
}

/// Convert a positive, finite number of seconds.
fn seconds(field: &'static str, value: f64) -> ConfigResult<Duration> {
    if value.is_nan() || value <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("{} is not a positive number of seconds", value),
        });
    }
    Duration::try_from_secs_f64(value).map_err(|e| ConfigError::InvalidValue {
        field,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.threads, 100);
        assert_eq!(settings.max_hosts, 256);
        assert_eq!(settings.timeout, 1.0);
        assert_eq!(settings.banner_timeout, 2.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"threads": 8, "output_format": "csv"}"#).unwrap();

        let settings = AppSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.threads, 8);
        assert_eq!(settings.output_format, OutputFormat::Csv);
        assert_eq!(settings.max_hosts, 256);
        assert_eq!(settings.tls_ports, TLS_PORTS.to_vec());
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            AppSettings::load(Some(&missing)),
            Err(ConfigError::ReadFailed { .. })
        ));

        let malformed = dir.path().join("bad.json");
        fs::write(&malformed, "{ threads: ").unwrap();
        assert!(matches!(
            AppSettings::load_from(&malformed),
            Err(ConfigError::InvalidFormat(_))
        ));

        let invalid = dir.path().join("zero.json");
        fs::write(&invalid, r#"{"threads": 0}"#).unwrap();
        assert!(matches!(
            AppSettings::load_from(&invalid),
            Err(ConfigError::InvalidValue { field: "threads", .. })
        ));
    }

    #[test]
    fn test_scan_config_conversion() {
        let settings = AppSettings {
            timeout: 0.25,
            grab_banners: true,
            ..AppSettings::default()
        };
        let config = settings.scan_config().unwrap();
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.banner_timeout, Duration::from_secs(2));
        assert!(config.grab_banners);
        assert!(!config.detect_services);

        let negative = AppSettings {
            banner_timeout: -1.0,
            ..AppSettings::default()
        };
        assert!(negative.scan_config().is_err());
        assert!(seconds("timeout", f64::NAN).is_err());
    }
}

//! Error types for portsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Only [`ScanError`] is
//! fatal to a run; the others are reported per target or per sink and the
//! run moves on.

use crate::types::PortError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a target string into an address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("could not resolve hostname '{target}': {reason}")]
    ResolutionFailed { target: String, reason: String },

    #[error("no IPv4/IPv6 address found for '{0}'")]
    NoAddressFound(String),
}

/// Failure to expand a CIDR target into host addresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpansionError {
    #[error("invalid network '{input}': {reason}")]
    InvalidNetwork { input: String, reason: String },

    #[error("network '{input}' has {hosts} usable hosts, above the hard limit of {limit}")]
    TooLarge { input: String, hosts: u128, limit: u128 },
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Failure while handing a report to a sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors that abort a run before any scanning starts.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid port specification: {0}")]
    Ports(#[from] PortError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("no targets specified")]
    NoTargets,

    #[error("no valid targets after expansion")]
    NoTargetsAfterExpansion,
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortSpec` describes which ports a scan covers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value.into()))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl FromStr for Port {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value: u32 = s
            .parse()
            .map_err(|_| PortError::InvalidFormat(s.to_string()))?;
        u16::try_from(value)
            .ok()
            .and_then(Port::new)
            .ok_or(PortError::OutOfRange(value))
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u32),
    #[error("invalid port number: {0:?}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port list")]
    Empty,
}

/// Ports probed when no explicit specification is given.
pub const COMMON_PORTS: [u16; 22] = [
    20, 21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 993, 995, 1723, 3306, 3389,
    5900, 8080, 8443,
];

/// Which ports a scan covers.
///
/// Accepted textual forms:
/// - empty or `common`: the built-in common port list
/// - `1-1000`: an inclusive range (split at the first `-`)
/// - `22,80,443`: an explicit list, duplicates allowed
/// - `8080`: a single port
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortSpec {
    #[default]
    AllCommon,
    Range { start: Port, end: Port },
    List { ports: Vec<Port> },
    Single { port: Port },
}

impl PortSpec {
    /// Build a range, rejecting `start > end`.
    pub fn range(start: Port, end: Port) -> Result<Self, PortError> {
        if start > end {
            return Err(PortError::InvalidRange(start.0, end.0));
        }
        Ok(Self::Range { start, end })
    }

    /// Build a list, rejecting an empty one.
    pub fn list(ports: Vec<Port>) -> Result<Self, PortError> {
        if ports.is_empty() {
            return Err(PortError::Empty);
        }
        Ok(Self::List { ports })
    }

    /// Every port this spec covers, ascending and without duplicates.
    pub fn ports(&self) -> Vec<Port> {
        let mut ports: Vec<Port> = match self {
            Self::AllCommon => COMMON_PORTS.iter().filter_map(|&p| Port::new(p)).collect(),
            Self::Range { start, end } => (start.0..=end.0).filter_map(Port::new).collect(),
            Self::List { ports } => ports.clone(),
            Self::Single { port } => vec![*port],
        };
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    /// Whether `port` belongs to this spec's universe.
    pub fn contains(&self, port: Port) -> bool {
        match self {
            Self::AllCommon => COMMON_PORTS.contains(&port.0),
            Self::Range { start, end } => (*start..=*end).contains(&port),
            Self::List { ports } => ports.contains(&port),
            Self::Single { port: p } => *p == port,
        }
    }

    /// Number of distinct ports covered.
    pub fn count(&self) -> usize {
        match self {
            Self::Range { start, end } => (end.0 - start.0) as usize + 1,
            _ => self.ports().len(),
        }
    }
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("common") {
            return Ok(Self::AllCommon);
        }

        if let Some((start, end)) = s.split_once('-') {
            return Self::range(start.parse()?, end.parse()?);
        }

        if s.contains(',') {
            let ports = s
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<Port>, _>>()?;
            return Self::list(ports);
        }

        Ok(Self::Single { port: s.parse()? })
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllCommon => write!(f, "common ({} ports)", COMMON_PORTS.len()),
            Self::Range { start, end } => write!(f, "{}-{}", start, end),
            Self::List { ports } => {
                let parts: Vec<String> = ports.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Self::Single { port } => write!(f, "{}", port),
        }
    }
}

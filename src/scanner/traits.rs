//! Scanner trait abstractions.
//!
//! The scheduler talks to connection probes and banner grabbers through
//! these traits so that tests can drive it with scripted implementations.

use crate::types::{Port, Target};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// State of a probed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    /// The TCP handshake completed.
    Open,
    /// Refused, timed out, or unreachable.
    Closed,
    /// A local fault prevented the probe (socket creation, resource limits).
    Error,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of probing a single port.
///
/// `service` and `banner` are only ever set on open ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOutcome {
    pub port: Port,
    pub state: PortState,
    /// Detected service label, present when service detection ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Banner grab result: `None` when grabbing was disabled,
    /// `Some(None)` when it ran but got nothing back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Option<String>>,
}

impl PortOutcome {
    /// Outcome of a bare connection probe.
    pub fn new(port: Port, state: PortState) -> Self {
        Self {
            port,
            state,
            service: None,
            banner: None,
        }
    }

    /// Attach a banner grab result. Ignored unless the port is open.
    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        if self.is_open() {
            self.banner = Some(banner);
        }
        self
    }

    /// Attach a service label. Ignored unless the port is open.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        if self.is_open() {
            self.service = Some(service.into());
        }
        self
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }

    /// The captured banner text, if any.
    pub fn banner_text(&self) -> Option<&str> {
        self.banner.as_ref().and_then(|b| b.as_deref())
    }
}

/// Single-port reachability check.
///
/// Implementations must be safe to call concurrently for many ports and
/// must bound every call by `timeout`.
#[async_trait]
pub trait PortProbe: Send + Sync {
    async fn probe(&self, target: &Target, port: Port, timeout: Duration) -> PortState;
}

/// Banner acquisition for ports already known to be open.
///
/// Every failure degrades to `None`.
#[async_trait]
pub trait BannerSource: Send + Sync {
    async fn grab(
        &self,
        target: &Target,
        port: Port,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_state_display() {
        assert_eq!(PortState::Open.to_string(), "open");
        assert_eq!(PortState::Closed.to_string(), "closed");
        assert_eq!(PortState::Error.to_string(), "error");
    }

    #[test]
    fn test_extras_only_attach_to_open_ports() {
        let port = Port::new(80).unwrap();

        let open = PortOutcome::new(port, PortState::Open)
            .with_banner(Some("Apache/2.4".to_string()))
            .with_service("http (apache)");
        assert_eq!(open.banner_text(), Some("Apache/2.4"));
        assert_eq!(open.service.as_deref(), Some("http (apache)"));

        let closed = PortOutcome::new(port, PortState::Closed)
            .with_banner(Some("stray".to_string()))
            .with_service("http");
        assert_eq!(closed.banner, None);
        assert_eq!(closed.service, None);
    }

    #[test]
    fn test_empty_banner_grab_is_recorded() {
        let port = Port::new(22).unwrap();
        let outcome = PortOutcome::new(port, PortState::Open).with_banner(None);
        assert_eq!(outcome.banner, Some(None));
        assert_eq!(outcome.banner_text(), None);
    }
}

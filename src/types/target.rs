//! Resolved scan targets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Address family of a resolved target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Family of an IP address.
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::Ipv4,
            IpAddr::V6(_) => Self::Ipv6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "ipv4"),
            Self::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// A single scan target that has been resolved to an IP address.
///
/// `raw` keeps the string the user supplied; it is what gets presented as
/// the TLS server name and HTTP `Host` header during banner grabbing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "target")]
    pub raw: String,
    #[serde(rename = "addr")]
    pub address: IpAddr,
    pub family: AddressFamily,
}

impl Target {
    /// Create a target; the family follows the address.
    pub fn new(raw: impl Into<String>, address: IpAddr) -> Self {
        Self {
            raw: raw.into(),
            family: AddressFamily::of(&address),
            address,
        }
    }

    /// Socket address for `port` on this target.
    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.address, port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw == self.address.to_string() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.raw, self.address)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_family_follows_address() {
        let v4 = Target::new("10.0.0.1", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(v4.family, AddressFamily::Ipv4);

        let v6 = Target::new("localhost", IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(v6.family, AddressFamily::Ipv6);
        assert_eq!(v6.socket_addr(22).to_string(), "[::1]:22");
    }

    #[test]
    fn test_display() {
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert_eq!(Target::new("127.0.0.1", ip).to_string(), "127.0.0.1");
        assert_eq!(Target::new("localhost", ip).to_string(), "localhost (127.0.0.1)");
    }
}

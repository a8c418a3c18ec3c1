//! CIDR target expansion.
//!
//! Networks are parsed leniently: host bits in the input are cleared rather
//! than rejected, so `192.168.1.77/24` means `192.168.1.0/24`. Expansion
//! above the configured size threshold has to be confirmed by the caller.

use crate::error::ExpansionError;
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// Absolute ceiling on materialized hosts, regardless of confirmation.
pub const HARD_HOST_LIMIT: u128 = 1 << 24;

/// Whether a target string should be treated as a network range.
pub fn is_network_input(input: &str) -> bool {
    input.contains('/')
}

/// Outcome of expanding one network input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Every usable host address, ascending.
    Hosts(Vec<IpAddr>),
    /// The network exceeded the threshold and the caller said no.
    Declined { network: IpNetwork, hosts: u128 },
}

/// Expands CIDR inputs into host addresses behind a size gate.
#[derive(Debug, Clone, Copy)]
pub struct NetworkExpander {
    max_hosts: u128,
    allow_override: bool,
}

impl NetworkExpander {
    pub fn new(max_hosts: u64, allow_override: bool) -> Self {
        Self {
            max_hosts: max_hosts.into(),
            allow_override,
        }
    }

    /// Expand `input`, asking `confirm` when the network is larger than the
    /// threshold and no override was given.
    ///
    /// `confirm` receives the normalized network and its usable-host count.
    pub fn expand<F>(&self, input: &str, confirm: F) -> Result<Expansion, ExpansionError>
    where
        F: FnOnce(&IpNetwork, u128) -> bool,
    {
        let network = parse_network(input)?;
        let hosts = usable_host_count(&network);

        if hosts > HARD_HOST_LIMIT {
            return Err(ExpansionError::TooLarge {
                input: input.trim().to_string(),
                hosts,
                limit: HARD_HOST_LIMIT,
            });
        }

        if hosts > self.max_hosts && !self.allow_override && !confirm(&network, hosts) {
            debug!(%network, hosts, "expansion declined");
            return Ok(Expansion::Declined { network, hosts });
        }

        Ok(Expansion::Hosts(host_addresses(&network)))
    }
}

/// Parse a CIDR string and clear any host bits.
pub fn parse_network(input: &str) -> Result<IpNetwork, ExpansionError> {
    let input = input.trim();
    let invalid = |reason: String| ExpansionError::InvalidNetwork {
        input: input.to_string(),
        reason,
    };

    let parsed: IpNetwork = input.parse().map_err(|e| invalid(format!("{}", e)))?;
    let normalized = match parsed {
        IpNetwork::V4(net) => Ipv4Network::new(net.network(), net.prefix()).map(IpNetwork::V4),
        IpNetwork::V6(net) => Ipv6Network::new(net.network(), net.prefix()).map(IpNetwork::V6),
    };
    normalized.map_err(|e| invalid(format!("{}", e)))
}

/// Number of addresses `host_addresses` would return.
pub fn usable_host_count(network: &IpNetwork) -> u128 {
    match network {
        IpNetwork::V4(net) => {
            let total = 1u128 << (32 - u32::from(net.prefix()));
            if net.prefix() < 31 {
                total - 2
            } else {
                total
            }
        }
        IpNetwork::V6(net) => {
            let span = v6_span(net.prefix());
            if net.prefix() < 127 {
                span
            } else {
                span + 1
            }
        }
    }
}

/// Usable host addresses of a normalized network.
///
/// IPv4 networks wider than /31 drop the network and broadcast addresses;
/// IPv6 networks wider than /127 drop the subnet-router anycast address.
/// Point-to-point and single-host networks return all of their addresses.
fn host_addresses(network: &IpNetwork) -> Vec<IpAddr> {
    match network {
        IpNetwork::V4(net) => {
            let base = u32::from(net.network());
            let last = base | (u32::MAX.checked_shr(u32::from(net.prefix())).unwrap_or(0));
            let (first, last) = if net.prefix() < 31 {
                (base + 1, last - 1)
            } else {
                (base, last)
            };
            (first..=last)
                .map(|n| IpAddr::V4(Ipv4Addr::from(n)))
                .collect()
        }
        IpNetwork::V6(net) => {
            let base = u128::from(net.network());
            let last = base | v6_span(net.prefix());
            let first = if net.prefix() < 127 { base + 1 } else { base };
            (first..=last)
                .map(|n| IpAddr::V6(Ipv6Addr::from(n)))
                .collect()
        }
    }
}

/// Host-part mask of an IPv6 prefix (addresses in the network minus one).
fn v6_span(prefix: u8) -> u128 {
    u128::MAX.checked_shr(u32::from(prefix)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn hosts(expansion: Expansion) -> Vec<String> {
        match expansion {
            Expansion::Hosts(hosts) => hosts.iter().map(|h| h.to_string()).collect(),
            other => panic!("expected hosts, got {:?}", other),
        }
    }

    #[test]
    fn test_slash_30_yields_two_hosts() {
        let expander = NetworkExpander::new(256, false);
        let result = expander.expand("192.168.1.0/30", |_, _| true).unwrap();
        assert_eq!(hosts(result), vec!["192.168.1.1", "192.168.1.2"]);
    }

    #[test]
    fn test_host_bits_are_cleared() {
        let network = parse_network("10.1.2.77/24").unwrap();
        assert_eq!(network.to_string(), "10.1.2.0/24");
        assert_eq!(usable_host_count(&network), 254);
    }

    #[test]
    fn test_declined_expansion_is_not_an_error() {
        let expander = NetworkExpander::new(1, false);
        let result = expander.expand("192.168.1.0/30", |_, _| false).unwrap();
        assert!(matches!(result, Expansion::Declined { hosts: 2, .. }));
    }

    #[test]
    fn test_confirm_only_asked_above_threshold() {
        let asked = Cell::new(0);
        let ask = |_: &IpNetwork, _: u128| {
            asked.set(asked.get() + 1);
            true
        };

        NetworkExpander::new(2, false).expand("10.0.0.0/30", ask).unwrap();
        assert_eq!(asked.get(), 0);

        NetworkExpander::new(1, true).expand("10.0.0.0/30", ask).unwrap();
        assert_eq!(asked.get(), 0);

        NetworkExpander::new(1, false).expand("10.0.0.0/30", ask).unwrap();
        assert_eq!(asked.get(), 1);
    }

    #[test]
    fn test_point_to_point_and_single_host() {
        let expander = NetworkExpander::new(256, false);
        assert_eq!(
            hosts(expander.expand("10.0.0.8/31", |_, _| false).unwrap()),
            vec!["10.0.0.8", "10.0.0.9"]
        );
        assert_eq!(
            hosts(expander.expand("10.0.0.8/32", |_, _| false).unwrap()),
            vec!["10.0.0.8"]
        );
        assert_eq!(
            hosts(expander.expand("2001:db8::5/128", |_, _| false).unwrap()),
            vec!["2001:db8::5"]
        );
    }

    #[test]
    fn test_ipv6_skips_anycast_address() {
        let expander = NetworkExpander::new(256, false);
        assert_eq!(
            hosts(expander.expand("2001:db8::/126", |_, _| false).unwrap()),
            vec!["2001:db8::1", "2001:db8::2", "2001:db8::3"]
        );
    }

    #[test]
    fn test_invalid_network() {
        let expander = NetworkExpander::new(256, false);
        assert!(matches!(
            expander.expand("10.0.0.0/33", |_, _| true),
            Err(ExpansionError::InvalidNetwork { .. })
        ));
        assert!(matches!(
            expander.expand("not-a-net/24", |_, _| true),
            Err(ExpansionError::InvalidNetwork { .. })
        ));
    }

    #[test]
    fn test_hard_limit_checked_before_asking() {
        let expander = NetworkExpander::new(256, false);
        let mut asked = false;
        assert!(matches!(
            expander.expand("10.0.0.0/7", |_, _| {
                asked = true;
                true
            }),
            Err(ExpansionError::TooLarge { .. })
        ));
        assert!(!asked);

        let forced = NetworkExpander::new(256, true);
        assert!(matches!(
            forced.expand("10.0.0.0/7", |_, _| true),
            Err(ExpansionError::TooLarge { .. })
        ));
        assert_eq!(usable_host_count(&parse_network("::/0").unwrap()), u128::MAX);
    }

    #[test]
    fn test_is_network_input() {
        assert!(is_network_input("10.0.0.0/8"));
        assert!(!is_network_input("example.com"));
    }
}

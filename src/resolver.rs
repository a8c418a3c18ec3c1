//! Target resolution.
//!
//! Literal addresses are used as-is; anything else goes through a
//! [`NameLookup`] backend. Among the candidates a lookup returns, IPv4 wins
//! and the first IPv6 address is the fallback.

use crate::error::ResolveError;
use crate::types::Target;
use async_trait::async_trait;
use std::net::IpAddr;
use tracing::{debug, warn};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// Hostname lookup backend.
///
/// An empty candidate list means the name exists but has no usable address.
#[async_trait]
pub trait NameLookup: Send + Sync {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Lookup through the system resolver configuration.
pub struct SystemLookup {
    resolver: TokioAsyncResolver,
}

impl SystemLookup {
    /// Build from `/etc/resolv.conf` (or the platform equivalent), falling
    /// back to the library defaults when that cannot be read.
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "system resolver configuration unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

impl Default for SystemLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        match self.resolver.lookup_ip(host).await {
            Ok(response) => Ok(response.iter().collect()),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { response_code, .. }
                    if *response_code != ResponseCode::NXDomain =>
                {
                    Ok(Vec::new())
                }
                _ => Err(ResolveError::ResolutionFailed {
                    target: host.to_string(),
                    reason: e.to_string(),
                }),
            },
        }
    }
}

/// Turns target strings into [`Target`]s.
pub struct AddressResolver {
    lookup: Box<dyn NameLookup>,
}

impl AddressResolver {
    pub fn new(lookup: impl NameLookup + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Resolver backed by the system DNS configuration.
    pub fn system() -> Self {
        Self::new(SystemLookup::new())
    }

    /// Resolve a literal IP address or hostname.
    pub async fn resolve(&self, input: &str) -> Result<Target, ResolveError> {
        let input = input.trim();

        if let Ok(ip) = input.parse::<IpAddr>() {
            return Ok(Target::new(input, ip));
        }

        let candidates = self.lookup.lookup(input).await?;
        let address = select_address(&candidates)
            .ok_or_else(|| ResolveError::NoAddressFound(input.to_string()))?;

        debug!(host = input, %address, candidates = candidates.len(), "resolved");
        Ok(Target::new(input, address))
    }
}

/// First IPv4 candidate, else first IPv6 candidate.
fn select_address(candidates: &[IpAddr]) -> Option<IpAddr> {
    candidates
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| candidates.iter().find(|ip| ip.is_ipv6()))
        .copied()
}

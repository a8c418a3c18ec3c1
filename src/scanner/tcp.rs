//! TCP connect probe.
//!
//! Performs standard TCP connect scans using the operating system's
//! socket API. A port is open only when the full handshake completes.

use crate::scanner::traits::{PortProbe, PortState};
use crate::types::{Port, Target};
use async_trait::async_trait;
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Connect-based port probe.
///
/// Stateless: each call opens its own socket, so one instance can be shared
/// across every concurrent probe of a scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectProbe;

impl ConnectProbe {
    pub fn new() -> Self {
        Self
    }

    /// Probe a socket address, bounding the connect attempt by `limit`.
    ///
    /// The socket is dropped on every path before this returns.
    pub async fn probe_addr(addr: SocketAddr, limit: Duration) -> PortState {
        let socket = match open_socket(&addr) {
            Ok(socket) => socket,
            Err(e) => {
                debug!(%addr, error = %e, "socket creation failed");
                return PortState::Error;
            }
        };

        match timeout(limit, socket.connect(addr)).await {
            Ok(Ok(stream)) => {
                // Reset instead of FIN so large sweeps don't pile up TIME_WAIT.
                if let Err(e) = SockRef::from(&stream).set_linger(Some(Duration::ZERO)) {
                    trace!(%addr, error = %e, "could not set linger");
                }
                PortState::Open
            }
            Ok(Err(e)) => {
                let state = classify_connect_error(&e);
                trace!(%addr, error = %e, %state, "connect failed");
                state
            }
            Err(_) => {
                trace!(%addr, "connect timed out");
                PortState::Closed
            }
        }
    }
}

#[async_trait]
impl PortProbe for ConnectProbe {
    async fn probe(&self, target: &Target, port: Port, limit: Duration) -> PortState {
        Self::probe_addr(target.socket_addr(port.as_u16()), limit).await
    }
}

/// Create a non-blocking stream socket matching the address family.
fn open_socket(addr: &SocketAddr) -> io::Result<TcpSocket> {
    let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;
    Ok(TcpSocket::from_std_stream(socket.into()))
}

/// Remote conditions mean closed; anything else is a local fault.
fn classify_connect_error(e: &io::Error) -> PortState {
    match e.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::TimedOut => PortState::Closed,
        _ if is_unreachable(e) => PortState::Closed,
        _ => PortState::Error,
    }
}

#[cfg(unix)]
fn is_unreachable(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(code) if code == libc::EHOSTUNREACH || code == libc::ENETUNREACH || code == libc::EHOSTDOWN
    )
}

#[cfg(not(unix))]
fn is_unreachable(e: &io::Error) -> bool {
    e.to_string().to_lowercase().contains("unreachable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn localhost() -> Target {
        Target::new("127.0.0.1", IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[tokio::test]
    async fn test_listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let state = ConnectProbe::new()
            .probe(&localhost(), port, Duration::from_secs(1))
            .await;
        assert_eq!(state, PortState::Open);
    }

    #[tokio::test]
    async fn test_refused_port_is_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        drop(listener);

        let state = ConnectProbe::new()
            .probe(&localhost(), port, Duration::from_secs(1))
            .await;
        assert_eq!(state, PortState::Closed);
    }

    #[tokio::test]
    async fn test_unroutable_address_respects_timeout() {
        let target = Target::new("10.255.255.1", "10.255.255.1".parse().unwrap());
        let limit = Duration::from_millis(200);

        let start = Instant::now();
        let state = ConnectProbe::new()
            .probe(&target, Port::new(81).unwrap(), limit)
            .await;

        assert_ne!(state, PortState::Open);
        assert!(start.elapsed() < limit + Duration::from_secs(1));
    }

    #[test]
    fn test_error_classification() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(classify_connect_error(&refused), PortState::Closed);

        let exhausted = io::Error::new(io::ErrorKind::Other, "too many open files");
        assert_eq!(classify_connect_error(&exhausted), PortState::Error);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreachable_is_closed() {
        let unreachable = io::Error::from_raw_os_error(libc::EHOSTUNREACH);
        assert_eq!(classify_connect_error(&unreachable), PortState::Closed);
    }
}

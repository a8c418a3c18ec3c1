//! Banner grabbing for open TCP ports.
//!
//! Dispatch is by port number:
//! - TLS-likely ports get a TLS handshake followed by an HTTP `HEAD`; if the
//!   handshake fails or times out the plaintext bytes are used instead.
//! - HTTP-likely plaintext ports get the same `HEAD` before the read.
//! - Everything else is only read from, which catches services that greet
//!   on connect (SSH, SMTP, FTP).
//!
//! A grab never fails outward: every fault becomes "no banner".

use crate::scanner::traits::BannerSource;
use crate::types::{Port, Target};
use async_trait::async_trait;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// Maximum bytes to read for a banner.
pub const MAX_BANNER_SIZE: usize = 4096;

/// Ports where a TLS handshake is attempted first.
pub const TLS_PORTS: [u16; 3] = [443, 8443, 9443];

/// Plaintext ports that are nudged with an HTTP request.
pub const HTTP_PORTS: [u16; 6] = [80, 8080, 8000, 81, 8888, 8008];

/// TLS-aware banner grabber.
///
/// Cheap to clone; clones share the TLS client configuration.
#[derive(Clone)]
pub struct BannerGrabber {
    connector: TlsConnector,
    tls_ports: Vec<u16>,
    http_ports: Vec<u16>,
}

impl BannerGrabber {
    /// Create a grabber trusting the Mozilla root set.
    pub fn new() -> Result<Self, rustls::Error> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::with_roots(roots)
    }

    /// Create a grabber trusting only `roots`.
    pub fn with_roots(roots: RootCertStore) -> Result<Self, rustls::Error> {
        let config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            tls_ports: TLS_PORTS.to_vec(),
            http_ports: HTTP_PORTS.to_vec(),
        })
    }

    /// Replace the set of ports treated as TLS.
    pub fn with_tls_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.tls_ports = ports.into_iter().collect();
        self
    }

    /// Replace the set of ports treated as plaintext HTTP.
    pub fn with_http_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.http_ports = ports.into_iter().collect();
        self
    }

    /// Grab a banner from `port` on `target`.
    ///
    /// Connecting and the TLS handshake are bounded by the shorter of the
    /// two timeouts; sending and reading by `read_timeout`.
    pub async fn grab_banner(
        &self,
        target: &Target,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Option<String> {
        let addr = target.socket_addr(port);
        let setup_limit = connect_timeout.min(read_timeout);

        let mut stream = match timeout(setup_limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "banner connect failed");
                return None;
            }
            Err(_) => {
                debug!(%addr, "banner connect timed out");
                return None;
            }
        };

        let data = if self.tls_ports.contains(&port) {
            self.tls_exchange(stream, target, setup_limit, read_timeout)
                .await
        } else {
            if self.http_ports.contains(&port)
                && !send_head_request(&mut stream, &target.raw, read_timeout).await
            {
                debug!(%addr, "HTTP probe not sent");
            }
            read_banner(&mut stream, read_timeout).await
        };

        let banner = decode_banner(&data);
        if banner.is_none() {
            debug!(%addr, "no banner");
        }
        banner
    }

    /// Handshake, probe and read over TLS, or fall back to the raw socket
    /// when the peer does not speak TLS.
    ///
    /// Bytes the TLS layer consumed before giving up become the banner. If
    /// nothing arrived during the handshake the socket is read once more.
    async fn tls_exchange(
        &self,
        stream: TcpStream,
        target: &Target,
        handshake_limit: Duration,
        read_timeout: Duration,
    ) -> Vec<u8> {
        let mut stream = Recorded::new(stream);

        let server_name = match ServerName::try_from(target.raw.as_str()) {
            Ok(name) => name.to_owned(),
            Err(e) => {
                debug!(host = %target.raw, error = %e, "not a TLS server name, reading plaintext");
                return read_banner(&mut stream, read_timeout).await;
            }
        };

        match timeout(handshake_limit, self.connector.connect(server_name, &mut stream)).await {
            Ok(Ok(mut tls)) => {
                if !send_head_request(&mut tls, &target.raw, read_timeout).await {
                    debug!(host = %target.raw, "HTTP probe over TLS not sent");
                }
                return read_banner(&mut tls, read_timeout).await;
            }
            Ok(Err(e)) => {
                debug!(host = %target.raw, error = %e, "TLS handshake failed, reading plaintext");
            }
            Err(_) => {
                debug!(host = %target.raw, "TLS handshake timed out, reading plaintext");
            }
        }

        let (mut plain, seen) = stream.into_parts();
        if seen.is_empty() {
            read_banner(&mut plain, read_timeout).await
        } else {
            seen
        }
    }
}

/// Stream wrapper keeping a copy of the first [`MAX_BANNER_SIZE`] bytes
/// read through it.
struct Recorded<S> {
    inner: S,
    seen: Vec<u8>,
}

impl<S> Recorded<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            seen: Vec::new(),
        }
    }

    fn into_parts(self) -> (S, Vec<u8>) {
        (self.inner, self.seen)
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for Recorded<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let fresh = &buf.filled()[before..];
            let room = MAX_BANNER_SIZE.saturating_sub(this.seen.len());
            this.seen.extend_from_slice(&fresh[..fresh.len().min(room)]);
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Recorded<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[async_trait]
impl BannerSource for BannerGrabber {
    async fn grab(
        &self,
        target: &Target,
        port: Port,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Option<String> {
        self.grab_banner(target, port.as_u16(), connect_timeout, read_timeout)
            .await
    }
}

/// Send a minimal `HEAD /`. Returns whether the request went out.
async fn send_head_request<S>(stream: &mut S, host: &str, limit: Duration) -> bool
where
    S: AsyncWrite + Unpin,
{
    let request = format!("HEAD / HTTP/1.0\r\nHost: {}\r\n\r\n", host);
    let send = async {
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;
        Ok::<(), io::Error>(())
    };
    matches!(timeout(limit, send).await, Ok(Ok(())))
}

/// A single bounded read of up to [`MAX_BANNER_SIZE`] bytes.
async fn read_banner<S>(stream: &mut S, limit: Duration) -> Vec<u8>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; MAX_BANNER_SIZE];
    match timeout(limit, stream.read(&mut buffer)).await {
        Ok(Ok(n)) => {
            buffer.truncate(n);
            buffer
        }
        _ => Vec::new(),
    }
}

/// Decode as UTF-8, dropping invalid sequences, and trim.
fn decode_banner(data: &[u8]) -> Option<String> {
    let text: String = data.utf8_chunks().map(|chunk| chunk.valid()).collect();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
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

    fn grabber() -> BannerGrabber {
        BannerGrabber::new().unwrap()
    }

    /// Bind a loopback listener and return it with its port.
    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn test_decode_banner() {
        assert_eq!(
            decode_banner(b"SSH-2.0-OpenSSH_8.9\r\n"),
            Some("SSH-2.0-OpenSSH_8.9".to_string())
        );
        assert_eq!(decode_banner(b"\xffHel\xfelo\n"), Some("Hello".to_string()));
        assert_eq!(decode_banner(b" \r\n\t"), None);
        assert_eq!(decode_banner(b""), None);
    }

    #[tokio::test]
    async fn test_greeting_on_connect() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"READY\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let banner = grabber()
            .grab_banner(&localhost(), port, Duration::from_secs(1), Duration::from_secs(2))
            .await;
        assert_eq!(banner.as_deref(), Some("READY"));
    }

    #[tokio::test]
    async fn test_silent_service_has_no_banner() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
        });

        let read_timeout = Duration::from_millis(300);
        let start = Instant::now();
        let banner = grabber()
            .grab_banner(&localhost(), port, Duration::from_secs(1), read_timeout)
            .await;

        assert_eq!(banner, None);
        assert!(start.elapsed() < read_timeout + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_http_port_receives_head_request() {
        let (listener, port) = listener().await;
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.0 200 OK\r\nServer: test\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        let banner = grabber()
            .with_http_ports([port])
            .grab_banner(&localhost(), port, Duration::from_secs(1), Duration::from_secs(2))
            .await;

        assert_eq!(banner.as_deref(), Some("HTTP/1.0 200 OK\r\nServer: test"));
        let request = server.await.unwrap();
        assert_eq!(request, "HEAD / HTTP/1.0\r\nHost: 127.0.0.1\r\n\r\n");
    }

    #[tokio::test]
    async fn test_plaintext_reply_to_client_hello() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(b"NOT TLS\r\n").await;
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let start = Instant::now();
        let banner = grabber()
            .with_tls_ports([port])
            .grab_banner(&localhost(), port, Duration::from_secs(1), Duration::from_millis(500))
            .await;

        assert_eq!(banner.as_deref(), Some("NOT TLS"));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_greeting_service_on_tls_port() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let banner = grabber()
            .with_tls_ports([port])
            .grab_banner(&localhost(), port, Duration::from_secs(1), Duration::from_secs(2))
            .await;
        assert_eq!(banner.as_deref(), Some("SSH-2.0-OpenSSH_9.6"));
    }

    #[tokio::test]
    async fn test_slow_greeting_after_handshake_timeout() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(400)).await;
            socket.write_all(b"220 slow plaintext service\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let banner = grabber()
            .with_tls_ports([port])
            .grab_banner(&localhost(), port, Duration::from_millis(200), Duration::from_secs(2))
            .await;
        assert_eq!(banner.as_deref(), Some("220 slow plaintext service"));
    }

    #[tokio::test]
    async fn test_head_request_over_tls() {
        use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
        use rustls::ServerConfig;
        use tokio_rustls::TlsAcceptor;

        let ca = CertificateDer::from(include_bytes!("../testdata/ca.der").to_vec());
        let leaf = CertificateDer::from(include_bytes!("../testdata/localhost.der").to_vec());
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
            include_bytes!("../testdata/localhost.key.der").to_vec(),
        ));

        let server_config = ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![leaf, ca.clone()], key)
        .unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(server_config));

        let (listener, port) = listener().await;
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut tls = acceptor.accept(socket).await.unwrap();
            let mut buf = vec![0u8; 256];
            let n = tls.read(&mut buf).await.unwrap();
            tls.write_all(b"HTTP/1.0 204 No Content\r\nServer: tls-test\r\n\r\n")
                .await
                .unwrap();
            tls.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        let mut roots = RootCertStore::empty();
        roots.add(ca).unwrap();
        let target = Target::new("localhost", IpAddr::V4(Ipv4Addr::LOCALHOST));
        let banner = BannerGrabber::with_roots(roots)
            .unwrap()
            .with_tls_ports([port])
            .grab_banner(&target, port, Duration::from_secs(2), Duration::from_secs(2))
            .await;

        assert_eq!(
            banner.as_deref(),
            Some("HTTP/1.0 204 No Content\r\nServer: tls-test")
        );
        let request = server.await.unwrap();
        assert_eq!(request, "HEAD / HTTP/1.0\r\nHost: localhost\r\n\r\n");
    }

    #[tokio::test]
    async fn test_closed_port_has_no_banner() {
        let (listener, port) = listener().await;
        drop(listener);

        let banner = grabber()
            .grab_banner(&localhost(), port, Duration::from_secs(1), Duration::from_secs(1))
            .await;
        assert_eq!(banner, None);
    }

    #[tokio::test]
    #[ignore]
    async fn test_tls_banner_from_public_site() {
        let target = crate::resolver::AddressResolver::system()
            .resolve("example.com")
            .await
            .unwrap();
        let banner = grabber()
            .grab_banner(&target, 443, Duration::from_secs(3), Duration::from_secs(3))
            .await;
        assert!(banner.unwrap().starts_with("HTTP/"));
    }
}

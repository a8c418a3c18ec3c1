//! # portsweep - a concurrent TCP connect scanner
//!
//! portsweep resolves targets (hostnames, IP addresses, CIDR networks),
//! probes their TCP ports with bounded concurrency and produces one
//! [`ScanReport`] per target.
//!
//! ## Features
//!
//! - **Connect scanning**: full TCP handshakes via the OS socket API
//! - **Network expansion**: CIDR inputs with a confirmation gate for large ranges
//! - **Banner grabbing**: TLS-aware, with an HTTP nudge for web ports
//! - **Service classification**: port table plus banner keyword rules
//! - **Graceful interruption**: partial reports on cancellation
//! - **Report sinks**: console, text log, NDJSON and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portsweep::banner::BannerGrabber;
//! use portsweep::network::NetworkExpander;
//! use portsweep::output::MemorySink;
//! use portsweep::resolver::AddressResolver;
//! use portsweep::scanner::{ConnectProbe, NoopObserver, ScanConfig, ScanRunner, ScanScheduler};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scheduler = ScanScheduler::new(ConnectProbe::new(), BannerGrabber::new()?, ScanConfig::default());
//!     let runner = ScanRunner::new(AddressResolver::system(), NetworkExpander::new(256, false), scheduler);
//!
//!     let targets = runner.plan(&["192.168.1.0/30".to_string()], |_, _| false);
//!     let mut sink = MemorySink::new();
//!     runner
//!         .run(&targets, &"22,80,443".parse()?, &mut sink, &NoopObserver, &CancellationToken::new())
//!         .await;
//!
//!     for report in sink.reports() {
//!         println!("{}", report.summary());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - ports, port specifications and resolved targets
//! - [`resolver`] - hostname resolution
//! - [`network`] - CIDR expansion
//! - [`scanner`] - probes, the per-target scheduler and the multi-target runner
//! - [`banner`] and [`services`] - banner grabbing and service labels
//! - [`output`] - report sinks
//! - [`config`] - settings file
//! - [`cli`] - command-line front end
//! - [`error`] - error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod resolver;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{ResolveError, ScanError};
pub use scanner::{PortOutcome, PortState, ScanConfig, ScanReport};
pub use types::{Port, PortSpec, Target};

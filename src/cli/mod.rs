//! Command-line interface.
//!
//! `portsweep` is a single command: every flag configures one scan run over
//! one or more targets.

mod progress;
mod prompt;
mod scan;
mod targets;

pub use progress::ProgressObserver;
pub use prompt::{confirm, confirm_with};
pub use scan::{PreparedScan, ScanCommand};
pub use targets::{collect_targets, load_targets_file};

use clap::Parser;
use std::path::PathBuf;

/// portsweep - a concurrent TCP connect scanner.
///
/// Scans hostnames, IP addresses and CIDR networks, optionally grabbing
/// banners and classifying the services behind open ports.
#[derive(Parser, Debug)]
#[command(name = "portsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP port scanner", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub scan: ScanCommand,

    /// Print closed and errored ports, and enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to a settings file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

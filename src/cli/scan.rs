//! The scan command.

use crate::banner::BannerGrabber;
use crate::cli::progress::ProgressObserver;
use crate::cli::{prompt, targets};
use crate::config::AppSettings;
use crate::error::ScanError;
use crate::network::NetworkExpander;
use crate::output::{self, ConsoleSink, FanOut, OutputFormat};
use crate::resolver::AddressResolver;
use crate::scanner::{ConnectProbe, RunSummary, ScanRunner, ScanScheduler};
use crate::types::PortSpec;
use clap::Args;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Scan options. Unset values fall back to the settings file.
#[derive(Args, Debug, Default)]
pub struct ScanCommand {
    /// Target host, IP address or CIDR network (repeatable, comma-separated)
    #[arg(short = 't', long = "target", value_name = "TARGET", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// File with one target per line ('#' starts a comment)
    #[arg(long, value_name = "PATH")]
    pub targets_file: Option<PathBuf>,

    /// Ports: "common", a single port, a list "22,80,443" or a range "1-1024"
    #[arg(short, long, value_name = "SPEC")]
    pub ports: Option<String>,

    /// Connect timeout in seconds [default: 1.0]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Banner read timeout in seconds [default: 2.0]
    #[arg(long, value_name = "SECS")]
    pub banner_timeout: Option<f64>,

    /// Concurrent probes per target [default: 100]
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Networks with more usable hosts than this need confirmation [default: 256]
    #[arg(long, value_name = "N")]
    pub max_hosts: Option<u64>,

    /// Expand large networks without asking
    #[arg(long)]
    pub force_network_scan: bool,

    /// Grab banners from open ports
    #[arg(long)]
    pub banner: bool,

    /// Classify services on open ports
    #[arg(long)]
    pub service_detect: bool,

    /// Append each report to this file
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Format for --output-file [default: text]
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,
}

impl ScanCommand {
    /// Settings with this command's flags applied on top.
    pub fn apply(&self, mut settings: AppSettings) -> AppSettings {
        if let Some(timeout) = self.timeout {
            settings.timeout = timeout;
        }
        if let Some(banner_timeout) = self.banner_timeout {
            settings.banner_timeout = banner_timeout;
        }
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if let Some(max_hosts) = self.max_hosts {
            settings.max_hosts = max_hosts;
        }
        if let Some(format) = self.output_format {
            settings.output_format = format;
        }
        settings.grab_banners |= self.banner;
        settings.detect_services |= self.service_detect;
        settings
    }

    /// Parse, validate and plan the scan without probing anything.
    ///
    /// Planning may ask on stdin about large networks, so this blocks and
    /// should run before a SIGINT handler is installed.
    pub fn prepare(&self, settings: AppSettings) -> Result<PreparedScan, ScanError> {
        let ports: PortSpec = self.ports.as_deref().unwrap_or_default().parse()?;
        let settings = self.apply(settings);
        let config = settings.scan_config()?;

        let inputs = targets::collect_targets(&self.targets, self.targets_file.as_deref());
        if inputs.is_empty() {
            return Err(ScanError::NoTargets);
        }

        let grabber = BannerGrabber::new()?
            .with_tls_ports(settings.tls_ports.iter().copied())
            .with_http_ports(settings.http_ports.iter().copied());
        let runner = ScanRunner::new(
            AddressResolver::system(),
            NetworkExpander::new(settings.max_hosts, self.force_network_scan),
            ScanScheduler::new(ConnectProbe::new(), grabber, config),
        );

        let max_hosts = settings.max_hosts;
        let targets = runner.plan(&inputs, |network, hosts| {
            prompt::confirm(&format!(
                "Network {} contains {} addresses which exceeds --max-hosts ({}). Continue?",
                network, hosts, max_hosts
            ))
        });
        if targets.is_empty() {
            return Err(ScanError::NoTargetsAfterExpansion);
        }

        Ok(PreparedScan {
            runner,
            targets,
            ports,
            settings,
            output_file: self.output_file.clone(),
        })
    }

    /// Prepare and run in one go. Only invalid input is an error.
    pub async fn execute(
        &self,
        settings: AppSettings,
        verbose: bool,
        cancel: CancellationToken,
    ) -> Result<RunSummary, ScanError> {
        Ok(self.prepare(settings)?.run(verbose, &cancel).await)
    }
}

/// A planned scan: targets expanded, settings resolved, nothing probed yet.
pub struct PreparedScan {
    runner: ScanRunner<ConnectProbe, BannerGrabber>,
    targets: Vec<String>,
    ports: PortSpec,
    settings: AppSettings,
    output_file: Option<PathBuf>,
}

impl PreparedScan {
    /// Targets in the order they will be scanned.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Scan every planned target, reporting to the console and the
    /// optional output file.
    pub async fn run(self, verbose: bool, cancel: &CancellationToken) -> RunSummary {
        output::print_banner(self.targets.len(), &self.ports.to_string());

        let mut sink = FanOut::new().with(ConsoleSink::new());
        if let Some(path) = &self.output_file {
            info!(path = %path.display(), format = %self.settings.output_format, "appending reports");
            sink.push(output::file_sink(self.settings.output_format, path));
        }

        let observer = ProgressObserver::new(self.ports.count(), verbose || self.settings.verbose);
        let summary = self
            .runner
            .run(&self.targets, &self.ports, &mut sink, &observer, cancel)
            .await;

        if summary.interrupted {
            output::print_warning("Scan interrupted by user; remaining targets were not scanned.");
        } else {
            output::print_success(&format!(
                "Scanned {} target(s), {} skipped",
                summary.reports, summary.skipped
            ));
        }
        summary
    }
}

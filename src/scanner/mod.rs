//! Scanner module - schedules probes for a single target.
//!
//! [`ScanScheduler`] fans one unit of work out per port, bounded by the
//! configured concurrency. Each unit probes the port and, when it is open,
//! grabs a banner and classifies the service before the outcome reaches the
//! per-target [`ReportBuilder`]. [`ScanRunner`] drives the scheduler across
//! many targets.

pub mod report;
pub mod runner;
pub mod tcp;
pub mod traits;

use crate::banner::BannerGrabber;
use crate::error::{ConfigError, ConfigResult};
use crate::services;
use crate::types::{Port, PortSpec, Target};
use futures::future;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use report::{ReportBuilder, ScanReport};
pub use runner::{RunSummary, ScanRunner};
pub use tcp::ConnectProbe;
pub use traits::{BannerSource, PortOutcome, PortProbe, PortState};

/// Completed probes between two progress notifications.
pub const PROGRESS_INTERVAL: usize = 100;

/// Runtime configuration of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub connect_timeout: Duration,
    pub banner_timeout: Duration,
    /// Maximum probes in flight for one target.
    pub concurrency: usize,
    pub grab_banners: bool,
    pub detect_services: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            banner_timeout: Duration::from_secs(2),
            concurrency: 100,
            grab_banners: false,
            detect_services: false,
        }
    }
}

impl ScanConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_banner_timeout(mut self, timeout: Duration) -> Self {
        self.banner_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_banners(mut self, enabled: bool) -> Self {
        self.grab_banners = enabled;
        self
    }

    pub fn with_service_detection(mut self, enabled: bool) -> Self {
        self.detect_services = enabled;
        self
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be positive".to_string(),
            });
        }
        if self.grab_banners && self.banner_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "banner_timeout",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Lifecycle of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Resolving,
    Scanning,
    Finalizing,
    Done,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolving => write!(f, "resolving"),
            Self::Scanning => write!(f, "scanning"),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Receives scan events. Purely observational; every method defaults to a
/// no-op.
pub trait ScanObserver {
    /// `target` is the raw input string, since resolution may not have
    /// happened yet.
    fn phase(&self, _target: &str, _phase: ScanPhase) {}

    /// A probe finished and its outcome was recorded.
    fn outcome(&self, _target: &Target, _outcome: &PortOutcome) {}

    /// Sent every [`PROGRESS_INTERVAL`] completed probes.
    fn progress(&self, _target: &Target, _completed: usize, _total: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Bounded-concurrency port scheduler for one target at a time.
pub struct ScanScheduler<P = ConnectProbe, B = BannerGrabber> {
    probe: P,
    banners: B,
    config: ScanConfig,
}

impl<P: PortProbe, B: BannerSource> ScanScheduler<P, B> {
    pub fn new(probe: P, banners: B, config: ScanConfig) -> Self {
        Self {
            probe,
            banners,
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan every port of `ports` on `target`.
    ///
    /// Once `cancel` fires no new probes are started; probes already in
    /// flight run to completion and the report is finalized from whatever
    /// finished, with `interrupted` set.
    pub async fn scan_target(
        &self,
        target: &Target,
        ports: &PortSpec,
        observer: &dyn ScanObserver,
        cancel: &CancellationToken,
    ) -> ScanReport {
        let universe = ports.ports();
        let total = universe.len();
        let mut report = ReportBuilder::new(target.clone(), total);

        observer.phase(&target.raw, ScanPhase::Scanning);
        info!(
            host = %target,
            ports = total,
            concurrency = self.config.concurrency,
            "scanning"
        );

        let mut outcomes = stream::iter(universe)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|port| self.scan_port(target, port))
            .buffer_unordered(self.config.concurrency.max(1));

        while let Some(outcome) = outcomes.next().await {
            match outcome.state {
                PortState::Open => debug!(host = %target, port = %outcome.port, "open"),
                state => debug!(host = %target, port = %outcome.port, %state, "not open"),
            }
            observer.outcome(target, &outcome);
            report.record(outcome);

            let completed = report.completed();
            if completed % PROGRESS_INTERVAL == 0 {
                observer.progress(target, completed, total);
            }
        }

        observer.phase(&target.raw, ScanPhase::Finalizing);
        let interrupted = cancel.is_cancelled() && report.completed() < total;
        let report = report.finish(interrupted);
        info!(summary = %report.summary(), "scan finished");
        report
    }

    /// One unit of work: probe, then banner and classification if open.
    async fn scan_port(&self, target: &Target, port: Port) -> PortOutcome {
        let state = self
            .probe
            .probe(target, port, self.config.connect_timeout)
            .await;
        let mut outcome = PortOutcome::new(port, state);
        if !outcome.is_open() {
            return outcome;
        }

        if self.config.grab_banners {
            let banner = self
                .banners
                .grab(
                    target,
                    port,
                    self.config.connect_timeout,
                    self.config.banner_timeout,
                )
                .await;
            outcome = outcome.with_banner(banner);
        }

        if self.config.detect_services {
            let label = services::classify(port.as_u16(), outcome.banner_text());
            outcome = outcome.with_service(label);
        }

        outcome
    }
}

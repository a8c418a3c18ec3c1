//! Per-target scan reports.
//!
//! A [`ReportBuilder`] is owned by the scheduler for the lifetime of one
//! target scan and is only touched on the completion path, one outcome at a
//! time. [`ReportBuilder::finish`] freezes it into a [`ScanReport`].

use crate::scanner::traits::{PortOutcome, PortState};
use crate::types::{Port, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Finished result of scanning one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    #[serde(flatten)]
    pub target: Target,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Open ports, strictly ascending.
    pub open_ports: Vec<Port>,
    /// Banner grab results for open ports; `None` when nothing came back.
    pub banners: BTreeMap<Port, Option<String>>,
    pub detected_services: BTreeMap<Port, String>,
    /// Set when cancellation stopped the scan before every port was probed.
    pub interrupted: bool,
    pub ports_total: usize,
    pub ports_completed: usize,
    pub closed_ports: usize,
    pub errored_ports: usize,
}

impl ScanReport {
    /// Wall-clock time between start and finish.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// First line of the banner captured on `port`.
    pub fn banner_line(&self, port: Port) -> Option<&str> {
        self.banners
            .get(&port)
            .and_then(|b| b.as_deref())
            .and_then(|b| b.lines().next())
    }

    /// One-line summary for logs and listings.
    pub fn summary(&self) -> String {
        format!(
            "{} - {} open, {} closed, {} errors [{}/{} ports, {:.2}s]{}",
            self.target,
            self.open_ports.len(),
            self.closed_ports,
            self.errored_ports,
            self.ports_completed,
            self.ports_total,
            self.duration().num_milliseconds() as f64 / 1000.0,
            if self.interrupted { " (interrupted)" } else { "" }
        )
    }
}

/// Mutable accumulator for a target scan in progress.
#[derive(Debug)]
pub struct ReportBuilder {
    target: Target,
    started_at: DateTime<Utc>,
    ports_total: usize,
    open: BTreeSet<Port>,
    banners: BTreeMap<Port, Option<String>>,
    services: BTreeMap<Port, String>,
    completed: usize,
    closed: usize,
    errored: usize,
}

impl ReportBuilder {
    /// Start a report; the start time is taken now.
    pub fn new(target: Target, ports_total: usize) -> Self {
        Self {
            target,
            started_at: Utc::now(),
            ports_total,
            open: BTreeSet::new(),
            banners: BTreeMap::new(),
            services: BTreeMap::new(),
            completed: 0,
            closed: 0,
            errored: 0,
        }
    }

    /// Record a finished probe.
    ///
    /// Banner and service data are only kept for open ports.
    pub fn record(&mut self, outcome: PortOutcome) {
        self.completed += 1;
        match outcome.state {
            PortState::Open => {
                self.open.insert(outcome.port);
                if let Some(banner) = outcome.banner {
                    self.banners.insert(outcome.port, banner);
                }
                if let Some(service) = outcome.service {
                    self.services.insert(outcome.port, service);
                }
            }
            PortState::Closed => self.closed += 1,
            PortState::Error => self.errored += 1,
        }
    }

    /// Number of outcomes recorded so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Freeze into a report; the finish time is taken now.
    pub fn finish(self, interrupted: bool) -> ScanReport {
        ScanReport {
            target: self.target,
            started_at: self.started_at,
            finished_at: Utc::now(),
            open_ports: self.open.into_iter().collect(),
            banners: self.banners,
            detected_services: self.services,
            interrupted,
            ports_total: self.ports_total,
            ports_completed: self.completed,
            closed_ports: self.closed,
            errored_ports: self.errored,
        }
    }
}

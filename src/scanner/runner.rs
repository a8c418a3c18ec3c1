//! Multi-target driver.
//!
//! Targets are handled one after another in the order given. Network inputs
//! are expanded up front by [`ScanRunner::plan`] so every confirmation
//! question is asked before the first probe goes out.

use crate::network::{is_network_input, Expansion, NetworkExpander};
use crate::output::ReportSink;
use crate::resolver::AddressResolver;
use crate::scanner::traits::{BannerSource, PortProbe};
use crate::scanner::{ScanObserver, ScanPhase, ScanScheduler};
use crate::types::PortSpec;
use ipnetwork::IpNetwork;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What a run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Reports handed to the sink, partial ones included.
    pub reports: usize,
    /// Targets dropped because they could not be resolved.
    pub skipped: usize,
    pub interrupted: bool,
}

/// Resolves, scans and reports a list of targets.
pub struct ScanRunner<P, B> {
    resolver: AddressResolver,
    expander: NetworkExpander,
    scheduler: ScanScheduler<P, B>,
}

impl<P: PortProbe, B: BannerSource> ScanRunner<P, B> {
    pub fn new(
        resolver: AddressResolver,
        expander: NetworkExpander,
        scheduler: ScanScheduler<P, B>,
    ) -> Self {
        Self {
            resolver,
            expander,
            scheduler,
        }
    }

    /// Expand network inputs into host addresses, keeping input order.
    ///
    /// `confirm` is asked about networks above the host threshold. Invalid
    /// networks and declined expansions are logged and dropped.
    pub fn plan<F>(&self, inputs: &[String], mut confirm: F) -> Vec<String>
    where
        F: FnMut(&IpNetwork, u128) -> bool,
    {
        let mut targets = Vec::new();
        for input in inputs.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
            if !is_network_input(input) {
                targets.push(input.to_string());
                continue;
            }

            match self.expander.expand(input, |net, hosts| confirm(net, hosts)) {
                Ok(Expansion::Hosts(hosts)) => {
                    info!(network = input, hosts = hosts.len(), "expanded network");
                    targets.extend(hosts.into_iter().map(|ip| ip.to_string()));
                }
                Ok(Expansion::Declined { network, hosts }) => {
                    info!(%network, hosts, "network scan declined, skipping");
                }
                Err(e) => warn!(error = %e, "skipping network"),
            }
        }
        targets
    }

    /// Scan each target in turn and submit its report to `sink`.
    ///
    /// After `cancel` fires the current target's partial report is still
    /// submitted; no further targets are started.
    pub async fn run(
        &self,
        targets: &[String],
        ports: &PortSpec,
        sink: &mut dyn ReportSink,
        observer: &dyn ScanObserver,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for raw in targets {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            observer.phase(raw, ScanPhase::Resolving);
            let target = match self.resolver.resolve(raw).await {
                Ok(target) => target,
                Err(e) => {
                    warn!(error = %e, "skipping target");
                    summary.skipped += 1;
                    continue;
                }
            };

            let report = self
                .scheduler
                .scan_target(&target, ports, observer, cancel)
                .await;

            if let Err(e) = sink.submit(&report) {
                warn!(host = %target, error = %e, "failed to write report");
            }
            summary.reports += 1;
            observer.phase(raw, ScanPhase::Done);

            if report.interrupted || cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }
        }

        summary
    }
}

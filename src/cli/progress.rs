//! Terminal progress reporting for a scan run.

use crate::scanner::{PortOutcome, PortState, ScanObserver, ScanPhase};
use crate::services;
use crate::types::Target;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use tracing::{debug, info};

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Progress bar per target plus a line for every open port.
///
/// Closed and errored ports are only printed when `verbose` is set.
pub struct ProgressObserver {
    ports_per_target: u64,
    verbose: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver {
    pub fn new(ports_per_target: usize, verbose: bool) -> Self {
        Self {
            ports_per_target: ports_per_target as u64,
            verbose,
            bar: Mutex::new(None),
        }
    }

    fn start_bar(&self, target: &str) {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        let bar = ProgressBar::new(self.ports_per_target)
            .with_style(style)
            .with_message(target.to_string());

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }

    /// Print above the bar, or plainly when no bar is active.
    fn line(&self, text: String) {
        match self.bar.lock().ok().and_then(|slot| slot.clone()) {
            Some(bar) => bar.println(text),
            None => println!("{}", text),
        }
    }
}

impl ScanObserver for ProgressObserver {
    fn phase(&self, target: &str, phase: ScanPhase) {
        match phase {
            ScanPhase::Resolving => debug!(host = target, "resolving"),
            ScanPhase::Scanning => {
                self.line(format!(
                    "{} Scanning {}",
                    style("[*]").cyan(),
                    style(target).white().bold()
                ));
                self.start_bar(target);
            }
            ScanPhase::Finalizing => self.finish_bar(),
            ScanPhase::Done => info!(host = target, "report written"),
        }
    }

    fn outcome(&self, _target: &Target, outcome: &PortOutcome) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.inc(1);
            }
        }

        let port = outcome.port.as_u16();
        match outcome.state {
            PortState::Open => {
                let service = outcome
                    .service
                    .clone()
                    .unwrap_or_else(|| services::service_description(port).to_string());
                self.line(format!(
                    "{} Port {:5} - OPEN ({})",
                    style("[+]").green().bold(),
                    port,
                    service
                ));
                if let Some(first) = outcome.banner_text().and_then(|b| b.lines().next()) {
                    self.line(format!("    Banner: {}", style(first).dim()));
                }
            }
            PortState::Closed if self.verbose => {
                self.line(format!("{} Port {:5} - CLOSED", style("[-]").red(), port));
            }
            PortState::Error if self.verbose => {
                self.line(format!("{} Port {:5} - ERROR", style("[!]").yellow(), port));
            }
            _ => {}
        }
    }

    fn progress(&self, target: &Target, completed: usize, total: usize) {
        let percent = if total == 0 {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        debug!(host = %target, completed, total, "progress {:.1}%", percent);
    }
}

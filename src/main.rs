use anyhow::Context;
use clap::Parser;
use portsweep::cli::Cli;
use portsweep::config::AppSettings;
use portsweep::output;
use portsweep::scanner::RunSummary;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Conventional exit status after SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(summary) if summary.interrupted => ExitCode::from(EXIT_INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    let settings = AppSettings::load(cli.config.as_deref()).context("failed to load settings")?;
    let verbose = cli.verbose || settings.verbose;

    // Planning may prompt on stdin; Ctrl-C keeps its default meaning until
    // the scan itself starts.
    let prepared = tokio::task::block_in_place(|| cli.scan.prepare(settings))
        .context("scan failed")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            output::print_warning("Interrupt received, finishing in-flight probes...");
            on_signal.cancel();
        }
    });

    Ok(prepared.run(verbose, &cancel).await)
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

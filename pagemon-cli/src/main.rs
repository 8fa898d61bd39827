mod cli;
mod config;
mod error;
mod logging;
mod output;
mod scheduler;

use crate::{
    cli::Args,
    config::AppConfig,
    error::Result,
    output::OutputManager,
    scheduler::Scheduler,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use page_monitor::{ChangeMonitor, HttpFetcher, credentials::JsonFileCredentialSource};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    #[cfg(feature = "colored-output")]
    if args.no_color {
        colored::control::set_override(false);
    }

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.merge_args(&args)?;
    config.validate()?;

    if args.dry_run {
        print!("{}", config.show()?);
        return Ok(());
    }

    let _log_guard = logging::init_logging(&config.logging, args.verbose, args.quiet, !args.no_color)?;

    if let Some(log_dir) = config.logging.log_dir.clone() {
        tokio::spawn(async move {
            if let Err(e) = logging::cleanup_old_logs(&log_dir, logging::LOG_RETENTION_DAYS).await {
                warn!(error = %e, "Failed to clean up old logs");
            }
        });
    }

    let monitor_config = config.monitor_config()?;
    let target_url = monitor_config.target_url.clone();
    let cookies_file = config.credentials.cookies_file.clone();

    let fetcher = HttpFetcher::new(&config.fetcher_config())?;
    let credentials = JsonFileCredentialSource::new(&cookies_file);
    let monitor = ChangeMonitor::new(monitor_config, credentials, fetcher);

    let mut scheduler = Scheduler::new(monitor, config.interval());
    if args.once {
        scheduler = scheduler.with_max_cycles(1);
    }

    let output = OutputManager::new(!args.no_color, target_url.clone(), cookies_file);
    output.print_startup(config.schedule.interval_secs);
    info!(
        url = %target_url,
        interval_secs = config.schedule.interval_secs,
        timeout_secs = config.http.timeout_secs,
        "Monitor started"
    );

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.cancel(),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    let summary = scheduler.run(cancel, |outcome| output.report(outcome)).await;

    info!(
        cycles = summary.cycles,
        changes = summary.changes,
        failures = summary.failures,
        "Monitor stopped"
    );
    Ok(())
}

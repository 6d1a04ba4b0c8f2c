// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridPeak.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! GridPeak - entry point for the `gridpeak` binary

mod cli;
mod config;
mod logging;
mod notifications;

use anyhow::Result;
use clap::Parser;
use gridpeak_core::{
    Alert, AlertDispatcher, LogAlertDispatcher, MemoryStateRepository, PeakError, RunSummary,
    StateRepository, run_once,
};
use gridpeak_types::{HourClock, Status, StatusRecord};
use std::process::ExitCode;
use tracing::{error, info};

use crate::cli::{Cli, Commands, RunArgs};
use crate::config::AppConfig;
use crate::notifications::EmailNotifier;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("gridpeak: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(cli.debug, config.logging.file.as_deref()) {
        eprintln!("gridpeak: {e:#}");
        return ExitCode::FAILURE;
    }
    logging::install_panic_hook();

    let (result, dry_run) = match &cli.command {
        Commands::Run(args) => (run(&config, args), args.dry_run),
        Commands::Show => (show(&config), true),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {e:#}");
            if let Some(alert) = failure_alert(&e) {
                report_failure(&config, dry_run, &alert);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig, args: &RunArgs) -> Result<()> {
    let settings = config.run_settings(args.lookback)?;
    let repository = config.repository()?;
    info!(
        feed = %settings.feed.path().display(),
        lookback = settings.lookback,
        zones = settings.zones.len(),
        "Starting GridPeak run"
    );

    let summary = if args.dry_run {
        info!("Dry run: state stays in memory, alerts go to the log");
        let memory =
            MemoryStateRepository::new(repository.load_peaks()?, repository.load_status()?);
        let summary = run_once(&settings, &memory, &LogAlertDispatcher)?;
        print_state(&memory.peaks(), &memory.status(), &settings.clock);
        summary
    } else {
        let dispatcher = dispatcher(config, false)?;
        run_once(&settings, &repository, dispatcher.as_ref())?
    };

    log_summary(&summary);
    Ok(())
}

fn show(config: &AppConfig) -> Result<()> {
    let repository = config.repository()?;
    print_state(
        &repository.load_peaks()?,
        &repository.load_status()?,
        &config.clock()?,
    );
    Ok(())
}

fn print_state(peaks: &gridpeak_core::PeakStore, status: &StatusRecord, clock: &HourClock) {
    match status.status {
        Status::Warning => match &status.zone {
            Some(zone) => println!("Status: WARNING ({zone})"),
            None => println!("Status: WARNING"),
        },
        Status::Normal => println!("Status: NORMAL"),
    }

    for (zone, list) in peaks.iter() {
        println!("\n{zone}");
        for (rank, entry) in list.entries().iter().enumerate() {
            println!(
                "  {}. {:>10.1} MW  {}",
                rank + 1,
                entry.load_mw,
                clock.format(entry.timestamp_ms)
            );
        }
    }
}

fn log_summary(summary: &RunSummary) {
    for report in &summary.zones {
        info!(
            zone = %report.zone,
            evaluated = report.evaluated,
            warnings = report.warnings,
            inserted = report.peaks_inserted,
            cleaned = report.entries_cleaned,
            live_alert = report.live_alert,
            status = ?report.final_status,
            "Zone summary"
        );
    }
}

fn dispatcher(config: &AppConfig, dry_run: bool) -> Result<Box<dyn AlertDispatcher>> {
    match config.email.as_ref().filter(|_| !dry_run) {
        Some(email) => Ok(Box::new(EmailNotifier::new(email)?)),
        None => Ok(Box::new(LogAlertDispatcher)),
    }
}

/// Alert for an error that ended the run. A lookback larger than the feed
/// is an operator mistake and is only logged.
fn failure_alert(err: &anyhow::Error) -> Option<Alert> {
    if let Some(PeakError::LookbackExceedsDataset { .. }) = err.downcast_ref::<PeakError>() {
        return None;
    }

    let causes: Vec<String> = err.chain().skip(1).map(|c| format!("  - {c}")).collect();
    let causes = if causes.is_empty() {
        "  (none)".to_owned()
    } else {
        causes.join("\n")
    };
    let details = format!("Error: {err}\n\nCaused by:\n{causes}\n\nDebug:\n{err:?}");
    Some(Alert::run_failure(&err.to_string(), &details))
}

fn report_failure(config: &AppConfig, dry_run: bool, alert: &Alert) {
    let result =
        dispatcher(config, dry_run).and_then(|d| d.dispatch(alert).map_err(anyhow::Error::from));
    if let Err(e) = result {
        error!("Failed to send failure alert: {e:#}");
    }
}

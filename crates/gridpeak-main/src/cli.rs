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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(name = "gridpeak", version, about = "Early warning for new top-5 grid demand peaks")]
#[command(
    long_about = "Reads the latest load feed, projects each zone's load one slope window ahead\n\
    and raises a WARNING when a new top-5 peak is on the way.\n\
    \nMeant to be run from cron or a systemd timer after each feed update.\n\
    \nExamples:\n  \
    gridpeak run                            # Evaluate the whole feed\n  \
    gridpeak run --lookback 48 --dry-run    # Last 4 hours, no state written\n  \
    gridpeak show                           # Print tracked peaks and status"
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Debug-level logs to stderr instead of the log file
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate the feed, update tracked peaks and send alerts
    Run(RunArgs),

    /// Print tracked peaks and the current status
    Show,
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Number of most recent samples to evaluate
    #[arg(
        long,
        value_name = "N",
        help = "Trailing window of samples to load (0 = whole feed)",
        long_help = "Overrides feed.lookback from the config file.\n\
          Must not exceed the number of rows in the feed."
    )]
    pub lookback: Option<usize>,

    /// Evaluate without writing state or sending e-mail
    #[arg(
        long,
        default_value_t = false,
        help = "Keep state in memory and log alerts instead of sending them"
    )]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "gridpeak",
            "run",
            "--lookback",
            "48",
            "--dry-run",
            "--debug",
            "--config",
            "/etc/gridpeak.toml",
        ]);
        assert!(cli.debug);
        assert_eq!(cli.config, PathBuf::from("/etc/gridpeak.toml"));
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.lookback, Some(48));
        assert!(args.dry_run);
    }

    #[test]
    fn test_show_defaults() {
        let cli = Cli::parse_from(["gridpeak", "show"]);
        assert!(!cli.debug);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(matches!(cli.command, Commands::Show));
    }
}

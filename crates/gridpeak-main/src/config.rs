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

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use gridpeak_core::persistence::{DEFAULT_PEAK_STORE_PATH, DEFAULT_STATUS_PATH};
use gridpeak_core::{CsvFeed, JsonStateRepository, PredictionConfig, RunSettings};
use gridpeak_types::{HourClock, Zone};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "gridpeak.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub feed: FeedSettings,
    #[serde(default)]
    pub state: StateSettings,
    #[serde(default)]
    pub prediction: PredictionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    pub email: Option<EmailSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedSettings {
    pub path: PathBuf,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    #[serde(default)]
    pub lookback: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSettings {
    #[serde(default = "default_peak_store")]
    pub peak_store: PathBuf,
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictionSettings {
    #[serde(default = "default_zones")]
    pub zones: Vec<String>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_slope_steps")]
    pub slope_steps: usize,
    #[serde(default = "default_warmup_samples")]
    pub warmup_samples: usize,
    #[serde(default = "default_cadence_minutes")]
    pub cadence_minutes: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailSettings {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    pub from_address: String,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    pub recipients: Vec<String>,
}

fn default_time_column() -> String {
    gridpeak_core::feed::DEFAULT_TIME_COLUMN.to_owned()
}

fn default_peak_store() -> PathBuf {
    PathBuf::from(DEFAULT_PEAK_STORE_PATH)
}

fn default_status_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATUS_PATH)
}

fn default_zones() -> Vec<String> {
    vec!["PJM RTO Total".to_owned(), "COMED".to_owned()]
}

fn default_multiplier() -> f64 {
    PredictionConfig::default().multiplier
}

fn default_slope_steps() -> usize {
    PredictionConfig::default().slope_steps
}

fn default_warmup_samples() -> usize {
    PredictionConfig::default().warmup_samples
}

fn default_cadence_minutes() -> u32 {
    PredictionConfig::default().cadence_minutes
}

fn default_timezone() -> String {
    "UTC".to_owned()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_use_tls() -> bool {
    true
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            peak_store: default_peak_store(),
            status_file: default_status_file(),
        }
    }
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            multiplier: default_multiplier(),
            slope_steps: default_slope_steps(),
            warmup_samples: default_warmup_samples(),
            cadence_minutes: default_cadence_minutes(),
            timezone: default_timezone(),
        }
    }
}

impl PredictionSettings {
    fn engine_config(&self) -> PredictionConfig {
        PredictionConfig {
            multiplier: self.multiplier,
            slope_steps: self.slope_steps,
            warmup_samples: self.warmup_samples,
            cadence_minutes: self.cadence_minutes,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.feed.path.as_os_str().is_empty() {
            bail!("feed.path must be set");
        }
        if self.feed.time_column.trim().is_empty() {
            bail!("feed.time_column must not be empty");
        }

        let prediction = &self.prediction;
        if prediction.zones.is_empty() {
            bail!("prediction.zones must contain at least one zone");
        }
        let mut seen = HashSet::new();
        if let Some(dup) = prediction.zones.iter().find(|z| !seen.insert(z.as_str())) {
            bail!("prediction.zones lists {dup:?} twice");
        }
        prediction
            .engine_config()
            .validate()
            .context("Invalid [prediction] settings")?;
        self.timezone()?;

        if let Some(email) = &self.email {
            if email.smtp_host.is_empty() {
                bail!("email.smtp_host must be set");
            }
            if email.recipients.is_empty() {
                bail!("email.recipients must contain at least one address");
            }
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.prediction
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid prediction.timezone {:?}: {e}", self.prediction.timezone))
    }

    pub fn clock(&self) -> Result<HourClock> {
        Ok(HourClock::new(self.timezone()?))
    }

    pub fn zones(&self) -> Vec<Zone> {
        self.prediction
            .zones
            .iter()
            .map(|z| Zone::new(z.as_str()))
            .collect()
    }

    /// Run settings, with `lookback` overriding `feed.lookback` when given.
    pub fn run_settings(&self, lookback: Option<usize>) -> Result<RunSettings> {
        Ok(RunSettings {
            feed: CsvFeed::new(&self.feed.path).with_time_column(&self.feed.time_column),
            lookback: lookback.unwrap_or(self.feed.lookback),
            zones: self.zones(),
            prediction: self.prediction.engine_config(),
            clock: self.clock()?,
        })
    }

    pub fn repository(&self) -> Result<JsonStateRepository> {
        Ok(JsonStateRepository::new(
            &self.state.peak_store,
            &self.state.status_file,
            self.clock()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[feed]
path = "./data/PjmCurrentLoads.csv"
"#;

    const FULL: &str = r#"
[feed]
path = "/srv/feed/loads.csv"
time_column = "timestamp"
lookback = 48

[state]
peak_store = "/srv/state/peaks.json"
status_file = "/srv/state/status.json"

[prediction]
zones = ["COMED"]
multiplier = 1.1
slope_steps = 6
warmup_samples = 8
cadence_minutes = 5
timezone = "America/Chicago"

[logging]
file = "/var/log/gridpeak.log"

[email]
smtp_host = "smtp.example.com"
smtp_username = "gridpeak"
smtp_password = "secret"
from_address = "GridPeak <gridpeak@example.com>"
recipients = ["operator@example.com"]
"#;

    fn with_prediction(extra: &str) -> String {
        format!("{MINIMAL}\n[prediction]\n{extra}\n")
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.feed.time_column, "Time");
        assert_eq!(config.feed.lookback, 0);
        assert_eq!(config.state.peak_store, PathBuf::from(DEFAULT_PEAK_STORE_PATH));
        assert_eq!(
            config.zones(),
            vec![Zone::new("PJM RTO Total"), Zone::new("COMED")]
        );
        assert_eq!(config.prediction.engine_config(), PredictionConfig::default());
        assert_eq!(config.clock().unwrap(), HourClock::utc());
        assert!(config.logging.file.is_none());
        assert!(config.email.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml(FULL).unwrap();
        assert_eq!(config.timezone().unwrap(), chrono_tz::America::Chicago);

        let email = config.email.as_ref().unwrap();
        assert_eq!(email.smtp_port, 587);
        assert!(email.use_tls);

        let settings = config.run_settings(None).unwrap();
        assert_eq!(settings.lookback, 48);
        assert_eq!(settings.zones, vec![Zone::new("COMED")]);
        assert_eq!(settings.prediction.slope_steps, 6);
        assert_eq!(settings.feed.path(), Path::new("/srv/feed/loads.csv"));

        assert_eq!(config.run_settings(Some(0)).unwrap().lookback, 0);
    }

    #[test]
    fn test_rejects_invalid_prediction() {
        for extra in [
            "zones = []",
            r#"zones = ["COMED", "COMED"]"#,
            "multiplier = 0.9",
            "slope_steps = 0",
            "warmup_samples = 3",
            "cadence_minutes = 0",
            r#"timezone = "Mars/Olympus""#,
        ] {
            assert!(
                AppConfig::from_toml(&with_prediction(extra)).is_err(),
                "{extra} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_email_without_recipients() {
        let toml = format!(
            "{MINIMAL}\n[email]\nsmtp_host = \"smtp.example.com\"\nfrom_address = \"a@example.com\"\nrecipients = []\n"
        );
        let err = AppConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("recipients"));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(AppConfig::from_toml(&format!("{MINIMAL}lookbak = 5\n")).is_err());
    }

    #[test]
    fn test_missing_feed_section() {
        assert!(AppConfig::from_toml("[state]\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridpeak.toml");
        std::fs::write(&path, FULL).unwrap();
        assert!(AppConfig::from_file(&path).is_ok());
        assert!(AppConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}

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

//! One complete invocation: feed, state, engine.

use gridpeak_types::{HourClock, Sample, Zone};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use crate::alert::AlertDispatcher;
use crate::engine::{PredictionConfig, PredictionEngine, ZoneReport};
use crate::error::{PeakError, Result};
use crate::feed::CsvFeed;
use crate::persistence::StateRepository;

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub feed: CsvFeed,
    /// Trailing window of samples to load, 0 for the whole feed
    pub lookback: usize,
    pub zones: Vec<Zone>,
    pub prediction: PredictionConfig,
    pub clock: HourClock,
}

impl RunSettings {
    pub fn validate(&self) -> Result<()> {
        self.prediction.validate()?;
        if self.zones.is_empty() {
            return Err(PeakError::Config("at least one zone is required".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.zones.iter().find(|z| !seen.insert(z.as_str())) {
            return Err(PeakError::Config(format!("zone {dup} listed twice")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub samples: usize,
    pub zones: Vec<ZoneReport>,
}

impl RunSummary {
    pub fn any_warning(&self) -> bool {
        self.zones.iter().any(|z| z.warnings > 0)
    }

    pub fn live_alerts(&self) -> usize {
        self.zones.iter().filter(|z| z.live_alert).count()
    }
}

/// Load the feed and run every configured zone.
///
/// The feed is read before any state is loaded, so a lookback larger than
/// the dataset aborts the run with nothing persisted.
pub fn run_once<R, A>(settings: &RunSettings, repository: &R, dispatcher: &A) -> Result<RunSummary>
where
    R: StateRepository + ?Sized,
    A: AlertDispatcher + ?Sized,
{
    settings.validate()?;
    let samples = settings.feed.load(&settings.zones, settings.lookback)?;
    run_samples(settings, &samples, repository, dispatcher)
}

/// Run every configured zone over already loaded samples.
pub fn run_samples<R, A>(
    settings: &RunSettings,
    samples: &[Sample],
    repository: &R,
    dispatcher: &A,
) -> Result<RunSummary>
where
    R: StateRepository + ?Sized,
    A: AlertDispatcher + ?Sized,
{
    settings.validate()?;
    let warmup = settings.prediction.warmup_samples;
    if samples.len() <= warmup {
        return Err(PeakError::InsufficientHistory {
            required: warmup,
            available: samples.len(),
        });
    }

    let mut peaks = repository.load_peaks()?;
    let mut status = repository.load_status()?;

    let seeded = settings
        .zones
        .iter()
        .filter(|zone| peaks.ensure_zone(zone))
        .count();
    if seeded > 0 {
        info!("Seeded or topped up placeholder peaks for {} zones", seeded);
        repository.save_peaks(&peaks)?;
        repository.save_status(&status)?;
    }

    let engine = PredictionEngine::new(settings.prediction, settings.clock, repository, dispatcher);

    let mut reports = Vec::with_capacity(settings.zones.len());
    for zone in &settings.zones {
        reports.push(engine.run_zone(zone, samples, &mut peaks, &mut status)?);
    }

    let summary = RunSummary {
        samples: samples.len(),
        zones: reports,
    };
    info!(
        samples = summary.samples,
        live_alerts = summary.live_alerts(),
        "Run complete, status {:?}",
        status.status
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::RecordingAlertDispatcher;
    use crate::peaks::PeakStore;
    use crate::persistence::MemoryStateRepository;
    use gridpeak_types::StatusRecord;

    fn settings(zones: &[&str]) -> RunSettings {
        RunSettings {
            feed: CsvFeed::new("unused.csv"),
            lookback: 0,
            zones: zones.iter().map(|z| Zone::new(*z)).collect(),
            prediction: PredictionConfig::default(),
            clock: HourClock::utc(),
        }
    }

    fn flat_samples(count: i64) -> Vec<Sample> {
        (0..count)
            .map(|i| {
                Sample::new(i * 300_000)
                    .with_load("COMED", 100.0)
                    .with_load("PJM RTO Total", 90_000.0)
            })
            .collect()
    }

    #[test]
    fn test_duplicate_zones_rejected() {
        let err = settings(&["COMED", "COMED"]).validate().unwrap_err();
        assert!(matches!(err, PeakError::Config(_)));
        assert!(settings(&[]).validate().is_err());
    }

    #[test]
    fn test_first_run_seeds_and_saves() {
        let repo = MemoryStateRepository::default();
        let alerts = RecordingAlertDispatcher::new();

        let summary = run_samples(
            &settings(&["PJM RTO Total", "COMED"]),
            &flat_samples(20),
            &repo,
            &alerts,
        )
        .unwrap();

        assert_eq!(summary.samples, 20);
        assert_eq!(summary.zones.len(), 2);
        assert_eq!(summary.zones[0].zone, Zone::new("PJM RTO Total"));
        assert!(!summary.any_warning());
        assert_eq!(
            repo.peaks(),
            PeakStore::seeded(&[Zone::new("COMED"), Zone::new("PJM RTO Total")])
        );
        assert_eq!(repo.peak_saves(), 1);
        assert_eq!(repo.status(), StatusRecord::normal());
    }

    #[test]
    fn test_existing_state_is_not_rewritten() {
        let zones = [Zone::new("COMED")];
        let repo = MemoryStateRepository::new(PeakStore::seeded(&zones), StatusRecord::normal());

        run_samples(
            &settings(&["COMED"]),
            &flat_samples(20),
            &repo,
            &RecordingAlertDispatcher::new(),
        )
        .unwrap();

        assert_eq!(repo.peak_saves(), 0);
        assert_eq!(repo.status_saves(), 0);
    }

    #[test]
    fn test_too_few_samples_touches_nothing() {
        let repo = MemoryStateRepository::default();
        let err = run_samples(
            &settings(&["COMED"]),
            &flat_samples(13),
            &repo,
            &RecordingAlertDispatcher::new(),
        )
        .unwrap_err();

        assert!(matches!(err, PeakError::InsufficientHistory { .. }));
        assert_eq!(repo.peak_saves(), 0);
    }
}

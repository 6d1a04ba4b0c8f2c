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

//! Slope-based peak warning engine.
//!
//! Walks a zone's samples in arrival order. For every sample past warm-up
//! the engine projects the load over the next `slope_steps` readings; when
//! the projection clears the smallest tracked peak it raises a WARNING and
//! offers the running hourly maximum to the zone's [`PeakRankList`].
//!
//! [`PeakRankList`]: crate::peaks::PeakRankList

use gridpeak_types::{HourClock, PeakEntry, Sample, Status, StatusRecord, Zone};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::alert::{Alert, AlertDispatcher};
use crate::cleanup::cleanup;
use crate::error::{PeakError, Result};
use crate::peaks::PeakStore;
use crate::persistence::StateRepository;
use crate::series::{ZoneSeries, hourly_max};
use crate::slope::slope;

/// Tuning knobs for the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Safety factor applied to the projected growth
    pub multiplier: f64,
    /// Samples between the two readings the slope is taken over
    pub slope_steps: usize,
    /// Samples skipped at the start of a run
    pub warmup_samples: usize,
    /// Feed cadence in minutes
    pub cadence_minutes: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.03,
            slope_steps: 12,
            warmup_samples: 13,
            cadence_minutes: 5,
        }
    }
}

impl PredictionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier <= 1.0 {
            return Err(PeakError::Config(format!(
                "multiplier must be greater than 1, got {}",
                self.multiplier
            )));
        }
        if self.slope_steps == 0 {
            return Err(PeakError::Config("slope_steps must be positive".into()));
        }
        if self.warmup_samples < self.slope_steps {
            return Err(PeakError::Config(format!(
                "warmup_samples ({}) must be at least slope_steps ({})",
                self.warmup_samples, self.slope_steps
            )));
        }
        if !(1..=60).contains(&self.cadence_minutes) {
            return Err(PeakError::Config(format!(
                "cadence_minutes must be within 1..=60, got {}",
                self.cadence_minutes
            )));
        }
        Ok(())
    }

    /// Projected load one slope window ahead.
    #[must_use]
    pub fn predicted_max(&self, load_mw: f64, slope_mw: f64) -> f64 {
        #[expect(clippy::cast_precision_loss)]
        let steps = self.slope_steps as f64;
        load_mw + self.multiplier * slope_mw * steps
    }
}

/// Outcome of one pass over a zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneReport {
    pub zone: Zone,
    pub evaluated: usize,
    pub warnings: usize,
    pub peaks_inserted: usize,
    pub entries_cleaned: usize,
    pub live_alert: bool,
    pub final_status: Status,
}

impl ZoneReport {
    fn new(zone: Zone) -> Self {
        Self {
            zone,
            evaluated: 0,
            warnings: 0,
            peaks_inserted: 0,
            entries_cleaned: 0,
            live_alert: false,
            final_status: Status::Normal,
        }
    }
}

pub struct PredictionEngine<'a, R: ?Sized, A: ?Sized> {
    config: PredictionConfig,
    clock: HourClock,
    repository: &'a R,
    dispatcher: &'a A,
}

impl<R: ?Sized, A: ?Sized> fmt::Debug for PredictionEngine<'_, R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionEngine")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<'a, R, A> PredictionEngine<'a, R, A>
where
    R: StateRepository + ?Sized,
    A: AlertDispatcher + ?Sized,
{
    pub fn new(config: PredictionConfig, clock: HourClock, repository: &'a R, dispatcher: &'a A) -> Self {
        Self {
            config,
            clock,
            repository,
            dispatcher,
        }
    }

    /// Evaluate every post-warm-up sample for `zone`.
    ///
    /// Mutations to `peaks` and `status` are saved through the repository
    /// as they happen. The last sample is the live edge: a warning there is
    /// also dispatched as an alert.
    pub fn run_zone(
        &self,
        zone: &Zone,
        samples: &[Sample],
        peaks: &mut PeakStore,
        status: &mut StatusRecord,
    ) -> Result<ZoneReport> {
        self.config.validate()?;
        let series = ZoneSeries::from_samples(samples, zone)?;
        let warmup = self.config.warmup_samples;
        if series.len() <= warmup {
            return Err(PeakError::InsufficientHistory {
                required: warmup,
                available: series.len(),
            });
        }

        let mut report = ZoneReport::new(zone.clone());
        let live_edge = series.len() - 1;
        let mut cleaned_hour = None;

        for x in warmup..series.len() {
            let timestamp_ms = series.timestamp(x);
            let load_mw = series.load(x);

            let hour = self.clock.hour_bucket(timestamp_ms);
            if self.clock.minute_of_hour(timestamp_ms) < self.config.cadence_minutes
                && cleaned_hour != Some(hour)
            {
                cleaned_hour = Some(hour);
                self.start_hour(zone, peaks, status, &mut report)?;
            }

            report.evaluated += 1;

            let trend = slope(
                load_mw,
                series.load(x - self.config.slope_steps),
                self.config.slope_steps,
            );
            debug!(zone = %zone, index = x, load_mw, slope = trend, "Evaluating sample");
            if trend <= 0.0 {
                continue;
            }

            let predicted_mw = self.config.predicted_max(load_mw, trend);
            let floor = peaks
                .zone_mut(zone)
                .min_load()
                .unwrap_or(f64::NEG_INFINITY);
            if predicted_mw <= floor {
                continue;
            }

            report.warnings += 1;
            info!(
                zone = %zone,
                load_mw,
                predicted_mw,
                min_peak_mw = floor,
                "Peak warning at {}",
                self.clock.format(timestamp_ms)
            );

            if !status.is_warning_for(zone) {
                *status = StatusRecord::warning(zone.clone());
                self.repository.save_status(status)?;
            }

            if x == live_edge {
                let alert = Alert::peak_warning(
                    zone,
                    load_mw,
                    predicted_mw,
                    &self.clock.format(timestamp_ms),
                );
                self.dispatcher.dispatch(&alert)?;
                report.live_alert = true;
            }

            let candidate = hourly_max(&series, x, &self.clock, self.config.cadence_minutes);
            if peaks
                .zone_mut(zone)
                .try_insert(PeakEntry::new(timestamp_ms, candidate))
            {
                report.peaks_inserted += 1;
                info!(
                    zone = %zone,
                    load_mw = candidate,
                    "New peak recorded at {}",
                    self.clock.format(timestamp_ms)
                );
                self.repository.save_peaks(peaks)?;
            }
        }

        if status.is_warning_for(zone) {
            report.final_status = Status::Warning;
        }

        info!(
            zone = %zone,
            evaluated = report.evaluated,
            warnings = report.warnings,
            inserted = report.peaks_inserted,
            cleaned = report.entries_cleaned,
            "Zone pass complete"
        );
        Ok(report)
    }

    /// First sample of a clock hour: drop same-hour duplicates, refill the
    /// freed ranks with placeholders and clear a WARNING this zone raised in
    /// an earlier hour.
    fn start_hour(
        &self,
        zone: &Zone,
        peaks: &mut PeakStore,
        status: &mut StatusRecord,
        report: &mut ZoneReport,
    ) -> Result<()> {
        let list = peaks.zone_mut(zone);
        let removed = cleanup(list, &self.clock);
        let added = list.top_up();
        if removed > 0 || added > 0 {
            report.entries_cleaned += removed;
            info!(zone = %zone, removed, added, "Hourly peak cleanup");
            self.repository.save_peaks(peaks)?;
        }

        if status.is_warning_for(zone) {
            *status = StatusRecord::normal();
            self.repository.save_status(status)?;
            info!(zone = %zone, "Status reset to NORMAL for new hour");
        }
        Ok(())
    }
}

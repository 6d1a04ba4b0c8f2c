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

//! Per-zone view of the sample sequence and the hourly maximum resolver.

use gridpeak_types::{HourClock, Sample, Zone};

use crate::error::{PeakError, Result};

/// Loads of a single zone, index-aligned with the sample sequence.
#[derive(Debug, Clone)]
pub struct ZoneSeries {
    timestamps: Vec<i64>,
    loads: Vec<f64>,
}

impl ZoneSeries {
    /// Project `zone` out of `samples`. Every sample must carry a load for the zone.
    pub fn from_samples(samples: &[Sample], zone: &Zone) -> Result<Self> {
        let mut timestamps = Vec::with_capacity(samples.len());
        let mut loads = Vec::with_capacity(samples.len());

        for (index, sample) in samples.iter().enumerate() {
            let load = sample
                .load(zone.as_str())
                .ok_or_else(|| PeakError::MissingLoad {
                    zone: zone.clone(),
                    index,
                    timestamp_ms: sample.timestamp_ms,
                })?;
            timestamps.push(sample.timestamp_ms);
            loads.push(load);
        }

        Ok(Self { timestamps, loads })
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// # Panics
    /// If `index` is out of range.
    pub fn load(&self, index: usize) -> f64 {
        self.loads[index]
    }

    /// # Panics
    /// If `index` is out of range.
    pub fn timestamp(&self, index: usize) -> i64 {
        self.timestamps[index]
    }
}

/// Maximum load recorded so far in the clock hour of sample `index`.
///
/// Looks back `minute / cadence` samples (the readings already taken this
/// hour at a regular cadence) and includes the current sample. Readings from
/// an earlier hour that fall inside the window because of feed gaps are
/// ignored, so the result is the true running hourly max and never below the
/// current load.
///
/// # Panics
/// If `index` is out of range for the series.
pub fn hourly_max(series: &ZoneSeries, index: usize, clock: &HourClock, cadence_minutes: u32) -> f64 {
    let current_ts = series.timestamp(index);
    let bucket = clock.hour_bucket(current_ts);

    #[expect(clippy::integer_division)]
    let lookback = (clock.minute_of_hour(current_ts) / cadence_minutes.max(1)) as usize;
    let start = index.saturating_sub(lookback);

    (start..=index)
        .filter(|&i| clock.hour_bucket(series.timestamp(i)) == bucket)
        .map(|i| series.load(i))
        .fold(series.load(index), f64::max)
}

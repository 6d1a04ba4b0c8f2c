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

//! CSV load feed reader.
//!
//! The feed is an append-only CSV with a millisecond `Time` column and one
//! MW column per zone, e.g.
//!
//! ```text
//! Time,PJM RTO Total,COMED
//! 1721138400000,95012.4,14230.1
//! ```

use chrono::{DateTime, Utc};
use gridpeak_types::{Sample, Zone};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{PeakError, Result};

pub const DEFAULT_TIME_COLUMN: &str = "Time";

/// Load feed backed by a CSV file
#[derive(Debug, Clone)]
pub struct CsvFeed {
    path: PathBuf,
    time_column: String,
}

impl CsvFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            time_column: DEFAULT_TIME_COLUMN.to_owned(),
        }
    }

    #[must_use]
    pub fn with_time_column(mut self, column: impl Into<String>) -> Self {
        self.time_column = column.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the feed, keeping only the last `trailing_window` samples
    /// (0 keeps everything).
    pub fn load(&self, zones: &[Zone], trailing_window: usize) -> Result<Vec<Sample>> {
        let reader = csv::Reader::from_path(&self.path)?;
        let samples = read_samples(reader, &self.time_column, zones, trailing_window)?;
        info!(
            "Loaded {} samples from {}",
            samples.len(),
            self.path.display()
        );
        Ok(samples)
    }
}

/// Parse samples from any CSV source.
///
/// Fails with [`PeakError::LookbackExceedsDataset`] when the feed holds
/// fewer rows than `trailing_window`.
pub fn read_samples<R: io::Read>(
    mut reader: csv::Reader<R>,
    time_column: &str,
    zones: &[Zone],
    trailing_window: usize,
) -> Result<Vec<Sample>> {
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PeakError::MissingColumn(name.to_owned()))
    };

    let time_idx = column(time_column)?;
    let zone_idx = zones
        .iter()
        .map(|zone| Ok((zone.clone(), column(zone.as_str())?)))
        .collect::<Result<Vec<_>>>()?;

    let mut window: VecDeque<Sample> = VecDeque::new();
    let mut total = 0_usize;
    let mut last_ts = i64::MIN;
    let mut out_of_order = 0_usize;

    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);
        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();

        let timestamp_ms = parse_timestamp(field(time_idx)).ok_or_else(|| PeakError::Feed {
            line,
            reason: format!("invalid timestamp {:?}", field(time_idx)),
        })?;

        let mut sample = Sample::new(timestamp_ms);
        for (zone, idx) in &zone_idx {
            let load = field(*idx)
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| PeakError::Feed {
                    line,
                    reason: format!("invalid load {:?} for {zone}", field(*idx)),
                })?;
            sample.loads.insert(zone.clone(), load);
        }

        if timestamp_ms < last_ts {
            out_of_order += 1;
        }
        last_ts = timestamp_ms;

        total += 1;
        if trailing_window > 0 && window.len() == trailing_window {
            window.pop_front();
        }
        window.push_back(sample);
    }

    if trailing_window > total {
        return Err(PeakError::LookbackExceedsDataset {
            lookback: trailing_window,
            available: total,
        });
    }

    if out_of_order > 0 {
        warn!(
            "Feed has {} samples older than their predecessor; results assume arrival order",
            out_of_order
        );
    }

    Ok(window.into())
}

/// Millisecond epoch timestamp, written either as an integer or a float.
#[expect(clippy::cast_possible_truncation)]
fn parse_timestamp(raw: &str) -> Option<i64> {
    let ms = match raw.parse::<i64>() {
        Ok(ms) => ms,
        Err(_) => raw.parse::<f64>().ok().filter(|v| v.is_finite())?.round() as i64,
    };
    DateTime::<Utc>::from_timestamp_millis(ms).map(|_| ms)
}

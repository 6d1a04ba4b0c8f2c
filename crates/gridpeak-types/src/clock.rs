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

//! Wall-clock helpers for millisecond feed timestamps.
//!
//! Clock hours are local to the configured time zone, so a zone with a
//! half-hour UTC offset buckets at :30 UTC.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

pub const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Maps feed timestamps onto local clock hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourClock {
    tz: Tz,
}

impl HourClock {
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    #[must_use]
    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Local time of a feed timestamp. Out-of-range timestamps collapse to the epoch.
    #[must_use]
    pub fn local_time(&self, timestamp_ms: i64) -> DateTime<Tz> {
        DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
            .unwrap_or_default()
            .with_timezone(&self.tz)
    }

    #[must_use]
    pub fn minute_of_hour(&self, timestamp_ms: i64) -> u32 {
        self.local_time(timestamp_ms).minute()
    }

    /// Start of the clock hour containing `timestamp_ms`, in epoch milliseconds.
    ///
    /// Two timestamps belong to the same clock hour iff their buckets are equal.
    #[must_use]
    pub fn hour_bucket(&self, timestamp_ms: i64) -> i64 {
        let local = self.local_time(timestamp_ms);
        let into_hour = i64::from(local.minute()) * 60_000
            + i64::from(local.second()) * 1_000
            + i64::from(local.timestamp_subsec_millis());
        timestamp_ms - into_hour
    }

    /// Human-readable local timestamp for logs and alerts.
    #[must_use]
    pub fn format(&self, timestamp_ms: i64) -> String {
        self.local_time(timestamp_ms)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string()
    }
}

impl Default for HourClock {
    fn default() -> Self {
        Self::utc()
    }
}

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

use serde::{Deserialize, Serialize};

/// One observed peak candidate for a zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakEntry {
    /// Milliseconds since the Unix epoch of the sample that produced the peak
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    /// Hourly maximum load (MW)
    #[serde(rename = "load")]
    pub load_mw: f64,
}

impl PeakEntry {
    #[must_use]
    pub fn new(timestamp_ms: i64, load_mw: f64) -> Self {
        Self {
            timestamp_ms,
            load_mw,
        }
    }
}

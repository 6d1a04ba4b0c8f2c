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
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Grid zone identifier (e.g. "PJM RTO Total", "COMED").
///
/// Zones carry no behavior of their own; they key loads, peak lists and
/// the status record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(String);

impl Zone {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Zone {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Zone {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Zone {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A single feed reading (5-minute cadence in the PJM feed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// Load per zone (MW)
    pub loads: BTreeMap<Zone, f64>,
}

impl Sample {
    #[must_use]
    pub fn new(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            loads: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly for tests and synthetic feeds.
    #[must_use]
    pub fn with_load(mut self, zone: impl Into<Zone>, load_mw: f64) -> Self {
        self.loads.insert(zone.into(), load_mw);
        self
    }

    #[must_use]
    pub fn load(&self, zone: &str) -> Option<f64> {
        self.loads.get(zone).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_lookup_by_str() {
        let sample = Sample::new(1_000)
            .with_load("PJM RTO Total", 95_000.0)
            .with_load("COMED", 14_200.5);

        assert_eq!(sample.load("COMED"), Some(14_200.5));
        assert_eq!(sample.load("PJM RTO Total"), Some(95_000.0));
        assert_eq!(sample.load("DOM"), None);
    }

    #[test]
    fn test_zone_serializes_as_plain_string() {
        let zone = Zone::new("COMED");
        assert_eq!(serde_json::to_string(&zone).unwrap(), "\"COMED\"");
        assert_eq!(zone.to_string(), "COMED");
    }
}

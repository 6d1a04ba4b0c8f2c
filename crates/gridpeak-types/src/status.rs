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

use crate::load::Zone;

/// Warning state of the peak predictor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Normal,
    Warning,
}

/// Persisted status record: `{"status": "WARNING", "zone": "COMED"}`.
///
/// `zone` is written as `"NONE"` while nothing is warning. Older status
/// files keyed the zone as `RTO`, which is still accepted on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: Status,
    #[serde(alias = "RTO", with = "zone_or_none")]
    pub zone: Option<Zone>,
}

impl StatusRecord {
    #[must_use]
    pub fn normal() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn warning(zone: Zone) -> Self {
        Self {
            status: Status::Warning,
            zone: Some(zone),
        }
    }

    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.status == Status::Warning
    }

    /// True when the record holds a warning raised by `zone`.
    #[must_use]
    pub fn is_warning_for(&self, zone: &Zone) -> bool {
        self.is_warning() && self.zone.as_ref() == Some(zone)
    }
}

mod zone_or_none {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::load::Zone;

    const NONE: &str = "NONE";

    pub fn serialize<S: Serializer>(zone: &Option<Zone>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(zone.as_ref().map_or(NONE, Zone::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Zone>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok((raw != NONE).then(|| Zone::from(raw)))
    }
}

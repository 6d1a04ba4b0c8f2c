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

/// Load growth per sampling step between two readings `steps` apart (MW/step).
///
/// Falling trends clamp to zero: a dropping load never signals peak risk.
/// `steps` must be non-zero.
#[must_use]
pub fn slope(current_mw: f64, prior_mw: f64, steps: usize) -> f64 {
    #[expect(clippy::cast_precision_loss)]
    let per_step = (current_mw - prior_mw) / steps as f64;
    per_step.max(0.0)
}

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

//! Alert dispatch abstraction.
//!
//! The engine only knows [`AlertDispatcher`]; the binary decides whether
//! alerts go out by e-mail or just to the log.

use gridpeak_types::Zone;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;

/// A notification for a human operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

impl Alert {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Live-edge warning that `zone` is on track to set a new top-5 peak.
    #[must_use]
    pub fn peak_warning(zone: &Zone, load_mw: f64, predicted_mw: f64, local_time: &str) -> Self {
        Self::new(
            format!("Peak Warning: {zone}"),
            format!(
                "{zone} is on track for a new top-5 peak this hour.\n\n\
                 Current load: {load_mw:.0} MW at {local_time}\n\
                 Projected hourly max: {predicted_mw:.0} MW\n\n\
                 Consider starting demand reduction now."
            ),
        )
    }

    /// A run that ended in an error nobody handled.
    #[must_use]
    pub fn run_failure(summary: &str, details: &str) -> Self {
        Self::new(
            format!("GridPeak failure: {summary}"),
            format!("A GridPeak run failed and was aborted.\n\n{details}"),
        )
    }
}

/// Something that can deliver an [`Alert`].
pub trait AlertDispatcher {
    fn dispatch(&self, alert: &Alert) -> Result<()>;
}

/// Writes alerts to the log only (no e-mail configured, or dry runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertDispatcher;

impl AlertDispatcher for LogAlertDispatcher {
    fn dispatch(&self, alert: &Alert) -> Result<()> {
        warn!(subject = %alert.subject, "ALERT: {}", alert.body);
        Ok(())
    }
}

/// Keeps alerts in memory so callers can inspect what would have been sent.
#[derive(Debug, Default)]
pub struct RecordingAlertDispatcher {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingAlertDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.lock().is_empty()
    }
}

impl AlertDispatcher for RecordingAlertDispatcher {
    fn dispatch(&self, alert: &Alert) -> Result<()> {
        self.alerts.lock().push(alert.clone());
        Ok(())
    }
}

impl<T: AlertDispatcher + ?Sized> AlertDispatcher for Box<T> {
    fn dispatch(&self, alert: &Alert) -> Result<()> {
        (**self).dispatch(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_warning_mentions_zone_and_load() {
        let alert = Alert::peak_warning(&Zone::new("COMED"), 21_450.4, 22_100.0, "2024-07-16 16:05:00 CDT");
        assert_eq!(alert.subject, "Peak Warning: COMED");
        assert!(alert.body.contains("21450 MW"));
        assert!(alert.body.contains("22100 MW"));
        assert!(alert.body.contains("2024-07-16 16:05:00 CDT"));
    }

    #[test]
    fn test_recording_dispatcher_keeps_order() {
        let recorder = RecordingAlertDispatcher::new();
        recorder.dispatch(&Alert::new("a", "1")).unwrap();
        recorder.dispatch(&Alert::new("b", "2")).unwrap();

        let subjects: Vec<String> = recorder.alerts().into_iter().map(|a| a.subject).collect();
        assert_eq!(subjects, vec!["a", "b"]);
    }

    #[test]
    fn test_boxed_dispatcher_forwards() {
        let boxed: Box<dyn AlertDispatcher> = Box::new(LogAlertDispatcher);
        assert!(boxed.dispatch(&Alert::run_failure("io", "disk full")).is_ok());
    }
}

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

//! GridPeak Core
//!
//! Early warning for new top-5 demand peaks in a grid zone, used to start
//! demand reduction before a capacity-charge hour is set.
//!
//! ## Features
//!
//! - **Slope Projection**: Project the load one slope window ahead from the trailing trend
//! - **Peak Tracking**: Top-5 ranked peaks per zone with insert-and-evict and hourly dedup
//! - **Warnings**: WARNING status per zone, alerts on the live edge of the feed
//! - **Collaborators**: CSV feed loader, JSON state repository, alert dispatchers

pub mod alert;
pub mod cleanup;
pub mod engine;
pub mod error;
pub mod feed;
pub mod peaks;
pub mod persistence;
pub mod runner;
pub mod series;
pub mod slope;

pub use alert::{Alert, AlertDispatcher, LogAlertDispatcher, RecordingAlertDispatcher};
pub use cleanup::cleanup;
pub use engine::{PredictionConfig, PredictionEngine, ZoneReport};
pub use error::{PeakError, Result};
pub use feed::{CsvFeed, read_samples};
pub use peaks::{PEAK_CAPACITY, PeakRankList, PeakStore};
pub use persistence::{JsonStateRepository, MemoryStateRepository, StateRepository};
pub use runner::{RunSettings, RunSummary, run_once, run_samples};
pub use series::{ZoneSeries, hourly_max};
pub use slope::slope;

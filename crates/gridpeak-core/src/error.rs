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

//! Error types for the peak predictor

use gridpeak_types::Zone;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeakError {
    #[error("lookback of {lookback} samples exceeds the {available} samples in the feed")]
    LookbackExceedsDataset { lookback: usize, available: usize },

    #[error("need more than {required} samples of history, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("sample {index} (t={timestamp_ms}) has no load for zone {zone}")]
    MissingLoad {
        zone: Zone,
        index: usize,
        timestamp_ms: i64,
    },

    #[error("feed has no column named {0:?}")]
    MissingColumn(String),

    #[error("feed line {line}: {reason}")]
    Feed { line: u64, reason: String },

    #[error("feed read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("state file {} is corrupt: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("invalid peak list: {0}")]
    InvalidPeakList(String),

    #[error("state file {}: {source}", path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("alert dispatch failed: {0}")]
    Alert(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PeakError>;

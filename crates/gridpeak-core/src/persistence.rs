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

//! Persistence layer for the peak store and status record.
//!
//! Handles loading and saving of `PeakStore` and `StatusRecord` to/from disk.

use gridpeak_types::{HourClock, StatusRecord};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::error::{PeakError, Result};
use crate::peaks::PeakStore;

/// Default path for the peak store file.
pub const DEFAULT_PEAK_STORE_PATH: &str = "./data/peak_loads.json";

/// Default path for the status file.
pub const DEFAULT_STATUS_PATH: &str = "./data/peak_status.json";

/// Storage for the state that outlives a run.
///
/// Every save must be durable before it returns; the engine calls
/// `save_peaks` after each accepted insertion.
/// Filesystem errors carry the path they hit.
pub trait StateRepository {
    fn load_peaks(&self) -> Result<PeakStore>;
    fn save_peaks(&self, peaks: &PeakStore) -> Result<()>;
    fn load_status(&self) -> Result<StatusRecord>;
    fn save_status(&self, status: &StatusRecord) -> Result<()>;
}

/// JSON files on disk, written atomically (temp file + rename).
#[derive(Debug, Clone)]
pub struct JsonStateRepository {
    peak_path: PathBuf,
    status_path: PathBuf,
    clock: HourClock,
}

impl JsonStateRepository {
    pub fn new(peak_path: impl Into<PathBuf>, status_path: impl Into<PathBuf>, clock: HourClock) -> Self {
        Self {
            peak_path: peak_path.into(),
            status_path: status_path.into(),
            clock,
        }
    }

    pub fn peak_path(&self) -> &Path {
        &self.peak_path
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }
}

impl StateRepository for JsonStateRepository {
    /// Load the peak store.
    ///
    /// Returns an empty store if the file doesn't exist. Same-hour duplicates
    /// are cleaned up on load.
    fn load_peaks(&self) -> Result<PeakStore> {
        let Some(mut store) = read_json::<PeakStore>(&self.peak_path)? else {
            info!(
                "Peak store not found at {}, starting empty",
                self.peak_path.display()
            );
            return Ok(PeakStore::new());
        };

        let cleaned = store.cleanup_all(&self.clock);
        if cleaned > 0 {
            info!("Cleaned up {} same-hour peak entries on load", cleaned);
        }

        info!(
            "Loaded peak store from {} ({} zones)",
            self.peak_path.display(),
            store.zone_count()
        );
        Ok(store)
    }

    fn save_peaks(&self, peaks: &PeakStore) -> Result<()> {
        write_json_atomic(&self.peak_path, peaks)?;
        debug!("Saved peak store to {}", self.peak_path.display());
        Ok(())
    }

    /// Load the status record, defaulting to NORMAL when the file doesn't exist.
    fn load_status(&self) -> Result<StatusRecord> {
        match read_json::<StatusRecord>(&self.status_path)? {
            Some(status) => {
                info!(status = ?status.status, zone = ?status.zone, "Loaded status record");
                Ok(status)
            }
            None => {
                info!(
                    "Status file not found at {}, assuming NORMAL",
                    self.status_path.display()
                );
                Ok(StatusRecord::normal())
            }
        }
    }

    fn save_status(&self, status: &StatusRecord) -> Result<()> {
        write_json_atomic(&self.status_path, status)?;
        info!(
            "Saved status {:?} to {}",
            status.status,
            self.status_path.display()
        );
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(io_at(path))?;
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| PeakError::CorruptState {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(io_at(parent))?;
    }

    let json = serde_json::to_string_pretty(value)?;

    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path).map_err(io_at(&temp_path))?;
    file.write_all(json.as_bytes()).map_err(io_at(&temp_path))?;
    file.sync_all().map_err(io_at(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(io_at(path))?;
    Ok(())
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> PeakError + use<> {
    let path = path.to_path_buf();
    move |source| PeakError::StateIo { path, source }
}

/// In-memory repository for dry runs and tests. Counts saves.
#[derive(Debug, Default)]
pub struct MemoryStateRepository {
    peaks: Mutex<PeakStore>,
    status: Mutex<StatusRecord>,
    peak_saves: AtomicUsize,
    status_saves: AtomicUsize,
}

impl MemoryStateRepository {
    #[must_use]
    pub fn new(peaks: PeakStore, status: StatusRecord) -> Self {
        Self {
            peaks: Mutex::new(peaks),
            status: Mutex::new(status),
            ..Self::default()
        }
    }

    pub fn peaks(&self) -> PeakStore {
        self.peaks.lock().clone()
    }

    pub fn status(&self) -> StatusRecord {
        self.status.lock().clone()
    }

    pub fn peak_saves(&self) -> usize {
        self.peak_saves.load(Ordering::Relaxed)
    }

    pub fn status_saves(&self) -> usize {
        self.status_saves.load(Ordering::Relaxed)
    }
}

impl StateRepository for MemoryStateRepository {
    fn load_peaks(&self) -> Result<PeakStore> {
        Ok(self.peaks())
    }

    fn save_peaks(&self, peaks: &PeakStore) -> Result<()> {
        *self.peaks.lock() = peaks.clone();
        self.peak_saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn load_status(&self) -> Result<StatusRecord> {
        Ok(self.status())
    }

    fn save_status(&self, status: &StatusRecord) -> Result<()> {
        *self.status.lock() = status.clone();
        self.status_saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

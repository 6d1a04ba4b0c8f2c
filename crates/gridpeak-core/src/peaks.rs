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

//! Ranked top-N peak tracking per zone.

use gridpeak_types::{HourClock, MILLIS_PER_HOUR, PeakEntry, Zone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cleanup;
use crate::error::{PeakError, Result};

/// Number of peaks tracked per zone (the capacity charge uses the top 5 hours).
pub const PEAK_CAPACITY: usize = 5;

/// Fixed-capacity list of peaks, strictly descending by load.
///
/// All mutation goes through [`PeakRankList::try_insert`] and the hourly
/// cleanup, which keeps the ordering and capacity invariants in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PeakEntry>", into = "Vec<PeakEntry>")]
pub struct PeakRankList {
    entries: Vec<PeakEntry>,
}

impl PeakRankList {
    /// Empty list. Accepts its first candidate unconditionally.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(PEAK_CAPACITY + 1),
        }
    }

    /// Placeholder list used on first run: loads 5..1 MW, one hour apart so
    /// the hourly cleanup leaves them alone.
    #[must_use]
    pub fn seeded() -> Self {
        let mut list = Self::new();
        list.top_up();
        list
    }

    /// Build a list from persisted entries, rejecting anything that breaks
    /// the capacity or ordering invariants.
    pub fn from_entries(entries: Vec<PeakEntry>) -> Result<Self> {
        if entries.len() > PEAK_CAPACITY {
            return Err(PeakError::InvalidPeakList(format!(
                "{} entries, at most {PEAK_CAPACITY} allowed",
                entries.len()
            )));
        }
        if let Some(bad) = entries.iter().find(|e| !e.load_mw.is_finite()) {
            return Err(PeakError::InvalidPeakList(format!(
                "non-finite load at t={}",
                bad.timestamp_ms
            )));
        }
        if let Some(pair) = entries.windows(2).find(|w| w[0].load_mw <= w[1].load_mw) {
            return Err(PeakError::InvalidPeakList(format!(
                "loads not strictly descending ({} then {})",
                pair[0].load_mw, pair[1].load_mw
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PeakEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest tracked peak.
    pub fn top(&self) -> Option<&PeakEntry> {
        self.entries.first()
    }

    /// Smallest tracked peak load, the bar a new peak has to clear.
    pub fn min_load(&self) -> Option<f64> {
        self.entries.last().map(|e| e.load_mw)
    }

    /// Exact match against a tracked load. Loads are compared as recorded,
    /// so an hourly max already absorbed is recognized on every later sample.
    #[expect(clippy::float_cmp)]
    pub fn contains_load(&self, load_mw: f64) -> bool {
        self.entries.iter().any(|e| e.load_mw == load_mw)
    }

    /// Insert `candidate` at the first rank it beats, evicting the lowest
    /// entry if the list overflows.
    ///
    /// Returns false without touching the list when the load is already
    /// tracked, is not finite, or beats no tracked entry.
    pub fn try_insert(&mut self, candidate: PeakEntry) -> bool {
        if !candidate.load_mw.is_finite() || self.contains_load(candidate.load_mw) {
            return false;
        }

        if self.entries.is_empty() {
            self.entries.push(candidate);
            return true;
        }

        let Some(rank) = self
            .entries
            .iter()
            .position(|entry| candidate.load_mw > entry.load_mw)
        else {
            return false;
        };

        self.entries.insert(rank, candidate);
        self.entries.truncate(PEAK_CAPACITY);
        true
    }

    /// Refill an under-filled list with placeholder entries so later
    /// candidates have a rank to take. Returns the number added.
    ///
    /// Slot `i` gets load `5 - i` MW (capped below the current smallest load)
    /// at epoch hour `5 - i`, which matches [`PeakRankList::seeded`] for an
    /// empty list.
    pub fn top_up(&mut self) -> usize {
        let before = self.entries.len();
        for rank in before..PEAK_CAPACITY {
            let slot = PEAK_CAPACITY - rank;
            #[expect(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
            let (timestamp_ms, placeholder) = (slot as i64 * MILLIS_PER_HOUR, slot as f64);
            let load_mw = self
                .min_load()
                .map_or(placeholder, |min| placeholder.min(min - 1.0));
            self.entries.push(PeakEntry::new(timestamp_ms, load_mw));
        }
        self.entries.len() - before
    }

    /// Keep entries matching `keep`, preserving rank order.
    pub(crate) fn retain(&mut self, keep: impl FnMut(&PeakEntry) -> bool) {
        self.entries.retain(keep);
    }
}

impl Default for PeakRankList {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<PeakEntry>> for PeakRankList {
    type Error = PeakError;

    fn try_from(entries: Vec<PeakEntry>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<PeakRankList> for Vec<PeakEntry> {
    fn from(list: PeakRankList) -> Self {
        list.entries
    }
}

/// Tracked peaks for every zone. Serialized as `{"<zone>": [entries...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeakStore {
    zones: BTreeMap<Zone, PeakRankList>,
}

impl PeakStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with placeholder peaks for each of `zones`.
    #[must_use]
    pub fn seeded(zones: &[Zone]) -> Self {
        let mut store = Self::new();
        for zone in zones {
            store.ensure_zone(zone);
        }
        store
    }

    /// Seed `zone` if it has no list yet, and top up a list the hourly
    /// cleanup left short. Returns true when placeholders were added.
    pub fn ensure_zone(&mut self, zone: &Zone) -> bool {
        self.zones.entry(zone.clone()).or_default().top_up() > 0
    }

    pub fn get(&self, zone: &str) -> Option<&PeakRankList> {
        self.zones.get(zone)
    }

    /// Mutable list for `zone`, seeding it if absent.
    pub fn zone_mut(&mut self, zone: &Zone) -> &mut PeakRankList {
        self.zones
            .entry(zone.clone())
            .or_insert_with(PeakRankList::seeded)
    }

    pub fn insert(&mut self, zone: Zone, list: PeakRankList) {
        self.zones.insert(zone, list);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Zone, &PeakRankList)> {
        self.zones.iter()
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Deduplicate every zone by clock hour. Returns the number of entries removed.
    pub fn cleanup_all(&mut self, clock: &HourClock) -> usize {
        self.zones
            .values_mut()
            .map(|list| cleanup::cleanup(list, clock))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(load: f64) -> PeakEntry {
        #[expect(clippy::cast_possible_truncation)]
        let hour = load as i64;
        PeakEntry::new(hour * MILLIS_PER_HOUR, load)
    }

    fn loads(list: &PeakRankList) -> Vec<f64> {
        list.entries().iter().map(|e| e.load_mw).collect()
    }

    fn assert_invariants(list: &PeakRankList) {
        assert!(list.len() <= PEAK_CAPACITY);
        assert!(list.entries().windows(2).all(|w| w[0].load_mw > w[1].load_mw));
    }

    #[test]
    fn test_seeded_list() {
        let list = PeakRankList::seeded();
        assert_eq!(loads(&list), vec![5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_invariants(&list);
    }

    #[test]
    fn test_insert_at_top_evicts_lowest() {
        let mut list = PeakRankList::seeded();
        assert!(list.try_insert(entry(100.0)));
        assert_eq!(loads(&list), vec![100.0, 5.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut list = PeakRankList::from_entries(vec![
            entry(50.0),
            entry(40.0),
            entry(30.0),
            entry(20.0),
            entry(10.0),
        ])
        .unwrap();
        assert!(list.try_insert(entry(35.0)));
        assert_eq!(loads(&list), vec![50.0, 40.0, 35.0, 30.0, 20.0]);
    }

    #[test]
    fn test_insert_can_take_last_rank() {
        let mut list = PeakRankList::seeded();
        assert!(list.try_insert(entry(1.5)));
        assert_eq!(loads(&list), vec![5.0, 4.0, 3.0, 2.0, 1.5]);
    }

    #[test]
    fn test_candidate_below_all_is_rejected() {
        let mut list = PeakRankList::seeded();
        let before = list.clone();
        assert!(!list.try_insert(entry(0.5)));
        assert_eq!(list, before);
    }

    #[test]
    fn test_duplicate_load_is_noop() {
        let mut list = PeakRankList::seeded();
        list.try_insert(entry(100.0));
        let before = list.clone();

        assert!(!list.try_insert(PeakEntry::new(42, 100.0)));
        assert!(!list.try_insert(PeakEntry::new(42, 3.0)));
        assert_eq!(list, before);
    }

    #[test]
    fn test_short_list_does_not_grow_with_low_candidates() {
        let mut list = PeakRankList::from_entries(vec![entry(50.0), entry(40.0)]).unwrap();
        assert!(!list.try_insert(entry(30.0)));
        assert!(list.try_insert(entry(45.0)));
        assert_eq!(loads(&list), vec![50.0, 45.0, 40.0]);
    }

    #[test]
    fn test_top_up_refills_short_list() {
        let mut list = PeakRankList::from_entries(vec![entry(195.0)]).unwrap();
        assert_eq!(list.top_up(), 4);
        assert_eq!(loads(&list), vec![195.0, 4.0, 3.0, 2.0, 1.0]);
        assert_invariants(&list);

        // Placeholders give a mid-range candidate somewhere to land
        assert!(list.try_insert(entry(185.5)));
        assert_eq!(loads(&list), vec![195.0, 185.5, 4.0, 3.0, 2.0]);
        assert_eq!(list.top_up(), 0);
    }

    #[test]
    fn test_top_up_stays_below_small_loads() {
        let mut list = PeakRankList::from_entries(vec![entry(9.0), entry(2.5)]).unwrap();
        assert_eq!(list.top_up(), 3);
        assert_eq!(loads(&list), vec![9.0, 2.5, 1.5, 0.5, -0.5]);
        assert_invariants(&list);

        let mut empty = PeakRankList::new();
        empty.top_up();
        assert_eq!(empty, PeakRankList::seeded());
    }

    #[test]
    fn test_empty_list_accepts_first_candidate() {
        let mut list = PeakRankList::new();
        assert!(list.try_insert(entry(12.0)));
        assert_eq!(loads(&list), vec![12.0]);
    }

    #[test]
    fn test_non_finite_candidate_rejected() {
        let mut list = PeakRankList::seeded();
        assert!(!list.try_insert(PeakEntry::new(0, f64::NAN)));
        assert!(!list.try_insert(PeakEntry::new(0, f64::INFINITY)));
        assert_eq!(list, PeakRankList::seeded());
    }

    #[test]
    fn test_invariants_hold_over_many_inserts() {
        let mut list = PeakRankList::seeded();
        let candidates = [
            7.0, 3.0, 120.0, 7.0, 55.5, 2.5, 300.0, 299.0, 120.0, 1.0, 150.0, 310.0, 5.0, 0.0,
        ];
        for load in candidates {
            list.try_insert(entry(load));
            assert_invariants(&list);
        }
        assert_eq!(loads(&list), vec![310.0, 300.0, 299.0, 150.0, 120.0]);
    }

    #[test]
    fn test_from_entries_rejects_bad_lists() {
        let too_long = (0..6).map(|i| entry(f64::from(100 - i))).collect();
        assert!(PeakRankList::from_entries(too_long).is_err());
        assert!(PeakRankList::from_entries(vec![entry(1.0), entry(2.0)]).is_err());
        assert!(PeakRankList::from_entries(vec![entry(2.0), entry(2.0)]).is_err());
        assert!(PeakRankList::from_entries(vec![PeakEntry::new(0, f64::NAN)]).is_err());
    }

    #[test]
    fn test_store_json_shape() {
        let mut store = PeakStore::new();
        store.insert(
            Zone::new("COMED"),
            PeakRankList::from_entries(vec![PeakEntry::new(1_700_000_000_000, 21_000.5)]).unwrap(),
        );
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(
            json,
            r#"{"COMED":[{"timestamp":1700000000000,"load":21000.5}]}"#
        );

        let parsed: PeakStore = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store);
    }

    #[test]
    fn test_store_rejects_unsorted_json() {
        let json = r#"{"COMED":[{"timestamp":1,"load":1.0},{"timestamp":2,"load":9.0}]}"#;
        assert!(serde_json::from_str::<PeakStore>(json).is_err());
    }

    #[test]
    fn test_ensure_zone_seeds_missing_and_empty() {
        let mut store = PeakStore::new();
        store.insert(Zone::new("COMED"), PeakRankList::new());
        assert!(store.ensure_zone(&Zone::new("COMED")));
        assert!(store.ensure_zone(&Zone::new("PJM RTO Total")));
        assert!(!store.ensure_zone(&Zone::new("COMED")));
        assert_eq!(store.zone_count(), 2);
        assert_eq!(store.get("COMED"), Some(&PeakRankList::seeded()));
    }

    #[test]
    fn test_ensure_zone_tops_up_short_list() {
        let mut store = PeakStore::new();
        store.insert(
            Zone::new("COMED"),
            PeakRankList::from_entries(vec![entry(195.0), entry(150.0)]).unwrap(),
        );
        assert!(store.ensure_zone(&Zone::new("COMED")));
        let list = store.get("COMED").unwrap();
        assert_eq!(loads(list), vec![195.0, 150.0, 3.0, 2.0, 1.0]);
    }
}

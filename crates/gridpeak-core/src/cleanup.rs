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

use gridpeak_types::HourClock;
use std::collections::HashSet;

use crate::peaks::PeakRankList;

/// Drop all but one entry per clock hour.
///
/// The survivor is the first entry in rank order, i.e. the highest load
/// recorded for that hour. Returns the number of entries removed.
pub fn cleanup(list: &mut PeakRankList, clock: &HourClock) -> usize {
    let before = list.len();
    let mut seen_hours = HashSet::with_capacity(before);
    list.retain(|entry| seen_hours.insert(clock.hour_bucket(entry.timestamp_ms)));
    before - list.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gridpeak_types::PeakEntry;

    fn at(h: u32, m: u32, load: f64) -> PeakEntry {
        let ts = Utc.with_ymd_and_hms(2024, 8, 1, h, m, 0).unwrap();
        PeakEntry::new(ts.timestamp_millis(), load)
    }

    #[test]
    fn test_distinct_hours_untouched() {
        let mut list =
            PeakRankList::from_entries(vec![at(17, 5, 500.0), at(16, 55, 480.0), at(15, 0, 470.0)])
                .unwrap();
        let before = list.clone();
        assert_eq!(cleanup(&mut list, &HourClock::utc()), 0);
        assert_eq!(list, before);
    }

    #[test]
    fn test_same_hour_keeps_highest() {
        let mut list = PeakRankList::from_entries(vec![
            at(17, 55, 520.0),
            at(16, 40, 510.0),
            at(17, 5, 505.0),
            at(17, 30, 490.0),
            at(16, 10, 480.0),
        ])
        .unwrap();

        assert_eq!(cleanup(&mut list, &HourClock::utc()), 3);
        assert_eq!(list.entries(), &[at(17, 55, 520.0), at(16, 40, 510.0)]);
    }

    #[test]
    fn test_no_shared_buckets_after_cleanup() {
        let clock = HourClock::utc();
        let mut list = PeakRankList::from_entries(vec![
            at(9, 0, 9.0),
            at(9, 59, 8.0),
            at(10, 0, 7.0),
            at(10, 1, 6.0),
            at(11, 30, 5.0),
        ])
        .unwrap();
        let before = list.len();

        cleanup(&mut list, &clock);

        let buckets: HashSet<i64> = list
            .entries()
            .iter()
            .map(|e| clock.hour_bucket(e.timestamp_ms))
            .collect();
        assert_eq!(buckets.len(), list.len());
        assert!(list.len() <= before);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_bucketing_follows_configured_timezone() {
        // 09:10 and 09:50 UTC straddle 15:00 IST, so they are different local hours
        let mut list =
            PeakRankList::from_entries(vec![at(9, 50, 300.0), at(9, 10, 200.0)]).unwrap();
        assert_eq!(cleanup(&mut list, &HourClock::new(chrono_tz::Asia::Kolkata)), 0);

        let mut list =
            PeakRankList::from_entries(vec![at(9, 50, 300.0), at(9, 10, 200.0)]).unwrap();
        assert_eq!(cleanup(&mut list, &HourClock::utc()), 1);
    }
}

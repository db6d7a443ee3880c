//! # Day Bucketing
//!
//! The provider returns one series per station covering the whole date range.
//! Each page needs just one calendar day of it. Days are matched by string prefix
//! against the ISO `YYYY-MM-DD` key: timestamps are already in station-local
//! time, so no timezone conversion is involved.

use crate::{HourlySample, PredictionEvent, StationKind, StationSeries, Timestamped};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// ISO date key (`YYYY-MM-DD`) that timestamps of `day` start with.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Items whose timestamp falls on `day`, in their original order.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_almanac_lib::{bucket::bucket, HourlySample};
///
/// let samples = vec![
///     HourlySample::new("2026-01-01 23:00", 4.1),
///     HourlySample::new("2026-01-02 00:00", 3.6),
/// ];
/// let day = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
/// assert_eq!(bucket(&samples, day), vec![&samples[1]]);
/// ```
pub fn bucket<T: Timestamped>(items: &[T], day: NaiveDate) -> Vec<&T> {
    bucket_by_key(items, &day_key(day))
}

fn bucket_by_key<'a, T: Timestamped>(items: &'a [T], key: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| item.timestamp().starts_with(key))
        .collect()
}

/// Every series and hourly sample set fetched for an almanac run.
///
/// Station ids are only unique within a kind, so series are looked up by
/// `(kind, id)`. Hourly samples exist only for tide stations with a curve.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AlmanacData {
    series: Vec<StationSeries>,
    hourly: HashMap<String, Vec<HourlySample>>,
}

impl AlmanacData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station series, replacing any earlier one for the same station.
    pub fn insert_series(&mut self, series: StationSeries) {
        self.series
            .retain(|s| !(s.kind == series.kind && s.station_id == series.station_id));
        self.series.push(series);
    }

    pub fn insert_hourly(&mut self, station_id: &str, samples: Vec<HourlySample>) {
        self.hourly.insert(station_id.to_string(), samples);
    }

    pub fn series(&self, kind: StationKind, station_id: &str) -> Option<&StationSeries> {
        self.series
            .iter()
            .find(|s| s.kind == kind && s.station_id == station_id)
    }

    pub fn hourly(&self, station_id: &str) -> Option<&[HourlySample]> {
        self.hourly.get(station_id).map(Vec::as_slice)
    }

    /// View of the data restricted to one calendar day.
    pub fn day(&self, day: NaiveDate) -> DayBuckets<'_> {
        DayBuckets {
            key: day_key(day),
            data: self,
        }
    }
}

/// One day's slice of [`AlmanacData`].
///
/// Lookups return `None` for a station that was never fetched and `Some(vec![])`
/// for a known station with nothing on this day.
pub struct DayBuckets<'a> {
    key: String,
    data: &'a AlmanacData,
}

impl<'a> DayBuckets<'a> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn events(&self, kind: StationKind, station_id: &str) -> Option<Vec<&'a PredictionEvent>> {
        self.data
            .series(kind, station_id)
            .map(|series| bucket_by_key(&series.events, &self.key))
    }

    pub fn hourly(&self, station_id: &str) -> Option<Vec<&'a HourlySample>> {
        self.data
            .hourly(station_id)
            .map(|samples| bucket_by_key(samples, &self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CurrentKind, TideKind};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn seattle() -> StationSeries {
        let events = [
            ("2026-01-01 06:49", 9.52, "H"),
            ("2026-01-01 13:10", 1.20, "L"),
            ("2026-01-01 18:32", 7.85, "H"),
            ("2026-01-02 00:41", 3.02, "L"),
            ("2026-01-02 07:22", 9.61, "H"),
            ("2026-01-03 01:30", 2.80, "L"),
            ("2026-01-03 08:01", 9.70, "H"),
            ("2026-01-03 14:40", 0.40, "L"),
            ("2026-01-03 21:05", 8.20, "H"),
        ]
        .iter()
        .map(|(t, v, k)| PredictionEvent::tide(*t, *v, TideKind::from_raw(k)))
        .collect();

        StationSeries {
            station_id: "9447130".to_string(),
            station_name: "Seattle".to_string(),
            kind: StationKind::Tide,
            events,
        }
    }

    #[test]
    fn day_key_is_iso() {
        assert_eq!(day_key(date(1)), "2026-01-01");
        assert_eq!(day_key(NaiveDate::from_ymd_opt(2026, 11, 30).unwrap()), "2026-11-30");
    }

    #[test]
    fn buckets_keep_order_and_count() {
        let series = seattle();
        let first = bucket(&series.events, date(1));
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].timestamp, "2026-01-01 06:49");
        assert_eq!(first[2].timestamp, "2026-01-01 18:32");
        assert_eq!(bucket(&series.events, date(2)).len(), 2);
        assert_eq!(bucket(&series.events, date(3)).len(), 4);
        assert!(bucket(&series.events, date(4)).is_empty());
    }

    #[test]
    fn buckets_are_disjoint_and_lossless() {
        let series = seattle();
        let mut union = Vec::new();
        for d in 1..=4 {
            let day = bucket(&series.events, date(d));
            assert!(day.iter().all(|e| !union.contains(e)), "day {d} overlaps");
            union.extend(day);
        }
        let original: Vec<&PredictionEvent> = series.events.iter().collect();
        assert_eq!(union, original);
    }

    #[test]
    fn bucketing_is_idempotent() {
        let series = seattle();
        let once: Vec<PredictionEvent> = bucket(&series.events, date(3)).into_iter().cloned().collect();
        let twice: Vec<PredictionEvent> = bucket(&once, date(3)).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_timestamps_never_match() {
        let events = vec![
            PredictionEvent::current("", 1.0, CurrentKind::Slack),
            PredictionEvent::current("2026-1-1 05:00", 1.0, CurrentKind::MaxFlood),
            PredictionEvent::current("2026-01-01 05:00", 1.0, CurrentKind::MaxEbb),
        ];
        let day = bucket(&events, date(1));
        assert_eq!(day, vec![&events[2]]);
    }

    #[test]
    fn unknown_station_differs_from_empty_day() {
        let mut data = AlmanacData::new();
        data.insert_series(seattle());
        data.insert_series(StationSeries::empty("9444900", "Port Townsend", StationKind::Tide));

        let day = data.day(date(1));
        assert_eq!(day.key(), "2026-01-01");
        assert_eq!(day.events(StationKind::Tide, "9447130").map(|e| e.len()), Some(3));
        assert_eq!(day.events(StationKind::Tide, "9444900"), Some(vec![]));
        assert_eq!(day.events(StationKind::Tide, "0000000"), None);
        // Same id under the other kind is a different station
        assert_eq!(day.events(StationKind::Current, "9447130"), None);
    }

    #[test]
    fn hourly_samples_bucket_like_events() {
        let mut data = AlmanacData::new();
        data.insert_hourly(
            "9447130",
            vec![
                HourlySample::new("2026-01-01 22:00", 6.0),
                HourlySample::new("2026-01-01 23:00", 5.1),
                HourlySample::new("2026-01-02 00:00", 4.3),
            ],
        );
        let day = data.day(date(1));
        assert_eq!(day.hourly("9447130").unwrap().len(), 2);
        assert!(day.hourly("9444900").is_none());
    }

    #[test]
    fn reinserting_a_series_replaces_it() {
        let mut data = AlmanacData::new();
        data.insert_series(seattle());
        data.insert_series(StationSeries::empty("9447130", "Seattle", StationKind::Tide));
        assert!(data.series(StationKind::Tide, "9447130").unwrap().events.is_empty());
    }
}

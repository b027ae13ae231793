use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::game::record::GameRecord;

/// A cleaned rating observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingPoint {
    pub date: DateTime<Utc>,
    pub rating: i32,
}

impl RatingPoint {
    pub fn new(date: DateTime<Utc>, rating: i32) -> Self {
        Self { date, rating }
    }

    pub(crate) fn millis(&self) -> f64 {
        self.date.timestamp_millis() as f64
    }
}

/// Per-control point lists, before any derived stage runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesSet {
    /// Every cleaned point, regardless of truncation.
    pub raw: BTreeMap<String, Vec<RatingPoint>>,
    /// The points each stage works on (truncated when starting at the lowest rating).
    pub points: BTreeMap<String, Vec<RatingPoint>>,
    /// Lowest rating over all controls; earliest date on ties.
    pub global_min: Option<RatingPoint>,
}

/// Drop unusable ratings and sort by date. The sort is stable, so games
/// finishing at the same instant keep their input order.
pub fn clean_points(records: &[GameRecord]) -> Vec<RatingPoint> {
    let mut points: Vec<RatingPoint> = records
        .iter()
        .filter_map(|r| r.valid_rating().map(|rating| RatingPoint::new(r.date, rating)))
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

pub fn global_minimum(series: &BTreeMap<String, Vec<RatingPoint>>) -> Option<RatingPoint> {
    series
        .values()
        .flatten()
        .min_by_key(|p| (p.rating, p.date))
        .copied()
}

pub fn since(points: &[RatingPoint], cutoff: DateTime<Utc>) -> Vec<RatingPoint> {
    points.iter().filter(|p| p.date >= cutoff).copied().collect()
}

/// The tail of a date-sorted slice lying within `days` of its last point.
pub fn recent_window(points: &[RatingPoint], days: i64) -> &[RatingPoint] {
    let Some(last) = points.last() else {
        return points;
    };
    let cutoff = last.date - Duration::days(days);
    let start = points.partition_point(|p| p.date < cutoff);
    &points[start..]
}

pub fn build_series(
    records: &BTreeMap<String, Vec<GameRecord>>,
    start_at_lowest: bool,
) -> SeriesSet {
    let raw: BTreeMap<String, Vec<RatingPoint>> = records
        .iter()
        .map(|(control, games)| (control.clone(), clean_points(games)))
        .collect();
    let global_min = global_minimum(&raw);

    let points = match global_min {
        Some(min) if start_at_lowest => raw
            .iter()
            .map(|(control, pts)| (control.clone(), since(pts, min.date)))
            .collect(),
        _ => raw.clone(),
    };

    SeriesSet {
        raw,
        points,
        global_min,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn day(d: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(d)
    }

    fn rec(d: i64, rating: Option<i32>, control: &str) -> GameRecord {
        GameRecord::new(day(d), rating, control)
    }

    fn input(records: Vec<GameRecord>) -> BTreeMap<String, Vec<GameRecord>> {
        crate::game::record::group_by_control(&records)
    }

    #[test]
    fn test_clean_points_filters_and_sorts_stably() {
        let records = vec![
            rec(3, Some(1030), "blitz"),
            rec(1, Some(1010), "blitz"),
            rec(2, None, "blitz"),
            rec(1, Some(1011), "blitz"),
            rec(0, Some(0), "blitz"),
        ];
        let points = clean_points(&records);
        let ratings: Vec<i32> = points.iter().map(|p| p.rating).collect();
        assert_eq!(ratings, vec![1010, 1011, 1030]);
    }

    #[test]
    fn test_global_minimum_prefers_earliest_on_tie() {
        let set = build_series(
            &input(vec![
                rec(5, Some(900), "blitz"),
                rec(2, Some(900), "rapid"),
                rec(1, Some(950), "rapid"),
            ]),
            false,
        );
        assert_eq!(set.global_min, Some(RatingPoint::new(day(2), 900)));
    }

    #[test]
    fn test_start_at_lowest_uses_global_cutoff() {
        let set = build_series(
            &input(vec![
                rec(0, Some(1200), "blitz"),
                rec(4, Some(1000), "blitz"),
                rec(6, Some(1100), "blitz"),
                rec(1, Some(1500), "rapid"),
                rec(3, Some(1450), "rapid"),
                rec(8, Some(1480), "rapid"),
            ]),
            true,
        );
        assert_eq!(set.points["blitz"].len(), 2);
        assert_eq!(set.points["rapid"].len(), 1);
        assert_eq!(set.points["rapid"][0].rating, 1480);
        assert_eq!(set.raw["rapid"].len(), 3);
    }

    #[test]
    fn test_control_without_valid_ratings_is_empty() {
        let set = build_series(
            &input(vec![rec(0, None, "bullet"), rec(1, Some(1200), "blitz")]),
            true,
        );
        assert!(set.points["bullet"].is_empty());
        assert_eq!(set.points["blitz"].len(), 1);
    }

    #[test]
    fn test_filtering_full_series_matches_start_at_lowest() {
        let records = input(vec![
            rec(0, Some(1300), "blitz"),
            rec(2, Some(1250), "blitz"),
            rec(4, Some(1190), "rapid"),
            rec(4, Some(1320), "blitz"),
            rec(7, Some(1210), "rapid"),
            rec(9, Some(1350), "blitz"),
        ]);
        let full = build_series(&records, false);
        let lowest = build_series(&records, true);
        let min = full.global_min.unwrap();
        let filtered: BTreeMap<String, Vec<RatingPoint>> = full
            .points
            .iter()
            .map(|(c, pts)| (c.clone(), since(pts, min.date)))
            .collect();
        assert_eq!(filtered, lowest.points);
    }

    #[test]
    fn test_recent_window() {
        let points: Vec<RatingPoint> = (0..10).map(|d| RatingPoint::new(day(d * 10), 1000)).collect();
        let window = recent_window(&points, 30);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].date, day(60));
        assert!(recent_window(&[], 30).is_empty());
    }
}

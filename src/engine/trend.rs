use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::MS_PER_DAY;
use crate::engine::params::TrendParams;
use crate::engine::series::{RatingPoint, recent_window};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// A fitted straight line, kept only as its two endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub start: TrendPoint,
    pub end: TrendPoint,
}

impl TrendLine {
    /// Rating points gained per day along the line.
    pub fn daily_slope(&self) -> f64 {
        let days = (self.end.date - self.start.date).num_milliseconds() as f64 / MS_PER_DAY;
        if days <= 0.0 {
            0.0
        } else {
            (self.end.value - self.start.value) / days
        }
    }
}

/// Least-squares line through the recent part of a series, for display.
///
/// Returns `None` when the series, or its recent window, is too short.
pub fn fit_trend(points: &[RatingPoint], params: &TrendParams) -> Option<TrendLine> {
    if points.len() < params.min_points {
        return None;
    }
    let sample = recent_window(points, params.window_days);
    if sample.len() < params.min_points.max(1) {
        tracing::debug!(
            total = points.len(),
            recent = sample.len(),
            "trend skipped: too few recent points"
        );
        return None;
    }

    let first = sample[0];
    let last = sample[sample.len() - 1];
    let x_of = |p: &RatingPoint| (p.millis() - first.millis()) / MS_PER_DAY;

    let n = sample.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xx, mut sum_xy) = (0.0, 0.0, 0.0, 0.0);
    for p in sample {
        let x = x_of(p);
        let y = p.rating as f64;
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_xy += x * y;
    }

    let denom = (n * sum_xx - sum_x * sum_x).max(1e-9);
    let slope = ((n * sum_xy - sum_x * sum_y) / denom)
        .clamp(-params.max_daily_slope, params.max_daily_slope);
    let intercept = (sum_y - slope * sum_x) / n;

    Some(TrendLine {
        start: TrendPoint {
            date: first.date,
            value: intercept,
        },
        end: TrendPoint {
            date: last.date,
            value: slope * x_of(&last) + intercept,
        },
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn day(d: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::days(d)
    }

    fn linear(n: i64, start: i32, per_day: i32) -> Vec<RatingPoint> {
        (0..n)
            .map(|d| RatingPoint::new(day(d), start + per_day * d as i32))
            .collect()
    }

    #[test]
    fn test_too_few_points() {
        assert!(fit_trend(&linear(4, 1000, 1), &TrendParams::default()).is_none());
    }

    #[test]
    fn test_too_few_recent_points() {
        let mut points = linear(10, 1000, 1);
        points.push(RatingPoint::new(day(400), 1100));
        assert!(fit_trend(&points, &TrendParams::default()).is_none());
    }

    #[test]
    fn test_exact_line() {
        let trend = fit_trend(&linear(10, 1000, 3), &TrendParams::default()).unwrap();
        assert_eq!(trend.start.date, day(0));
        assert_eq!(trend.end.date, day(9));
        assert!((trend.start.value - 1000.0).abs() < 1e-6);
        assert!((trend.end.value - 1027.0).abs() < 1e-6);
        assert!((trend.daily_slope() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_uses_only_recent_window() {
        let mut points: Vec<RatingPoint> = (0..10).map(|d| RatingPoint::new(day(d), 2000)).collect();
        points.extend((0..10).map(|d| RatingPoint::new(day(300 + d), 1200 + d as i32)));
        let trend = fit_trend(&points, &TrendParams::default()).unwrap();
        assert_eq!(trend.start.date, day(300));
        assert!((trend.start.value - 1200.0).abs() < 1e-6);
    }

    #[test]
    fn test_slope_is_clamped() {
        let mut points = linear(5, 1000, 0);
        points.push(RatingPoint::new(day(5), 2000));
        let trend = fit_trend(&points, &TrendParams::default()).unwrap();
        assert!(trend.daily_slope() <= 8.0 + 1e-9);
        assert!((trend.daily_slope() - 8.0).abs() < 1e-9);

        let falling: Vec<RatingPoint> = linear(6, 2000, -300);
        let trend = fit_trend(&falling, &TrendParams::default()).unwrap();
        assert!((trend.daily_slope() + 8.0).abs() < 1e-9);
    }
}

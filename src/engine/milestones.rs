use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::forecast::ForecastPoint;
use crate::engine::series::RatingPoint;

/// A round rating threshold and the moment it was (or is expected to be) reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub rating: i32,
    pub date: DateTime<Utc>,
}

fn date_from_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.round() as i64)
}

fn millis(date: DateTime<Utc>) -> f64 {
    date.timestamp_millis() as f64
}

/// All points of all controls in one stream, stable-sorted by date.
pub fn merge_points(series: &BTreeMap<String, Vec<RatingPoint>>) -> Vec<RatingPoint> {
    let mut merged: Vec<RatingPoint> = series.values().flatten().copied().collect();
    merged.sort_by_key(|p| p.date);
    merged
}

/// Thresholds reached by the running maximum rating, in date order.
///
/// The first threshold is the next multiple of `step` above the first rating
/// (never below `step`). A single jump can claim several thresholds at once.
pub fn observed_milestones(points: &[RatingPoint], step: i32) -> Vec<Milestone> {
    if step <= 0 {
        return Vec::new();
    }
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);
    let Some(first) = sorted.first() else {
        return Vec::new();
    };

    let mut max_so_far = first.rating;
    let mut next = step.max(first.rating.div_euclid(step) * step + step);
    let mut marks = Vec::new();
    for point in &sorted {
        max_so_far = max_so_far.max(point.rating);
        while max_so_far >= next {
            marks.push(Milestone {
                rating: next,
                date: point.date,
            });
            next += step;
        }
    }
    marks
}

/// Earliest date at which the curve's piecewise-linear path passes `threshold`.
pub fn bracketed_crossing(curve: &[ForecastPoint], threshold: f64) -> Option<DateTime<Utc>> {
    for pair in curve.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let (lo, hi) = if a.value <= b.value {
            (a.value, b.value)
        } else {
            (b.value, a.value)
        };
        if threshold < lo || threshold > hi {
            continue;
        }
        if (b.value - a.value).abs() < 1e-6 {
            continue;
        }
        let ratio = (threshold - a.value) / (b.value - a.value);
        let x0 = millis(a.date);
        let x1 = millis(b.date);
        return date_from_millis(x0 + ratio * (x1 - x0));
    }
    None
}

/// Continue the curve's final segment until it reaches `threshold`.
///
/// Only dates strictly after the curve's end are accepted.
pub fn extrapolated_crossing(curve: &[ForecastPoint], threshold: f64) -> Option<DateTime<Utc>> {
    let [.., a, b] = curve else {
        return None;
    };
    let x0 = millis(a.date);
    let x1 = millis(b.date);
    let slope = (b.value - a.value) / (x1 - x0).max(1.0);
    if slope.abs() <= 1e-9 {
        return None;
    }
    let dt = (threshold - b.value) / slope;
    if dt <= 0.0 {
        return None;
    }
    date_from_millis(x1 + dt).filter(|d| *d > b.date)
}

/// Expected date for one threshold across every curve.
///
/// Curves that actually pass the threshold take precedence; extrapolation is
/// only consulted when none of them does.
pub fn predict_crossing(curves: &[&[ForecastPoint]], threshold: f64) -> Option<DateTime<Utc>> {
    let usable = || curves.iter().filter(|c| c.len() >= 2);
    usable()
        .filter_map(|c| bracketed_crossing(c, threshold))
        .min()
        .or_else(|| {
            usable()
                .filter_map(|c| extrapolated_crossing(c, threshold))
                .min()
        })
}

/// Future thresholds above `max_observed`, up to the highest forecast value
/// rounded up to the next `step`. Unreachable thresholds are left out.
pub fn predicted_milestones(
    curves: &[&[ForecastPoint]],
    max_observed: i32,
    step: i32,
) -> Vec<Milestone> {
    if step <= 0 || curves.iter().all(|c| c.is_empty()) {
        return Vec::new();
    }
    let start = max_observed.div_euclid(step) * step + step;
    let max_forecast = curves
        .iter()
        .flat_map(|c| c.iter().map(|p| p.value))
        .fold(max_observed as f64, f64::max);
    let up_to = ((max_forecast / step as f64).ceil() * step as f64) as i32;

    let mut out = Vec::new();
    let mut threshold = start;
    while threshold <= up_to {
        if let Some(date) = predict_crossing(curves, threshold as f64) {
            out.push(Milestone {
                rating: threshold,
                date,
            });
        }
        threshold += step;
    }
    out
}

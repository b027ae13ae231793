use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::forecast::{ForecastPoint, forecast};
use crate::engine::milestones::{Milestone, merge_points, observed_milestones, predicted_milestones};
use crate::engine::params::EngineParams;
use crate::engine::series::{RatingPoint, build_series};
use crate::engine::smoothing::moving_average;
use crate::engine::trend::{TrendLine, fit_trend};
use crate::game::record::GameRecord;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: DateTime<Utc>,
    pub rating: i32,
    pub moving_average: f64,
}

/// Everything derived for one time control.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<SeriesPoint>,
    pub moving_average: Vec<f64>,
    pub trend: Option<TrendLine>,
    pub forecast: Vec<ForecastPoint>,
    /// Peak rating, earliest occurrence.
    pub best: Option<RatingPoint>,
    pub milestones: Vec<Milestone>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingExtent {
    pub min: i32,
    pub max: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineResult {
    pub series: BTreeMap<String, Series>,
    /// Lowest and highest displayed rating over all controls.
    pub rating_extent: Option<RatingExtent>,
    /// Observed milestones over all controls combined.
    pub milestones: Vec<Milestone>,
    pub predicted_milestones: Vec<Milestone>,
}

/// The same timeline computed over full history and from the lowest rating onward.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineBoth {
    pub normal: TimelineResult,
    pub lowest: TimelineResult,
}

fn peak(points: &[RatingPoint]) -> Option<RatingPoint> {
    points
        .iter()
        .copied()
        .reduce(|best, p| if p.rating > best.rating { p } else { best })
}

/// Run the smoothing, trend and forecast stages over one control.
///
/// `points` are the points to display; `raw` is the untruncated history the
/// observed milestones are taken from.
pub fn build_control_series(
    label: &str,
    points: &[RatingPoint],
    raw: &[RatingPoint],
    params: &EngineParams,
) -> Series {
    let averages = moving_average(points, params.smoothing.window_days);
    let series_points = points
        .iter()
        .zip(&averages)
        .map(|(p, &ma)| SeriesPoint {
            date: p.date,
            rating: p.rating,
            moving_average: ma,
        })
        .collect();

    Series {
        label: label.to_string(),
        points: series_points,
        moving_average: averages,
        trend: fit_trend(points, &params.trend),
        forecast: forecast(points, &params.forecast),
        best: peak(points),
        milestones: observed_milestones(raw, params.milestones.step),
    }
}

pub fn compute_timeline(
    records: &BTreeMap<String, Vec<GameRecord>>,
    start_at_lowest: bool,
    params: &EngineParams,
) -> TimelineResult {
    let set = build_series(records, start_at_lowest);
    let step = params.milestones.step;

    let mut series = BTreeMap::new();
    let mut extent: Option<RatingExtent> = None;
    for (control, points) in &set.points {
        let raw = set.raw.get(control).map(Vec::as_slice).unwrap_or_default();
        let built = build_control_series(control, points, raw, params);
        for p in points {
            extent = Some(match extent {
                Some(e) => RatingExtent {
                    min: e.min.min(p.rating),
                    max: e.max.max(p.rating),
                },
                None => RatingExtent {
                    min: p.rating,
                    max: p.rating,
                },
            });
        }
        series.insert(control.clone(), built);
    }

    let merged = merge_points(&set.raw);
    let milestones = observed_milestones(&merged, step);

    let predicted = match merged.iter().map(|p| p.rating).max() {
        Some(max_observed) => {
            let curves: Vec<&[ForecastPoint]> = series.values().map(|s| s.forecast.as_slice()).collect();
            predicted_milestones(&curves, max_observed, step)
        }
        None => Vec::new(),
    };

    tracing::debug!(
        controls = series.len(),
        start_at_lowest,
        observed = milestones.len(),
        predicted = predicted.len(),
        "timeline computed"
    );

    TimelineResult {
        series,
        rating_extent: extent,
        milestones,
        predicted_milestones: predicted,
    }
}

pub fn rating_timeline_both(
    records: &BTreeMap<String, Vec<GameRecord>>,
    params: &EngineParams,
) -> TimelineBoth {
    TimelineBoth {
        normal: compute_timeline(records, false, params),
        lowest: compute_timeline(records, true, params),
    }
}

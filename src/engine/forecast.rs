use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::MS_PER_DAY;
use crate::engine::params::ForecastParams;
use crate::engine::regression::{fit_weighted_ridge, recency_weights};
use crate::engine::series::{RatingPoint, recent_window};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
    pub lo: f64,
    pub hi: f64,
}

/// Project a series forward from its last observation.
///
/// A weighted ridge regression over the recent window supplies the starting
/// slope and the residual error; the slope then decays by `damping` every
/// step while the confidence band widens. The first point is the last observed
/// rating with a zero-width band. Returns an empty curve when the sample is
/// too small or the regression is singular.
pub fn forecast(points: &[RatingPoint], params: &ForecastParams) -> Vec<ForecastPoint> {
    let required = params.required_points();
    if points.len() < required {
        return Vec::new();
    }
    let sample = recent_window(points, params.window_days);
    if sample.len() < required {
        tracing::debug!(
            total = points.len(),
            recent = sample.len(),
            "forecast skipped: too few recent points"
        );
        return Vec::new();
    }

    let t0 = sample[0].millis();
    let span = sample[sample.len() - 1].millis() - t0;
    let scale = if span > 0.0 { span } else { 1.0 };

    let xs: Vec<f64> = sample.iter().map(|p| (p.millis() - t0) / scale).collect();
    let ys: Vec<f64> = sample.iter().map(|p| p.rating as f64).collect();
    let weights = recency_weights(sample.len(), params.min_weight);

    let Some(fit) = fit_weighted_ridge(
        &xs,
        &ys,
        &weights,
        params.degree,
        params.ridge_lambda,
        params.singular_epsilon,
    ) else {
        tracing::debug!(points = sample.len(), "forecast skipped: singular regression");
        return Vec::new();
    };

    // The slope is per normalized unit; cap it in rating points per day.
    let max_slope = params.max_daily_slope * scale / MS_PER_DAY;
    let mut slope = fit.linear_term().clamp(-max_slope, max_slope);

    let last = points[points.len() - 1];
    let step_ms = params.step_days as f64 * MS_PER_DAY;
    let mut value = last.rating as f64;

    let mut out = Vec::with_capacity(params.horizon_steps + 1);
    out.push(ForecastPoint {
        date: last.date,
        value,
        lo: value,
        hi: value,
    });

    for step in 1..=params.horizon_steps {
        slope *= params.damping;
        value += slope * (step_ms / scale);
        let width = params.z_score * fit.rmse * (1.0 + params.band_growth * step as f64);
        out.push(ForecastPoint {
            date: last.date + Duration::days(params.step_days * step as i64),
            value,
            lo: value - width,
            hi: value + width,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn day(d: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap() + Duration::days(d)
    }

    fn series(ratings: &[i32]) -> Vec<RatingPoint> {
        ratings
            .iter()
            .enumerate()
            .map(|(d, &r)| RatingPoint::new(day(d as i64), r))
            .collect()
    }

    #[test]
    fn test_too_few_points() {
        assert!(forecast(&series(&[1000, 1010, 1020, 1030]), &ForecastParams::default()).is_empty());
    }

    #[test]
    fn test_degree_plus_two_guard_without_floor() {
        let params = ForecastParams {
            min_points: 0,
            ..ForecastParams::default()
        };
        assert!(forecast(&series(&[1000, 1010]), &params).is_empty());
        assert_eq!(forecast(&series(&[1000, 1010, 1020]), &params).len(), 61);
    }

    #[test]
    fn test_anchor_and_cadence() {
        let points = series(&[1200, 1190, 1215, 1230, 1225, 1250, 1245, 1260]);
        let fx = forecast(&points, &ForecastParams::default());
        assert_eq!(fx.len(), 61);
        let anchor = fx[0];
        assert_eq!(anchor.date, day(7));
        assert_eq!(anchor.value, 1260.0);
        assert_eq!(anchor.lo, 1260.0);
        assert_eq!(anchor.hi, 1260.0);
        assert_eq!(fx[1].date, day(9));
        assert_eq!(fx[60].date, day(7 + 120));
    }

    #[test]
    fn test_band_widens_monotonically() {
        let points = series(&[1500, 1480, 1530, 1470, 1550, 1490, 1560, 1500, 1575]);
        let fx = forecast(&points, &ForecastParams::default());
        assert!(fx[1].hi - fx[1].lo > 0.0);
        for pair in fx.windows(2) {
            assert!(pair[1].hi - pair[1].lo >= pair[0].hi - pair[0].lo - 1e-9);
        }
    }

    #[test]
    fn test_rising_series_keeps_rising_with_decay() {
        let points = series(&[1000, 1010, 1020, 1030, 1040, 1050, 1060, 1070]);
        let fx = forecast(&points, &ForecastParams::default());
        let steps: Vec<f64> = fx.windows(2).map(|p| p[1].value - p[0].value).collect();
        assert!(steps.iter().all(|s| *s > 0.0));
        assert!(steps.windows(2).all(|p| p[1] < p[0]));
    }

    #[test]
    fn test_slope_cap_with_huge_jump() {
        let mut points = series(&[1000, 1000, 1000, 1000, 1000]);
        points.push(RatingPoint::new(day(5), 2000));
        let params = ForecastParams::default();
        let fx = forecast(&points, &params);
        assert!(!fx.is_empty());
        for pair in fx.windows(2) {
            let days = (pair[1].date - pair[0].date).num_milliseconds() as f64 / MS_PER_DAY;
            let per_day = (pair[1].value - pair[0].value) / days;
            assert!(per_day.abs() <= params.max_daily_slope + 1e-9, "slope {per_day}");
        }
    }

    #[test]
    fn test_constant_fit_stays_flat() {
        let params = ForecastParams {
            degree: 0,
            ..ForecastParams::default()
        };
        let points = series(&[1400, 1420, 1380, 1410, 1390, 1405]);
        let fx = forecast(&points, &params);
        assert_eq!(fx.len(), 61);
        assert!(fx.iter().all(|p| p.value == 1405.0));
    }

    #[test]
    fn test_singular_solve_abandons_forecast() {
        let params = ForecastParams {
            singular_epsilon: 1e12,
            ..ForecastParams::default()
        };
        let points = series(&[1000, 1010, 1020, 1030, 1040, 1050]);
        assert!(forecast(&points, &params).is_empty());
    }
}

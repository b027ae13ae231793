//! Tunables for every stage of the rating timeline engine.
//!
//! Every field has a serde default so a partial `[engine]` table in the config
//! file only overrides what it names.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Length of the trailing moving-average window, in days (inclusive).
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

fn default_window_days() -> i64 {
    7
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendParams {
    #[serde(default = "default_min_points")]
    pub min_points: usize,
    /// Only points this many days before the last observation are fitted.
    #[serde(default = "default_trend_window_days")]
    pub window_days: i64,
    /// Absolute cap on the fitted slope, rating points per day.
    #[serde(default = "default_max_daily_slope")]
    pub max_daily_slope: f64,
}

fn default_min_points() -> usize {
    5
}
fn default_trend_window_days() -> i64 {
    120
}
fn default_max_daily_slope() -> f64 {
    8.0
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            min_points: default_min_points(),
            window_days: default_trend_window_days(),
            max_daily_slope: default_max_daily_slope(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastParams {
    /// Polynomial degree of the regression basis.
    #[serde(default = "default_degree")]
    pub degree: usize,
    /// Floor on the sample size, on top of the `degree + 2` requirement.
    /// Controls with fewer points get no forecast curve and so never
    /// contribute to predicted milestones; 0 leaves only `degree + 2`.
    #[serde(default = "default_min_points")]
    pub min_points: usize,
    #[serde(default = "default_forecast_window_days")]
    pub window_days: i64,
    /// Ridge penalty added to the Gram matrix diagonal.
    #[serde(default = "default_ridge_lambda")]
    pub ridge_lambda: f64,
    /// Pivots smaller than this abort the solve.
    #[serde(default = "default_singular_epsilon")]
    pub singular_epsilon: f64,
    /// Weight of the oldest sample point; the newest always weighs 1.0.
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
    #[serde(default = "default_step_days")]
    pub step_days: i64,
    #[serde(default = "default_horizon_steps")]
    pub horizon_steps: usize,
    /// Multiplicative slope decay applied at every step.
    #[serde(default = "default_damping")]
    pub damping: f64,
    #[serde(default = "default_max_daily_slope")]
    pub max_daily_slope: f64,
    /// z-score of the confidence band (1.64 ~ 90% two-sided).
    #[serde(default = "default_z_score")]
    pub z_score: f64,
    /// Relative band widening per step.
    #[serde(default = "default_band_growth")]
    pub band_growth: f64,
}

fn default_degree() -> usize {
    1
}
fn default_forecast_window_days() -> i64 {
    180
}
fn default_ridge_lambda() -> f64 {
    1e-2
}
fn default_singular_epsilon() -> f64 {
    1e-9
}
fn default_min_weight() -> f64 {
    0.1
}
fn default_step_days() -> i64 {
    2
}
fn default_horizon_steps() -> usize {
    60
}
fn default_damping() -> f64 {
    0.993
}
fn default_z_score() -> f64 {
    1.64
}
fn default_band_growth() -> f64 {
    0.02
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            degree: default_degree(),
            min_points: default_min_points(),
            window_days: default_forecast_window_days(),
            ridge_lambda: default_ridge_lambda(),
            singular_epsilon: default_singular_epsilon(),
            min_weight: default_min_weight(),
            step_days: default_step_days(),
            horizon_steps: default_horizon_steps(),
            damping: default_damping(),
            max_daily_slope: default_max_daily_slope(),
            z_score: default_z_score(),
            band_growth: default_band_growth(),
        }
    }
}

impl ForecastParams {
    pub fn required_points(&self) -> usize {
        (self.degree + 2).max(self.min_points)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MilestoneParams {
    /// Spacing between milestone thresholds.
    #[serde(default = "default_milestone_step")]
    pub step: i32,
}

fn default_milestone_step() -> i32 {
    100
}

impl Default for MilestoneParams {
    fn default() -> Self {
        Self {
            step: default_milestone_step(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    #[serde(default)]
    pub smoothing: SmoothingParams,
    #[serde(default)]
    pub trend: TrendParams,
    #[serde(default)]
    pub forecast: ForecastParams,
    #[serde(default)]
    pub milestones: MilestoneParams,
}

/// Longest window or step accepted from a config file, in days.
const MAX_DAYS: i64 = 36_500;
const MAX_HORIZON_STEPS: usize = 10_000;

fn days_in_range(days: i64) -> bool {
    (1..=MAX_DAYS).contains(&days)
}

fn positive_finite(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

impl EngineParams {
    /// Reset values the engine cannot work with to their defaults.
    /// Call after loading a config file.
    pub fn normalize(&mut self) {
        let s = &mut self.smoothing;
        if !days_in_range(s.window_days) {
            s.window_days = default_window_days();
        }

        let t = &mut self.trend;
        if !days_in_range(t.window_days) {
            t.window_days = default_trend_window_days();
        }
        if !positive_finite(t.max_daily_slope) {
            t.max_daily_slope = default_max_daily_slope();
        }

        let f = &mut self.forecast;
        if !days_in_range(f.window_days) {
            f.window_days = default_forecast_window_days();
        }
        if !days_in_range(f.step_days) {
            f.step_days = default_step_days();
        }
        if f.horizon_steps == 0 || f.horizon_steps > MAX_HORIZON_STEPS {
            f.horizon_steps = default_horizon_steps();
        }
        if !(f.damping.is_finite() && f.damping > 0.0 && f.damping <= 1.0) {
            f.damping = default_damping();
        }
        if !(f.ridge_lambda.is_finite() && f.ridge_lambda >= 0.0) {
            f.ridge_lambda = default_ridge_lambda();
        }
        if !positive_finite(f.singular_epsilon) {
            f.singular_epsilon = default_singular_epsilon();
        }
        if !(f.min_weight.is_finite() && (0.0..=1.0).contains(&f.min_weight)) {
            f.min_weight = default_min_weight();
        }
        if !positive_finite(f.max_daily_slope) {
            f.max_daily_slope = default_max_daily_slope();
        }
        if !(f.z_score.is_finite() && f.z_score >= 0.0) {
            f.z_score = default_z_score();
        }
        if !(f.band_growth.is_finite() && f.band_growth >= 0.0) {
            f.band_growth = default_band_growth();
        }

        if self.milestones.step <= 0 {
            self.milestones.step = default_milestone_step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_params_from_empty_toml() {
        let params: EngineParams = toml::from_str("").unwrap();
        assert_eq!(params, EngineParams::default());
        assert_eq!(params.smoothing.window_days, 7);
        assert_eq!(params.forecast.horizon_steps, 60);
        assert_eq!(params.milestones.step, 100);
    }

    #[test]
    fn test_partial_table_keeps_other_defaults() {
        let toml_str = r#"
[forecast]
degree = 2
damping = 0.99
"#;
        let params: EngineParams = toml::from_str(toml_str).unwrap();
        assert_eq!(params.forecast.degree, 2);
        assert_eq!(params.forecast.damping, 0.99);
        assert_eq!(params.forecast.ridge_lambda, 1e-2);
        assert_eq!(params.trend.window_days, 120);
    }

    #[test]
    fn test_normalize_resets_unusable_values() {
        let toml_str = r#"
[smoothing]
window_days = 0

[trend]
window_days = 9999999999
max_daily_slope = -1.0

[forecast]
step_days = -2
horizon_steps = 0
damping = 1.5
min_weight = 2.0
degree = 2

[milestones]
step = 0
"#;
        let mut params: EngineParams = toml::from_str(toml_str).unwrap();
        params.normalize();
        assert_eq!(params.smoothing.window_days, 7);
        assert_eq!(params.trend.window_days, 120);
        assert_eq!(params.trend.max_daily_slope, 8.0);
        assert_eq!(params.forecast.step_days, 2);
        assert_eq!(params.forecast.horizon_steps, 60);
        assert_eq!(params.forecast.damping, 0.993);
        assert_eq!(params.forecast.min_weight, 0.1);
        assert_eq!(params.milestones.step, 100);
        // Valid overrides survive.
        assert_eq!(params.forecast.degree, 2);

        params.milestones.step = -50;
        params.normalize();
        assert_eq!(params.milestones.step, 100);
    }

    #[test]
    fn test_normalize_keeps_valid_values() {
        let mut params = EngineParams::default();
        params.smoothing.window_days = 14;
        params.forecast.damping = 1.0;
        params.forecast.ridge_lambda = 0.0;
        params.milestones.step = 50;
        let before = params.clone();
        params.normalize();
        assert_eq!(params, before);
    }

    #[test]
    fn test_required_points() {
        let mut params = ForecastParams::default();
        assert_eq!(params.required_points(), 5);
        params.min_points = 0;
        assert_eq!(params.required_points(), 3);
        params.degree = 4;
        assert_eq!(params.required_points(), 6);
    }
}

use chrono::Duration;

use crate::engine::series::RatingPoint;

/// Trailing moving average over a time window (inclusive of the window start).
///
/// `points` must be sorted by date. The window start only ever moves forward,
/// so the whole pass is linear.
pub fn moving_average(points: &[RatingPoint], window_days: i64) -> Vec<f64> {
    let window = Duration::days(window_days);
    let mut out = Vec::with_capacity(points.len());
    let mut start = 0;
    let mut sum = 0.0;
    let mut count = 0usize;

    for (i, point) in points.iter().enumerate() {
        sum += point.rating as f64;
        count += 1;

        let cutoff = point.date - window;
        while start < i && points[start].date < cutoff {
            sum -= points[start].rating as f64;
            count -= 1;
            start += 1;
        }

        if count == 0 {
            out.push(point.rating as f64);
        } else {
            out.push(sum / count as f64);
        }
    }
    out
}

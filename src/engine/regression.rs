//! Weighted polynomial ridge regression on small dense systems.

/// Coefficients in ascending power order (`[c0, c1, c2, ...]`) plus the
/// weighted residual error of the fit on its own training sample.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyFit {
    pub coefficients: Vec<f64>,
    pub rmse: f64,
}

impl PolyFit {
    /// Coefficient of the linear term, 0 for a constant fit.
    pub fn linear_term(&self) -> f64 {
        self.coefficients.get(1).copied().unwrap_or(0.0)
    }
}

pub fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Linear ramp from `min_weight` (oldest) to 1.0 (newest).
pub fn recency_weights(n: usize, min_weight: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..n)
            .map(|i| min_weight + (1.0 - min_weight) * (i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// Solve `matrix * a = rhs` by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` as soon as the best available pivot is smaller than `epsilon`.
pub fn solve_linear_system(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>, epsilon: f64) -> Option<Vec<f64>> {
    let k = rhs.len();
    debug_assert!(matrix.len() == k && matrix.iter().all(|row| row.len() == k));

    for col in 0..k {
        let pivot = (col..k).max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot][col].abs() < epsilon {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        let div = matrix[col][col];
        for c in col..k {
            matrix[col][c] /= div;
        }
        rhs[col] /= div;

        for r in 0..k {
            if r == col {
                continue;
            }
            let factor = matrix[r][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..k {
                matrix[r][c] -= factor * matrix[col][c];
            }
            rhs[r] -= factor * rhs[col];
        }
    }
    Some(rhs)
}

/// Fit `y ~ c0 + c1 x + ... + cd x^d` minimising the weighted squared error
/// plus `lambda * |c|^2`.
pub fn fit_weighted_ridge(
    xs: &[f64],
    ys: &[f64],
    weights: &[f64],
    degree: usize,
    lambda: f64,
    epsilon: f64,
) -> Option<PolyFit> {
    let k = degree + 1;
    let mut gram = vec![vec![0.0; k]; k];
    let mut target = vec![0.0; k];
    let mut basis = vec![0.0; k];

    for ((&x, &y), &w) in xs.iter().zip(ys).zip(weights) {
        let mut power = 1.0;
        for b in basis.iter_mut() {
            *b = power;
            power *= x;
        }
        for r in 0..k {
            target[r] += w * basis[r] * y;
            for c in 0..k {
                gram[r][c] += w * basis[r] * basis[c];
            }
        }
    }
    for (d, row) in gram.iter_mut().enumerate() {
        row[d] += lambda;
    }

    let coefficients = solve_linear_system(gram, target, epsilon)?;

    let mut ss = 0.0;
    let mut sum_w = 0.0;
    for ((&x, &y), &w) in xs.iter().zip(ys).zip(weights) {
        let err = y - evaluate(&coefficients, x);
        ss += w * err * err;
        sum_w += w;
    }
    let rmse = (ss / (sum_w - k as f64).max(1e-9)).sqrt();

    Some(PolyFit { coefficients, rmse })
}

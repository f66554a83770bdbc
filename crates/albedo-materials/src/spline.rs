//! Cubic smoothing splines for noisy empirical optical data.
//!
//! Tabulated absorption data from independent sources disagree and carry
//! measurement noise. A smoothing spline trades fidelity to the data against
//! curvature: given weights $w_i$ and a smoothing parameter $p \in [0, 1]$ it
//! minimises
//!
//! $$ p \sum_i w_i \left(y_i - f(x_i)\right)^2 + (1 - p) \int f''(t)^2 \, dt $$
//!
//! With $p = 1$ the result is the natural cubic interpolating spline; with
//! $p = 0$ it is the weighted least-squares straight line. The solution is a
//! natural cubic spline with breaks at the data sites (Reinsch, 1967), found
//! from a symmetric positive-definite pentadiagonal system.

use crate::provider::OpticsError;

/// A piecewise cubic fitted by [`SmoothingSpline::fit`].
///
/// Piece $j$ is $a_j t^3 + b_j t^2 + c_j t + d_j$ with $t = x - x_j$.
/// Evaluation outside the break range extends the boundary pieces.
#[derive(Debug, Clone)]
pub struct SmoothingSpline {
    /// Strictly increasing break points (the distinct data sites).
    breaks: Vec<f64>,
    /// Polynomial coefficients `[a, b, c, d]` per piece.
    coefs: Vec<[f64; 4]>,
}

impl SmoothingSpline {
    /// Fit a smoothing spline to `(xs, ys)`.
    ///
    /// # Arguments
    /// * `xs` - Data sites, in any order. Coincident sites are merged into
    ///   one site carrying the weighted mean ordinate and the summed weight.
    /// * `ys` - Ordinates (same length as `xs`).
    /// * `weights` - Optional positive per-point weights (default 1).
    /// * `p` - Smoothing parameter in `[0, 1]`.
    pub fn fit(
        xs: &[f64],
        ys: &[f64],
        weights: Option<&[f64]>,
        p: f64,
    ) -> Result<Self, OpticsError> {
        if xs.len() != ys.len() {
            return Err(OpticsError::DataError(format!(
                "smoothing spline: {} sites but {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.is_empty() {
            return Err(OpticsError::DataError(
                "smoothing spline needs at least one data point".into(),
            ));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(OpticsError::DataError(format!(
                "smoothing parameter {} is outside [0, 1]",
                p
            )));
        }
        let unit_weights;
        let weights = match weights {
            Some(w) if w.len() != xs.len() => {
                return Err(OpticsError::DataError(format!(
                    "smoothing spline: {} sites but {} weights",
                    xs.len(),
                    w.len()
                )));
            }
            Some(w) => w,
            None => {
                unit_weights = vec![1.0; xs.len()];
                &unit_weights
            }
        };
        for i in 0..xs.len() {
            if !xs[i].is_finite() || !ys[i].is_finite() {
                return Err(OpticsError::DataError(format!(
                    "smoothing spline: non-finite data point ({}, {})",
                    xs[i], ys[i]
                )));
            }
            if !(weights[i].is_finite() && weights[i] > 0.0) {
                return Err(OpticsError::DataError(format!(
                    "smoothing spline: weight {} at x = {} must be positive",
                    weights[i], xs[i]
                )));
            }
        }

        let (x, y, w) = merge_coincident_sites(xs, ys, weights);
        let n = x.len();

        if n == 1 {
            return Ok(Self {
                breaks: x,
                coefs: vec![[0.0, 0.0, 0.0, y[0]]],
            });
        }

        let h: Vec<f64> = x.windows(2).map(|pair| pair[1] - pair[0]).collect();

        if n == 2 {
            let slope = (y[1] - y[0]) / h[0];
            return Ok(Self {
                breaks: x,
                coefs: vec![[0.0, 0.0, slope, y[0]]],
            });
        }

        let divdiff: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();
        let m = n - 2;
        let lambda = 6.0 * (1.0 - p);
        let w_recip: Vec<f64> = w.iter().map(|&wi| 1.0 / wi).collect();

        // Q^T has rows [1/h_i, -(1/h_i + 1/h_{i+1}), 1/h_{i+1}] at columns i..i+2.
        let qa: Vec<f64> = (0..m).map(|i| 1.0 / h[i]).collect();
        let qb: Vec<f64> = (0..m).map(|i| -(1.0 / h[i] + 1.0 / h[i + 1])).collect();
        let qc: Vec<f64> = (0..m).map(|i| 1.0 / h[i + 1]).collect();

        // A = 6(1-p) Q^T W^-1 Q + p R, stored by its three upper diagonals.
        let mut diag0 = vec![0.0; m];
        let mut diag1 = vec![0.0; m];
        let mut diag2 = vec![0.0; m];
        for i in 0..m {
            diag0[i] = lambda
                * (qa[i] * qa[i] * w_recip[i]
                    + qb[i] * qb[i] * w_recip[i + 1]
                    + qc[i] * qc[i] * w_recip[i + 2])
                + p * 2.0 * (h[i] + h[i + 1]);
            if i + 1 < m {
                diag1[i] = lambda
                    * (qb[i] * qa[i + 1] * w_recip[i + 1] + qc[i] * qb[i + 1] * w_recip[i + 2])
                    + p * h[i + 1];
            }
            if i + 2 < m {
                diag2[i] = lambda * qc[i] * qa[i + 2] * w_recip[i + 2];
            }
        }

        let rhs: Vec<f64> = (0..m).map(|i| divdiff[i + 1] - divdiff[i]).collect();
        let u = solve_symmetric_pentadiagonal(&diag0, &diag1, &diag2, &rhs)?;

        // Pad with the natural end conditions.
        let mut u_full = Vec::with_capacity(n);
        u_full.push(0.0);
        u_full.extend_from_slice(&u);
        u_full.push(0.0);

        let mut d1 = Vec::with_capacity(n + 1);
        d1.push(0.0);
        d1.extend((0..n - 1).map(|i| (u_full[i + 1] - u_full[i]) / h[i]));
        d1.push(0.0);

        // Smoothed ordinates at the sites.
        let fitted: Vec<f64> = (0..n)
            .map(|j| y[j] - lambda * w_recip[j] * (d1[j + 1] - d1[j]))
            .collect();

        let c: Vec<f64> = u_full.iter().map(|&ui| p * ui).collect();
        let coefs = (0..n - 1)
            .map(|i| {
                [
                    (c[i + 1] - c[i]) / h[i],
                    3.0 * c[i],
                    (fitted[i + 1] - fitted[i]) / h[i] - h[i] * (2.0 * c[i] + c[i + 1]),
                    fitted[i],
                ]
            })
            .collect();

        Ok(Self { breaks: x, coefs })
    }

    /// Evaluate the spline at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let idx = self
            .breaks
            .partition_point(|&b| b <= x)
            .saturating_sub(1)
            .min(self.coefs.len() - 1);
        let t = x - self.breaks[idx];
        let [a, b, c, d] = self.coefs[idx];
        ((a * t + b) * t + c) * t + d
    }

    /// Evaluate the spline at every value in `xs`.
    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Break points (distinct, sorted data sites).
    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }

    /// `[first, last]` break.
    pub fn domain(&self) -> (f64, f64) {
        (self.breaks[0], self.breaks[self.breaks.len() - 1])
    }
}

/// Sort the sites and merge exact duplicates (weighted mean, summed weight).
fn merge_coincident_sites(xs: &[f64], ys: &[f64], ws: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));

    let mut x: Vec<f64> = Vec::with_capacity(xs.len());
    let mut y: Vec<f64> = Vec::with_capacity(xs.len());
    let mut w: Vec<f64> = Vec::with_capacity(xs.len());
    for i in order {
        match x.last() {
            Some(&last) if last == xs[i] => {
                let j = x.len() - 1;
                w[j] += ws[i];
                y[j] += (ys[i] - y[j]) * ws[i] / w[j];
            }
            _ => {
                x.push(xs[i]);
                y.push(ys[i]);
                w.push(ws[i]);
            }
        }
    }
    (x, y, w)
}

/// Solve $A u = b$ for a symmetric positive-definite pentadiagonal $A$ by a
/// banded Cholesky factorisation.
///
/// `diag0[i] = A[i][i]`, `diag1[i] = A[i][i+1]`, `diag2[i] = A[i][i+2]`.
fn solve_symmetric_pentadiagonal(
    diag0: &[f64],
    diag1: &[f64],
    diag2: &[f64],
    rhs: &[f64],
) -> Result<Vec<f64>, OpticsError> {
    let m = diag0.len();
    // l0[i] = L[i][i], l1[i] = L[i][i-1], l2[i] = L[i][i-2]
    let mut l0 = vec![0.0; m];
    let mut l1 = vec![0.0; m];
    let mut l2 = vec![0.0; m];

    for i in 0..m {
        if i >= 2 {
            l2[i] = diag2[i - 2] / l0[i - 2];
        }
        if i >= 1 {
            let shared = if i >= 2 { l2[i] * l1[i - 1] } else { 0.0 };
            l1[i] = (diag1[i - 1] - shared) / l0[i - 1];
        }
        let pivot = diag0[i] - l1[i] * l1[i] - l2[i] * l2[i];
        if !(pivot.is_finite() && pivot > 0.0) {
            return Err(OpticsError::DataError(format!(
                "smoothing spline system is not positive definite (pivot {} at row {})",
                pivot, i
            )));
        }
        l0[i] = pivot.sqrt();
    }

    // Forward substitution: L z = b
    let mut z = vec![0.0; m];
    for i in 0..m {
        let mut s = rhs[i];
        if i >= 1 {
            s -= l1[i] * z[i - 1];
        }
        if i >= 2 {
            s -= l2[i] * z[i - 2];
        }
        z[i] = s / l0[i];
    }

    // Back substitution: L^T u = z
    let mut u = vec![0.0; m];
    for i in (0..m).rev() {
        let mut s = z[i];
        if i + 1 < m {
            s -= l1[i + 1] * u[i + 1];
        }
        if i + 2 < m {
            s -= l2[i + 2] * u[i + 2];
        }
        u[i] = s / l0[i];
    }

    Ok(u)
}

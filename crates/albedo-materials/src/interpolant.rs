//! Modified Akima interpolation with clamped extrapolation.
//!
//! Evaluates smooth tabulated curves at arbitrary abscissae without the
//! overshoot a global cubic spline shows next to sharp absorption bands.
//! Node slopes follow the modified Akima rule: for divided differences
//! $\delta_i$ the slope at node $i$ is
//!
//! $$ s_i = \frac{w_1 \delta_{i-1} + w_2 \delta_i}{w_1 + w_2}, \quad
//! w_1 = |\delta_{i+1} - \delta_i| + \tfrac{1}{2}|\delta_{i+1} + \delta_i|, \quad
//! w_2 = |\delta_{i-1} - \delta_{i-2}| + \tfrac{1}{2}|\delta_{i-1} + \delta_{i-2}| $$
//!
//! which reproduces flat runs exactly. Outside the knot range the nearest
//! boundary value is returned.

use crate::provider::OpticsError;

/// Piecewise cubic Hermite interpolant with modified Akima slopes.
#[derive(Debug, Clone)]
pub struct AkimaInterpolant {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl AkimaInterpolant {
    /// Build an interpolant through `(xs, ys)`.
    ///
    /// `xs` must be strictly increasing with at least two points; all values
    /// must be finite.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, OpticsError> {
        if xs.len() != ys.len() {
            return Err(OpticsError::DataError(format!(
                "interpolant: {} knots but {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(OpticsError::DataError(
                "interpolant needs at least 2 knots".into(),
            ));
        }
        if let Some((x, y)) = xs.iter().zip(&ys).find(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(OpticsError::DataError(format!(
                "interpolant: non-finite knot ({}, {})",
                x, y
            )));
        }
        if let Some(i) = (1..xs.len()).find(|&i| xs[i] <= xs[i - 1]) {
            return Err(OpticsError::DataError(format!(
                "interpolant knots must be strictly increasing at index {}",
                i
            )));
        }

        let slopes = akima_slopes(&xs, &ys);
        Ok(Self { xs, ys, slopes })
    }

    /// Evaluate at `x`, clamping to the boundary values outside the knots.
    ///
    /// A NaN abscissa yields NaN.
    pub fn evaluate(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        let lo = self.xs.partition_point(|&v| v <= x).saturating_sub(1).min(n - 2);
        let hi = lo + 1;
        let h = self.xs[hi] - self.xs[lo];
        let t = (x - self.xs[lo]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        (2.0 * t3 - 3.0 * t2 + 1.0) * self.ys[lo]
            + (t3 - 2.0 * t2 + t) * h * self.slopes[lo]
            + (-2.0 * t3 + 3.0 * t2) * self.ys[hi]
            + (t3 - t2) * h * self.slopes[hi]
    }

    /// Knot abscissae.
    pub fn knots(&self) -> &[f64] {
        &self.xs
    }

    /// `[first, last]` knot.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

fn akima_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let delta: Vec<f64> = (0..n - 1)
        .map(|i| (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]))
        .collect();

    if n == 2 {
        return vec![delta[0]; 2];
    }

    // Two ghost differences on each side by linear extension.
    let mut ext = Vec::with_capacity(n + 3);
    let left1 = 2.0 * delta[0] - delta[1];
    let left2 = 2.0 * left1 - delta[0];
    ext.push(left2);
    ext.push(left1);
    ext.extend_from_slice(&delta);
    let right1 = 2.0 * delta[n - 2] - delta[n - 3];
    let right2 = 2.0 * right1 - delta[n - 2];
    ext.push(right1);
    ext.push(right2);

    // ext[i + 2] is delta_i
    (0..n)
        .map(|i| {
            let (dm2, dm1, d0, dp1) = (ext[i], ext[i + 1], ext[i + 2], ext[i + 3]);
            let w1 = (dp1 - d0).abs() + 0.5 * (dp1 + d0).abs();
            let w2 = (dm1 - dm2).abs() + 0.5 * (dm1 + dm2).abs();
            if w1 + w2 == 0.0 {
                0.5 * (dm1 + d0)
            } else {
                (w1 * dm1 + w2 * d0) / (w1 + w2)
            }
        })
        .collect()
}

//! Mineral dust refractive index.
//!
//! The real part is the constant 1.55. The imaginary part is a weighted
//! smoothing spline through empirical absorption points between 0.30 and
//! 2.50 um (Skiles et al., 2016; Zender). Queries outside the fitted range are
//! clamped to the nearest end of the range without a warning.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::datasets::{DatasetStore, DustPoint};
use crate::provider::{MediumProvider, MediumSamples, OpticsError};
use crate::spline::SmoothingSpline;

/// Real refractive index of mineral dust.
pub const DUST_REAL_INDEX: f64 = 1.55;

/// Smoothing parameter of the absorption fit.
pub const DUST_SMOOTHING: f64 = 0.97;

/// Fitted dust absorption curve.
#[derive(Debug, Clone)]
pub struct DustSpline {
    spline: SmoothingSpline,
}

impl DustSpline {
    /// Fit the weighted smoothing spline to the empirical points.
    pub fn fit(points: &[DustPoint]) -> Result<Self, OpticsError> {
        if let Some(p) = points
            .iter()
            .find(|p| !(p.wavelength_um.is_finite() && p.wavelength_um > 0.0))
        {
            return Err(OpticsError::DataError(format!(
                "dust point has invalid wavelength {}",
                p.wavelength_um
            )));
        }
        let wavelengths: Vec<f64> = points.iter().map(|p| p.wavelength_um).collect();
        let k: Vec<f64> = points.iter().map(|p| p.imag_index).collect();
        let weights: Vec<f64> = points.iter().map(|p| p.weight).collect();

        let spline = SmoothingSpline::fit(&wavelengths, &k, Some(&weights), DUST_SMOOTHING)?;
        Ok(Self { spline })
    }

    /// `[min, max]` wavelength (um) of the fit.
    pub fn domain(&self) -> (f64, f64) {
        self.spline.domain()
    }

    /// Absorption at `wavelength_um`, clamped to the fitted range.
    pub fn imag_index(&self, wavelength_um: f64) -> f64 {
        let (lo, hi) = self.domain();
        self.spline.evaluate(wavelength_um.clamp(lo, hi))
    }
}

impl MediumProvider for DustSpline {
    fn name(&self) -> &str {
        "dust"
    }

    fn citation(&self) -> &str {
        "Skiles et al. (2016); Zender"
    }

    fn wavelength_range(&self) -> Option<(f64, f64)> {
        Some(self.domain())
    }

    fn evaluate(&self, wavelengths_um: &[f64]) -> MediumSamples {
        MediumSamples {
            n: vec![DUST_REAL_INDEX; wavelengths_um.len()],
            k: wavelengths_um.iter().map(|&w| self.imag_index(w)).collect(),
            out_of_range: false,
        }
    }
}

/// Lazily fitted dust model.
pub struct DustModel {
    store: Arc<dyn DatasetStore>,
    spline: OnceCell<DustSpline>,
}

impl DustModel {
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self {
            store,
            spline: OnceCell::new(),
        }
    }

    /// The fitted spline, built on first use.
    pub fn spline(&self) -> Result<&DustSpline, OpticsError> {
        self.spline.get_or_try_init(|| {
            let points = self.store.load_dust_points()?;
            log::debug!("Fitting dust absorption to {} points", points.len());
            DustSpline::fit(&points)
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.spline.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::EmbeddedDatasets;

    fn model() -> DustModel {
        DustModel::new(Arc::new(EmbeddedDatasets))
    }

    #[test]
    fn test_visible_absorption_matches_empirical_range() {
        let dust = model();
        let spline = dust.spline().unwrap();
        let k = spline.imag_index(0.55);
        assert!((8e-4..=2e-3).contains(&k), "k(0.55) = {:e}", k);
        assert_eq!(spline.refractive_index(0.55).re, DUST_REAL_INDEX);
    }

    #[test]
    fn test_absorption_decreases_from_uv_to_near_infrared() {
        let dust = model();
        let spline = dust.spline().unwrap();
        assert!(spline.imag_index(0.35) > spline.imag_index(0.55));
        assert!(spline.imag_index(0.55) > spline.imag_index(0.9));
    }

    #[test]
    fn test_silent_clamping_outside_fit() {
        let dust = model();
        let spline = dust.spline().unwrap();
        assert_eq!(spline.domain(), (0.30, 2.50));

        let samples = spline.evaluate(&[0.1, 0.30, 10.0, 2.50]);
        assert!(!samples.out_of_range);
        assert_eq!(samples.k[0], samples.k[1]);
        assert_eq!(samples.k[2], samples.k[3]);
        assert!(samples.n.iter().all(|&n| n == DUST_REAL_INDEX));
    }

    #[test]
    fn test_fit_is_cached() {
        let dust = model();
        assert!(!dust.is_fitted());
        let a = dust.spline().unwrap() as *const DustSpline;
        let b = dust.spline().unwrap() as *const DustSpline;
        assert_eq!(a, b);
        assert!(dust.is_fitted());
    }

    #[test]
    fn test_invalid_weight_is_rejected() {
        let points = vec![
            DustPoint { wavelength_um: 0.4, imag_index: 2e-3, weight: 1.0 },
            DustPoint { wavelength_um: 0.5, imag_index: 1e-3, weight: -1.0 },
        ];
        assert!(DustSpline::fit(&points).is_err());
    }
}

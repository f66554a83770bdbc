//! Medium provider trait.
//!
//! Every optical medium (tabulated ice and water, fitted dust, constant soot)
//! implements [`MediumProvider`], which evaluates the complex refractive index
//! $\tilde{n} = n + ik$ over a batch of wavelengths given in micrometres.

use num_complex::Complex64;
use thiserror::Error;

/// Errors from dataset loading, curve fitting and index queries.
#[derive(Debug, Error)]
pub enum OpticsError {
    #[error("Unrecognized substance '{0}'. Valid substances: ice, snow, water, dust, soot")]
    InvalidSubstance(String),

    #[error("A wavelength must be supplied for {0}: it has no native wavelength grid")]
    MissingWavelength(String),

    #[error("Unsupported wavelength unit '{0}'. Valid units: um, mum, nm, mm, cm, m, GHz")]
    UnsupportedUnit(String),

    #[error("Wavelength {0} um is not a positive finite value")]
    InvalidWavelength(f64),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dataset: {0}")]
    Csv(#[from] csv::Error),
}

/// Real and imaginary index columns evaluated over a batch of wavelengths.
#[derive(Debug, Clone, PartialEq)]
pub struct MediumSamples {
    /// Real part $n$ at each query wavelength.
    pub n: Vec<f64>,
    /// Imaginary part $k$ at each query wavelength.
    pub k: Vec<f64>,
    /// `true` when at least one query fell outside the tabulated range and
    /// was answered with the nearest boundary value.
    pub out_of_range: bool,
}

impl MediumSamples {
    /// Assemble $n + i|k|$. A passive medium never has negative absorption.
    pub fn to_complex(&self) -> Vec<Complex64> {
        self.n
            .iter()
            .zip(self.k.iter())
            .map(|(&n, &k)| Complex64::new(n, k.abs()))
            .collect()
    }
}

/// Provides wavelength-dependent complex refractive indices.
///
/// Implementations are immutable once constructed and are shared across
/// threads by the engine.
pub trait MediumProvider: Send + Sync {
    /// Human-readable name of this medium.
    fn name(&self) -> &str;

    /// Literature source of the underlying data or constants.
    fn citation(&self) -> &str;

    /// Wavelength range (um) covered by the underlying data, if any.
    fn wavelength_range(&self) -> Option<(f64, f64)>;

    /// Wavelengths (um) at which the medium was originally tabulated.
    ///
    /// Media without a native grid (fits and constants) return `None`.
    fn native_grid_um(&self) -> Option<Vec<f64>> {
        None
    }

    /// Evaluate $n$ and $k$ at every wavelength in `wavelengths_um`.
    fn evaluate(&self, wavelengths_um: &[f64]) -> MediumSamples;

    /// Complex refractive index at a single wavelength.
    fn refractive_index(&self, wavelength_um: f64) -> Complex64 {
        let samples = self.evaluate(&[wavelength_um]);
        Complex64::new(samples.n[0], samples.k[0].abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_complex_forces_nonnegative_absorption() {
        let samples = MediumSamples {
            n: vec![1.3, 1.5],
            k: vec![-2.0e-3, 4.0e-3],
            out_of_range: false,
        };
        let z = samples.to_complex();
        assert_eq!(z[0], Complex64::new(1.3, 2.0e-3));
        assert_eq!(z[1], Complex64::new(1.5, 4.0e-3));
    }

    #[test]
    fn test_error_messages_name_the_offending_input() {
        let err = OpticsError::InvalidSubstance("glass".into()).to_string();
        assert!(err.contains("glass"), "{}", err);
        let err = OpticsError::UnsupportedUnit("furlong".into()).to_string();
        assert!(err.contains("furlong"), "{}", err);
    }
}

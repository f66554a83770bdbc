//! Soot (black carbon) refractive index.
//!
//! Constant $\tilde{n} = 1.95 + 0.79i$ recommended by
//! T. C. Bond and R. W. Bergstrom, *Aerosol Sci. Technol.* **40**, 27 (2006).

use crate::provider::{MediumProvider, MediumSamples};

pub const SOOT_REAL_INDEX: f64 = 1.95;
pub const SOOT_IMAG_INDEX: f64 = 0.79;

/// Wavelength-independent soot model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SootModel;

impl MediumProvider for SootModel {
    fn name(&self) -> &str {
        "soot"
    }

    fn citation(&self) -> &str {
        "Bond & Bergstrom (2006)"
    }

    fn wavelength_range(&self) -> Option<(f64, f64)> {
        None
    }

    fn evaluate(&self, wavelengths_um: &[f64]) -> MediumSamples {
        MediumSamples {
            n: vec![SOOT_REAL_INDEX; wavelengths_um.len()],
            k: vec![SOOT_IMAG_INDEX; wavelengths_um.len()],
            out_of_range: false,
        }
    }
}

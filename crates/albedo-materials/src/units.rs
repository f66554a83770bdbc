//! Wavelength unit conversion.
//!
//! All internal computation happens in micrometres; conversion is done only at
//! the boundary of a query. Frequencies in GHz are mapped to vacuum
//! wavelengths through $\lambda = c / f$.

use std::fmt;
use std::str::FromStr;

use crate::provider::OpticsError;

/// Speed of light expressed in um·GHz, so that $\lambda_{\mu m} = c / f_{GHz}$.
const SPEED_OF_LIGHT_UM_GHZ: f64 = 299_792.458;

/// A supported wavelength (or frequency) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WavelengthUnit {
    Micrometre,
    Nanometre,
    Millimetre,
    Centimetre,
    Metre,
    Gigahertz,
}

impl WavelengthUnit {
    /// Every supported unit, in display order.
    pub fn all() -> [WavelengthUnit; 6] {
        [
            WavelengthUnit::Micrometre,
            WavelengthUnit::Nanometre,
            WavelengthUnit::Millimetre,
            WavelengthUnit::Centimetre,
            WavelengthUnit::Metre,
            WavelengthUnit::Gigahertz,
        ]
    }

    /// Short label used in file headers (`um`, `nm`, `GHz`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            WavelengthUnit::Micrometre => "um",
            WavelengthUnit::Nanometre => "nm",
            WavelengthUnit::Millimetre => "mm",
            WavelengthUnit::Centimetre => "cm",
            WavelengthUnit::Metre => "m",
            WavelengthUnit::Gigahertz => "GHz",
        }
    }

    /// Convert `value` expressed in this unit to micrometres.
    pub fn to_micrometres(&self, value: f64) -> f64 {
        match self {
            WavelengthUnit::Micrometre => value,
            WavelengthUnit::Nanometre => value / 1.0e3,
            WavelengthUnit::Millimetre => value * 1.0e3,
            WavelengthUnit::Centimetre => value * 1.0e4,
            WavelengthUnit::Metre => value * 1.0e6,
            WavelengthUnit::Gigahertz => SPEED_OF_LIGHT_UM_GHZ / value,
        }
    }

    /// Convert a wavelength in micrometres to this unit.
    pub fn from_micrometres(&self, um: f64) -> f64 {
        match self {
            WavelengthUnit::Micrometre => um,
            WavelengthUnit::Nanometre => um * 1.0e3,
            WavelengthUnit::Millimetre => um / 1.0e3,
            WavelengthUnit::Centimetre => um / 1.0e4,
            WavelengthUnit::Metre => um / 1.0e6,
            WavelengthUnit::Gigahertz => SPEED_OF_LIGHT_UM_GHZ / um,
        }
    }
}

impl Default for WavelengthUnit {
    fn default() -> Self {
        WavelengthUnit::Micrometre
    }
}

impl fmt::Display for WavelengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WavelengthUnit {
    type Err = OpticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "um" | "mum" | "μm" | "µm" | "micron" | "microns" => Ok(WavelengthUnit::Micrometre),
            "nm" => Ok(WavelengthUnit::Nanometre),
            "mm" => Ok(WavelengthUnit::Millimetre),
            "cm" => Ok(WavelengthUnit::Centimetre),
            "m" => Ok(WavelengthUnit::Metre),
            "ghz" => Ok(WavelengthUnit::Gigahertz),
            _ => Err(OpticsError::UnsupportedUnit(s.to_string())),
        }
    }
}

/// Convert `value` between two unit names.
///
/// Fails with [`OpticsError::UnsupportedUnit`] naming the first unit string
/// that is not recognised.
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, OpticsError> {
    let from: WavelengthUnit = from.parse()?;
    let to: WavelengthUnit = to.parse()?;
    Ok(to.from_micrometres(from.to_micrometres(value)))
}

//! Refractive index queries.
//!
//! [`RefractiveIndexEngine::compute`] is the single entry point callers use:
//! it parses the substance and unit, converts wavelengths to micrometres,
//! dispatches to the medium model, evaluates the whole array as one batch and
//! reshapes the result to the input shape.
//!
//! ```
//! use albedo_materials::engine::RefractiveIndexEngine;
//!
//! let engine = RefractiveIndexEngine::embedded();
//! let result = engine.compute_slice(&[400.0, 600.0, 800.0], "soot", "nm").unwrap();
//! assert!(result.index.iter().all(|z| z.re == 1.95 && z.im == 0.79));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::{arr0, Array1, ArrayD};
use num_complex::Complex64;
use once_cell::sync::Lazy;

use crate::cache::{InterpolantCache, TabulatedMedium};
use crate::datasets::{DatasetStore, EmbeddedDatasets};
use crate::dust::DustModel;
use crate::provider::{MediumProvider, OpticsError};
use crate::soot::SootModel;
use crate::units::WavelengthUnit;

/// A supported optical medium. `"snow"` parses to [`Substance::Ice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Substance {
    Ice,
    Water,
    Dust,
    Soot,
}

impl Substance {
    pub fn all() -> [Substance; 4] {
        [Substance::Ice, Substance::Water, Substance::Dust, Substance::Soot]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Substance::Ice => "ice",
            Substance::Water => "water",
            Substance::Dust => "dust",
            Substance::Soot => "soot",
        }
    }

    /// Ice and water are tabulated and can be queried on their own grid.
    pub fn has_native_grid(&self) -> bool {
        matches!(self, Substance::Ice | Substance::Water)
    }
}

impl fmt::Display for Substance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Substance {
    type Err = OpticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ice" | "snow" => Ok(Substance::Ice),
            "water" => Ok(Substance::Water),
            "dust" => Ok(Substance::Dust),
            "soot" => Ok(Substance::Soot),
            _ => Err(OpticsError::InvalidSubstance(s.to_string())),
        }
    }
}

/// Result of a refractive index query.
#[derive(Debug, Clone, PartialEq)]
pub struct RefractiveIndex {
    pub substance: Substance,
    /// $n + ik$, same shape as the query (1-D for a native-grid query).
    pub index: ArrayD<Complex64>,
    /// Wavelengths used, expressed in [`RefractiveIndex::units`].
    pub wavelengths: ArrayD<f64>,
    pub units: WavelengthUnit,
    /// Some query fell outside the tabulated range and was clamped.
    pub out_of_range: bool,
}

impl RefractiveIndex {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Evaluates complex refractive indices for every [`Substance`].
///
/// Tabulated interpolants and the dust fit are built lazily on first use and
/// shared by all later queries; the engine is `Send + Sync`.
pub struct RefractiveIndexEngine {
    tables: InterpolantCache,
    dust: DustModel,
    soot: SootModel,
}

impl RefractiveIndexEngine {
    /// Engine reading its tables from `store`.
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self {
            tables: InterpolantCache::new(store.clone()),
            dust: DustModel::new(store),
            soot: SootModel,
        }
    }

    /// Engine backed by the tables compiled into the library.
    pub fn embedded() -> Self {
        Self::new(Arc::new(EmbeddedDatasets))
    }

    /// Compute the complex refractive index of `substance` at `wave`.
    ///
    /// # Arguments
    /// * `wave` - Wavelengths in `units`, any shape. An empty array selects the
    ///   native grid of ice or water.
    /// * `substance` - `ice`, `snow`, `water`, `dust` or `soot` (any case).
    /// * `units` - `um` (alias `mum`), `nm`, `mm`, `cm`, `m` or `GHz`.
    ///
    /// Queries outside the ice or water tables are answered with the nearest
    /// boundary value, logged as a warning and flagged in the result.
    pub fn compute(
        &self,
        wave: &ArrayD<f64>,
        substance: &str,
        units: &str,
    ) -> Result<RefractiveIndex, OpticsError> {
        let substance: Substance = substance.parse()?;
        let unit: WavelengthUnit = units.parse()?;

        if wave.is_empty() && !substance.has_native_grid() {
            return Err(OpticsError::MissingWavelength(substance.to_string()));
        }
        let provider = self.provider(substance)?;

        let query_um: ArrayD<f64> = if wave.is_empty() {
            let grid = provider
                .native_grid_um()
                .ok_or_else(|| OpticsError::MissingWavelength(substance.to_string()))?;
            Array1::from(grid).into_dyn()
        } else if unit == WavelengthUnit::Micrometre {
            wave.clone()
        } else {
            wave.mapv(|w| unit.to_micrometres(w))
        };

        if let Some(&bad) = query_um.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(OpticsError::InvalidWavelength(bad));
        }

        let flat: Vec<f64> = query_um.iter().copied().collect();
        let samples = provider.evaluate(&flat);
        if samples.out_of_range {
            log::warn!(
                "{}: values outside tabulated range; nearest-neighbor values used",
                substance
            );
        }

        let index = ArrayD::from_shape_vec(query_um.raw_dim(), samples.to_complex())
            .map_err(|e| OpticsError::DataError(format!("result shape mismatch: {}", e)))?;
        let wavelengths = if unit == WavelengthUnit::Micrometre {
            query_um
        } else {
            query_um.mapv(|w| unit.from_micrometres(w))
        };

        Ok(RefractiveIndex {
            substance,
            index,
            wavelengths,
            units: unit,
            out_of_range: samples.out_of_range,
        })
    }

    /// [`compute`](Self::compute) for a 1-D slice of wavelengths.
    pub fn compute_slice(
        &self,
        wave: &[f64],
        substance: &str,
        units: &str,
    ) -> Result<RefractiveIndex, OpticsError> {
        self.compute(&Array1::from(wave.to_vec()).into_dyn(), substance, units)
    }

    /// [`compute`](Self::compute) for a single wavelength.
    pub fn compute_one(
        &self,
        wavelength: f64,
        substance: &str,
        units: &str,
    ) -> Result<Complex64, OpticsError> {
        let result = self.compute(&arr0(wavelength).into_dyn(), substance, units)?;
        result
            .index
            .first()
            .copied()
            .ok_or_else(|| OpticsError::DataError("empty result for a scalar query".into()))
    }

    /// Native wavelength grid (um) of a tabulated substance.
    pub fn native_grid(&self, substance: Substance) -> Result<Vec<f64>, OpticsError> {
        self.provider(substance)?
            .native_grid_um()
            .ok_or_else(|| OpticsError::MissingWavelength(substance.to_string()))
    }

    /// The model answering queries for `substance`, building it if needed.
    pub fn provider(&self, substance: Substance) -> Result<&dyn MediumProvider, OpticsError> {
        let provider: &dyn MediumProvider = match substance {
            Substance::Ice => self.tables.get(TabulatedMedium::Ice)?,
            Substance::Water => self.tables.get(TabulatedMedium::Water)?,
            Substance::Dust => self.dust.spline()?,
            Substance::Soot => &self.soot,
        };
        Ok(provider)
    }

    /// Build every lazily constructed model now.
    pub fn warm_up(&self) -> Result<(), OpticsError> {
        for substance in Substance::all() {
            self.provider(substance)?;
        }
        Ok(())
    }
}

impl Default for RefractiveIndexEngine {
    fn default() -> Self {
        Self::embedded()
    }
}

static DEFAULT_ENGINE: Lazy<RefractiveIndexEngine> = Lazy::new(RefractiveIndexEngine::embedded);

/// Process-wide engine backed by the embedded tables.
pub fn default_engine() -> &'static RefractiveIndexEngine {
    &DEFAULT_ENGINE
}

/// [`RefractiveIndexEngine::compute`] on the process-wide engine.
pub fn refractive_index(
    wave: &ArrayD<f64>,
    substance: &str,
    units: &str,
) -> Result<RefractiveIndex, OpticsError> {
    DEFAULT_ENGINE.compute(wave, substance, units)
}

//! Lazily built interpolants for the tabulated media (ice and water).
//!
//! Building an entry loads the raw tables, runs the reconciliation or
//! smoothing pass and fits two [`AkimaInterpolant`]s over $\ln\lambda$: one
//! for $n$ and one for $\ln k$. Interpolating $\ln k$ keeps the absorption
//! strictly positive after exponentiation.
//!
//! Each entry is built at most once per [`InterpolantCache`]. Concurrent first
//! callers block until the single build finishes; a failed build publishes
//! nothing and the next call retries.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::datasets::DatasetStore;
use crate::interpolant::AkimaInterpolant;
use crate::provider::{MediumProvider, MediumSamples, OpticsError};
use crate::reconcile::{reconcile_ice, smooth_water, ReconciledCurve};

/// Slack on the log-wavelength domain check, so that the native grid
/// (exponentiated knots) never reports itself as out of range.
const DOMAIN_TOLERANCE: f64 = 1e-12;

/// A medium backed by tabulated optical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabulatedMedium {
    Ice,
    Water,
}

impl TabulatedMedium {
    pub fn name(&self) -> &'static str {
        match self {
            TabulatedMedium::Ice => "ice",
            TabulatedMedium::Water => "water",
        }
    }

    pub fn citation(&self) -> &'static str {
        match self {
            TabulatedMedium::Ice => {
                "Warren & Brandt (2008), UV/visible corrected with Picard et al. (2016)"
            }
            TabulatedMedium::Water => "Hale & Querry (1973)",
        }
    }
}

/// Interpolants and log-wavelength domain for one tabulated medium.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    medium: TabulatedMedium,
    real: AkimaInterpolant,
    log_imag: AkimaInterpolant,
    log_domain: (f64, f64),
}

impl CacheEntry {
    /// Fit the real and log-imaginary interpolants to a smoothed curve.
    pub fn from_curve(medium: TabulatedMedium, curve: &ReconciledCurve) -> Result<Self, OpticsError> {
        let log_wl: Vec<f64> = curve.wavelengths_um().iter().map(|w| w.ln()).collect();
        let log_k: Vec<f64> = curve.imag_index().iter().map(|k| k.ln()).collect();

        let real = AkimaInterpolant::new(log_wl.clone(), curve.real_index())?;
        let log_imag = AkimaInterpolant::new(log_wl, log_k)?;
        let log_domain = real.domain();

        Ok(Self {
            medium,
            real,
            log_imag,
            log_domain,
        })
    }

    /// `[min, max]` of $\ln\lambda$ (um) covered by the data.
    pub fn log_domain(&self) -> (f64, f64) {
        self.log_domain
    }

    /// Whether a log-wavelength lies inside the tabulated domain.
    pub fn in_domain(&self, log_wavelength: f64) -> bool {
        let (lo, hi) = self.log_domain;
        log_wavelength >= lo - DOMAIN_TOLERANCE && log_wavelength <= hi + DOMAIN_TOLERANCE
    }
}

impl MediumProvider for CacheEntry {
    fn name(&self) -> &str {
        self.medium.name()
    }

    fn citation(&self) -> &str {
        self.medium.citation()
    }

    fn wavelength_range(&self) -> Option<(f64, f64)> {
        let (lo, hi) = self.log_domain;
        Some((lo.exp(), hi.exp()))
    }

    fn native_grid_um(&self) -> Option<Vec<f64>> {
        Some(self.real.knots().iter().map(|x| x.exp()).collect())
    }

    fn evaluate(&self, wavelengths_um: &[f64]) -> MediumSamples {
        let mut n = Vec::with_capacity(wavelengths_um.len());
        let mut k = Vec::with_capacity(wavelengths_um.len());
        let mut out_of_range = false;

        for &wl in wavelengths_um {
            let x = wl.ln();
            out_of_range |= !self.in_domain(x);
            n.push(self.real.evaluate(x));
            k.push(self.log_imag.evaluate(x).exp());
        }

        MediumSamples { n, k, out_of_range }
    }
}

/// At-most-once cache of [`CacheEntry`] values for ice and water.
pub struct InterpolantCache {
    store: Arc<dyn DatasetStore>,
    ice: OnceCell<CacheEntry>,
    water: OnceCell<CacheEntry>,
}

impl InterpolantCache {
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self {
            store,
            ice: OnceCell::new(),
            water: OnceCell::new(),
        }
    }

    /// Return the entry for `medium`, building it on first use.
    pub fn get(&self, medium: TabulatedMedium) -> Result<&CacheEntry, OpticsError> {
        self.cell(medium).get_or_try_init(|| self.build(medium))
    }

    /// Whether the entry for `medium` has been published.
    pub fn is_built(&self, medium: TabulatedMedium) -> bool {
        self.cell(medium).get().is_some()
    }

    fn cell(&self, medium: TabulatedMedium) -> &OnceCell<CacheEntry> {
        match medium {
            TabulatedMedium::Ice => &self.ice,
            TabulatedMedium::Water => &self.water,
        }
    }

    fn build(&self, medium: TabulatedMedium) -> Result<CacheEntry, OpticsError> {
        log::debug!("Building {} interpolants", medium.name());
        let curve = match medium {
            TabulatedMedium::Ice => {
                let ice = self.store.load_ice_table()?;
                let picard = self.store.load_picard_table()?;
                reconcile_ice(&ice, &picard)?
            }
            TabulatedMedium::Water => smooth_water(&self.store.load_water_table()?)?,
        };
        let entry = CacheEntry::from_curve(medium, &curve)?;
        let (lo, hi) = entry.log_domain();
        log::info!(
            "{} interpolants ready: {} wavelengths, {:.4}-{:.1} um",
            medium.name(),
            curve.len(),
            lo.exp(),
            hi.exp()
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{AbsorptionTable, DustPoint, EmbeddedDatasets, OpticalRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embedded data, counting how often each table is read.
    #[derive(Default)]
    struct CountingStore {
        ice_loads: AtomicUsize,
        water_loads: AtomicUsize,
    }

    impl DatasetStore for CountingStore {
        fn load_ice_table(&self) -> Result<Vec<OpticalRecord>, OpticsError> {
            self.ice_loads.fetch_add(1, Ordering::SeqCst);
            EmbeddedDatasets.load_ice_table()
        }
        fn load_water_table(&self) -> Result<Vec<OpticalRecord>, OpticsError> {
            self.water_loads.fetch_add(1, Ordering::SeqCst);
            EmbeddedDatasets.load_water_table()
        }
        fn load_picard_table(&self) -> Result<AbsorptionTable, OpticsError> {
            EmbeddedDatasets.load_picard_table()
        }
        fn load_dust_points(&self) -> Result<Vec<DustPoint>, OpticsError> {
            EmbeddedDatasets.load_dust_points()
        }
    }

    /// Water table with a zero absorption value, which cannot be log-fitted.
    struct BrokenWaterStore;

    impl DatasetStore for BrokenWaterStore {
        fn load_ice_table(&self) -> Result<Vec<OpticalRecord>, OpticsError> {
            EmbeddedDatasets.load_ice_table()
        }
        fn load_water_table(&self) -> Result<Vec<OpticalRecord>, OpticsError> {
            let mut table = EmbeddedDatasets.load_water_table()?;
            table[3].imag_index = 0.0;
            Ok(table)
        }
        fn load_picard_table(&self) -> Result<AbsorptionTable, OpticsError> {
            EmbeddedDatasets.load_picard_table()
        }
        fn load_dust_points(&self) -> Result<Vec<DustPoint>, OpticsError> {
            EmbeddedDatasets.load_dust_points()
        }
    }

    #[test]
    fn test_entry_is_built_once_and_reused() {
        let store = Arc::new(CountingStore::default());
        let cache = InterpolantCache::new(store.clone());
        assert!(!cache.is_built(TabulatedMedium::Water));

        let first = cache.get(TabulatedMedium::Water).unwrap() as *const CacheEntry;
        let second = cache.get(TabulatedMedium::Water).unwrap() as *const CacheEntry;
        assert_eq!(first, second);
        assert_eq!(store.water_loads.load(Ordering::SeqCst), 1);
        assert_eq!(store.ice_loads.load(Ordering::SeqCst), 0);
        assert!(cache.is_built(TabulatedMedium::Water));
        assert!(!cache.is_built(TabulatedMedium::Ice));
    }

    #[test]
    fn test_concurrent_first_calls_build_once() {
        let store = Arc::new(CountingStore::default());
        let cache = InterpolantCache::new(store.clone());

        let addresses: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| cache.get(TabulatedMedium::Ice).unwrap() as *const CacheEntry as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.ice_loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_build_publishes_nothing() {
        let cache = InterpolantCache::new(Arc::new(BrokenWaterStore));
        let err = cache.get(TabulatedMedium::Water).unwrap_err();
        assert!(matches!(err, OpticsError::DataError(_)), "{}", err);
        assert!(!cache.is_built(TabulatedMedium::Water));
        // Ice does not depend on the broken table.
        assert!(cache.get(TabulatedMedium::Ice).is_ok());
    }

    #[test]
    fn test_native_grid_is_inside_domain() {
        let cache = InterpolantCache::new(Arc::new(EmbeddedDatasets));
        let entry = cache.get(TabulatedMedium::Ice).unwrap();
        let grid = entry.native_grid_um().unwrap();
        let samples = entry.evaluate(&grid);
        assert!(!samples.out_of_range);
        assert_eq!(samples.n.len(), grid.len());
        assert!(samples.k.iter().all(|&k| k > 0.0));
    }

    #[test]
    fn test_out_of_domain_is_flagged_and_clamped() {
        let cache = InterpolantCache::new(Arc::new(EmbeddedDatasets));
        let entry = cache.get(TabulatedMedium::Water).unwrap();
        let (lo, hi) = entry.wavelength_range().unwrap();

        let inside = entry.evaluate(&[(lo * hi).sqrt()]);
        assert!(!inside.out_of_range);

        let outside = entry.evaluate(&[hi * 100.0]);
        assert!(outside.out_of_range);
        let edge = entry.evaluate(&[hi]);
        assert!((outside.n[0] - edge.n[0]).abs() < 1e-9);
        assert!((outside.k[0] / edge.k[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_wavelength_yields_nan_without_panicking() {
        let cache = InterpolantCache::new(Arc::new(EmbeddedDatasets));
        let entry = cache.get(TabulatedMedium::Water).unwrap();

        let z = entry.refractive_index(-1.0);
        assert!(z.re.is_nan() && z.im.is_nan());

        let samples = entry.evaluate(&[f64::NAN, 0.5]);
        assert!(samples.out_of_range);
        assert!(samples.n[0].is_nan());
        assert!(samples.n[1] > 1.3 && samples.n[1] < 1.4);
    }
}

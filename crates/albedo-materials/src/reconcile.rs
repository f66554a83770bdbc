//! Reconciliation and smoothing of tabulated ice and water optical constants.
//!
//! Ice absorption in the UV and visible comes from two sources that disagree:
//! the Warren & Brandt (2008) compilation and the Picard et al. (2016)
//! measurements. [`reconcile_ice`] splices them in log-log space: below the
//! longest Picard wavelength both sources feed one smoothing spline, above it
//! the original table is kept, and a final rigid smoothing pass removes the
//! kink at the splice. Water has a single source and is only re-smoothed
//! ([`smooth_water`]).

use crate::datasets::{validate_table, AbsorptionTable, OpticalRecord};
use crate::provider::OpticsError;
use crate::spline::SmoothingSpline;

/// Smoothing parameter for blending the two ice absorption sources.
pub const BLEND_SMOOTHING: f64 = 0.97;

/// Smoothing parameter for the final real and imaginary curves.
pub const CURVE_SMOOTHING: f64 = 0.9999;

/// A smoothed optical-constant curve on a strictly increasing wavelength axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledCurve {
    pub records: Vec<OpticalRecord>,
}

impl ReconciledCurve {
    pub fn wavelengths_um(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.wavelength_um).collect()
    }

    pub fn real_index(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.real_index).collect()
    }

    pub fn imag_index(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.imag_index).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Merge the Picard UV/visible correction into the ice table.
///
/// The returned axis is the sorted, de-duplicated union of the ice and Picard
/// wavelengths up to the longest Picard wavelength, followed by the remaining
/// ice wavelengths.
pub fn reconcile_ice(
    ice: &[OpticalRecord],
    picard: &AbsorptionTable,
) -> Result<ReconciledCurve, OpticsError> {
    validate_table("ice", ice)?;
    if picard.is_empty() || picard.imag_index.len() != picard.len() {
        return Err(OpticsError::DataError(format!(
            "Picard table has {} wavelengths and {} absorption values",
            picard.len(),
            picard.imag_index.len()
        )));
    }
    let picard_max = picard
        .max_wavelength()
        .filter(|m| m.is_finite())
        .ok_or_else(|| OpticsError::DataError("Picard table has no finite wavelength".into()))?;

    // Last ice row inside the Picard range.
    let cutoff = ice
        .iter()
        .rposition(|r| r.wavelength_um <= picard_max)
        .ok_or_else(|| {
            OpticsError::DataError(format!(
                "Picard table (max {} um) does not overlap the ice table (min {} um)",
                picard_max, ice[0].wavelength_um
            ))
        })?;
    let (corrected, retained) = ice.split_at(cutoff + 1);
    log::debug!(
        "Reconciling ice: {} rows below {} um blended with {} Picard rows, {} rows retained",
        corrected.len(),
        picard_max,
        picard.len(),
        retained.len()
    );

    let blend_x: Vec<f64> = corrected
        .iter()
        .map(|r| r.wavelength_um)
        .chain(picard.wavelengths_um.iter().copied())
        .collect();
    let blend_k: Vec<f64> = corrected
        .iter()
        .map(|r| r.imag_index)
        .chain(picard.imag_index.iter().copied())
        .collect();
    let blend = SmoothingSpline::fit(
        &ln_positive("ice/Picard wavelength", &blend_x)?,
        &ln_positive("ice/Picard absorption", &blend_k)?,
        None,
        BLEND_SMOOTHING,
    )?;

    // The blend spline's breaks are exactly the de-duplicated corrected axis.
    let corrected_ln_wl = blend.breaks().to_vec();
    let retained_wl: Vec<f64> = retained.iter().map(|r| r.wavelength_um).collect();
    let retained_ln_k = ln_positive(
        "ice absorption",
        &retained.iter().map(|r| r.imag_index).collect::<Vec<_>>(),
    )?;

    let mut ln_wl = corrected_ln_wl.clone();
    ln_wl.extend(retained_wl.iter().map(|w| w.ln()));

    let mut ln_k = blend.evaluate_many(&corrected_ln_wl);
    ln_k.extend_from_slice(&retained_ln_k);

    let imag = SmoothingSpline::fit(&ln_wl, &ln_k, None, CURVE_SMOOTHING)?;
    let real = fit_ln_ln(
        "ice real index",
        &ice.iter().map(|r| r.wavelength_um).collect::<Vec<_>>(),
        &ice.iter().map(|r| r.real_index).collect::<Vec<_>>(),
    )?;

    let records = ln_wl
        .iter()
        .map(|&x| OpticalRecord {
            wavelength_um: x.exp(),
            real_index: real.evaluate(x).exp(),
            imag_index: imag.evaluate(x).exp(),
        })
        .collect();

    Ok(ReconciledCurve { records })
}

/// Re-smooth the water table in log-log space on its own wavelength axis.
pub fn smooth_water(water: &[OpticalRecord]) -> Result<ReconciledCurve, OpticsError> {
    validate_table("water", water)?;

    let wavelengths: Vec<f64> = water.iter().map(|r| r.wavelength_um).collect();
    let real = fit_ln_ln(
        "water real index",
        &wavelengths,
        &water.iter().map(|r| r.real_index).collect::<Vec<_>>(),
    )?;
    let imag = fit_ln_ln(
        "water absorption",
        &wavelengths,
        &water.iter().map(|r| r.imag_index).collect::<Vec<_>>(),
    )?;

    let records = water
        .iter()
        .map(|r| {
            let x = r.wavelength_um.ln();
            OpticalRecord {
                wavelength_um: r.wavelength_um,
                real_index: real.evaluate(x).exp(),
                imag_index: imag.evaluate(x).exp(),
            }
        })
        .collect();

    Ok(ReconciledCurve { records })
}

/// Rigid smoothing spline of `ln(values)` against `ln(wavelengths)`.
fn fit_ln_ln(
    what: &str,
    wavelengths: &[f64],
    values: &[f64],
) -> Result<SmoothingSpline, OpticsError> {
    SmoothingSpline::fit(
        &ln_positive(what, wavelengths)?,
        &ln_positive(what, values)?,
        None,
        CURVE_SMOOTHING,
    )
}

fn ln_positive(what: &str, values: &[f64]) -> Result<Vec<f64>, OpticsError> {
    values
        .iter()
        .map(|&v| {
            if v > 0.0 && v.is_finite() {
                Ok(v.ln())
            } else {
                Err(OpticsError::DataError(format!(
                    "{}: logarithm of non-positive value {}",
                    what, v
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{DatasetStore, EmbeddedDatasets};

    fn record(wavelength_um: f64, real_index: f64, imag_index: f64) -> OpticalRecord {
        OpticalRecord { wavelength_um, real_index, imag_index }
    }

    #[test]
    fn test_reconciled_axis_is_union_then_tail() {
        let ice = vec![
            record(0.3, 1.33, 1e-9),
            record(0.4, 1.32, 2e-10),
            record(0.5, 1.31, 5e-10),
            record(1.0, 1.30, 2e-6),
            record(2.0, 1.27, 1e-3),
        ];
        let picard = AbsorptionTable {
            wavelengths_um: vec![0.35, 0.4, 0.45],
            imag_index: vec![4e-10, 3e-10, 3e-10],
        };
        let curve = reconcile_ice(&ice, &picard).unwrap();
        let wl = curve.wavelengths_um();

        // 0.4 um appears in both sources and is kept once; 0.5 um lies beyond
        // the Picard maximum (0.45 um) and is carried over from the ice table.
        let expected = [0.3, 0.35, 0.4, 0.45, 0.5, 1.0, 2.0];
        assert_eq!(wl.len(), expected.len(), "axis {:?}", wl);
        for (a, b) in wl.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12, "axis {:?}", wl);
        }
    }

    #[test]
    fn test_reconciled_ice_is_strictly_increasing_and_positive() {
        let store = EmbeddedDatasets;
        let ice = store.load_ice_table().unwrap();
        let picard = store.load_picard_table().unwrap();
        let curve = reconcile_ice(&ice, &picard).unwrap();

        validate_table("reconciled ice", &curve.records).unwrap();
        assert!(curve.records.iter().all(|r| r.imag_index > 0.0 && r.real_index > 1.0));

        // Axis ends are preserved.
        let wl = curve.wavelengths_um();
        assert!((wl[0] - ice[0].wavelength_um).abs() < 1e-12);
        assert!((wl[wl.len() - 1] - ice[ice.len() - 1].wavelength_um).abs() < 1e-9);
    }

    #[test]
    fn test_picard_raises_visible_ice_absorption() {
        let store = EmbeddedDatasets;
        let ice = store.load_ice_table().unwrap();
        let picard = store.load_picard_table().unwrap();
        let curve = reconcile_ice(&ice, &picard).unwrap();

        // Near 0.425 um the legacy table has its absorption minimum, well
        // below the Picard values; the blend must sit above the legacy value.
        let row = curve
            .records
            .iter()
            .find(|r| (r.wavelength_um - 0.425).abs() < 1e-9)
            .unwrap();
        assert!(row.imag_index > 1.5e-11, "k(0.425) = {:e}", row.imag_index);
        assert!(row.imag_index < 1e-9, "k(0.425) = {:e}", row.imag_index);
    }

    #[test]
    fn test_water_keeps_axis_and_stays_close() {
        let water = EmbeddedDatasets.load_water_table().unwrap();
        let curve = smooth_water(&water).unwrap();
        assert_eq!(curve.len(), water.len());
        for (smooth, raw) in curve.records.iter().zip(&water) {
            assert_eq!(smooth.wavelength_um, raw.wavelength_um);
            let rel = (smooth.real_index - raw.real_index).abs() / raw.real_index;
            assert!(rel < 0.1, "n at {} um moved by {:.3}", raw.wavelength_um, rel);
        }
    }

    #[test]
    fn test_zero_absorption_is_a_data_error() {
        let water = vec![
            record(0.4, 1.34, 1e-9),
            record(0.5, 1.33, 0.0),
            record(0.6, 1.33, 1e-8),
        ];
        let err = smooth_water(&water).unwrap_err();
        assert!(matches!(err, OpticsError::DataError(_)));
    }

    #[test]
    fn test_non_overlapping_picard_is_a_data_error() {
        let ice = vec![record(1.0, 1.3, 1e-6), record(2.0, 1.27, 1e-3)];
        let picard = AbsorptionTable {
            wavelengths_um: vec![0.3, 0.4],
            imag_index: vec![1e-9, 1e-10],
        };
        assert!(reconcile_ice(&ice, &picard).is_err());
    }
}

//! # Albedo Materials
//!
//! Complex refractive indices $\tilde{n} = n + ik$ of the components of a
//! snowpack: ice (snow), liquid water, mineral dust and soot. Every medium
//! implements the [`MediumProvider`](provider::MediumProvider) trait; callers
//! normally go through [`RefractiveIndexEngine`](engine::RefractiveIndexEngine)
//! or the process-wide [`refractive_index`] function.
//!
//! ## Available media
//!
//! | Substance | Source | Module | Outside data range |
//! |-----------|--------|--------|--------------------|
//! | Ice / snow | Warren & Brandt (2008) + Picard et al. (2016) | [`reconcile`], [`cache`] | Clamped, warned |
//! | Water | Hale & Querry (1973) | [`reconcile`], [`cache`] | Clamped, warned |
//! | Dust | Skiles et al. (2016), n = 1.55 | [`dust`] | Clamped, silent |
//! | Soot | Bond & Bergstrom (2006), 1.95 + 0.79i | [`soot`] | Constant |
//!
//! ## Interpolation
//!
//! Tabulated data is smoothed with cubic smoothing splines
//! ([`spline::SmoothingSpline`]) in log-log space and then interpolated with a
//! modified Akima scheme ([`interpolant::AkimaInterpolant`]) over
//! $\ln\lambda$, so that neither $n$ nor $\ln k$ overshoots between samples.
//!
//! ```
//! use ndarray::arr1;
//!
//! let result = albedo_materials::refractive_index(&arr1(&[500.0]).into_dyn(), "water", "nm").unwrap();
//! assert!((result.index.first().unwrap().re - 1.335).abs() < 0.01);
//! ```

pub mod cache;
pub mod datasets;
pub mod dust;
pub mod engine;
pub mod interpolant;
pub mod provider;
pub mod reconcile;
pub mod soot;
pub mod spline;
pub mod units;

pub use engine::{default_engine, refractive_index, RefractiveIndex, RefractiveIndexEngine, Substance};
pub use provider::{MediumProvider, OpticsError};
pub use units::{convert, WavelengthUnit};

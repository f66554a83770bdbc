//! Raw tabulated optical datasets.
//!
//! | Table | File | Source |
//! |-------|------|--------|
//! | Ice $(\lambda, n, k)$ | `ice_warren_brandt_2008.csv` | Warren & Brandt (2008) |
//! | Water $(\lambda, n, k)$ | `water_hale_querry_1973.csv` | Hale & Querry (1973) |
//! | Ice UV/visible $k$ | `ice_picard_2016.csv` | Picard et al. (2016) |
//! | Dust $(\lambda, k, w)$ | `dust_skiles_2016.csv` | Skiles et al. (2016), Zender |
//!
//! The tables are plain CSV with a header row; lines starting with `#` are
//! comments. An abridged copy of each table is compiled into the library
//! ([`EmbeddedDatasets`]); full-resolution tables with the same file names
//! and headers can be read from a directory ([`DirectoryDatasets`]).

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::provider::OpticsError;

pub const ICE_FILE: &str = "ice_warren_brandt_2008.csv";
pub const WATER_FILE: &str = "water_hale_querry_1973.csv";
pub const PICARD_FILE: &str = "ice_picard_2016.csv";
pub const DUST_FILE: &str = "dust_skiles_2016.csv";

const ICE_CSV: &str = include_str!("../data/ice_warren_brandt_2008.csv");
const WATER_CSV: &str = include_str!("../data/water_hale_querry_1973.csv");
const PICARD_CSV: &str = include_str!("../data/ice_picard_2016.csv");
const DUST_CSV: &str = include_str!("../data/dust_skiles_2016.csv");

/// One tabulated sample of the complex refractive index.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OpticalRecord {
    /// Wavelength in micrometres.
    pub wavelength_um: f64,
    /// Real part $n$.
    #[serde(rename = "n")]
    pub real_index: f64,
    /// Imaginary part $k$ (non-negative).
    #[serde(rename = "k")]
    pub imag_index: f64,
}

/// A table of absorption (imaginary index) values without a real part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbsorptionTable {
    pub wavelengths_um: Vec<f64>,
    pub imag_index: Vec<f64>,
}

impl AbsorptionTable {
    pub fn len(&self) -> usize {
        self.wavelengths_um.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths_um.is_empty()
    }

    /// Longest wavelength in the table.
    pub fn max_wavelength(&self) -> Option<f64> {
        self.wavelengths_um.iter().copied().reduce(f64::max)
    }
}

#[derive(Debug, Deserialize)]
struct AbsorptionRow {
    wavelength_um: f64,
    k: f64,
}

/// One weighted empirical dust absorption point.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DustPoint {
    pub wavelength_um: f64,
    #[serde(rename = "k")]
    pub imag_index: f64,
    /// Confidence weight of this point in the smoothing fit.
    pub weight: f64,
}

/// Source of the raw tabulated data.
///
/// Implementations must return the same data on every call; the engine loads
/// each table once per cache build.
pub trait DatasetStore: Send + Sync {
    /// Ice optical constants, strictly increasing in wavelength.
    fn load_ice_table(&self) -> Result<Vec<OpticalRecord>, OpticsError>;

    /// Liquid water optical constants, strictly increasing in wavelength.
    fn load_water_table(&self) -> Result<Vec<OpticalRecord>, OpticsError>;

    /// UV/visible ice absorption used to correct the ice table.
    fn load_picard_table(&self) -> Result<AbsorptionTable, OpticsError>;

    /// Weighted empirical dust absorption points.
    fn load_dust_points(&self) -> Result<Vec<DustPoint>, OpticsError>;
}

/// The abridged tables compiled into the library.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedDatasets;

impl DatasetStore for EmbeddedDatasets {
    fn load_ice_table(&self) -> Result<Vec<OpticalRecord>, OpticsError> {
        read_records(ICE_CSV.as_bytes())
    }

    fn load_water_table(&self) -> Result<Vec<OpticalRecord>, OpticsError> {
        read_records(WATER_CSV.as_bytes())
    }

    fn load_picard_table(&self) -> Result<AbsorptionTable, OpticsError> {
        read_absorption(PICARD_CSV.as_bytes())
    }

    fn load_dust_points(&self) -> Result<Vec<DustPoint>, OpticsError> {
        read_records(DUST_CSV.as_bytes())
    }
}

/// Tables read from CSV files in a directory.
///
/// The directory must contain [`ICE_FILE`], [`WATER_FILE`], [`PICARD_FILE`]
/// and [`DUST_FILE`] with the same headers as the embedded copies.
#[derive(Debug, Clone)]
pub struct DirectoryDatasets {
    root: PathBuf,
}

impl DirectoryDatasets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open(&self, file: &str) -> Result<std::fs::File, OpticsError> {
        let path = self.root.join(file);
        log::debug!("Loading dataset {}", path.display());
        Ok(std::fs::File::open(path)?)
    }
}

impl DatasetStore for DirectoryDatasets {
    fn load_ice_table(&self) -> Result<Vec<OpticalRecord>, OpticsError> {
        read_records(self.open(ICE_FILE)?)
    }

    fn load_water_table(&self) -> Result<Vec<OpticalRecord>, OpticsError> {
        read_records(self.open(WATER_FILE)?)
    }

    fn load_picard_table(&self) -> Result<AbsorptionTable, OpticsError> {
        read_absorption(self.open(PICARD_FILE)?)
    }

    fn load_dust_points(&self) -> Result<Vec<DustPoint>, OpticsError> {
        read_records(self.open(DUST_FILE)?)
    }
}

fn read_records<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, OpticsError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

fn read_absorption<R: Read>(reader: R) -> Result<AbsorptionTable, OpticsError> {
    let rows: Vec<AbsorptionRow> = read_records(reader)?;
    Ok(AbsorptionTable {
        wavelengths_um: rows.iter().map(|r| r.wavelength_um).collect(),
        imag_index: rows.iter().map(|r| r.k).collect(),
    })
}

/// Check that a table is non-empty, finite, positive in wavelength and
/// strictly increasing.
pub fn validate_table(name: &str, records: &[OpticalRecord]) -> Result<(), OpticsError> {
    if records.len() < 2 {
        return Err(OpticsError::DataError(format!(
            "{} table needs at least 2 rows, found {}",
            name,
            records.len()
        )));
    }
    for (i, r) in records.iter().enumerate() {
        if !(r.wavelength_um.is_finite() && r.wavelength_um > 0.0) {
            return Err(OpticsError::DataError(format!(
                "{} table row {}: invalid wavelength {}",
                name, i, r.wavelength_um
            )));
        }
        if !(r.real_index.is_finite() && r.imag_index.is_finite()) || r.imag_index < 0.0 {
            return Err(OpticsError::DataError(format!(
                "{} table row {}: invalid index {} + {}i",
                name, i, r.real_index, r.imag_index
            )));
        }
        if i > 0 && r.wavelength_um <= records[i - 1].wavelength_um {
            return Err(OpticsError::DataError(format!(
                "{} table must be strictly increasing in wavelength at row {}",
                name, i
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_tables_parse() {
        let store = EmbeddedDatasets;
        let ice = store.load_ice_table().unwrap();
        let water = store.load_water_table().unwrap();
        let picard = store.load_picard_table().unwrap();
        let dust = store.load_dust_points().unwrap();

        assert!(ice.len() > 50);
        assert!(water.len() > 50);
        assert_eq!(picard.imag_index.len(), picard.len());
        assert_eq!(dust.len(), 39);

        validate_table("ice", &ice).unwrap();
        validate_table("water", &water).unwrap();
    }

    #[test]
    fn test_dust_points_span_and_weights() {
        let dust = EmbeddedDatasets.load_dust_points().unwrap();
        assert_eq!(dust.first().unwrap().wavelength_um, 0.30);
        assert_eq!(dust.last().unwrap().wavelength_um, 2.50);
        for p in &dust {
            assert!(
                [0.5, 0.75, 1.0].contains(&p.weight),
                "unexpected weight {} at {} um",
                p.weight,
                p.wavelength_um
            );
        }
    }

    #[test]
    fn test_picard_table_lies_inside_ice_range() {
        let store = EmbeddedDatasets;
        let ice = store.load_ice_table().unwrap();
        let picard = store.load_picard_table().unwrap();
        let max = picard.max_wavelength().unwrap();
        assert!(max > ice[0].wavelength_um && max < ice[ice.len() - 1].wavelength_um);
    }

    #[test]
    fn test_read_records_skips_comments_and_whitespace() {
        let content = "# comment\nwavelength_um, n, k\n0.5, 1.33, 1e-9\n 0.6 ,1.32,2e-9\n";
        let rows: Vec<OpticalRecord> = read_records(content.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].wavelength_um, 0.6);
        assert_eq!(rows[0].imag_index, 1e-9);
    }

    #[test]
    fn test_read_records_rejects_bad_number() {
        let content = "wavelength_um,n,k\n0.5,abc,1e-9\n";
        let result: Result<Vec<OpticalRecord>, _> = read_records(content.as_bytes());
        assert!(matches!(result, Err(OpticsError::Csv(_))));
    }

    #[test]
    fn test_validate_table_rejects_unsorted() {
        let rows = vec![
            OpticalRecord { wavelength_um: 0.6, real_index: 1.3, imag_index: 1e-9 },
            OpticalRecord { wavelength_um: 0.5, real_index: 1.3, imag_index: 1e-9 },
        ];
        let err = validate_table("ice", &rows).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_directory_store_reports_missing_file() {
        let store = DirectoryDatasets::new("/nonexistent/albedo/tables");
        assert!(matches!(store.load_ice_table(), Err(OpticsError::Io(_))));
    }
}

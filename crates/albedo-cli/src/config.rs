//! TOML configuration deserialisation for refractive index jobs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use albedo_materials::{Substance, WavelengthUnit};

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub datasets: DatasetsConfig,
    #[serde(default, rename = "query")]
    pub queries: Vec<QueryConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the tabulated optical constants come from.
#[derive(Debug, Default, Deserialize)]
pub struct DatasetsConfig {
    /// Directory holding full-resolution tables. Embedded tables when absent.
    pub directory: Option<PathBuf>,
}

/// A single refractive index query.
#[derive(Debug, Deserialize)]
pub struct QueryConfig {
    pub name: String,
    /// Substance identifier ("ice", "snow", "water", "dust", "soot").
    pub substance: String,
    /// Wavelength unit of `wavelengths` and of the written output (default: "um").
    #[serde(default = "default_units")]
    pub units: String,
    /// Query wavelengths. Absent selects the native grid of ice or water.
    #[serde(default)]
    pub wavelengths: Option<WavelengthSpec>,
}

fn default_units() -> String {
    "um".into()
}

/// Wavelength specification: either a range or explicit list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WavelengthSpec {
    Range { range: [f64; 2], points: usize },
    List { values: Vec<f64> },
}

impl WavelengthSpec {
    /// Expand into the list of query wavelengths (linearly spaced for a range).
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            WavelengthSpec::Range { range, points } => {
                let start = range[0];
                let end = range[1];
                (0..*points)
                    .map(|i| start + (end - start) * i as f64 / (*points - 1).max(1) as f64)
                    .collect()
            }
            WavelengthSpec::List { values } => values.clone(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save one CSV file per query (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to also save all queries as one JSON file (default: false).
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_csv: true,
            save_json: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

impl JobConfig {
    /// Check identifiers and wavelength specs without evaluating anything.
    pub fn validate(&self) -> Result<()> {
        if self.queries.is_empty() {
            anyhow::bail!("No [[query]] entries in configuration");
        }

        let mut names = HashSet::new();
        for query in &self.queries {
            if !names.insert(query.name.as_str()) {
                anyhow::bail!("Duplicate query name '{}'", query.name);
            }
            let substance: Substance = query
                .substance
                .parse()
                .with_context(|| format!("Query '{}'", query.name))?;
            query
                .units
                .parse::<WavelengthUnit>()
                .with_context(|| format!("Query '{}'", query.name))?;

            match &query.wavelengths {
                None if !substance.has_native_grid() => anyhow::bail!(
                    "Query '{}': {} has no native grid, 'wavelengths' is required",
                    query.name,
                    substance
                ),
                Some(WavelengthSpec::Range { points: 0, .. }) => {
                    anyhow::bail!("Query '{}': range needs at least one point", query.name)
                }
                Some(WavelengthSpec::List { values }) if values.is_empty() => {
                    anyhow::bail!("Query '{}': 'values' is empty", query.name)
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Parse a TOML job configuration.
pub fn parse_config(content: &str) -> Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    Ok(config)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid configuration {}", path.display()))
}

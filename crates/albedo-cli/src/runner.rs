//! Job runner: builds the engine, evaluates queries and writes results.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ndarray::{Array1, ArrayD};
use serde::Serialize;

use albedo_materials::datasets::DirectoryDatasets;
use albedo_materials::{RefractiveIndex, RefractiveIndexEngine};

use crate::config::JobConfig;

/// One evaluated query.
pub struct QueryOutput {
    pub name: String,
    pub result: RefractiveIndex,
}

/// A single `(wavelength, n, k)` sample, serialisable to CSV or JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexRow {
    pub wavelength: f64,
    pub n: f64,
    pub k: f64,
}

/// JSON representation of an evaluated query.
#[derive(Debug, Serialize)]
pub struct QueryRecord<'a> {
    pub name: &'a str,
    pub substance: String,
    pub units: &'static str,
    pub out_of_range: bool,
    pub rows: Vec<IndexRow>,
}

impl<'a> From<&'a QueryOutput> for QueryRecord<'a> {
    fn from(output: &'a QueryOutput) -> Self {
        Self {
            name: &output.name,
            substance: output.result.substance.to_string(),
            units: output.result.units.label(),
            out_of_range: output.result.out_of_range,
            rows: index_rows(&output.result),
        }
    }
}

/// Build the engine from the `[datasets]` section.
pub fn build_engine(job: &JobConfig) -> RefractiveIndexEngine {
    match &job.datasets.directory {
        Some(dir) => {
            let store = DirectoryDatasets::new(dir);
            log::info!("Reading optical tables from {}", store.root().display());
            RefractiveIndexEngine::new(Arc::new(store))
        }
        None => RefractiveIndexEngine::embedded(),
    }
}

/// Evaluate every query of a validated job, in order.
pub fn run_queries(engine: &RefractiveIndexEngine, job: &JobConfig) -> Result<Vec<QueryOutput>> {
    let mut outputs = Vec::with_capacity(job.queries.len());

    for (qi, query) in job.queries.iter().enumerate() {
        let wave: ArrayD<f64> = match &query.wavelengths {
            Some(spec) => Array1::from(spec.to_vec()).into_dyn(),
            None => Array1::<f64>::zeros(0).into_dyn(),
        };

        let result = engine
            .compute(&wave, &query.substance, &query.units)
            .with_context(|| format!("Query '{}'", query.name))?;

        println!(
            "  [{}/{}] {}: {} x {} ({}){}",
            qi + 1,
            job.queries.len(),
            query.name,
            result.substance,
            result.len(),
            result.units,
            if result.out_of_range { ", clamped outside data range" } else { "" }
        );

        outputs.push(QueryOutput {
            name: query.name.clone(),
            result,
        });
    }

    Ok(outputs)
}

/// Flatten a result into rows, in the logical order of its wavelengths.
pub fn index_rows(result: &RefractiveIndex) -> Vec<IndexRow> {
    result
        .wavelengths
        .iter()
        .zip(result.index.iter())
        .map(|(&wavelength, z)| IndexRow {
            wavelength,
            n: z.re,
            k: z.im,
        })
        .collect()
}

/// Write one query to a CSV file with a metadata header.
pub fn write_index_csv(output: &QueryOutput, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    write_index_table(&mut file, output)?;

    println!("Refractive index written to: {}", path.display());
    Ok(())
}

/// CSV body shared by files and standard output.
pub fn write_index_table<W: Write>(out: &mut W, output: &QueryOutput) -> Result<()> {
    let result = &output.result;

    writeln!(out, "# Albedo refractive index: {}", output.name)?;
    writeln!(out, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "# substance: {}", result.substance)?;
    if result.out_of_range {
        writeln!(out, "# note: wavelengths outside the tabulated range use the nearest tabulated value")?;
    }
    writeln!(out, "#")?;
    writeln!(out, "wavelength_{},n,k", result.units.label())?;

    for row in index_rows(result) {
        writeln!(out, "{},{:.6},{:.6e}", row.wavelength, row.n, row.k)?;
    }
    Ok(())
}

/// Write every query to one JSON file.
pub fn write_index_json(outputs: &[QueryOutput], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = to_json(outputs)?;
    std::fs::write(path, json).with_context(|| format!("Cannot write {}", path.display()))?;

    println!("Refractive index (JSON) written to: {}", path.display());
    Ok(())
}

/// Pretty-printed JSON array of query records.
pub fn to_json(outputs: &[QueryOutput]) -> Result<String> {
    let records: Vec<QueryRecord<'_>> = outputs.iter().map(QueryRecord::from).collect();
    serde_json::to_string_pretty(&records).context("JSON serialisation error")
}

//! Albedo command-line interface.
//!
//! Evaluate refractive indices from TOML job files or directly:
//! ```sh
//! albedo-cli run job.toml
//! albedo-cli validate job.toml
//! albedo-cli query ice 0.4 0.5 0.6 -u um
//! albedo-cli query water --json
//! albedo-cli substances
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use albedo_materials::{MediumProvider, RefractiveIndexEngine, Substance};

#[derive(Parser)]
#[command(name = "albedo-cli")]
#[command(about = "Albedo: refractive indices of ice, water, dust and soot")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every query of a TOML job file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without evaluating it.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Evaluate one substance and print the result.
    Query {
        /// Substance: ice, snow, water, dust or soot.
        substance: String,
        /// Wavelengths; omit for the native grid of ice or water.
        wavelengths: Vec<f64>,
        /// Wavelength unit: um, nm, mm, cm, m or GHz.
        #[arg(short, long, default_value = "um")]
        units: String,
        /// Print JSON instead of CSV.
        #[arg(long)]
        json: bool,
    },
    /// Display information about available substances.
    Substances,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Albedo refractive index engine");
            println!("==============================");
            let job = config::load_config(&config)?;
            job.validate()?;
            println!("Configuration: {}", config.display());

            let engine = runner::build_engine(&job);
            let outputs = runner::run_queries(&engine, &job)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_csv {
                for out in &outputs {
                    let csv_path = out_dir.join(format!("{}.csv", out.name));
                    runner::write_index_csv(out, &csv_path)?;
                }
            }

            if job.output.save_json {
                let json_path = out_dir.join("refractive_index.json");
                runner::write_index_json(&outputs, &json_path)?;
            }

            println!("Done.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            job.validate()?;
            println!(
                "Configuration is valid: {} ({} queries)",
                config.display(),
                job.queries.len()
            );
            Ok(())
        }
        Commands::Query {
            substance,
            wavelengths,
            units,
            json,
        } => {
            let engine = RefractiveIndexEngine::embedded();
            let result = engine.compute_slice(&wavelengths, &substance, &units)?;
            let output = runner::QueryOutput {
                name: substance,
                result,
            };

            if json {
                println!("{}", runner::to_json(std::slice::from_ref(&output))?);
            } else {
                runner::write_index_table(&mut std::io::stdout().lock(), &output)?;
            }
            Ok(())
        }
        Commands::Substances => {
            let engine = RefractiveIndexEngine::embedded();
            println!("Available substances:");
            println!();
            for substance in Substance::all() {
                let provider = engine.provider(substance)?;
                let range = match provider.wavelength_range() {
                    Some((lo, hi)) => format!("{:.3}-{:.1} um", lo, hi),
                    None => "all wavelengths".to_string(),
                };
                let grid = if substance.has_native_grid() { ", native grid" } else { "" };
                println!("  {:<6} {} ({}{})", substance.name(), provider.citation(), range, grid);
            }
            println!();
            println!("  \"snow\" is an alias of \"ice\".");
            Ok(())
        }
    }
}

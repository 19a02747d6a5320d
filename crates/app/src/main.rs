//! Vase CLI - generate vase meshes from parameter files
//!
//! # Commands
//!
//! - `vase generate` - Generate a mesh and print a summary
//! - `vase defaults` - Print the default parameter set as JSON
//! - `vase check-formula` - Compile a formula and report problems
//!
//! # Usage
//!
//! ```bash
//! # Generate from defaults and write the mesh as JSON
//! vase generate --output vase.json
//!
//! # Generate from a saved parameter set with a different noise seed
//! vase generate --params my_vase.json --seed 7
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vase::formula::{CompiledFormula, SurfaceSample};
use vase::{Generation, VaseGenerator};
use vase_config::{ParameterStore, VaseParameters};

#[derive(Parser)]
#[command(name = "vase", version, about = "Parametric vase mesh generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a mesh from a parameter file (or the defaults)
    Generate {
        /// JSON parameter file; missing keys use defaults
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Override the noise seed
        #[arg(long)]
        seed: Option<u32>,

        /// Write the finished mesh as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default parameter set as JSON
    Defaults,

    /// Compile a formula and evaluate it on the validation scope
    CheckFormula {
        formula: String,

        /// Check as a vertical formula (fallback `y`) instead of a radius formula
        #[arg(long)]
        vertical: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            params,
            seed,
            output,
        } => run_generate(params, seed, output),
        Command::Defaults => {
            println!("{}", VaseParameters::default().to_json()?);
            Ok(())
        }
        Command::CheckFormula { formula, vertical } => run_check_formula(&formula, vertical),
    }
}

fn load_parameters(path: Option<PathBuf>) -> Result<VaseParameters> {
    let mut store = ParameterStore::default();
    if let Some(path) = path {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        store
            .import_json(&text)
            .with_context(|| format!("Failed to import {}", path.display()))?;
        tracing::info!("Loaded parameters from {}", path.display());
    }
    Ok(store.current().clone())
}

fn run_generate(
    params: Option<PathBuf>,
    seed: Option<u32>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut params = load_parameters(params)?;
    if let Some(seed) = seed {
        params.noise_seed = seed;
    }

    let mut generator = VaseGenerator::new();
    let Generation { mesh, stats } = generator.generate(&params)?;

    if stats.radius_formula_fell_back {
        tracing::warn!(
            "Radius formula '{}' was replaced by 'r'",
            params.radius_formula
        );
    }
    if stats.vertical_formula_fell_back {
        tracing::warn!(
            "Vertical formula '{}' was replaced by 'y'",
            params.vertical_deformation_formula
        );
    }

    println!("vertices:        {}", mesh.vertex_count());
    println!("triangles:       {}", mesh.triangle_count());
    println!("fallback points: {}", stats.fallback_points);
    if let Some((min, max)) = mesh.bounds() {
        println!("bounds:          {:?} .. {:?}", min.to_array(), max.to_array());
    }

    if let Some(path) = output {
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), &mesh)
            .with_context(|| format!("Failed to write mesh to {}", path.display()))?;
        tracing::info!("Wrote mesh to {}", path.display());
    }

    Ok(())
}

fn run_check_formula(source: &str, vertical: bool) -> Result<()> {
    let formula = if vertical {
        CompiledFormula::vertical(source)
    } else {
        CompiledFormula::radius(source)
    };

    match formula.compile_error() {
        Some(e) => {
            println!("invalid: {}", e);
            println!("fallback: {}", formula.fallback_source());
            std::process::exit(1);
        }
        None => {
            let value = formula.evaluate(&SurfaceSample::VALIDATION)?;
            println!("ok: {} = {} on the validation scope", formula.source(), value);
            Ok(())
        }
    }
}

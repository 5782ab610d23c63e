//! ECOTYPE - CLI Entry Point
//!
//! Individual-based simulation of ecotype formation.

use clap::{Parser, Subcommand};
use ecotype::config::LoggingConfig;
use ecotype::{benchmark, logging, Config, Simulation};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ecotype")]
#[command(version)]
#[command(about = "Individual-based simulation of resource specialization across two habitats")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation to its horizon
    Run {
        /// Configuration file (YAML); defaults are used if it does not exist
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Output directory for the parameter log and data files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (warnings and errors only)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Population size
        #[arg(short, long, default_value = "1000")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            seed,
            quiet,
        } => run_simulation(config, output, seed, quiet),

        Commands::Benchmark { steps, population } => {
            logging::init(&LoggingConfig::default(), Path::new("."), false)?;
            run_benchmark(steps, population)
        }

        Commands::Init { output } => {
            logging::init(&LoggingConfig::default(), Path::new("."), false)?;
            generate_config(output)
        }
    }
}

fn run_simulation(
    config_path: PathBuf,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let from_file = config_path.exists();
    let mut config = if from_file {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };

    if let Some(path) = logging::init(&config.logging, &output, quiet)? {
        println!("Logging to {}", path.display());
    }

    if from_file {
        log::info!("Loaded config from {:?}", config_path);
    } else {
        log::info!("Using default configuration");
    }

    if seed.is_some() {
        config.run.seed = seed;
    }

    let mut simulation = Simulation::new(config, &output)?;

    if !quiet {
        let config = simulation.config();
        println!("Starting simulation");
        println!("  Population: {}", config.population.size);
        println!("  Feeding rounds: {}", config.feeding.rounds);
        println!("  Horizon: {}", config.run.horizon);
        println!("  Seed: {}", simulation.seed());
        println!();
    }

    let summary = simulation.run()?;

    if !quiet {
        println!("{}", summary);
    }

    Ok(())
}

fn run_benchmark(steps: u64, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== ECOTYPE Benchmark ===");
    println!("Steps: {}", steps);
    println!("Population: {}", population);
    println!();

    let result = benchmark(steps, population)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

//! # ECOTYPE
//!
//! Individual-based simulation of resource specialization and ecotype
//! formation in a population spread over two habitats.
//!
//! ## Features
//!
//! - **Feeding market**: sequential resource choice with competitive sharing
//! - **Selection**: fitness-proportional reproduction with mutation and dispersal
//! - **Statistics**: ecological and spatial isolation every time step
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: Seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecotype::{Config, MemorySink, Population, Series};
//!
//! let mut config = Config::default();
//! config.run.horizon = 1000;
//! config.run.save_interval = 10;
//!
//! let mut population = Population::with_seed(&config, 42).unwrap();
//! let mut sink = MemorySink::new();
//! while population.keep_on() {
//!     population.advance_one_step(&mut sink);
//! }
//!
//! println!("EI: {:?}", sink.values(Series::EcologicalIsolation));
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use ecotype::Config;
//!
//! let mut config = Config::default();
//! config.population.size = 200;
//! config.evolution.mutation_rate = 0.01;
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Writing output files
//!
//! ```rust,no_run
//! use ecotype::{Config, Simulation};
//!
//! let mut config = Config::default();
//! config.output.save_data = true;
//!
//! let mut simulation = Simulation::new(config, "results").unwrap();
//! let summary = simulation.run().unwrap();
//! println!("{}", summary);
//! ```

pub mod config;
pub mod evolution;
pub mod individual;
pub mod logging;
pub mod market;
pub mod output;
pub mod population;
pub mod random;
pub mod simulation;
pub mod stats;

// Re-export main types
pub use config::{Config, ConfigError};
pub use individual::Individual;
pub use output::{MemorySink, NullSink, OutputError, OutputSink, Printer, Series};
pub use population::Population;
pub use random::RandomSource;
pub use simulation::{RunSummary, Simulation, SimulationError};
pub use stats::StepSummary;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark with default parameters and no output
pub fn benchmark(steps: u64, population: usize) -> Result<BenchmarkResult, ConfigError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.population.size = population;
    config.run.horizon = steps.max(1);

    let mut pop = Population::with_seed(&config, 0)?;
    let mut sink = NullSink;

    let start = Instant::now();
    let mut last = StepSummary::default();
    for _ in 0..steps {
        last = pop.advance_one_step(&mut sink);
    }
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        steps,
        population,
        rounds: config.feeding.rounds,
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
        final_mean_trait: last.mean_trait,
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub population: usize,
    pub rounds: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
    pub final_mean_trait: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Population: {} ({} feeding rounds)", self.population, self.rounds)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        writeln!(f, "Final mean trait: {:.4}", self.final_mean_trait)?;
        Ok(())
    }
}

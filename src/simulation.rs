//! Simulation driver: parameter log, output files and the main time loop.

use crate::config::{Config, ConfigError};
use crate::output::{NullSink, OutputError, OutputSink, Printer};
use crate::population::Population;
use crate::stats::StepSummary;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File name of the parameter log written next to the output series
pub const PARAMETER_LOG: &str = "paramlog.yaml";

/// A configured run, ready to go
pub struct Simulation {
    config: Config,
    seed: u64,
    output_dir: PathBuf,
    population: Population,
}

impl Simulation {
    /// Validate the configuration, settle the seed and build the population
    pub fn new<P: AsRef<Path>>(mut config: Config, output_dir: P) -> Result<Self, SimulationError> {
        config.validate()?;
        let seed = config.resolve_seed();
        let population = Population::with_seed(&config, seed)?;

        Ok(Self {
            config,
            seed,
            output_dir: output_dir.as_ref().to_path_buf(),
            population,
        })
    }

    /// Resolved configuration, seed included
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Write the resolved configuration to the output directory
    pub fn write_parameters(&self) -> Result<PathBuf, SimulationError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| OutputError::Io {
            path: self.output_dir.display().to_string(),
            source,
        })?;
        let path = self.output_dir.join(PARAMETER_LOG);
        self.config.save(&path)?;
        Ok(path)
    }

    /// Printer for the configured series, if data saving is on
    pub fn printer(&self) -> Result<Option<Printer>, OutputError> {
        let output = &self.config.output;
        if !output.save_data {
            return Ok(None);
        }
        let printer = if output.choose {
            Printer::from_names(&self.output_dir, &output.requested, output.memory_mb)?
        } else {
            Printer::all(&self.output_dir, output.memory_mb)
        };
        Ok(Some(printer))
    }

    /// Run to the horizon, writing the parameter log and series files as
    /// configured
    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        if self.config.output.save_parameters {
            let path = self.write_parameters()?;
            log::info!("Parameters saved to {}", path.display());
        }

        match self.printer()? {
            Some(mut printer) => {
                printer.open()?;
                let summary = self.run_with(&mut printer);
                printer.close()?;
                Ok(summary)
            }
            None => Ok(self.run_with(&mut NullSink)),
        }
    }

    /// Run to the horizon, sending every series to `sink`
    pub fn run_with<S: OutputSink + ?Sized>(&mut self, sink: &mut S) -> RunSummary {
        log::info!("Simulation started (seed {})", self.seed);
        let start = Instant::now();

        let mut steps = 0;
        let mut last = StepSummary::default();
        while self.population.keep_on() {
            last = self.population.advance_one_step(sink);
            steps += 1;
        }

        let elapsed = start.elapsed();
        log::info!("Simulation ended");

        RunSummary {
            steps,
            seed: self.seed,
            final_mean_trait: self.population.mean_trait(),
            ecological_isolation: last.ecological_isolation,
            spatial_isolation: last.spatial_isolation,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: u64,
    pub seed: u64,
    /// Mean trait of the generation alive at the end
    pub final_mean_trait: f64,
    /// Statistics of the last completed step
    pub ecological_isolation: f64,
    pub spatial_isolation: f64,
    pub elapsed_secs: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f, "Seed: {}", self.seed)?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Mean trait: {:.4}", self.final_mean_trait)?;
        writeln!(f, "EI: {:.4}", self.ecological_isolation)?;
        writeln!(f, "SI: {:.4}", self.spatial_isolation)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        Ok(())
    }
}

/// Errors that stop a run
#[derive(Debug)]
pub enum SimulationError {
    Config(ConfigError),
    Output(OutputError),
    Logger(log::SetLoggerError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{}", e),
            Self::Output(e) => write!(f, "{}", e),
            Self::Logger(e) => write!(f, "Unable to set up logging: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Output(e) => Some(e),
            Self::Logger(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<log::SetLoggerError> for SimulationError {
    fn from(e: log::SetLoggerError) -> Self {
        Self::Logger(e)
    }
}

impl From<OutputError> for SimulationError {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}

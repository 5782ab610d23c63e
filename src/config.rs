//! Configuration system for the ecotype simulation.
//!
//! Supports YAML configuration files with sensible defaults. Every section
//! may be omitted, in which case its defaults apply.

use crate::output::Series;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub population: PopulationConfig,
    #[serde(default)]
    pub feeding: FeedingConfig,
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Population configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationConfig {
    /// Fixed number of individuals
    pub size: usize,
    /// Trait value of every founder
    pub initial_trait: f64,
    /// Sharpness of the efficiency trade-off between the two resources
    pub tradeoff: f64,
}

/// Feeding market configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedingConfig {
    /// Weight of resource abundance in random choices (0.0 - 1.0)
    pub alpha: f64,
    /// Choice accuracy (0.0 - 1.0)
    pub beta: f64,
    /// Resource discovery rate
    pub delta: f64,
    /// Amount of the off-habitat resource (0.0 - 1.0)
    pub habitat_symmetry: f64,
    /// Feeding rounds per time step
    pub rounds: usize,
}

/// Evolution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvolutionConfig {
    /// Probability that an offspring mutates
    pub mutation_rate: f64,
    /// Standard deviation of mutational effects
    pub mutation_sd: f64,
    /// Probability that an offspring switches habitat
    pub dispersal: f64,
}

/// Run length and sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Last time step simulated (inclusive)
    pub horizon: u64,
    /// Steps between recorded samples
    pub save_interval: u64,
    /// Random seed; drawn from the OS when absent
    pub seed: Option<u64>,
}

/// Data output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Write the resolved configuration next to the data
    pub save_parameters: bool,
    /// Write output series to disk
    pub save_data: bool,
    /// Only write the series listed in `requested`
    pub choose: bool,
    /// Series names to write when `choose` is set
    pub requested: Vec<String>,
    /// Memory budget of each output buffer, in MB
    pub memory_mb: f64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log a summary line at every time step
    pub verbose: bool,
    /// Log level (off, error, warn, info, debug, trace)
    pub log_level: String,
    /// Write log records to `screenlog.txt` in the output directory
    /// instead of standard error
    pub save_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            feeding: FeedingConfig::default(),
            evolution: EvolutionConfig::default(),
            run: RunConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 10,
            initial_trait: 0.0,
            tradeoff: 1.0,
        }
    }
}

impl Default for FeedingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            beta: 1.0,
            delta: 1.0,
            habitat_symmetry: 1.0,
            rounds: 10,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.0001,
            mutation_sd: 0.02,
            dispersal: 0.1,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            horizon: 100,
            save_interval: 20,
            seed: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_parameters: true,
            save_data: false,
            choose: false,
            requested: Vec::new(),
            memory_mb: 1.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_level: "info".to_string(),
            save_log: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Return the seed, drawing and storing one if none was configured.
    ///
    /// Storing it means a saved parameter log reproduces the run.
    pub fn resolve_seed(&mut self) -> u64 {
        use rand::Rng;
        *self
            .run
            .seed
            .get_or_insert_with(|| rand::thread_rng().gen())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.population;
        let f = &self.feeding;
        let e = &self.evolution;

        check(p.size > 0, "population.size", STRICTLY_POSITIVE)?;
        check(p.initial_trait.is_finite(), "population.initial_trait", FINITE)?;
        check(non_negative(p.tradeoff), "population.tradeoff", POSITIVE)?;

        check(proportion(f.alpha), "feeding.alpha", PROPORTION)?;
        check(proportion(f.beta), "feeding.beta", PROPORTION)?;
        check(non_negative(f.delta), "feeding.delta", POSITIVE)?;
        check(proportion(f.habitat_symmetry), "feeding.habitat_symmetry", PROPORTION)?;
        check(f.rounds > 0, "feeding.rounds", STRICTLY_POSITIVE)?;

        check(proportion(e.mutation_rate), "evolution.mutation_rate", PROPORTION)?;
        check(non_negative(e.mutation_sd), "evolution.mutation_sd", POSITIVE)?;
        check(proportion(e.dispersal), "evolution.dispersal", PROPORTION)?;

        check(self.run.horizon > 0, "run.horizon", STRICTLY_POSITIVE)?;
        check(self.run.save_interval > 0, "run.save_interval", STRICTLY_POSITIVE)?;

        check(
            self.output.memory_mb * 1e6 >= std::mem::size_of::<f64>() as f64,
            "output.memory_mb",
            "must be enough MB to store a double",
        )?;

        check(
            self.logging.log_level.parse::<log::LevelFilter>().is_ok(),
            "logging.log_level",
            "must be one of off, error, warn, info, debug, trace",
        )?;

        for name in &self.output.requested {
            if name.parse::<Series>().is_err() {
                return Err(ConfigError::Invalid {
                    field: "output.requested",
                    constraint: format!("unknown output series: {}", name),
                });
            }
        }

        Ok(())
    }
}

const STRICTLY_POSITIVE: &str = "must be strictly positive";
const POSITIVE: &str = "must be positive";
const PROPORTION: &str = "must be between 0 and 1";
const FINITE: &str = "must be a finite number";

fn check(ok: bool, field: &'static str, constraint: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            constraint: constraint.to_string(),
        })
    }
}

// NaN fails both comparisons
fn non_negative(x: f64) -> bool {
    x >= 0.0 && x.is_finite()
}

fn proportion(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

/// Errors that can occur while loading, validating or saving a configuration
#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: std::io::Error },
    Yaml(serde_yaml::Error),
    Invalid { field: &'static str, constraint: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "Unable to open file {}: {}", path, source),
            Self::Yaml(e) => write!(f, "Invalid configuration: {}", e),
            Self::Invalid { field, constraint } => {
                write!(f, "Parameter {} {}", field, constraint)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Yaml(e) => Some(e),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(config: &Config) -> &'static str {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected invalid parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.run.seed = Some(42);
        config.output.requested = vec!["time".to_string()];
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("population:\n  size: 9\n").unwrap();
        assert_eq!(config.population.size, 9);
        assert_eq!(config.population.tradeoff, 1.0);
        assert_eq!(config.feeding, FeedingConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = Config::from_yaml("population:\n  sizee: 9\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_invalid_values_name_the_field() {
        let mut config = Config::default();
        config.population.size = 0;
        assert_eq!(invalid_field(&config), "population.size");

        let mut config = Config::default();
        config.feeding.alpha = 1.5;
        assert_eq!(invalid_field(&config), "feeding.alpha");

        let mut config = Config::default();
        config.feeding.delta = -0.1;
        assert_eq!(invalid_field(&config), "feeding.delta");

        let mut config = Config::default();
        config.evolution.mutation_sd = f64::NAN;
        assert_eq!(invalid_field(&config), "evolution.mutation_sd");

        let mut config = Config::default();
        config.run.save_interval = 0;
        assert_eq!(invalid_field(&config), "run.save_interval");

        let mut config = Config::default();
        config.output.memory_mb = 1e-9;
        assert_eq!(invalid_field(&config), "output.memory_mb");

        let mut config = Config::default();
        config.logging.log_level = "verbose".to_string();
        assert_eq!(invalid_field(&config), "logging.log_level");
    }

    #[test]
    fn test_log_levels_accepted() {
        for level in ["off", "error", "warn", "info", "debug", "trace", "DEBUG"] {
            let mut config = Config::default();
            config.logging.log_level = level.to_string();
            assert!(config.validate().is_ok(), "{} rejected", level);
        }
    }

    #[test]
    fn test_save_log_from_yaml() {
        let config = Config::from_yaml("logging:\n  save_log: true\n").unwrap();
        assert!(config.logging.save_log);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_unknown_requested_series_rejected() {
        let mut config = Config::default();
        config.output.requested = vec!["time".to_string(), "qux".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("qux"));
    }

    #[test]
    fn test_resolve_seed_is_sticky() {
        let mut config = Config::default();
        let seed = config.resolve_seed();
        assert_eq!(config.run.seed, Some(seed));
        assert_eq!(config.resolve_seed(), seed);
    }

    #[test]
    fn test_missing_file_error() {
        let err = Config::from_file("/nonexistent/ecotype.yaml").unwrap_err();
        assert!(err.to_string().contains("Unable to open file"));
    }
}

//! Logger setup for the command-line runs.

use crate::config::LoggingConfig;
use crate::output::OutputError;
use crate::simulation::SimulationError;
use std::fs::File;
use std::path::{Path, PathBuf};

/// File name of the log written when `logging.save_log` is on
pub const SCREEN_LOG: &str = "screenlog.txt";

/// Create (or truncate) the screen log in `dir`
pub fn open_screen_log(dir: &Path) -> Result<(File, PathBuf), OutputError> {
    let io_error = |path: &Path, source| OutputError::Io {
        path: path.display().to_string(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let path = dir.join(SCREEN_LOG);
    let file = File::create(&path).map_err(|e| io_error(&path, e))?;
    Ok((file, path))
}

/// Build a logger filtered at `logging.log_level` (or `warn` when quiet),
/// writing to the screen log in `output_dir` if `logging.save_log` is set.
///
/// `RUST_LOG` still overrides the level.
pub fn builder(
    config: &LoggingConfig,
    output_dir: &Path,
    quiet: bool,
) -> Result<(env_logger::Builder, Option<PathBuf>), OutputError> {
    let level = if quiet { "warn" } else { config.log_level.as_str() };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    let mut screen_log = None;
    if config.save_log {
        let (file, path) = open_screen_log(output_dir)?;
        builder
            .target(env_logger::Target::Pipe(Box::new(file)))
            .write_style(env_logger::WriteStyle::Never);
        screen_log = Some(path);
    }

    Ok((builder, screen_log))
}

/// Install the global logger; returns the screen log path if there is one
pub fn init(config: &LoggingConfig, output_dir: &Path, quiet: bool) -> Result<Option<PathBuf>, SimulationError> {
    let (mut builder, screen_log) = builder(config, output_dir, quiet)?;
    builder.try_init()?;
    Ok(screen_log)
}

//! File sink: one binary `.dat` file per enabled series.

use super::buffer::{capacity_for, Buffer};
use super::{OutputError, OutputSink, Series};
use std::path::{Path, PathBuf};

/// Writes enabled series to `<dir>/<name>.dat`
pub struct Printer {
    dir: PathBuf,
    // Indexed by `Series::index`; `None` means the series is not written
    buffers: Vec<Option<Buffer>>,
    open: bool,
    error: Option<OutputError>,
}

impl Printer {
    /// Printer writing every series
    pub fn all<P: AsRef<Path>>(dir: P, memory_mb: f64) -> Self {
        Self::with_series(dir, &Series::ALL, memory_mb)
    }

    /// Printer writing only the given series
    pub fn with_series<P: AsRef<Path>>(dir: P, enabled: &[Series], memory_mb: f64) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let capacity = capacity_for(memory_mb);
        let buffers = Series::ALL
            .iter()
            .map(|series| {
                enabled.contains(series).then(|| {
                    Buffer::new(dir.join(format!("{}.dat", series.name())), capacity)
                })
            })
            .collect();
        Self {
            dir,
            buffers,
            open: false,
            error: None,
        }
    }

    /// Printer writing the series named in `requested`
    pub fn from_names<P: AsRef<Path>>(
        dir: P,
        requested: &[String],
        memory_mb: f64,
    ) -> Result<Self, OutputError> {
        let enabled = requested
            .iter()
            .map(|name| name.parse::<Series>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_series(dir, &enabled, memory_mb))
    }

    /// Open every enabled output file
    pub fn open(&mut self) -> Result<(), OutputError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| OutputError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.open()?;
        }
        self.open = true;
        log::debug!("Opened {} output file(s) in {:?}", self.enabled().len(), self.dir);
        Ok(())
    }

    /// Flush and close every output file, reporting the first write error
    pub fn close(&mut self) -> Result<(), OutputError> {
        self.open = false;
        for buffer in self.buffers.iter_mut().flatten() {
            if let Err(e) = buffer.close() {
                self.error.get_or_insert(e);
            }
        }
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Whether a series is written
    pub fn exists(&self, series: Series) -> bool {
        self.buffers[series.index()].is_some()
    }

    pub fn is_open(&self, series: Series) -> bool {
        self.buffers[series.index()]
            .as_ref()
            .map_or(false, Buffer::is_open)
    }

    /// Buffer capacity of a series, in values
    pub fn capacity(&self, series: Series) -> Option<usize> {
        self.buffers[series.index()].as_ref().map(Buffer::capacity)
    }

    /// Enabled series in table order
    pub fn enabled(&self) -> Vec<Series> {
        Series::ALL
            .iter()
            .copied()
            .filter(|series| self.exists(*series))
            .collect()
    }
}

impl OutputSink for Printer {
    fn is_on(&self) -> bool {
        self.open
    }

    fn save(&mut self, series: Series, value: f64) {
        if !self.open {
            return;
        }
        let slot = &mut self.buffers[series.index()];
        if let Some(buffer) = slot.as_mut() {
            if let Err(e) = buffer.save(value) {
                log::error!("Output write failed, {} disabled: {}", series, e);
                *slot = None;
                self.error.get_or_insert(e);
            }
        }
    }
}

impl Drop for Printer {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.close() {
                log::error!("Output close failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::buffer::read_series;
    use tempfile::tempdir;

    #[test]
    fn test_printer_opens_buffers() {
        let dir = tempdir().unwrap();
        let mut printer = Printer::all(dir.path(), 0.01);
        assert!(!printer.is_on());

        printer.open().unwrap();
        assert!(printer.is_on());
        for series in Series::ALL {
            assert!(printer.is_open(series));
        }

        printer.close().unwrap();
        assert!(!printer.is_open(Series::Time));
        assert!(dir.path().join("time.dat").exists());
    }

    #[test]
    fn test_printer_reads_requested_output() {
        let dir = tempdir().unwrap();
        let requested = vec!["time".to_string(), "spatialIsolation".to_string()];
        let mut printer = Printer::from_names(dir.path(), &requested, 1.0).unwrap();
        printer.open().unwrap();

        assert!(printer.exists(Series::Time));
        assert!(printer.exists(Series::SpatialIsolation));
        assert!(!printer.exists(Series::HabitatCensus));
        assert_eq!(
            printer.enabled(),
            vec![Series::Time, Series::SpatialIsolation]
        );

        // Disabled series are silently ignored
        printer.save(Series::HabitatCensus, 1.0);
        printer.close().unwrap();
        assert!(!dir.path().join("habitatCensus.dat").exists());
    }

    #[test]
    fn test_printer_rejects_unknown_output() {
        let dir = tempdir().unwrap();
        let requested = vec!["time".to_string(), "qux".to_string()];
        let result = Printer::from_names(dir.path(), &requested, 1.0);
        assert!(matches!(result, Err(OutputError::UnknownSeries(name)) if name == "qux"));
    }

    #[test]
    fn test_saving_into_buffers() {
        let dir = tempdir().unwrap();
        let mut printer = Printer::with_series(dir.path(), &[Series::Time], 1.0);
        printer.open().unwrap();
        printer.save(Series::Time, 2.5);
        printer.save(Series::Time, 42usize as f64);
        printer.close().unwrap();

        let values = read_series(dir.path().join("time.dat")).unwrap();
        assert_eq!(values, vec![2.5, 42.0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_error_reported_on_close() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink(full, dir.path().join("time.dat")).unwrap();

        // 2000 values per container
        let mut printer = Printer::with_series(dir.path(), &[Series::Time, Series::HabitatCensus], 0.016);
        assert_eq!(printer.capacity(Series::Time), Some(2000));
        printer.open().unwrap();

        for t in 0..4010 {
            printer.save(Series::Time, t as f64);
            printer.save(Series::HabitatCensus, 1.0);
        }
        assert!(!printer.exists(Series::Time));
        assert!(printer.exists(Series::HabitatCensus));

        let err = printer.close().unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
        assert_eq!(
            read_series(dir.path().join("habitatCensus.dat")).unwrap().len(),
            4010
        );
    }

    #[test]
    fn test_custom_capacity() {
        let dir = tempdir().unwrap();
        let printer = Printer::with_series(dir.path(), &[Series::Time], 2.0);
        assert_eq!(printer.capacity(Series::Time), Some(capacity_for(2.0)));
        assert_eq!(printer.capacity(Series::HabitatCensus), None);
    }
}

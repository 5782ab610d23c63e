//! Double-buffered binary writer for one output series.
//!
//! Values go into the head container. When it is full the head and tail
//! swap, the tail is written out and emptied, and the old tail becomes the
//! new head.

use super::OutputError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Number of `f64` values that fit in `megabytes`
pub fn capacity_for(megabytes: f64) -> usize {
    ((megabytes * 1e6) / std::mem::size_of::<f64>() as f64).max(1.0) as usize
}

pub struct Buffer {
    path: PathBuf,
    capacity: usize,
    head: Vec<f64>,
    tail: Vec<f64>,
    file: Option<BufWriter<File>>,
}

impl Buffer {
    /// Create a closed buffer that will write to `path`
    pub fn new<P: AsRef<Path>>(path: P, capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            path: path.as_ref().to_path_buf(),
            capacity,
            head: Vec::with_capacity(capacity),
            tail: Vec::with_capacity(capacity),
            file: None,
        }
    }

    /// Create (or truncate) the output file
    pub fn open(&mut self) -> Result<(), OutputError> {
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        self.file = Some(BufWriter::new(file));
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Values waiting in the head container
    pub fn len(&self) -> usize {
        self.head.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a value, flushing to disk when the head is full
    pub fn save(&mut self, value: f64) -> Result<(), OutputError> {
        debug_assert!(self.head.len() < self.capacity);
        self.head.push(value);
        if self.head.len() == self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Swap the containers and write out the tail.
    ///
    /// The tail is emptied whether or not the write succeeds. After a failed
    /// write the file is dropped and later values are discarded.
    fn flush(&mut self) -> Result<(), OutputError> {
        std::mem::swap(&mut self.head, &mut self.tail);
        let written = match self.file.as_mut() {
            Some(file) => {
                let bytes: Vec<u8> = self.tail.iter().flat_map(|v| v.to_le_bytes()).collect();
                file.write_all(&bytes)
            }
            None => Ok(()),
        };
        self.tail.clear();
        debug_assert!(self.head.is_empty() && self.tail.is_empty());

        written.map_err(|e| {
            self.file = None;
            self.io_error(e)
        })
    }

    /// Write whatever is left and close the file
    pub fn close(&mut self) -> Result<(), OutputError> {
        self.flush()?;
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                return Err(self.io_error(e));
            }
        }
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> OutputError {
        OutputError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Read a file of little-endian `f64` values back
pub fn read_series<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, OutputError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.len() % std::mem::size_of::<f64>() != 0 {
        return Err(OutputError::Truncated {
            path: path.display().to_string(),
            len: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

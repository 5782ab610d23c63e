//! Named output series and the sinks that receive them.
//!
//! The engine only ever talks to an [`OutputSink`]; whether a value ends up
//! on disk, in memory or nowhere is the sink's business.

mod buffer;
mod printer;

pub use buffer::{read_series, Buffer};
pub use printer::Printer;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Every series the engine can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Series {
    /// Time step
    Time,
    /// Feeders on each resource in each habitat, per round
    ResourceCensus,
    /// Mean trait of feeders on each resource in each habitat, per round
    ResourceMeanTraitValue,
    /// Expected fitness gap of each individual, per round
    IndividualExpectedFitnessDifference,
    /// Resource chosen by each individual, per round
    IndividualChoice,
    /// Food obtained by each individual, per round
    IndividualRealizedFitness,
    /// Position of each individual in the feeding queue, per round
    IndividualRank,
    IndividualHabitat,
    IndividualTraitValue,
    /// Food obtained by each individual over all rounds
    IndividualTotalFitness,
    IndividualEcotype,
    /// Individuals in each habitat
    HabitatCensus,
    HabitatMeanTraitValue,
    EcologicalIsolation,
    SpatialIsolation,
    TraitStandardDeviation,
}

impl Series {
    pub const COUNT: usize = 16;

    pub const ALL: [Series; Series::COUNT] = [
        Series::Time,
        Series::ResourceCensus,
        Series::ResourceMeanTraitValue,
        Series::IndividualExpectedFitnessDifference,
        Series::IndividualChoice,
        Series::IndividualRealizedFitness,
        Series::IndividualRank,
        Series::IndividualHabitat,
        Series::IndividualTraitValue,
        Series::IndividualTotalFitness,
        Series::IndividualEcotype,
        Series::HabitatCensus,
        Series::HabitatMeanTraitValue,
        Series::EcologicalIsolation,
        Series::SpatialIsolation,
        Series::TraitStandardDeviation,
    ];

    /// Name used in configuration files and output file names
    pub fn name(self) -> &'static str {
        match self {
            Series::Time => "time",
            Series::ResourceCensus => "resourceCensus",
            Series::ResourceMeanTraitValue => "resourceMeanTraitValue",
            Series::IndividualExpectedFitnessDifference => "individualExpectedFitnessDifference",
            Series::IndividualChoice => "individualChoice",
            Series::IndividualRealizedFitness => "individualRealizedFitness",
            Series::IndividualRank => "individualRank",
            Series::IndividualHabitat => "individualHabitat",
            Series::IndividualTraitValue => "individualTraitValue",
            Series::IndividualTotalFitness => "individualTotalFitness",
            Series::IndividualEcotype => "individualEcotype",
            Series::HabitatCensus => "habitatCensus",
            Series::HabitatMeanTraitValue => "habitatMeanTraitValue",
            Series::EcologicalIsolation => "ecologicalIsolation",
            Series::SpatialIsolation => "spatialIsolation",
            Series::TraitStandardDeviation => "traitStandardDeviation",
        }
    }

    /// Position in [`Series::ALL`], used to index enabled tables
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Series {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Series::ALL
            .iter()
            .copied()
            .find(|series| series.name() == s)
            .ok_or_else(|| OutputError::UnknownSeries(s.to_string()))
    }
}

/// Receiver of output values
pub trait OutputSink {
    /// Whether the sink wants values at all; lets the engine skip sampling
    fn is_on(&self) -> bool {
        true
    }

    /// Append a value to a series
    fn save(&mut self, series: Series, value: f64);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn is_on(&self) -> bool {
        false
    }

    fn save(&mut self, _series: Series, _value: f64) {}
}

/// Sink that keeps every series in memory
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemorySink {
    series: HashMap<Series, Vec<f64>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values recorded for a series (empty if none)
    pub fn values(&self, series: Series) -> &[f64] {
        self.series.get(&series).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of values recorded for a series
    pub fn len(&self, series: Series) -> usize {
        self.values(series).len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(Vec::is_empty)
    }
}

impl OutputSink for MemorySink {
    fn save(&mut self, series: Series, value: f64) {
        self.series.entry(series).or_default().push(value);
    }
}

/// Errors that can occur while writing output
#[derive(Debug)]
pub enum OutputError {
    Io { path: String, source: std::io::Error },
    UnknownSeries(String),
    /// File size is not a whole number of values
    Truncated { path: String, len: usize },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "Unable to open file {}: {}", path, source),
            Self::UnknownSeries(name) => write!(f, "Invalid output requested: {}", name),
            Self::Truncated { path, len } => {
                write!(f, "File {} holds {} bytes, not a whole number of values", path, len)
            }
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::UnknownSeries(_) | Self::Truncated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for series in Series::ALL {
            assert_eq!(series.name().parse::<Series>().unwrap(), series);
        }
    }

    #[test]
    fn test_index_matches_table_order() {
        for (i, series) in Series::ALL.iter().enumerate() {
            assert_eq!(series.index(), i);
        }
    }

    #[test]
    fn test_unknown_series() {
        let err = "qux".parse::<Series>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid output requested: qux");
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        assert!(sink.is_on());
        assert!(sink.is_empty());
        sink.save(Series::Time, 0.0);
        sink.save(Series::Time, 1.0);
        assert_eq!(sink.values(Series::Time), &[0.0, 1.0]);
        assert_eq!(sink.len(Series::SpatialIsolation), 0);
    }

    #[test]
    fn test_null_sink_is_off() {
        let mut sink = NullSink;
        assert!(!sink.is_on());
        sink.save(Series::Time, 1.0);
    }
}

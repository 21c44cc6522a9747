//! Timing Record - one measurement of one entity at one sample size

use crate::engine::{ProfilerOptions, TimingTree};
use serde::{Deserialize, Serialize};

/// Name of the whole-dataset aggregate entity
pub const AGGREGATE_ENTITY: &str = "StructuredProfiler";

/// Run-wide settings snapshotted into every record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Percentage of cells nulled before profiling
    pub percent_to_nan: f64,
    /// Whether the engine may choose its own batching
    pub allow_subsampling: bool,
    /// Engine options
    pub options: ProfilerOptions,
}

/// Durations shared by all records of one sample size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeMeasurement {
    /// Requested sample size
    pub sample_size: usize,
    /// Wall-clock seconds of the profile call
    pub total_time: f64,
    /// Wall-clock seconds of the self-merge, if it succeeded
    pub merge: Option<f64>,
}

/// Timing Record for one `(name, sample_size)` pair
///
/// Serializes to the fixed field set `name, sample_size, total_time, column,
/// merge, percent_to_nan, allow_subsampling, is_data_labeler,
/// is_multiprocessing`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingRecord {
    name: String,
    sample_size: usize,
    total_time: f64,
    column: TimingTree,
    merge: Option<f64>,
    percent_to_nan: f64,
    allow_subsampling: bool,
    is_data_labeler: bool,
    is_multiprocessing: bool,
}

impl TimingRecord {
    /// Create a record for entity `name` with its timing breakdown
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        column: TimingTree,
        measurement: &SizeMeasurement,
        settings: &RunSettings,
    ) -> Self {
        Self {
            name: name.into(),
            sample_size: measurement.sample_size,
            total_time: measurement.total_time,
            column,
            merge: measurement.merge,
            percent_to_nan: settings.percent_to_nan,
            allow_subsampling: settings.allow_subsampling,
            is_data_labeler: settings.options.is_data_labeler(),
            is_multiprocessing: settings.options.is_multiprocessing(),
        }
    }

    /// Entity name (column or [`AGGREGATE_ENTITY`])
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested sample size
    #[must_use]
    pub const fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Profile duration in seconds
    #[must_use]
    pub const fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Engine-reported timing breakdown
    #[must_use]
    pub const fn column(&self) -> &TimingTree {
        &self.column
    }

    /// Merge duration in seconds, `None` when unavailable
    #[must_use]
    pub const fn merge(&self) -> Option<f64> {
        self.merge
    }

    /// Percentage of cells nulled
    #[must_use]
    pub const fn percent_to_nan(&self) -> f64 {
        self.percent_to_nan
    }

    /// Whether subsampling was allowed
    #[must_use]
    pub const fn allow_subsampling(&self) -> bool {
        self.allow_subsampling
    }

    /// Whether the data labeler was enabled
    #[must_use]
    pub const fn is_data_labeler(&self) -> bool {
        self.is_data_labeler
    }

    /// Whether multiprocessing was enabled
    #[must_use]
    pub const fn is_multiprocessing(&self) -> bool {
        self.is_multiprocessing
    }

    /// Whether this is the whole-dataset aggregate record
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        self.name == AGGREGATE_ENTITY
    }

    /// Whether this record belongs to the size-0 warm-up
    #[must_use]
    pub const fn is_warm_up(&self) -> bool {
        self.sample_size == 0
    }
}

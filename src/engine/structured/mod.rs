//! Reference structured profiler
//!
//! A small column profiler implementing [`ProfilingEngine`] so the harness
//! can be exercised end to end. It records its own timings at two levels:
//!
//! - top level: `clean_and_base_stats`, `column_profiles`, `data_labeling`
//! - per column: `compiler -> inspector -> operation` (see [`column`])
//!
//! Batching follows the engine contract: with `samples_per_update = Some(n)`
//! every row is profiled in updates of `n` rows; with `None` the engine picks
//! a seeded subsample and profiles it in a single update.

pub mod column;
pub mod labeler;

pub use column::{ColumnProfile, Order};

use super::{MergeError, OperationTimes, ProfileReport, ProfilerOptions, ProfilingEngine, TimingTree};
use crate::dataset::Dataset;
use crate::sampling::sample;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Datasets up to this many rows are never subsampled
pub const SUBSAMPLE_THRESHOLD: usize = 5_000;

/// Fraction of rows kept when subsampling larger datasets
pub const SUBSAMPLE_DIVISOR: usize = 5;

/// Rows the engine profiles when it may choose (`samples_per_update = None`)
#[must_use]
pub const fn subsample_size(rows: usize) -> usize {
    if rows <= SUBSAMPLE_THRESHOLD {
        rows
    } else {
        let fraction = rows / SUBSAMPLE_DIVISOR;
        if fraction > SUBSAMPLE_THRESHOLD {
            fraction
        } else {
            SUBSAMPLE_THRESHOLD
        }
    }
}

/// Reference profiling engine
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredEngine {
    seed: u64,
}

impl StructuredEngine {
    /// Create an engine whose internal subsampling is driven by `seed`
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn select_rows(&self, dataset: &Dataset, samples_per_update: Option<usize>) -> Result<Dataset> {
        match samples_per_update {
            Some(_) => Ok(dataset.clone()),
            None => {
                let size = subsample_size(dataset.num_rows());
                if size == dataset.num_rows() {
                    Ok(dataset.clone())
                } else {
                    tracing::debug!(rows = dataset.num_rows(), size, "engine subsampling");
                    sample(dataset, size, &mut StdRng::seed_from_u64(self.seed))
                }
            }
        }
    }
}

fn profile_column(
    dataset: &Dataset,
    index: usize,
    update_rows: usize,
    with_labeler: bool,
) -> Result<ColumnProfile> {
    let field = dataset.schema().field(index).clone();
    let array = dataset.column(index);
    let mut profile = ColumnProfile::new(field.name().as_str(), field.data_type().clone(), with_labeler);

    let rows = dataset.num_rows();
    let mut offset = 0;
    while offset < rows {
        let len = update_rows.min(rows - offset);
        profile.update(&array.slice(offset, len))?;
        offset += len;
    }
    Ok(profile)
}

fn profile_columns_sequential(
    dataset: &Dataset,
    update_rows: usize,
    with_labeler: bool,
) -> Result<Vec<ColumnProfile>> {
    (0..dataset.num_columns())
        .map(|index| profile_column(dataset, index, update_rows, with_labeler))
        .collect()
}

#[cfg(feature = "rayon")]
fn profile_columns(
    dataset: &Dataset,
    update_rows: usize,
    with_labeler: bool,
    parallel: bool,
) -> Result<Vec<ColumnProfile>> {
    use rayon::prelude::*;

    if parallel {
        (0..dataset.num_columns())
            .into_par_iter()
            .map(|index| profile_column(dataset, index, update_rows, with_labeler))
            .collect()
    } else {
        profile_columns_sequential(dataset, update_rows, with_labeler)
    }
}

// Without rayon the multiprocess option has no effect
#[cfg(not(feature = "rayon"))]
fn profile_columns(
    dataset: &Dataset,
    update_rows: usize,
    with_labeler: bool,
    _parallel: bool,
) -> Result<Vec<ColumnProfile>> {
    profile_columns_sequential(dataset, update_rows, with_labeler)
}

/// Profile of a whole dataset
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredProfile {
    row_count: usize,
    columns: Vec<ColumnProfile>,
    times: OperationTimes,
}

impl StructuredProfile {
    /// Column profiles in schema order
    #[must_use]
    pub fn columns(&self) -> &[ColumnProfile] {
        &self.columns
    }

    /// Column profile by name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|column| column.name() == name)
    }

    /// Top-level operation timings
    #[must_use]
    pub const fn operation_times(&self) -> &OperationTimes {
        &self.times
    }
}

impl ProfileReport for StructuredProfile {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn times(&self) -> TimingTree {
        TimingTree::from(&self.times)
    }

    fn column_times(&self) -> Vec<(String, TimingTree)> {
        self.columns
            .iter()
            .map(|column| (column.name().to_string(), column.timing_tree()))
            .collect()
    }
}

impl ProfilingEngine for StructuredEngine {
    type Profile = StructuredProfile;

    fn profile(
        &self,
        dataset: &Dataset,
        options: &ProfilerOptions,
        samples_per_update: Option<usize>,
    ) -> Result<StructuredProfile> {
        let mut times = OperationTimes::new();

        let working = times.time("clean_and_base_stats", || {
            self.select_rows(dataset, samples_per_update)
        })?;

        let update_rows = match samples_per_update {
            Some(rows) if rows > 0 => rows,
            _ => working.num_rows().max(1),
        };
        let with_labeler = options.is_data_labeler();

        let columns = times.time("column_profiles", || {
            profile_columns(&working, update_rows, with_labeler, options.is_multiprocessing())
        })?;

        if with_labeler {
            times.add(
                "data_labeling",
                columns.iter().map(ColumnProfile::labeling_seconds).sum(),
            );
        }

        tracing::debug!(
            rows = working.num_rows(),
            columns = columns.len(),
            update_rows,
            "profiled dataset"
        );

        Ok(StructuredProfile {
            row_count: working.num_rows(),
            columns,
            times,
        })
    }

    fn merge(
        &self,
        left: &StructuredProfile,
        right: &StructuredProfile,
    ) -> std::result::Result<StructuredProfile, MergeError> {
        if left.row_count == 0 && right.row_count == 0 {
            return Err(MergeError::EmptyProfiles);
        }

        let left_names: Vec<&str> = left.columns.iter().map(ColumnProfile::name).collect();
        let right_names: Vec<&str> = right.columns.iter().map(ColumnProfile::name).collect();
        if left_names != right_names {
            return Err(Error::Engine(format!(
                "cannot merge profiles with different columns: {left_names:?} vs {right_names:?}"
            ))
            .into());
        }

        let mut times = OperationTimes::new();
        let columns = times.time("merge", || {
            left.columns
                .iter()
                .zip(&right.columns)
                .map(|(a, b)| a.merge(b))
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(StructuredProfile {
            row_count: left.row_count + right.row_count,
            columns,
            times,
        })
    }
}

//! Profiling engine contract
//!
//! The harness measures a profiling engine it treats as a black box. The
//! contract is deliberately narrow:
//!
//! - [`ProfilingEngine::profile`] summarizes a dataset, either in batches the
//!   engine chooses (`samples_per_update = None`, subsampling allowed) or in
//!   batches of a fixed row count
//! - [`ProfilingEngine::merge`] combines two summaries, failing with the typed
//!   [`MergeError::EmptyProfiles`] when neither side saw any rows
//! - [`ProfileReport`] exposes the engine's own nested timing breakdowns
//!
//! [`StructuredEngine`] is the in-crate reference implementation.

mod options;
pub mod structured;
mod timing;

pub use options::{BooleanOption, ProfilerOptions, StructuredOptions};
pub use structured::{StructuredEngine, StructuredProfile};
pub use timing::{OperationTimes, TimingTree};

use crate::dataset::Dataset;
use crate::{Error, Result};
use thiserror::Error;

/// Outcome of a failed merge
///
/// Only [`MergeError::EmptyProfiles`] is an expected condition; callers
/// record it as "no merge timing" and continue. Everything else aborts.
#[derive(Error, Debug)]
pub enum MergeError {
    /// Both operands summarize zero rows
    #[error("cannot merge empty profiles")]
    EmptyProfiles,

    /// Any other engine failure
    #[error(transparent)]
    Fatal(#[from] Error),
}

/// Timing accessors of a finished profile
pub trait ProfileReport {
    /// Rows the profile summarizes
    fn row_count(&self) -> usize;

    /// Whole-dataset timing breakdown
    fn times(&self) -> TimingTree;

    /// Per-column timing breakdowns, in column order
    fn column_times(&self) -> Vec<(String, TimingTree)>;
}

/// A profiling engine under measurement
pub trait ProfilingEngine {
    /// Summary produced by [`profile`](Self::profile)
    type Profile: ProfileReport;

    /// Profile `dataset`
    ///
    /// `samples_per_update = None` lets the engine choose its own batching
    /// (and subsample); `Some(n)` forces updates of `n` rows.
    ///
    /// # Errors
    /// Returns error on any engine failure
    fn profile(
        &self,
        dataset: &Dataset,
        options: &ProfilerOptions,
        samples_per_update: Option<usize>,
    ) -> Result<Self::Profile>;

    /// Combine two profiles
    ///
    /// # Errors
    /// [`MergeError::EmptyProfiles`] when both profiles are empty,
    /// [`MergeError::Fatal`] otherwise
    fn merge(
        &self,
        left: &Self::Profile,
        right: &Self::Profile,
    ) -> std::result::Result<Self::Profile, MergeError>;
}

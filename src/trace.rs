//! Heap tracing (space analysis)
//!
//! Wraps an operation in a dhat heap profiler that writes its artifact to a
//! caller-chosen path. Allocations are only recorded when the running binary
//! installs [`dhat::Alloc`] as its global allocator:
//!
//! ```rust,ignore
//! #[global_allocator]
//! static ALLOC: dhat::Alloc = dhat::Alloc;
//! ```
//!
//! dhat allows a single live profiler per process, so tracing is serialized
//! by a process-wide lock.

use crate::dataset::Dataset;
use crate::engine::{MergeError, ProfilerOptions, ProfilingEngine};
use crate::nan::{inject_nans, validate_percent};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

static TRACER: Mutex<()> = Mutex::new(());

/// Run `operation` once under a heap tracer writing to `path`
///
/// The tracer is finalized when `operation` returns or unwinds; the artifact
/// is checked afterwards. An error from `operation` takes precedence over a
/// missing artifact.
///
/// # Errors
/// Returns the operation's error, or [`Error::Trace`] if no artifact was
/// written
pub fn trace_to_file<T>(
    path: impl AsRef<Path>,
    operation: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let path = path.as_ref();
    // A panic inside a previous trace leaves nothing to clean up
    let _guard = TRACER.lock().unwrap_or_else(PoisonError::into_inner);

    tracing::debug!(path = %path.display(), "heap tracing started");
    let outcome = {
        let _profiler = dhat::Profiler::builder().file_name(path).build();
        operation()
    };
    let value = outcome?;

    if !path.exists() {
        return Err(Error::Trace(format!(
            "heap trace artifact not written: {}",
            path.display()
        )));
    }
    tracing::info!(path = %path.display(), "heap trace written");
    Ok(value)
}

/// Trace a single-batch profile of `dataset`
///
/// Cells are nulled (seeded by `seed`) before tracing starts, so the
/// artifact covers only the profile call.
///
/// # Errors
/// Returns error on invalid `percent_to_nan`, engine failure, or a missing
/// artifact
pub fn profile_space_analysis<E: ProfilingEngine>(
    engine: &E,
    dataset: &Dataset,
    options: &ProfilerOptions,
    percent_to_nan: f64,
    seed: u64,
    path: impl AsRef<Path>,
) -> Result<E::Profile> {
    validate_percent(percent_to_nan)?;
    let data = if percent_to_nan > 0.0 {
        inject_nans(dataset, percent_to_nan, &mut StdRng::seed_from_u64(seed))?
    } else {
        dataset.clone()
    };

    let rows = data.num_rows();
    trace_to_file(path, || engine.profile(&data, options, Some(rows)))
}

/// Trace a self-merge of `profile`
///
/// Returns `Ok(None)` when the engine reports an empty-profile merge; the
/// artifact is still written.
///
/// # Errors
/// Returns error on any other merge failure or a missing artifact
pub fn merge_space_analysis<E: ProfilingEngine>(
    engine: &E,
    profile: &E::Profile,
    path: impl AsRef<Path>,
) -> Result<Option<E::Profile>> {
    trace_to_file(path, || match engine.merge(profile, profile) {
        Ok(merged) => Ok(Some(merged)),
        Err(MergeError::EmptyProfiles) => {
            tracing::warn!("merge of empty profiles suppressed during space analysis");
            Ok(None)
        }
        Err(MergeError::Fatal(e)) => Err(e),
    })
}

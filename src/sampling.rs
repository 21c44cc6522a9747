//! Dataset sampling
//!
//! Draws a sub-sample of a dataset for one measurement:
//! - `size <= rows`: distinct rows, uniformly without replacement
//! - `size > rows`: rows uniformly with replacement (never truncates)
//!
//! Sampled rows are returned in ascending original-position order, so the
//! result is a contiguous 0-based table whose row order is reproducible from
//! the seed alone. The sampler holds no state; randomness comes from the
//! caller's RNG.

use crate::dataset::Dataset;
use crate::{Error, Result};
use rand::seq::index;
use rand::Rng;

/// How a sample was drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Distinct rows (`size <= rows`)
    WithoutReplacement,
    /// Rows may repeat (`size > rows`)
    WithReplacement,
}

impl SampleMode {
    /// Mode used for drawing `size` rows out of `rows`
    #[must_use]
    pub const fn for_request(rows: usize, size: usize) -> Self {
        if size > rows {
            Self::WithReplacement
        } else {
            Self::WithoutReplacement
        }
    }
}

/// Draw original row positions for a sample, sorted ascending
///
/// # Errors
/// Returns error if `size > 0` and there are no rows to draw from
pub fn sample_indices<R: Rng + ?Sized>(rng: &mut R, rows: usize, size: usize) -> Result<Vec<u64>> {
    if rows == 0 && size > 0 {
        return Err(Error::InvalidInput(format!(
            "cannot draw {size} rows from an empty dataset"
        )));
    }

    let mut indices: Vec<u64> = match SampleMode::for_request(rows, size) {
        SampleMode::WithoutReplacement => index::sample(rng, rows, size)
            .into_iter()
            .map(|i| i as u64)
            .collect(),
        SampleMode::WithReplacement => (0..size).map(|_| rng.gen_range(0..rows) as u64).collect(),
    };

    // Ascending original order
    indices.sort_unstable();
    Ok(indices)
}

/// Sample `size` rows of `dataset`
///
/// # Errors
/// Returns error if `size > 0` and the dataset has no rows
///
/// # Example
/// ```rust
/// use rand::{rngs::StdRng, SeedableRng};
/// use trueno_spacetime::dataset::generate_dataset;
/// use trueno_spacetime::sampling::sample;
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let data = generate_dataset(&mut rng, 10)?;
///
/// assert_eq!(sample(&data, 5, &mut rng)?.num_rows(), 5);
/// assert_eq!(sample(&data, 20, &mut rng)?.num_rows(), 20);
/// # Ok::<(), trueno_spacetime::Error>(())
/// ```
pub fn sample<R: Rng + ?Sized>(dataset: &Dataset, size: usize, rng: &mut R) -> Result<Dataset> {
    let indices = sample_indices(rng, dataset.num_rows(), size)?;
    dataset.take(&indices)
}

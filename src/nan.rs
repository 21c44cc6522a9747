//! Nan injection
//!
//! Corrupts a dataset by nulling `round(percent / 100 * cells)` distinct
//! cells chosen uniformly at random. Cell positions are numbered row-major
//! (`row * columns + column`). The input dataset is never modified and column
//! types are preserved.

use crate::dataset::Dataset;
use crate::{Error, Result};
use arrow::array::{ArrayRef, BooleanArray};
use arrow::compute::kernels::nullif::nullif;
use rand::seq::index;
use rand::Rng;

/// Validate a percentage of cells to null
///
/// # Errors
/// Returns error if `percent` is not a finite value in `0..=100`
pub fn validate_percent(percent: f64) -> Result<()> {
    if percent.is_finite() && (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "percent_to_nan must be between 0 and 100, got {percent}"
        )))
    }
}

/// Number of cells nulled for `percent` of `total_cells`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn cells_to_null(total_cells: usize, percent: f64) -> usize {
    let count = (percent / 100.0 * total_cells as f64).round() as usize;
    count.min(total_cells)
}

/// Return a copy of `dataset` with `percent` of its cells set to null
///
/// # Errors
/// Returns error if `percent` is outside `0..=100`
///
/// # Example
/// ```rust
/// use rand::{rngs::StdRng, SeedableRng};
/// use trueno_spacetime::dataset::generate_dataset;
/// use trueno_spacetime::nan::inject_nans;
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let data = generate_dataset(&mut rng, 4)?;
/// let corrupted = inject_nans(&data, 50.0, &mut rng)?;
///
/// let nulls: usize = corrupted.columns().iter().map(|c| c.null_count()).sum();
/// assert_eq!(nulls, data.total_cells() / 2);
/// # Ok::<(), trueno_spacetime::Error>(())
/// ```
pub fn inject_nans<R: Rng + ?Sized>(dataset: &Dataset, percent: f64, rng: &mut R) -> Result<Dataset> {
    validate_percent(percent)?;

    let num_rows = dataset.num_rows();
    let num_columns = dataset.num_columns();
    let total = dataset.total_cells();
    let count = cells_to_null(total, percent);

    let mut masks = vec![vec![false; num_rows]; num_columns];
    for position in index::sample(rng, total, count) {
        masks[position % num_columns][position / num_columns] = true;
    }

    let columns = dataset
        .columns()
        .iter()
        .zip(masks)
        .map(|(column, mask)| {
            if mask.iter().any(|&hit| hit) {
                nullif(column.as_ref(), &BooleanArray::from(mask))
            } else {
                Ok(ArrayRef::clone(column))
            }
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    dataset.with_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    fn grid(rows: usize, columns: usize) -> Dataset {
        let fields: Vec<Field> = (0..columns)
            .map(|c| {
                let data_type = match c % 3 {
                    0 => DataType::Int64,
                    1 => DataType::Float64,
                    _ => DataType::Utf8,
                };
                Field::new(format!("c{c}"), data_type, true)
            })
            .collect();
        let arrays: Vec<ArrayRef> = (0..columns)
            .map(|c| -> ArrayRef {
                match c % 3 {
                    0 => Arc::new(Int64Array::from_iter_values(0..rows as i64)),
                    1 => Arc::new(Float64Array::from_iter_values((0..rows).map(|r| r as f64))),
                    _ => Arc::new(StringArray::from_iter_values((0..rows).map(|r| format!("v{r}")))),
                }
            })
            .collect();
        Dataset::new(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap())
    }

    fn null_cells(dataset: &Dataset) -> usize {
        dataset.columns().iter().map(|c| c.null_count()).sum()
    }

    #[test]
    fn test_zero_percent_is_value_equal() {
        let dataset = grid(8, 3);
        let mut rng = StdRng::seed_from_u64(0);
        let injected = inject_nans(&dataset, 0.0, &mut rng).unwrap();
        assert_eq!(injected, dataset);
    }

    #[test]
    fn test_hundred_percent_nulls_everything() {
        let dataset = grid(8, 3);
        let mut rng = StdRng::seed_from_u64(0);
        let injected = inject_nans(&dataset, 100.0, &mut rng).unwrap();

        assert_eq!(null_cells(&injected), 24);
        assert_eq!(injected.schema(), dataset.schema());
    }

    #[test]
    fn test_half_of_four_by_five() {
        let dataset = grid(4, 5);
        let mut rng = StdRng::seed_from_u64(9);
        let injected = inject_nans(&dataset, 50.0, &mut rng).unwrap();

        assert_eq!(null_cells(&injected), 10);
        // Input untouched
        assert_eq!(null_cells(&dataset), 0);
    }

    #[test]
    fn test_rounding_of_cell_count() {
        assert_eq!(cells_to_null(20, 50.0), 10);
        assert_eq!(cells_to_null(3, 50.0), 2);
        assert_eq!(cells_to_null(10, 4.0), 0);
        assert_eq!(cells_to_null(10, 5.0), 1);
        assert_eq!(cells_to_null(0, 100.0), 0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let dataset = grid(4, 2);
        let mut rng = StdRng::seed_from_u64(0);

        for percent in [-0.1, 100.5, f64::NAN, f64::INFINITY] {
            let result = inject_nans(&dataset, percent, &mut rng);
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("percent_to_nan"));
        }
    }

    #[test]
    fn test_injection_is_deterministic() {
        let dataset = grid(50, 4);
        let a = inject_nans(&dataset, 30.0, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = inject_nans(&dataset, 30.0, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = grid(0, 3);
        let mut rng = StdRng::seed_from_u64(0);
        let injected = inject_nans(&dataset, 75.0, &mut rng).unwrap();
        assert!(injected.is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: exactly round(p% of cells) become null on a null-free grid
            #[test]
            fn prop_null_count_matches_percent(
                rows in 0usize..40,
                columns in 1usize..6,
                percent in 0.0f64..=100.0,
                seed in any::<u64>()
            ) {
                let dataset = grid(rows, columns);
                let injected = inject_nans(&dataset, percent, &mut StdRng::seed_from_u64(seed)).unwrap();

                prop_assert_eq!(null_cells(&injected), cells_to_null(rows * columns, percent));
                prop_assert_eq!(injected.num_rows(), rows);
            }
        }
    }
}

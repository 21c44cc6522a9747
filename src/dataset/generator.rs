//! Synthetic mixed-type dataset generation
//!
//! Used when no dataset file is configured. Every column is drawn from the
//! caller's RNG so a fixed seed reproduces the same table.

use super::Dataset;
use crate::Result;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

/// Column names produced by [`generate_dataset`], in order
pub const GENERATED_COLUMNS: [&str; 6] =
    ["int", "float", "string", "categorical", "boolean", "datetime"];

/// Category pool for the `categorical` column
pub const CATEGORIES: [&str; 5] = ["red", "green", "blue", "yellow", "black"];

const MAX_STRING_LEN: usize = 16;

/// 2000-01-01T00:00:00Z
const DATETIME_START: i64 = 946_684_800;
/// 25 years of seconds
const DATETIME_SPAN: i64 = 25 * 365 * 24 * 3600;

/// Generate a dataset of `rows` rows with one column per value class
///
/// # Errors
/// Returns error if the record batch cannot be assembled
pub fn generate_dataset<R: Rng + ?Sized>(rng: &mut R, rows: usize) -> Result<Dataset> {
    let schema = Schema::new(vec![
        Field::new(GENERATED_COLUMNS[0], DataType::Int64, true),
        Field::new(GENERATED_COLUMNS[1], DataType::Float64, true),
        Field::new(GENERATED_COLUMNS[2], DataType::Utf8, true),
        Field::new(GENERATED_COLUMNS[3], DataType::Utf8, true),
        Field::new(GENERATED_COLUMNS[4], DataType::Boolean, true),
        Field::new(GENERATED_COLUMNS[5], DataType::Utf8, true),
    ]);

    let ints = Int64Array::from_iter_values((0..rows).map(|_| rng.gen_range(-1_000_000..1_000_000)));
    let floats = Float64Array::from_iter_values((0..rows).map(|_| rng.gen_range(-1.0e6..1.0e6)));
    let strings = StringArray::from_iter_values((0..rows).map(|_| {
        let len = rng.gen_range(1..=MAX_STRING_LEN);
        (&mut *rng)
            .sample_iter(Alphanumeric)
            .take(len)
            .map(char::from)
            .collect::<String>()
    }));
    let categories = StringArray::from_iter_values(
        (0..rows).map(|_| CATEGORIES[rng.gen_range(0..CATEGORIES.len())]),
    );
    let booleans: BooleanArray = (0..rows).map(|_| Some(rng.gen_bool(0.5))).collect();
    let datetimes: StringArray = (0..rows)
        .map(|_| {
            let secs = DATETIME_START + rng.gen_range(0..DATETIME_SPAN);
            DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        })
        .collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(ints),
        Arc::new(floats),
        Arc::new(strings),
        Arc::new(categories),
        Arc::new(booleans),
        Arc::new(datetimes),
    ];

    Ok(Dataset::new(RecordBatch::try_new(Arc::new(schema), columns)?))
}

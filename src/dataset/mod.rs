//! Dataset storage (Arrow columnar)
//!
//! A [`Dataset`] is a single Arrow `RecordBatch`: named, heterogeneously typed
//! columns whose row order is significant. Nulls are the missing-value marker.
//!
//! Datasets come from delimited files, Parquet files, or the seeded
//! [`generate_dataset`] generator.

mod generator;

pub use generator::{generate_dataset, CATEGORIES, GENERATED_COLUMNS};

use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, UInt64Array};
use arrow::compute::{self, TakeOptions};
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

/// In-memory table of named columns
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    /// Wrap an existing record batch
    #[must_use]
    pub const fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Concatenate batches sharing `schema` into one dataset
    ///
    /// # Errors
    /// Returns error if a batch does not match `schema`
    pub fn from_batches(schema: &SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = compute::concat_batches(schema, batches)?;
        Ok(Self { batch })
    }

    /// Load dataset from a path, choosing the reader by extension
    ///
    /// `.parquet` files go through the Parquet reader, everything else is
    /// treated as a delimited file with a header row.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_parquet = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

        if is_parquet {
            Self::load_parquet(path)
        } else {
            Self::load_csv(path)
        }
    }

    /// Load dataset from a CSV file with a header row
    ///
    /// Column types are inferred from the whole file.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        use arrow::csv::reader::Format;
        use arrow::csv::ReaderBuilder;

        let mut file = File::open(path.as_ref())
            .map_err(|e| Error::StorageError(format!("Failed to open CSV file: {e}")))?;

        let (schema, _) = Format::default()
            .with_header(true)
            .infer_schema(&mut file, None)
            .map_err(|e| Error::StorageError(format!("Failed to infer CSV schema: {e}")))?;
        file.rewind()?;

        let schema = Arc::new(schema);
        let reader = ReaderBuilder::new(Arc::clone(&schema))
            .with_header(true)
            .build(file)
            .map_err(|e| Error::StorageError(format!("Failed to create CSV reader: {e}")))?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch = batch
                .map_err(|e| Error::StorageError(format!("Failed to read CSV batch: {e}")))?;
            batches.push(batch);
        }

        Self::from_batches(&schema, &batches)
    }

    /// Load dataset from a Parquet file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path.as_ref()).map_err(|e| {
            Error::StorageError(format!("Failed to open Parquet file: {e}"))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;
        let schema = Arc::clone(builder.schema());

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            batches.push(batch);
        }

        Self::from_batches(&schema, &batches)
    }

    /// Underlying record batch
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Dataset schema
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Number of cells (`rows * columns`)
    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.num_rows() * self.num_columns()
    }

    /// Whether the dataset has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Column names in schema order
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|field| field.name().as_str())
            .collect()
    }

    /// Column by position
    #[must_use]
    pub fn column(&self, index: usize) -> &ArrayRef {
        self.batch.column(index)
    }

    /// All columns in schema order
    #[must_use]
    pub fn columns(&self) -> &[ArrayRef] {
        self.batch.columns()
    }

    /// Gather rows by original position, in the order given
    ///
    /// # Errors
    /// Returns error if an index is out of bounds
    pub fn take(&self, indices: &[u64]) -> Result<Self> {
        let indices = UInt64Array::from(indices.to_vec());
        let columns = self
            .batch
            .columns()
            .iter()
            .map(|column| {
                compute::take(
                    column.as_ref(),
                    &indices,
                    Some(TakeOptions { check_bounds: true }),
                )
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let batch = if columns.is_empty() {
            RecordBatch::try_new_with_options(
                self.schema(),
                columns,
                &arrow::record_batch::RecordBatchOptions::new().with_row_count(Some(indices.len())),
            )?
        } else {
            RecordBatch::try_new(self.schema(), columns)?
        };
        Ok(Self::new(batch))
    }

    /// Replace all columns, keeping names and types
    ///
    /// Fields declared non-nullable are relaxed when their new column
    /// contains nulls.
    ///
    /// # Errors
    /// Returns error if the columns don't match the schema
    pub fn with_columns(&self, columns: Vec<ArrayRef>) -> Result<Self> {
        let schema = self.batch.schema_ref();
        if columns.len() != schema.fields().len() {
            return Err(Error::InvalidInput(format!(
                "expected {} columns, got {}",
                schema.fields().len(),
                columns.len()
            )));
        }
        if columns.is_empty() {
            return Ok(self.clone());
        }

        let needs_relaxing = schema
            .fields()
            .iter()
            .zip(&columns)
            .any(|(field, column)| !field.is_nullable() && column.null_count() > 0);

        let schema = if needs_relaxing {
            let fields: Vec<Field> = schema
                .fields()
                .iter()
                .zip(&columns)
                .map(|(field, column)| {
                    let nullable = field.is_nullable() || column.null_count() > 0;
                    Field::clone(field).with_nullable(nullable)
                })
                .collect();
            Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
        } else {
            Arc::clone(schema)
        };

        Ok(Self::new(RecordBatch::try_new(schema, columns)?))
    }
}

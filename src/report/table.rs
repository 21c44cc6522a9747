//! Timing Table - flattened records indexed by `(name, sample_size)`

use crate::measurement::TimingRecord;
use crate::Result;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Name of the index column holding the entity
pub const NAME_COLUMN: &str = "name";
/// Name of the index column holding the sample size
pub const SIZE_COLUMN: &str = "sample_size";

/// One flattened record
#[derive(Debug, Clone, PartialEq)]
struct TableRow {
    name: String,
    sample_size: usize,
    cells: FxHashMap<String, Value>,
}

/// Two-dimensional view of a run's records
///
/// Nested objects are flattened into dotted column names
/// (`column.data_stats.numeric.sum`). Columns appear in first-seen order;
/// rows are sorted by name, then by sample size.
///
/// # Limitations
///
/// - Duplicate `(name, sample_size)` pairs are kept, not merged.
/// - A key that itself contains `.` shares its column with the nested path
///   of the same spelling; within one record the later value wins.
/// - Empty nested objects have no leaves and produce no column, so an
///   inspector that recorded no operations is absent from the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingTable {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

impl TimingTable {
    /// Flatten and index `records`
    ///
    /// Duplicate `(name, sample_size)` pairs are kept in input order and
    /// reported with a warning.
    ///
    /// # Errors
    /// Returns error if a record cannot be serialized
    pub fn from_records(records: &[TimingRecord]) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            let mut flat = Vec::new();
            flatten_into("", serde_json::to_value(record)?, &mut flat);

            let mut cells = FxHashMap::default();
            for (key, value) in flat {
                if key == NAME_COLUMN || key == SIZE_COLUMN {
                    continue;
                }
                if !cells.contains_key(&key) && !columns.contains(&key) {
                    columns.push(key.clone());
                }
                cells.insert(key, value);
            }

            rows.push(TableRow {
                name: record.name().to_string(),
                sample_size: record.sample_size(),
                cells,
            });
        }

        // Stable: duplicates stay in input order
        rows.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.sample_size.cmp(&b.sample_size))
        });

        for pair in rows.windows(2) {
            if pair[0].name == pair[1].name && pair[0].sample_size == pair[1].sample_size {
                tracing::warn!(
                    name = %pair[0].name,
                    sample_size = pair[0].sample_size,
                    "duplicate index pair in timing table"
                );
            }
        }

        Ok(Self { columns, rows })
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value column names, excluding the index
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Index pairs in row order
    #[must_use]
    pub fn index(&self) -> Vec<(&str, usize)> {
        self.rows
            .iter()
            .map(|row| (row.name.as_str(), row.sample_size))
            .collect()
    }

    /// Cell at `row`, `column`; `None` when absent
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row)?.cells.get(column)
    }

    /// Convert to an Arrow `RecordBatch`
    ///
    /// The index becomes `name: Utf8` and `sample_size: UInt64`. Each value
    /// column is `Float64` when all present cells are numbers, `Boolean` when
    /// all are booleans, `Utf8` otherwise. Absent cells are null.
    ///
    /// # Errors
    /// Returns error if Arrow rejects the assembled columns
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = vec![
            Field::new(NAME_COLUMN, DataType::Utf8, false),
            Field::new(SIZE_COLUMN, DataType::UInt64, false),
        ];
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(|row| row.name.as_str()),
            )),
            Arc::new(UInt64Array::from_iter_values(
                self.rows.iter().map(|row| row.sample_size as u64),
            )),
        ];

        for column in &self.columns {
            let cells: Vec<Option<&Value>> = self
                .rows
                .iter()
                .map(|row| row.cells.get(column).filter(|value| !value.is_null()))
                .collect();

            let array: ArrayRef = match infer_type(&cells) {
                DataType::Float64 => Arc::new(
                    cells
                        .iter()
                        .map(|cell| cell.and_then(Value::as_f64))
                        .collect::<Float64Array>(),
                ),
                DataType::Boolean => Arc::new(
                    cells
                        .iter()
                        .map(|cell| cell.and_then(Value::as_bool))
                        .collect::<BooleanArray>(),
                ),
                _ => Arc::new(
                    cells
                        .iter()
                        .map(|cell| cell.map(cell_text))
                        .collect::<StringArray>(),
                ),
            };

            fields.push(Field::new(column, array.data_type().clone(), true));
            arrays.push(array);
        }

        let schema = Arc::new(Schema::new(fields));
        Ok(RecordBatch::try_new(schema, arrays)?)
    }
}

fn flatten_into(prefix: &str, value: Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, child, out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf)),
    }
}

fn infer_type(cells: &[Option<&Value>]) -> DataType {
    let present = || cells.iter().flatten();
    if present().all(|value| value.is_number()) {
        DataType::Float64
    } else if present().all(|value| value.is_boolean()) {
        DataType::Boolean
    } else {
        DataType::Utf8
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ProfilerOptions, TimingTree};
    use crate::measurement::{RunSettings, SizeMeasurement};
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Float64Type;

    fn record(name: &str, size: usize, merge: Option<f64>) -> TimingRecord {
        let settings = RunSettings {
            percent_to_nan: 0.0,
            allow_subsampling: true,
            options: ProfilerOptions::default(),
        };
        let measurement = SizeMeasurement {
            sample_size: size,
            total_time: 1.5,
            merge,
        };
        let mut stats = TimingTree::node();
        stats.insert("sum", TimingTree::Seconds(0.25));
        let mut tree = TimingTree::node();
        tree.insert("data_stats", stats);
        TimingRecord::new(name, tree, &measurement, &settings)
    }

    #[test]
    fn test_empty_table() {
        let table = TimingTable::from_records(&[]).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());

        let batch = table.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn test_flattened_dotted_columns() {
        let table = TimingTable::from_records(&[record("int", 5, Some(0.1))]).unwrap();

        assert!(table.columns().iter().any(|c| c == "column.data_stats.sum"));
        assert!(!table.columns().iter().any(|c| c == "name" || c == "sample_size"));
        assert_eq!(
            table.cell(0, "column.data_stats.sum").and_then(Value::as_f64),
            Some(0.25)
        );
    }

    #[test]
    fn test_rows_sorted_by_name_then_size() {
        let records = vec![
            record("string", 100, None),
            record("int", 1000, None),
            record("int", 5, None),
            record("StructuredProfiler", 100, None),
        ];
        let table = TimingTable::from_records(&records).unwrap();

        assert_eq!(
            table.index(),
            vec![
                ("StructuredProfiler", 100),
                ("int", 5),
                ("int", 1000),
                ("string", 100),
            ]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let records = vec![record("int", 5, Some(1.0)), record("int", 5, Some(2.0))];
        let table = TimingTable::from_records(&records).unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.cell(0, "merge").and_then(Value::as_f64), Some(1.0));
        assert_eq!(table.cell(1, "merge").and_then(Value::as_f64), Some(2.0));
    }

    #[test]
    fn test_record_batch_types() {
        let records = vec![record("int", 5, Some(0.5)), record("int", 0, None)];
        let batch = TimingTable::from_records(&records)
            .unwrap()
            .to_record_batch()
            .unwrap();
        let schema = batch.schema();

        assert_eq!(schema.field_with_name("name").unwrap().data_type(), &DataType::Utf8);
        assert_eq!(
            schema.field_with_name("sample_size").unwrap().data_type(),
            &DataType::UInt64
        );
        assert_eq!(
            schema.field_with_name("allow_subsampling").unwrap().data_type(),
            &DataType::Boolean
        );

        let merge = batch.column_by_name("merge").unwrap();
        assert_eq!(merge.data_type(), &DataType::Float64);
        // size 0 sorts first and has no merge time
        assert!(merge.is_null(0));
        assert!((merge.as_primitive::<Float64Type>().value(1) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_nodes_produce_no_column() {
        let settings = RunSettings {
            percent_to_nan: 0.0,
            allow_subsampling: true,
            options: ProfilerOptions::default(),
        };
        let measurement = SizeMeasurement {
            sample_size: 0,
            total_time: 0.0,
            merge: None,
        };
        let mut stats = TimingTree::node();
        stats.insert("null", TimingTree::node());
        let mut tree = TimingTree::node();
        tree.insert("data_stats", stats);
        let warm_up = TimingRecord::new("int", tree, &measurement, &settings);

        let table = TimingTable::from_records(&[warm_up]).unwrap();
        assert!(!table.columns().iter().any(|c| c.starts_with("column.")));
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn test_dotted_key_collides_with_nested_path() {
        let value = serde_json::json!({
            "a": {"b": 1.0},
            "a.b": 2.0,
        });
        let mut flat = Vec::new();
        flatten_into("", value, &mut flat);

        let keys: Vec<&str> = flat.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["a.b", "a.b"]);

        let cells: FxHashMap<String, Value> = flat.into_iter().collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells.get("a.b").and_then(Value::as_f64), Some(2.0));
    }

    #[test]
    fn test_mixed_cells_become_text() {
        let cells = [Some(&Value::Bool(true)), Some(&Value::from(1.0)), None];
        assert_eq!(infer_type(&cells), DataType::Utf8);
        assert_eq!(infer_type(&[None, None]), DataType::Float64);
    }
}

//! Dataset source tests: CSV, Parquet and the synthetic generator
//! feeding a full time analysis

use arrow::array::{Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use trueno_spacetime::config::HarnessConfig;
use trueno_spacetime::dataset::{Dataset, GENERATED_COLUMNS};
use trueno_spacetime::engine::StructuredEngine;
use trueno_spacetime::measurement::TimeAnalysis;

/// Write a Parquet file with `num_rows` rows in two row groups
#[allow(clippy::cast_precision_loss)]
fn create_test_parquet<P: AsRef<Path>>(path: P, num_rows: i32) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("value", DataType::Float64, false),
        Field::new("category", DataType::Utf8, false),
    ]);

    let batch = RecordBatch::try_new(
        Arc::new(schema.clone()),
        vec![
            Arc::new(Int32Array::from_iter_values(0..num_rows)),
            Arc::new(Float64Array::from_iter_values((0..num_rows).map(|i| f64::from(i) * 1.5))),
            Arc::new(StringArray::from_iter_values(
                (0..num_rows).map(|i| format!("category_{}", i % 10)),
            )),
        ],
    )?;

    let file = File::create(path.as_ref())?;
    let props = WriterProperties::builder()
        .set_max_row_group_size(usize::try_from(num_rows)? / 2)
        .build();
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[test]
fn test_parquet_dataset_concatenates_row_groups() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.parquet");
    create_test_parquet(&path, 1_000).expect("Failed to create test Parquet file");

    let dataset = Dataset::load(&path).expect("Failed to load Parquet file");

    assert_eq!(dataset.num_rows(), 1_000);
    assert_eq!(dataset.column_names(), vec!["id", "value", "category"]);
}

#[test]
fn test_csv_dataset_runs_through_analysis() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "age,score,email").unwrap();
    for i in 0..30 {
        writeln!(file, "{},{}.5,user{i}@example.com", 20 + i, i).unwrap();
    }
    drop(file);

    let dataset = Dataset::load(&path).unwrap();
    assert_eq!(dataset.num_rows(), 30);

    let engine = StructuredEngine::new(0);
    let records = TimeAnalysis::builder(&engine)
        .build()
        .unwrap()
        .run(&[10, 60], &dataset)
        .unwrap();

    // 3 columns x (warm-up + 2 sizes) + 2 aggregates
    assert_eq!(records.len(), 11);
    assert!(records.iter().all(|r| r.is_data_labeler() && r.is_multiprocessing()));
}

#[test]
fn test_missing_dataset_is_error() {
    assert!(Dataset::load("/nonexistent/data.parquet").is_err());
    assert!(Dataset::load("/nonexistent/data.csv").is_err());
}

#[test]
fn test_config_file_drives_generated_dataset_size() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spacetime.json");
    std::fs::write(&path, r#"{"sample_sizes": [10, 250, 40], "seed": 5}"#).unwrap();

    let config = HarnessConfig::from_json_file(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.generated_rows(), 250);
    assert_eq!(config.seeds().generator, 5);
    assert_eq!(GENERATED_COLUMNS.len(), 6);
}

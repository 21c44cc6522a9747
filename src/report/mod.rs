//! Result aggregation and output
//!
//! Records are kept losslessly as a JSON array and flattened into a
//! [`TimingTable`] written as CSV.

mod table;

pub use table::{TimingTable, NAME_COLUMN, SIZE_COLUMN};

use crate::measurement::TimingRecord;
use crate::Result;
use arrow::csv::WriterBuilder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Build both output forms from a run's records
///
/// # Errors
/// Returns error if a record cannot be serialized
pub fn aggregate(records: Vec<TimingRecord>) -> Result<(Vec<TimingRecord>, TimingTable)> {
    let table = TimingTable::from_records(&records)?;
    Ok((records, table))
}

/// Write records as a pretty-printed JSON array
///
/// # Errors
/// Returns error on I/O or serialization failure
pub fn write_json(path: impl AsRef<Path>, records: &[TimingRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    tracing::debug!(path = %path.as_ref().display(), records = records.len(), "wrote JSON records");
    Ok(())
}

/// Read records written by [`write_json`]
///
/// # Errors
/// Returns error on I/O or parse failure
pub fn read_json(path: impl AsRef<Path>) -> Result<Vec<TimingRecord>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write the table as CSV with a header row
///
/// # Errors
/// Returns error on I/O or Arrow failure
pub fn write_csv(path: impl AsRef<Path>, table: &TimingTable) -> Result<()> {
    let batch = table.to_record_batch()?;
    let file = File::create(path.as_ref())?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch)?;
    tracing::debug!(path = %path.as_ref().display(), rows = table.num_rows(), "wrote CSV table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ProfilerOptions, TimingTree};
    use crate::measurement::{RunSettings, SizeMeasurement, AGGREGATE_ENTITY};
    use tempfile::TempDir;

    fn records() -> Vec<TimingRecord> {
        let settings = RunSettings {
            percent_to_nan: 0.0,
            allow_subsampling: true,
            options: ProfilerOptions::default(),
        };
        [(AGGREGATE_ENTITY, 5, Some(0.01)), ("int", 0, None), ("int", 5, Some(0.01))]
            .into_iter()
            .map(|(name, size, merge)| {
                let measurement = SizeMeasurement {
                    sample_size: size,
                    total_time: 0.02,
                    merge,
                };
                TimingRecord::new(name, TimingTree::Seconds(0.02), &measurement, &settings)
            })
            .collect()
    }

    #[test]
    fn test_aggregate_keeps_records() {
        let (kept, table) = aggregate(records()).unwrap();
        assert_eq!(kept, records());
        assert_eq!(table.num_rows(), 3);
    }

    #[test]
    fn test_json_written_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("times.json");

        write_json(&path, &records()).unwrap();
        assert_eq!(read_json(&path).unwrap(), records());
    }

    #[test]
    fn test_csv_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("times.csv");
        let (_, table) = aggregate(records()).unwrap();

        write_csv(&path, &table).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("name,sample_size"));
        assert!(header.contains("merge"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn test_empty_csv_has_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        let (_, table) = aggregate(Vec::new()).unwrap();

        write_csv(&path, &table).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim(), "name,sample_size");
    }

    #[test]
    fn test_missing_json_is_error() {
        assert!(read_json("/nonexistent/times.json").is_err());
    }
}

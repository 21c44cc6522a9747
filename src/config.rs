//! Harness configuration
//!
//! Loaded from an optional JSON file; every field falls back to its default
//! when absent. The `spacetime` binary applies command-line overrides on top.

use crate::engine::ProfilerOptions;
use crate::nan::validate_percent;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sample sizes measured when none are configured
pub const DEFAULT_SAMPLE_SIZES: [usize; 5] = [100, 1_000, 5_000, 7_500, 100_000];

/// Output file locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    /// Timing records as a JSON array
    pub times_json: PathBuf,
    /// Flattened timing table
    pub times_csv: PathBuf,
    /// Heap trace of the profile call
    pub profile_trace: PathBuf,
    /// Heap trace of the merge call
    pub merge_trace: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            times_json: PathBuf::from("structured_profiler_times.json"),
            times_csv: PathBuf::from("structured_profiler_times.csv"),
            profile_trace: PathBuf::from("profile_space_analysis.json"),
            merge_trace: PathBuf::from("merge_space_analysis.json"),
        }
    }
}

/// Seeds for every source of randomness in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seeds {
    /// Sampler and nan injector RNG
    pub sampling: u64,
    /// Synthetic dataset generator RNG
    pub generator: u64,
    /// Engine-internal subsampling
    pub engine: u64,
}

impl Seeds {
    /// Use one base seed everywhere
    #[must_use]
    pub const fn from_base(seed: u64) -> Self {
        Self {
            sampling: seed,
            generator: seed,
            engine: seed,
        }
    }
}

/// Full harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Sample sizes, measured in this order after the warm-up
    pub sample_sizes: Vec<usize>,
    /// Base seed
    pub seed: u64,
    /// Percentage of cells nulled before profiling
    pub percent_to_nan: f64,
    /// Let the engine choose its own batching
    pub allow_subsampling: bool,
    /// Profile columns in parallel
    pub multiprocess: bool,
    /// Enable the data labeler
    pub data_labeler: bool,
    /// CSV or Parquet input; a synthetic dataset is generated when absent
    pub dataset: Option<PathBuf>,
    /// Run the time analysis
    pub time_analysis: bool,
    /// Run the heap traces
    pub space_analysis: bool,
    /// Output locations
    pub output: OutputPaths,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            sample_sizes: DEFAULT_SAMPLE_SIZES.to_vec(),
            seed: 0,
            percent_to_nan: 0.0,
            allow_subsampling: true,
            multiprocess: false,
            data_labeler: false,
            dataset: None,
            time_analysis: true,
            space_analysis: true,
            output: OutputPaths::default(),
        }
    }
}

impl HarnessConfig {
    /// Load from a JSON file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Check the configuration before a run
    ///
    /// # Errors
    /// Returns error on an empty size list or an out-of-range percentage
    pub fn validate(&self) -> Result<()> {
        if self.sample_sizes.is_empty() {
            return Err(Error::Config("sample_sizes must not be empty".to_string()));
        }
        validate_percent(self.percent_to_nan)
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Engine options derived from the flags
    #[must_use]
    pub fn profiler_options(&self) -> ProfilerOptions {
        ProfilerOptions::default()
            .with_multiprocess(self.multiprocess)
            .with_data_labeler(self.data_labeler)
    }

    /// Seeds derived from the base seed
    #[must_use]
    pub const fn seeds(&self) -> Seeds {
        Seeds::from_base(self.seed)
    }

    /// Rows to generate for a synthetic dataset: the largest sample size
    #[must_use]
    pub fn generated_rows(&self) -> usize {
        self.sample_sizes.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.sample_sizes, vec![100, 1000, 5000, 7500, 100_000]);
        assert_eq!(config.seed, 0);
        assert!(config.allow_subsampling);
        assert!(!config.multiprocess);
        assert!(!config.data_labeler);
        assert!(config.dataset.is_none());
        assert!(config.time_analysis && config.space_analysis);
        assert_eq!(config.output.times_csv, PathBuf::from("structured_profiler_times.csv"));
        assert_eq!(config.generated_rows(), 100_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"sample_sizes": [5, 10], "data_labeler": true}}"#).unwrap();

        let config = HarnessConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.sample_sizes, vec![5, 10]);
        assert!(config.data_labeler);
        assert!(config.allow_subsampling);
        assert_eq!(config.output, OutputPaths::default());

        let options = config.profiler_options();
        assert!(options.is_data_labeler());
        assert!(!options.is_multiprocessing());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = HarnessConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects() {
        let empty = HarnessConfig {
            sample_sizes: Vec::new(),
            ..HarnessConfig::default()
        };
        assert!(empty.validate().is_err());

        let percent = HarnessConfig {
            percent_to_nan: 150.0,
            ..HarnessConfig::default()
        };
        let err = percent.validate().unwrap_err();
        assert!(err.to_string().contains("percent_to_nan"));
    }

    #[test]
    fn test_seeds_follow_base() {
        let config = HarnessConfig {
            seed: 42,
            ..HarnessConfig::default()
        };
        assert_eq!(config.seeds(), Seeds::from_base(42));
        assert_eq!(config.seeds().engine, 42);
    }
}

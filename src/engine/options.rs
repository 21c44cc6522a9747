//! Profiler options
//!
//! Opaque to the harness: passed through to the engine and snapshotted into
//! every timing record. Missing fields default to enabled.

use serde::{Deserialize, Serialize};

/// On/off switch for an optional engine component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanOption {
    /// Whether the component runs
    pub is_enabled: bool,
}

impl Default for BooleanOption {
    fn default() -> Self {
        Self { is_enabled: true }
    }
}

/// Options for structured (tabular) profiling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredOptions {
    /// Profile columns in parallel
    pub multiprocess: BooleanOption,
    /// Label columns with the data labeler
    pub data_labeler: BooleanOption,
}

/// Engine configuration bag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerOptions {
    /// Tabular profiling options
    pub structured_options: StructuredOptions,
}

impl ProfilerOptions {
    /// Set the multiprocess switch
    #[must_use]
    pub const fn with_multiprocess(mut self, enabled: bool) -> Self {
        self.structured_options.multiprocess.is_enabled = enabled;
        self
    }

    /// Set the data labeler switch
    #[must_use]
    pub const fn with_data_labeler(mut self, enabled: bool) -> Self {
        self.structured_options.data_labeler.is_enabled = enabled;
        self
    }

    /// Whether columns are profiled in parallel
    #[must_use]
    pub const fn is_multiprocessing(&self) -> bool {
        self.structured_options.multiprocess.is_enabled
    }

    /// Whether the data labeler runs
    #[must_use]
    pub const fn is_data_labeler(&self) -> bool {
        self.structured_options.data_labeler.is_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enabled() {
        let options = ProfilerOptions::default();
        assert!(options.is_multiprocessing());
        assert!(options.is_data_labeler());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: ProfilerOptions = serde_json::from_str(
            r#"{"structured_options": {"multiprocess": {"is_enabled": false}}}"#,
        )
        .unwrap();
        assert!(!options.is_multiprocessing());
        assert!(options.is_data_labeler());
    }

    #[test]
    fn test_builders() {
        let options = ProfilerOptions::default()
            .with_multiprocess(false)
            .with_data_labeler(false);
        assert!(!options.is_multiprocessing());
        assert!(!options.is_data_labeler());
    }
}

//! Nested timing breakdowns
//!
//! Engines report their own wall-clock timings as a tree whose depth they
//! choose (`compiler -> inspector -> operation -> seconds` for the reference
//! profiler). The harness passes these trees through untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Recursive mapping of names to either seconds or another mapping
///
/// Serialized untagged: a leaf is a JSON number, a node a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimingTree {
    /// Duration in seconds
    Seconds(f64),
    /// Named sub-trees, ordered by name
    Node(BTreeMap<String, TimingTree>),
}

impl Default for TimingTree {
    fn default() -> Self {
        Self::Node(BTreeMap::new())
    }
}

impl TimingTree {
    /// Empty node
    #[must_use]
    pub const fn node() -> Self {
        Self::Node(BTreeMap::new())
    }

    /// Insert a child, turning a leaf into a node if necessary
    pub fn insert(&mut self, key: impl Into<String>, value: Self) {
        if let Self::Seconds(_) = self {
            *self = Self::node();
        }
        if let Self::Node(children) = self {
            children.insert(key.into(), value);
        }
    }

    /// Child by name (leaves have no children)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Seconds(_) => None,
            Self::Node(children) => children.get(key),
        }
    }

    /// Descend through a path of names
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Self> {
        path.iter().try_fold(self, |tree, key| tree.get(key))
    }

    /// Leaf value
    #[must_use]
    pub const fn as_seconds(&self) -> Option<f64> {
        match self {
            Self::Seconds(seconds) => Some(*seconds),
            Self::Node(_) => None,
        }
    }

    /// Sum of all leaves
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        match self {
            Self::Seconds(seconds) => *seconds,
            Self::Node(children) => children.values().map(Self::total_seconds).sum(),
        }
    }

    /// Node depth (a leaf is 0, an empty node 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Seconds(_) => 0,
            Self::Node(children) => 1 + children.values().map(Self::depth).max().unwrap_or(0),
        }
    }
}

impl FromIterator<(String, TimingTree)> for TimingTree {
    fn from_iter<I: IntoIterator<Item = (String, TimingTree)>>(iter: I) -> Self {
        Self::Node(iter.into_iter().collect())
    }
}

impl From<&OperationTimes> for TimingTree {
    fn from(times: &OperationTimes) -> Self {
        times
            .iter()
            .map(|(op, seconds)| (op.to_string(), Self::Seconds(seconds)))
            .collect()
    }
}

/// Accumulated seconds per named operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationTimes {
    seconds: BTreeMap<String, f64>,
}

impl OperationTimes {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, adding its wall-clock duration to `op`
    pub fn time<T>(&mut self, op: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        self.add(op, start.elapsed().as_secs_f64());
        value
    }

    /// Add `seconds` to `op`
    pub fn add(&mut self, op: &str, seconds: f64) {
        *self.seconds.entry(op.to_string()).or_insert(0.0) += seconds;
    }

    /// Seconds recorded for `op`
    #[must_use]
    pub fn get(&self, op: &str) -> Option<f64> {
        self.seconds.get(op).copied()
    }

    /// Operations in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.seconds.iter().map(|(op, seconds)| (op.as_str(), *seconds))
    }

    /// Sum over all operations
    #[must_use]
    pub fn total(&self) -> f64 {
        self.seconds.values().sum()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }
}

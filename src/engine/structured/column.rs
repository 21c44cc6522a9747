//! Per-column profile
//!
//! A column profile is split into compilers, each made of inspectors. Every
//! inspector keeps its own statistics and its own operation timings:
//!
//! ```text
//! data_stats ─┬─ null      (null_count)
//!             ├─ distinct  (to_string, hash_values)
//!             ├─ numeric   (cast, sum, min_max)         numeric columns only
//!             ├─ text      (lengths, length_stats)      string columns only
//!             └─ order     (order_check)                numeric columns only
//! data_label ─── data_labeler (predict)                 labeler enabled only
//! ```

use super::labeler::LabelCounts;
use crate::engine::{OperationTimes, TimingTree};
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use rustc_hash::FxHashSet;
use trueno::Vector;

/// Compiler holding the statistical inspectors
pub const DATA_STATS: &str = "data_stats";
/// Compiler holding the labeler
pub const DATA_LABEL: &str = "data_label";

/// Null counting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullInspector {
    /// Nulls seen
    pub null_count: usize,
    times: OperationTimes,
}

/// Distinct value tracking (hashed)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistinctInspector {
    hashes: FxHashSet<u64>,
    times: OperationTimes,
}

impl DistinctInspector {
    /// Number of distinct non-null values
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.hashes.len()
    }
}

/// Numeric aggregates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericInspector {
    /// Non-null values seen
    pub count: u64,
    /// Running sum
    pub sum: f64,
    /// Smallest value
    pub min: Option<f64>,
    /// Largest value
    pub max: Option<f64>,
    times: OperationTimes,
}

impl NumericInspector {
    /// Mean of non-null values
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// String length aggregates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInspector {
    /// Non-null values seen
    pub count: u64,
    /// Sum of character lengths
    pub total_length: f64,
    /// Shortest value length
    pub min_length: Option<f64>,
    /// Longest value length
    pub max_length: Option<f64>,
    times: OperationTimes,
}

/// Sort order of a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Non-decreasing
    Ascending,
    /// Non-increasing
    Descending,
    /// All values equal (or fewer than two)
    Constant,
    /// Neither
    Random,
}

/// Running order state over non-null values
#[derive(Debug, Clone, PartialEq)]
struct OrderState {
    first: Option<f64>,
    last: Option<f64>,
    ascending: bool,
    descending: bool,
}

impl Default for OrderState {
    fn default() -> Self {
        Self {
            first: None,
            last: None,
            ascending: true,
            descending: true,
        }
    }
}

impl OrderState {
    fn observe(&mut self, values: &[f64]) {
        for &value in values {
            if let Some(last) = self.last {
                self.ascending &= last <= value;
                self.descending &= last >= value;
            } else {
                self.first = Some(value);
            }
            self.last = Some(value);
        }
    }

    /// `self` followed by `next`
    fn join(&self, next: &Self) -> Self {
        let (joined_ascending, joined_descending) = match (self.last, next.first) {
            (Some(last), Some(first)) => (last <= first, last >= first),
            _ => (true, true),
        };
        Self {
            first: self.first.or(next.first),
            last: next.last.or(self.last),
            ascending: self.ascending && next.ascending && joined_ascending,
            descending: self.descending && next.descending && joined_descending,
        }
    }
}

/// Order detection over non-null values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderInspector {
    state: OrderState,
    times: OperationTimes,
}

impl OrderInspector {
    /// Detected order
    #[must_use]
    pub const fn order(&self) -> Order {
        match (self.state.ascending, self.state.descending) {
            (true, true) => Order::Constant,
            (true, false) => Order::Ascending,
            (false, true) => Order::Descending,
            (false, false) => Order::Random,
        }
    }
}

/// Label counting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelerInspector {
    /// Per-label value counts
    pub labels: LabelCounts,
    times: OperationTimes,
}

/// Profile of a single column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    name: String,
    data_type: DataType,
    sample_size: usize,
    null: NullInspector,
    distinct: DistinctInspector,
    numeric: Option<NumericInspector>,
    text: Option<TextInspector>,
    order: Option<OrderInspector>,
    labeler: Option<LabelerInspector>,
}

const fn is_text(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

impl ColumnProfile {
    /// Create an empty profile for a column of `data_type`
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType, with_labeler: bool) -> Self {
        let numeric = data_type.is_numeric();
        Self {
            name: name.into(),
            numeric: numeric.then(NumericInspector::default),
            text: is_text(&data_type).then(TextInspector::default),
            order: numeric.then(OrderInspector::default),
            labeler: with_labeler.then(LabelerInspector::default),
            data_type,
            sample_size: 0,
            null: NullInspector::default(),
            distinct: DistinctInspector::default(),
        }
    }

    /// Column name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arrow type of the column
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Rows profiled (nulls included)
    #[must_use]
    pub const fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Nulls seen
    #[must_use]
    pub const fn null_count(&self) -> usize {
        self.null.null_count
    }

    /// Distinct non-null values seen
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.distinct.distinct_count()
    }

    /// Numeric aggregates, for numeric columns
    #[must_use]
    pub const fn numeric(&self) -> Option<&NumericInspector> {
        self.numeric.as_ref()
    }

    /// Length aggregates, for string columns
    #[must_use]
    pub const fn text(&self) -> Option<&TextInspector> {
        self.text.as_ref()
    }

    /// Detected order, for numeric columns
    #[must_use]
    pub fn order(&self) -> Option<Order> {
        self.order.as_ref().map(OrderInspector::order)
    }

    /// Label counts, when the labeler ran
    #[must_use]
    pub fn labels(&self) -> Option<&LabelCounts> {
        self.labeler.as_ref().map(|inspector| &inspector.labels)
    }

    /// Seconds the labeler spent predicting
    #[must_use]
    pub fn labeling_seconds(&self) -> f64 {
        self.labeler
            .as_ref()
            .map_or(0.0, |inspector| inspector.times.total())
    }

    /// Fold a batch of rows into the profile
    ///
    /// # Errors
    /// Returns error if the batch has a different type or cannot be cast
    pub fn update(&mut self, array: &ArrayRef) -> Result<()> {
        if array.data_type() != &self.data_type {
            return Err(Error::Engine(format!(
                "column '{}' expects {}, got {}",
                self.name,
                self.data_type,
                array.data_type()
            )));
        }
        self.sample_size += array.len();

        let null = &mut self.null;
        null.times
            .time("null_count", || null.null_count += array.null_count());

        let strings = self
            .distinct
            .times
            .time("to_string", || cast(array.as_ref(), &DataType::Utf8))?;
        let strings = strings.as_string::<i32>();

        let distinct = &mut self.distinct;
        distinct.times.time("hash_values", || {
            distinct
                .hashes
                .extend(strings.iter().flatten().map(|value| trueno::hash_key(value)));
        });

        if let Some(text) = self.text.as_mut() {
            update_text(text, strings);
        }

        if let Some(labeler) = self.labeler.as_mut() {
            labeler
                .times
                .time("predict", || labeler.labels.observe(strings.iter().flatten()));
        }

        if let Some(numeric) = self.numeric.as_mut() {
            let values = numeric.times.time("cast", || -> Result<Vec<f64>> {
                let floats = cast(array.as_ref(), &DataType::Float64)?;
                Ok(floats.as_primitive::<Float64Type>().iter().flatten().collect())
            })?;
            update_numeric(numeric, &values);

            if let Some(order) = self.order.as_mut() {
                order.times.time("order_check", || order.state.observe(&values));
            }
        }

        Ok(())
    }

    /// Combine two profiles of the same column
    ///
    /// # Errors
    /// Returns error if the columns differ in name or type
    pub fn merge(&self, other: &Self) -> Result<Self> {
        if self.name != other.name || self.data_type != other.data_type {
            return Err(Error::Engine(format!(
                "cannot merge column '{}' ({}) with '{}' ({})",
                self.name, self.data_type, other.name, other.data_type
            )));
        }

        let mut merged = Self::new(self.name.clone(), self.data_type.clone(), self.labeler.is_some());
        merged.sample_size = self.sample_size + other.sample_size;

        let null = &mut merged.null;
        null.times.time("merge", || {
            null.null_count = self.null.null_count + other.null.null_count;
        });

        let distinct = &mut merged.distinct;
        distinct.times.time("merge", || {
            distinct.hashes = self.distinct.hashes.union(&other.distinct.hashes).copied().collect();
        });

        if let (Some(out), Some(a), Some(b)) = (merged.numeric.as_mut(), &self.numeric, &other.numeric) {
            out.times.time("merge", || {
                out.count = a.count + b.count;
                out.sum = a.sum + b.sum;
                out.min = merge_extreme(a.min, b.min, f64::min);
                out.max = merge_extreme(a.max, b.max, f64::max);
            });
        }

        if let (Some(out), Some(a), Some(b)) = (merged.text.as_mut(), &self.text, &other.text) {
            out.times.time("merge", || {
                out.count = a.count + b.count;
                out.total_length = a.total_length + b.total_length;
                out.min_length = merge_extreme(a.min_length, b.min_length, f64::min);
                out.max_length = merge_extreme(a.max_length, b.max_length, f64::max);
            });
        }

        if let (Some(out), Some(a), Some(b)) = (merged.order.as_mut(), &self.order, &other.order) {
            out.times.time("merge", || out.state = a.state.join(&b.state));
        }

        if let (Some(out), Some(a), Some(b)) = (merged.labeler.as_mut(), &self.labeler, &other.labeler) {
            out.times.time("merge", || {
                out.labels = a.labels.clone();
                out.labels.absorb(&b.labels);
            });
        }

        Ok(merged)
    }

    /// `compiler -> inspector -> operation -> seconds`
    #[must_use]
    pub fn timing_tree(&self) -> TimingTree {
        let mut stats = TimingTree::node();
        stats.insert("null", TimingTree::from(&self.null.times));
        stats.insert("distinct", TimingTree::from(&self.distinct.times));
        if let Some(numeric) = &self.numeric {
            stats.insert("numeric", TimingTree::from(&numeric.times));
        }
        if let Some(text) = &self.text {
            stats.insert("text", TimingTree::from(&text.times));
        }
        if let Some(order) = &self.order {
            stats.insert("order", TimingTree::from(&order.times));
        }

        let mut tree = TimingTree::node();
        tree.insert(DATA_STATS, stats);
        if let Some(labeler) = &self.labeler {
            let mut label = TimingTree::node();
            label.insert("data_labeler", TimingTree::from(&labeler.times));
            tree.insert(DATA_LABEL, label);
        }
        tree
    }
}

fn merge_extreme(a: Option<f64>, b: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

/// f32 lanes when every value converts without rounding
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn exact_lanes(values: &[f64]) -> Option<Vec<f32>> {
    values
        .iter()
        .map(|&v| {
            let lane = v as f32;
            (f64::from(lane) == v).then_some(lane)
        })
        .collect()
}

/// Batch minimum and maximum, on the SIMD path when it is lossless
fn extremes(values: &[f64]) -> (Option<f64>, Option<f64>) {
    if let Some(lanes) = exact_lanes(values) {
        let vector = Vector::from_slice(&lanes);
        if let (Ok(min), Ok(max)) = (vector.min(), vector.max()) {
            return (Some(f64::from(min)), Some(f64::from(max)));
        }
    }
    let min = values.iter().copied().reduce(f64::min);
    let max = values.iter().copied().reduce(f64::max);
    (min, max)
}

fn update_numeric(numeric: &mut NumericInspector, values: &[f64]) {
    if values.is_empty() {
        return;
    }

    numeric.count += values.len() as u64;
    // Summed in f64: f32 partial sums round past 2^24
    numeric.times.time("sum", || numeric.sum += values.iter().sum::<f64>());
    let (batch_min, batch_max) = numeric.times.time("min_max", || extremes(values));
    numeric.min = merge_extreme(numeric.min, batch_min, f64::min);
    numeric.max = merge_extreme(numeric.max, batch_max, f64::max);
}

#[allow(clippy::cast_precision_loss)]
fn update_text(text: &mut TextInspector, strings: &arrow::array::StringArray) {
    let lengths: Vec<f64> = text.times.time("lengths", || {
        strings
            .iter()
            .flatten()
            .map(|s| s.chars().count() as f64)
            .collect()
    });
    if lengths.is_empty() {
        return;
    }

    text.times.time("length_stats", || {
        let (batch_min, batch_max) = extremes(&lengths);
        text.count += lengths.len() as u64;
        text.total_length += lengths.iter().sum::<f64>();
        text.min_length = merge_extreme(text.min_length, batch_min, f64::min);
        text.max_length = merge_extreme(text.max_length, batch_max, f64::max);
    });
}

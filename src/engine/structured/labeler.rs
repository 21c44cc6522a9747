//! Rule-based data labeler
//!
//! Assigns each non-null value a semantic label from its shape. Column labels
//! are the most frequent value label.

use std::collections::BTreeMap;

/// Labels the labeler can emit
pub const LABELS: [&str; 7] = [
    "INTEGER",
    "FLOAT",
    "BOOLEAN",
    "DATETIME",
    "EMAIL_ADDRESS",
    "CATEGORY",
    "UNKNOWN",
];

/// Label a single value
#[must_use]
pub fn label_value(value: &str) -> &'static str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "UNKNOWN";
    }
    if trimmed.parse::<i64>().is_ok() {
        return "INTEGER";
    }
    if trimmed.parse::<f64>().is_ok() {
        return "FLOAT";
    }
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return "BOOLEAN";
    }
    if looks_like_datetime(trimmed) {
        return "DATETIME";
    }
    if looks_like_email(trimmed) {
        return "EMAIL_ADDRESS";
    }
    if trimmed.chars().all(char::is_alphabetic) {
        return "CATEGORY";
    }
    "UNKNOWN"
}

// YYYY-MM-DD prefix
fn looks_like_datetime(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Label counts for one column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCounts {
    counts: BTreeMap<&'static str, u64>,
}

impl LabelCounts {
    /// Count labels of `values`
    pub fn observe<'a>(&mut self, values: impl IntoIterator<Item = &'a str>) {
        for value in values {
            *self.counts.entry(label_value(value)).or_insert(0) += 1;
        }
    }

    /// Combine with another column's counts
    pub fn absorb(&mut self, other: &Self) {
        for (label, count) in &other.counts {
            *self.counts.entry(label).or_insert(0) += count;
        }
    }

    /// Most frequent label (ties broken by label name)
    #[must_use]
    pub fn column_label(&self) -> Option<&'static str> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(label, _)| *label)
    }

    /// Count for a label
    #[must_use]
    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }
}

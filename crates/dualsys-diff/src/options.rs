//! Comparison options: field exclusion, timestamp handling, custom equality

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Field names treated as timestamps when `compare_timestamps` is off
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "createdAt",
    "updatedAt",
    "created_at",
    "updated_at",
    "timestamp",
    "lastUpdated",
];

/// Custom equality for one field name; its verdict is authoritative
pub type FieldComparator = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Options controlling a structural diff
///
/// Cheap to clone; comparators are shared.
#[derive(Clone)]
pub struct DiffOptions {
    /// Field names skipped when present on both sides
    pub ignore_fields: HashSet<String>,
    /// Whether timestamp-like fields take part in the comparison
    pub compare_timestamps: bool,
    /// Custom equality by field name
    pub custom_comparators: HashMap<String, FieldComparator>,
}

impl DiffOptions {
    /// Default options: nothing ignored, timestamps compared
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip a field name
    #[inline]
    #[must_use]
    pub fn ignore_field(mut self, field: impl Into<String>) -> Self {
        self.ignore_fields.insert(field.into());
        self
    }

    /// Skip several field names
    #[must_use]
    pub fn ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Include or exclude timestamp-like fields
    #[inline]
    #[must_use]
    pub fn compare_timestamps(mut self, enabled: bool) -> Self {
        self.compare_timestamps = enabled;
        self
    }

    /// Register custom equality for a field name
    #[must_use]
    pub fn with_comparator<F>(mut self, field: impl Into<String>, comparator: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.custom_comparators
            .insert(field.into(), Arc::new(comparator));
        self
    }

    /// Whether `field` is excluded from comparison
    #[must_use]
    pub fn skips(&self, field: &str) -> bool {
        self.ignore_fields.contains(field)
            || (!self.compare_timestamps && TIMESTAMP_FIELDS.contains(&field))
    }

    /// Custom comparator registered for `field`
    #[inline]
    #[must_use]
    pub fn comparator_for(&self, field: &str) -> Option<&FieldComparator> {
        self.custom_comparators.get(field)
    }
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_fields: HashSet::new(),
            compare_timestamps: true,
            custom_comparators: HashMap::new(),
        }
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut comparators: Vec<&String> = self.custom_comparators.keys().collect();
        comparators.sort();
        f.debug_struct("DiffOptions")
            .field("ignore_fields", &self.ignore_fields)
            .field("compare_timestamps", &self.compare_timestamps)
            .field("custom_comparators", &comparators)
            .finish()
    }
}

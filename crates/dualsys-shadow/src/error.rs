//! Error types for the shadow comparator

use crate::result::ComparisonResult;
use std::time::Duration;

/// Structural disagreement between the two sides
///
/// Only raised by [`compare`](crate::ShadowComparator::compare) when the
/// comparator is configured with `throw_on_mismatch`. The comparison is
/// recorded in history before this is returned.
#[derive(Debug, Clone, thiserror::Error)]
#[error("comparison mismatch in {operation}: {summary}")]
pub struct MismatchError {
    /// Operation name
    pub operation: String,
    /// Human-readable mismatch summary
    pub summary: String,
    /// The full comparison
    pub result: Box<ComparisonResult>,
}

impl MismatchError {
    /// Build from a mismatching comparison
    #[must_use]
    pub fn from_result(result: ComparisonResult) -> Self {
        Self {
            operation: result.operation_name.clone(),
            summary: result.summary(),
            result: Box::new(result),
        }
    }

    /// Number of discrepancies in the comparison
    #[inline]
    #[must_use]
    pub fn discrepancy_count(&self) -> usize {
        self.result.discrepancies.len()
    }
}

/// Failure of an operation raced against a deadline
#[derive(Debug, thiserror::Error)]
pub enum DeadlineError<E> {
    /// Deadline passed before the operation settled
    #[error("operation exceeded deadline of {0:?}")]
    Elapsed(Duration),

    /// The operation itself failed
    #[error("{0}")]
    Inner(E),
}

impl<E> DeadlineError<E> {
    /// Check if the deadline elapsed
    #[inline]
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed(_))
    }
}

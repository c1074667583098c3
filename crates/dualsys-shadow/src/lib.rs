//! Shadow comparator for dual-system migrations
//!
//! Runs a legacy and a target operation for the same logical call, diffs
//! their outcomes, and keeps per-operation statistics:
//! - Both thunks are dispatched concurrently and awaited together
//! - Each side's failure is captured independently
//! - Every comparison is retained until [`ShadowComparator::clear`]
//!
//! The comparator never imposes a timeout on either side. Callers needing
//! bounded latency wrap each thunk with [`with_deadline`] first.
//!
//! # Example
//!
//! ```rust,ignore
//! use dualsys_shadow::{ComparatorConfig, ShadowComparator};
//!
//! let comparator = ShadowComparator::new(ComparatorConfig::default());
//! let result = comparator
//!     .compare("get", || legacy.get("x"), || target.get("x"), None)
//!     .await?;
//! assert!(result.is_match);
//! ```

pub mod comparator;
pub mod deadline;
pub mod error;
pub mod result;
pub mod stats;

pub use comparator::{ComparatorConfig, ComparisonTask, ShadowComparator};
pub use deadline::with_deadline;
pub use error::{DeadlineError, MismatchError};
pub use result::{capture, CapturedError, ComparisonResult, Outcome};
pub use stats::{format_success_rate, ComparatorStatistics, OperationDiscrepancy, OperationStats};

pub use dualsys_diff::{Discrepancy, DiscrepancyKind, DiffOptions};

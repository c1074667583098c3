//! Structural differ for dual-system comparison
//!
//! Compares two tree-shaped values (as [`serde_json::Value`]) and reports
//! every path-addressed difference between them:
//! - Value mismatches on primitives and on type changes
//! - Keys present on only one side of an object
//! - Per-index differences on arrays, including length differences
//!
//! Paths use dot notation for object fields and bracket notation for array
//! indices (`a.b[2].c`), rooted at the compared value.
//!
//! # Example
//!
//! ```rust
//! use dualsys_diff::{diff, DiffOptions};
//! use serde_json::json;
//!
//! let report = diff(
//!     &json!({"id": 1, "timestamp": 123}),
//!     &json!({"id": 1, "timestamp": 456}),
//!     &DiffOptions::new().ignore_field("timestamp"),
//! );
//! assert!(report.is_match());
//! ```

pub mod differ;
pub mod discrepancy;
pub mod options;

pub use differ::{diff, DiffReport};
pub use discrepancy::{Discrepancy, DiscrepancyKind};
pub use options::{DiffOptions, FieldComparator, TIMESTAMP_FIELDS};

//! Comparison results and outcome capture

use chrono::{DateTime, Utc};
use dualsys_diff::{diff, Discrepancy, DiffOptions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Error captured from one side of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedError {
    /// Error message
    pub message: String,
}

impl CapturedError {
    /// Create from message
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Settled outcome of one side, in diffable form
pub type Outcome = Result<Value, CapturedError>;

/// Convert a typed outcome into diffable form
///
/// A value that fails to serialize counts as a failure of that side.
pub fn capture<T, E>(outcome: &Result<T, E>) -> Outcome
where
    T: Serialize,
    E: fmt::Display,
{
    match outcome {
        Ok(value) => serde_json::to_value(value)
            .map_err(|e| CapturedError::new(format!("failed to serialize result: {e}"))),
        Err(e) => Err(CapturedError::new(e.to_string())),
    }
}

/// Result of one `compare()` invocation
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Operation name the comparison is filed under
    pub operation_name: String,
    /// Whether both sides agree
    #[serde(rename = "match")]
    pub is_match: bool,
    /// Legacy value, when legacy succeeded
    pub legacy_result: Option<Value>,
    /// Target value, when target succeeded
    pub new_result: Option<Value>,
    /// Legacy failure
    pub legacy_error: Option<CapturedError>,
    /// Target failure
    pub new_error: Option<CapturedError>,
    /// Differences found
    pub discrepancies: Vec<Discrepancy>,
    /// When the comparison settled
    pub recorded_at: DateTime<Utc>,
}

impl ComparisonResult {
    /// Classify two settled outcomes
    ///
    /// - Both succeed: verdict and discrepancies come from the diff
    /// - Both fail: mismatch with no discrepancies
    /// - One fails: mismatch with a single `error_state_mismatch`
    #[must_use]
    pub fn evaluate(operation: &str, legacy: Outcome, new: Outcome, options: &DiffOptions) -> Self {
        let (is_match, discrepancies, legacy_result, new_result, legacy_error, new_error) =
            match (legacy, new) {
                (Ok(l), Ok(n)) => {
                    let report = diff(&l, &n, options);
                    (report.is_match(), report.discrepancies, Some(l), Some(n), None, None)
                }
                (Err(le), Err(ne)) => (false, Vec::new(), None, None, Some(le), Some(ne)),
                (Ok(l), Err(ne)) => {
                    let d = Discrepancy::error_state(Some(l.clone()), Some(error_value(&ne)));
                    (false, vec![d], Some(l), None, None, Some(ne))
                }
                (Err(le), Ok(n)) => {
                    let d = Discrepancy::error_state(Some(error_value(&le)), Some(n.clone()));
                    (false, vec![d], None, Some(n), Some(le), None)
                }
            };

        Self {
            operation_name: operation.to_string(),
            is_match,
            legacy_result,
            new_result,
            legacy_error,
            new_error,
            discrepancies,
            recorded_at: Utc::now(),
        }
    }

    /// One-line summary of the mismatch
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_match {
            return "match".to_string();
        }
        match (&self.legacy_error, &self.new_error) {
            (Some(le), Some(ne)) => format!("both sides failed (legacy: {le}; new: {ne})"),
            _ => {
                let paths: Vec<String> = self
                    .discrepancies
                    .iter()
                    .map(|d| {
                        if d.path.is_empty() {
                            format!("<root> ({})", d.kind)
                        } else {
                            format!("{} ({})", d.path, d.kind)
                        }
                    })
                    .collect();
                format!("{} discrepancies: {}", paths.len(), paths.join(", "))
            }
        }
    }
}

fn error_value(error: &CapturedError) -> Value {
    json!({ "error": error.message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualsys_diff::DiscrepancyKind;

    #[test]
    fn both_succeed_uses_diff() {
        let r = ComparisonResult::evaluate(
            "op",
            Ok(json!({"id": 3})),
            Ok(json!({"id": 4})),
            &DiffOptions::default(),
        );
        assert!(!r.is_match);
        assert_eq!(
            r.discrepancies,
            vec![Discrepancy::value_mismatch("id", Some(json!(3)), Some(json!(4)))]
        );
        assert_eq!(r.summary(), "1 discrepancies: id (value_mismatch)");
    }

    #[test]
    fn both_fail_is_mismatch_without_discrepancies() {
        let r = ComparisonResult::evaluate(
            "op",
            Err(CapturedError::new("a")),
            Err(CapturedError::new("b")),
            &DiffOptions::default(),
        );
        assert!(!r.is_match);
        assert!(r.discrepancies.is_empty());
        assert_eq!(r.legacy_error.as_ref().unwrap().message, "a");
        assert_eq!(r.new_error.as_ref().unwrap().message, "b");
        assert!(r.summary().contains("both sides failed"));
    }

    #[test]
    fn one_side_failure_is_error_state_mismatch() {
        let r = ComparisonResult::evaluate(
            "op",
            Ok(json!(1)),
            Err(CapturedError::new("down")),
            &DiffOptions::default(),
        );
        assert!(!r.is_match);
        assert_eq!(r.discrepancies.len(), 1);
        assert_eq!(r.discrepancies[0].kind, DiscrepancyKind::ErrorStateMismatch);
        assert_eq!(r.discrepancies[0].new, Some(json!({"error": "down"})));
        assert_eq!(r.legacy_result, Some(json!(1)));
    }

    #[test]
    fn capture_maps_errors_to_messages() {
        let ok: Result<u32, String> = Ok(5);
        assert_eq!(capture(&ok), Ok(json!(5)));

        let err: Result<u32, String> = Err("nope".into());
        assert_eq!(capture(&err), Err(CapturedError::new("nope")));
    }

    #[test]
    fn serializes_match_key() {
        let r = ComparisonResult::evaluate("op", Ok(json!(1)), Ok(json!(1)), &DiffOptions::default());
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["match"], json!(true));
        assert_eq!(v["operationName"], json!("op"));
    }
}

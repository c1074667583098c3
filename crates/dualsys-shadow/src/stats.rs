//! Comparison history and derived statistics

use crate::result::ComparisonResult;
use dualsys_diff::Discrepancy;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-operation statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    /// Comparisons run under this name
    pub count: u64,
    /// Comparisons that matched
    pub matches: u64,
    /// Comparisons that did not match
    pub mismatches: u64,
    /// Match rate as a percentage string (`"66.67%"`)
    pub success_rate: String,
}

/// Aggregate statistics across all recorded comparisons
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparatorStatistics {
    /// Distinct operation names
    pub total_operations: usize,
    /// Total `compare()` calls
    pub total_comparisons: u64,
    /// Matching comparisons
    pub matches: u64,
    /// Mismatching comparisons
    pub mismatches: u64,
    /// Statistics by operation name
    pub operation_stats: BTreeMap<String, OperationStats>,
    /// Overall match rate; exactly `"0%"` when nothing was compared
    pub overall_success_rate: String,
}

/// A discrepancy tagged with the operation it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDiscrepancy {
    /// Originating operation
    pub operation_name: String,
    /// The discrepancy
    #[serde(flatten)]
    pub discrepancy: Discrepancy,
}

/// Format a match rate with two decimals
///
/// With `total == 0` this is the literal `"0%"`, not `"0.00%"`.
/// A rate sitting exactly halfway between two hundredths rounds up
/// (`1/32` gives `"3.13%"`).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_success_rate(matches: u64, total: u64) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let rate = matches as f64 / total as f64 * 100.0;
    match half_hundredths(rate) {
        Some(halves) => {
            let hundredths = halves / 2 + 1;
            format!("{}.{:02}%", hundredths / 100, hundredths % 100)
        }
        None => format!("{rate:.2}%"),
    }
}

/// `Some(n)` when `rate * 200` is exactly the odd integer `n`
///
/// `{:.2}` rounds those exact ties to even; every other value it rounds
/// to the nearest hundredth already.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn half_hundredths(rate: f64) -> Option<u64> {
    let scaled = rate * 200.0;
    let exact = rate.mul_add(200.0, -scaled) == 0.0;
    if exact && scaled.fract() == 0.0 && scaled % 2.0 == 1.0 {
        Some(scaled as u64)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct OperationCounters {
    count: u64,
    matches: u64,
}

/// Comparison history plus running counters
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    history: Vec<ComparisonResult>,
    operations: BTreeMap<String, OperationCounters>,
    matches: u64,
}

impl Ledger {
    pub(crate) fn record(&mut self, result: ComparisonResult) {
        let counters = self
            .operations
            .entry(result.operation_name.clone())
            .or_default();
        counters.count += 1;
        if result.is_match {
            counters.matches += 1;
            self.matches += 1;
        }
        self.history.push(result);
    }

    pub(crate) fn statistics(&self) -> ComparatorStatistics {
        let total = self.history.len() as u64;
        let operation_stats = self
            .operations
            .iter()
            .map(|(name, c)| {
                (
                    name.clone(),
                    OperationStats {
                        count: c.count,
                        matches: c.matches,
                        mismatches: c.count - c.matches,
                        success_rate: format_success_rate(c.matches, c.count),
                    },
                )
            })
            .collect();

        ComparatorStatistics {
            total_operations: self.operations.len(),
            total_comparisons: total,
            matches: self.matches,
            mismatches: total - self.matches,
            operation_stats,
            overall_success_rate: format_success_rate(self.matches, total),
        }
    }

    pub(crate) fn discrepancies(&self) -> Vec<OperationDiscrepancy> {
        self.history
            .iter()
            .filter(|r| !r.is_match)
            .flat_map(|r| {
                r.discrepancies.iter().map(|d| OperationDiscrepancy {
                    operation_name: r.operation_name.clone(),
                    discrepancy: d.clone(),
                })
            })
            .collect()
    }

    pub(crate) fn history(&self) -> &[ComparisonResult] {
        &self.history
    }

    pub(crate) fn clear(&mut self) {
        self.history.clear();
        self.operations.clear();
        self.matches = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::CapturedError;
    use dualsys_diff::DiffOptions;
    use serde_json::json;

    fn result(op: &str, matched: bool) -> ComparisonResult {
        let new = if matched { json!(1) } else { json!(2) };
        ComparisonResult::evaluate(op, Ok(json!(1)), Ok(new), &DiffOptions::default())
    }

    #[test]
    fn empty_rate_is_bare_zero() {
        assert_eq!(format_success_rate(0, 0), "0%");
        assert_eq!(format_success_rate(0, 3), "0.00%");
        assert_eq!(format_success_rate(2, 3), "66.67%");
        assert_eq!(format_success_rate(4, 4), "100.00%");
    }

    #[test]
    fn exact_halves_round_up() {
        assert_eq!(format_success_rate(1, 32), "3.13%");
        assert_eq!(format_success_rate(5, 32), "15.63%");
        assert_eq!(format_success_rate(9, 32), "28.13%");
        assert_eq!(format_success_rate(13, 32), "40.63%");
        assert_eq!(format_success_rate(1, 8), "12.50%");
        assert_eq!(format_success_rate(1, 3), "33.33%");
    }

    #[test]
    fn statistics_by_operation() {
        let mut ledger = Ledger::default();
        ledger.record(result("get", true));
        ledger.record(result("get", false));
        ledger.record(result("list", true));

        let stats = ledger.statistics();
        assert_eq!(stats.total_operations, 2);
        assert_eq!(stats.total_comparisons, 3);
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.mismatches, 1);
        assert_eq!(stats.overall_success_rate, "66.67%");

        let get = &stats.operation_stats["get"];
        assert_eq!(get.count, 2);
        assert_eq!(get.mismatches, 1);
        assert_eq!(get.success_rate, "50.00%");
    }

    #[test]
    fn discrepancies_tagged_in_call_order() {
        let mut ledger = Ledger::default();
        ledger.record(result("a", false));
        ledger.record(result("b", true));
        ledger.record(ComparisonResult::evaluate(
            "c",
            Ok(json!(1)),
            Err(CapturedError::new("x")),
            &DiffOptions::default(),
        ));

        let tagged = ledger.discrepancies();
        let names: Vec<&str> = tagged.iter().map(|d| d.operation_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut ledger = Ledger::default();
        ledger.record(result("a", false));
        ledger.clear();

        let stats = ledger.statistics();
        assert_eq!(stats.total_comparisons, 0);
        assert_eq!(stats.total_operations, 0);
        assert_eq!(stats.overall_success_rate, "0%");
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn tagged_discrepancy_flattens() {
        let mut ledger = Ledger::default();
        ledger.record(result("get", false));
        let v = serde_json::to_value(&ledger.discrepancies()[0]).unwrap();
        assert_eq!(v["operationName"], json!("get"));
        assert_eq!(v["type"], json!("value_mismatch"));
    }
}

//! Structural diff with path tracking
//!
//! The walk is iterative over an explicit stack, so nesting depth is bounded
//! by heap rather than call stack. Discrepancies come out in pre-order: an
//! object's missing-key entries precede the entries of its children, and
//! children are visited in key order.

use crate::discrepancy::{Discrepancy, DiscrepancyKind};
use crate::options::DiffOptions;
use serde_json::{Map, Value};

/// Outcome of a structural diff
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiffReport {
    /// Every difference found, in walk order
    pub discrepancies: Vec<Discrepancy>,
}

impl DiffReport {
    /// Whether the two values are structurally equal under the options
    #[inline]
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Paths of all discrepancies
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.discrepancies.iter().map(|d| d.path.as_str()).collect()
    }
}

/// Pending comparison
struct Frame<'a> {
    path: String,
    /// Name of the nearest enclosing object field (array elements inherit it)
    field: Option<&'a str>,
    legacy: Option<&'a Value>,
    new: Option<&'a Value>,
}

/// Diff `legacy` against `new`
///
/// # Rules
/// - A custom comparator registered for the current field name decides
///   equality on its own; the subtree is not walked further.
/// - Objects report one-sided keys once per object, then recurse into shared
///   keys that are neither ignored nor (with `compare_timestamps` off)
///   timestamp-like.
/// - Arrays recurse by index; an index present on one side only yields a
///   value mismatch with the other side absent.
/// - Anything else compares by value, with numbers compared numerically.
#[must_use]
pub fn diff(legacy: &Value, new: &Value, options: &DiffOptions) -> DiffReport {
    let mut discrepancies = Vec::new();
    let mut stack = vec![Frame {
        path: String::new(),
        field: None,
        legacy: Some(legacy),
        new: Some(new),
    }];

    while let Some(frame) = stack.pop() {
        if let Some(cmp) = frame.field.and_then(|f| options.comparator_for(f)) {
            let l = frame.legacy.unwrap_or(&Value::Null);
            let n = frame.new.unwrap_or(&Value::Null);
            if !cmp(l, n) {
                discrepancies.push(Discrepancy::value_mismatch(
                    frame.path,
                    frame.legacy.cloned(),
                    frame.new.cloned(),
                ));
            }
            continue;
        }

        match (frame.legacy, frame.new) {
            (Some(Value::Object(l)), Some(Value::Object(n))) => {
                visit_object(&frame.path, l, n, options, &mut stack, &mut discrepancies);
            }
            (Some(Value::Array(l)), Some(Value::Array(n))) => {
                for i in (0..l.len().max(n.len())).rev() {
                    stack.push(Frame {
                        path: format!("{}[{}]", frame.path, i),
                        field: frame.field,
                        legacy: l.get(i),
                        new: n.get(i),
                    });
                }
            }
            (l, n) => {
                if !leaf_eq(l, n) {
                    discrepancies.push(Discrepancy::value_mismatch(
                        frame.path,
                        l.cloned(),
                        n.cloned(),
                    ));
                }
            }
        }
    }

    DiffReport { discrepancies }
}

fn visit_object<'a>(
    path: &str,
    legacy: &'a Map<String, Value>,
    new: &'a Map<String, Value>,
    options: &DiffOptions,
    stack: &mut Vec<Frame<'a>>,
    out: &mut Vec<Discrepancy>,
) {
    let only_legacy: Vec<String> = legacy
        .keys()
        .filter(|k| !new.contains_key(*k))
        .cloned()
        .collect();
    if !only_legacy.is_empty() {
        out.push(Discrepancy::missing_keys(
            path,
            DiscrepancyKind::MissingKeysNew,
            only_legacy,
        ));
    }

    let only_new: Vec<String> = new
        .keys()
        .filter(|k| !legacy.contains_key(*k))
        .cloned()
        .collect();
    if !only_new.is_empty() {
        out.push(Discrepancy::missing_keys(
            path,
            DiscrepancyKind::MissingKeysLegacy,
            only_new,
        ));
    }

    let shared: Vec<(&'a String, &'a Value, &'a Value)> = legacy
        .iter()
        .filter_map(|(k, l)| new.get(k).map(|n| (k, l, n)))
        .filter(|(k, _, _)| !options.skips(k))
        .collect();

    for (key, l, n) in shared.into_iter().rev() {
        stack.push(Frame {
            path: child_path(path, key),
            field: Some(key.as_str()),
            legacy: Some(l),
            new: Some(n),
        });
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Strict equality; `1` and `1.0` are the same number
fn leaf_eq(legacy: Option<&Value>, new: Option<&Value>) -> bool {
    match (legacy, new) {
        (Some(Value::Number(l)), Some(Value::Number(n))) => {
            if let (Some(a), Some(b)) = (l.as_i64(), n.as_i64()) {
                a == b
            } else if let (Some(a), Some(b)) = (l.as_u64(), n.as_u64()) {
                a == b
            } else {
                l.as_f64() == n.as_f64()
            }
        }
        (l, n) => l == n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(l: Value, n: Value) -> DiffReport {
        diff(&l, &n, &DiffOptions::default())
    }

    #[test]
    fn identical_values_match() {
        let v = json!({"a": [1, {"b": null}], "c": "x"});
        assert!(run(v.clone(), v).is_match());
    }

    #[test]
    fn primitive_mismatch_at_root() {
        let report = run(json!(3), json!(4));
        assert_eq!(
            report.discrepancies,
            vec![Discrepancy::value_mismatch("", Some(json!(3)), Some(json!(4)))]
        );
    }

    #[test]
    fn nested_paths_use_dots_and_brackets() {
        let report = run(
            json!({"a": {"b": [0, 1, {"c": 1}]}}),
            json!({"a": {"b": [0, 1, {"c": 2}]}}),
        );
        assert_eq!(report.paths(), vec!["a.b[2].c"]);
    }

    #[test]
    fn missing_keys_reported_on_both_sides() {
        let report = run(json!({"a": 1, "b": 2}), json!({"a": 1, "c": 3}));
        assert_eq!(
            report.discrepancies,
            vec![
                Discrepancy::missing_keys("", DiscrepancyKind::MissingKeysNew, vec!["b".into()]),
                Discrepancy::missing_keys("", DiscrepancyKind::MissingKeysLegacy, vec!["c".into()]),
            ]
        );
    }

    #[test]
    fn array_length_difference_surfaces_per_index() {
        let report = run(json!([1, 2]), json!([1, 2, 3]));
        assert_eq!(
            report.discrepancies,
            vec![Discrepancy::value_mismatch("[2]", None, Some(json!(3)))]
        );
    }

    #[test]
    fn null_differs_from_absent() {
        let report = run(json!([null]), json!([]));
        assert_eq!(
            report.discrepancies,
            vec![Discrepancy::value_mismatch("[0]", Some(Value::Null), None)]
        );
    }

    #[test]
    fn type_change_is_value_mismatch() {
        let report = run(json!({"a": [1]}), json!({"a": {"0": 1}}));
        assert_eq!(report.paths(), vec!["a"]);
        assert_eq!(report.discrepancies[0].kind, DiscrepancyKind::ValueMismatch);
    }

    #[test]
    fn integer_and_float_forms_are_equal() {
        assert!(run(json!({"t": 1}), json!({"t": 1.0})).is_match());
        assert!(!run(json!({"t": 1}), json!({"t": 1.5})).is_match());
    }

    #[test]
    fn ignored_field_is_skipped() {
        let opts = DiffOptions::new().ignore_field("timestamp");
        let report = diff(
            &json!({"id": 1, "timestamp": 123}),
            &json!({"id": 1, "timestamp": 456}),
            &opts,
        );
        assert!(report.is_match());
    }

    #[test]
    fn ignored_field_applies_at_any_depth() {
        let opts = DiffOptions::new().ignore_field("etag");
        let report = diff(
            &json!({"items": [{"etag": "a", "v": 1}]}),
            &json!({"items": [{"etag": "b", "v": 1}]}),
            &opts,
        );
        assert!(report.is_match());
    }

    #[test]
    fn timestamps_skipped_only_when_disabled() {
        let l = json!({"id": 1, "createdAt": "2024-01-01", "updatedAt": "2024-01-02"});
        let n = json!({"id": 1, "createdAt": "2025-01-01", "updatedAt": "2025-01-02"});

        let report = diff(&l, &n, &DiffOptions::new());
        assert_eq!(report.paths(), vec!["createdAt", "updatedAt"]);

        let report = diff(&l, &n, &DiffOptions::new().compare_timestamps(false));
        assert!(report.is_match());
    }

    #[test]
    fn custom_comparator_is_authoritative() {
        let opts = DiffOptions::new()
            .with_comparator("name", |a, b| {
                a.as_str().map(str::to_lowercase) == b.as_str().map(str::to_lowercase)
            })
            .with_comparator("strict", |_, _| false);

        let report = diff(
            &json!({"name": "Alice", "strict": 1}),
            &json!({"name": "alice", "strict": 1}),
            &opts,
        );
        assert_eq!(report.paths(), vec!["strict"]);
    }

    #[test]
    fn comparator_applies_to_array_elements_of_its_field() {
        let opts = DiffOptions::new().with_comparator("tags", |_, _| true);
        let report = diff(&json!({"tags": ["a"]}), &json!({"tags": ["b", "c"]}), &opts);
        assert!(report.is_match());
    }

    #[test]
    fn discrepancies_in_preorder() {
        let report = run(
            json!({"a": {"x": 1, "gone": true}, "b": 1}),
            json!({"a": {"x": 2}, "b": 2}),
        );
        assert_eq!(report.paths(), vec!["a", "a.x", "b"]);
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let mut l = json!(1);
        let mut n = json!(2);
        for _ in 0..2_000 {
            l = json!([l]);
            n = json!([n]);
        }
        let report = run(l, n);
        assert_eq!(report.discrepancies.len(), 1);
        assert!(report.discrepancies[0].path.starts_with("[0][0]"));
    }
}

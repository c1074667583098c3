use dualsys_diff::{diff, Discrepancy, DiscrepancyKind, DiffOptions};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| json!(n)),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[a-e]", inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

fn path_set(discrepancies: &[Discrepancy]) -> BTreeSet<(String, DiscrepancyKind)> {
    discrepancies
        .iter()
        .map(|d| (d.path.clone(), d.kind))
        .collect()
}

proptest! {
    #[test]
    fn prop_diff_is_reflexive(x in arb_value()) {
        let report = diff(&x, &x, &DiffOptions::default());
        prop_assert!(report.is_match());
        prop_assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn prop_detection_is_symmetric(a in arb_value(), b in arb_value()) {
        let forward = diff(&a, &b, &DiffOptions::default());
        let backward = diff(&b, &a, &DiffOptions::default());

        prop_assert_eq!(forward.is_match(), backward.is_match());

        let mut mirrored: Vec<Discrepancy> =
            backward.discrepancies.iter().map(Discrepancy::mirrored).collect();
        prop_assert_eq!(path_set(&forward.discrepancies), path_set(&mirrored));

        let mut forward = forward.discrepancies;
        forward.sort_by(|x, y| (&x.path, x.kind.as_str()).cmp(&(&y.path, y.kind.as_str())));
        mirrored.sort_by(|x, y| (&x.path, x.kind.as_str()).cmp(&(&y.path, y.kind.as_str())));
        prop_assert_eq!(forward, mirrored);
    }

    #[test]
    fn prop_ignored_root_field_never_reported(
        a in arb_value(),
        b in arb_value(),
        id in -5i64..5,
    ) {
        let l = json!({"id": id, "payload": a});
        let n = json!({"id": id, "payload": b});
        let report = diff(&l, &n, &DiffOptions::new().ignore_field("payload"));
        prop_assert!(report.is_match());
    }
}

#[test]
fn exclusion_of_timestamp_field() {
    let report = diff(
        &json!({"id": 1, "timestamp": 123}),
        &json!({"id": 1, "timestamp": 456}),
        &DiffOptions::new().ignore_fields(["timestamp"]),
    );
    assert!(report.is_match());
}

#[test]
fn missing_key_asymmetry() {
    let report = diff(
        &json!({"a": 1, "b": 2}),
        &json!({"a": 1, "c": 3}),
        &DiffOptions::default(),
    );

    assert!(!report.is_match());
    assert!(report.discrepancies.iter().any(|d| d.kind == DiscrepancyKind::MissingKeysNew
        && d.keys == vec!["b".to_string()]));
    assert!(report.discrepancies.iter().any(|d| d.kind == DiscrepancyKind::MissingKeysLegacy
        && d.keys == vec!["c".to_string()]));
}

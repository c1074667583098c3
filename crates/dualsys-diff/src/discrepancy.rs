//! Discrepancy records produced by the differ

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of a single difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Both sides hold a value at the path but they differ
    ValueMismatch,
    /// The legacy side lacks keys the new side has
    MissingKeysLegacy,
    /// The new side lacks keys the legacy side has
    MissingKeysNew,
    /// Exactly one side failed to produce a value
    ErrorStateMismatch,
}

impl DiscrepancyKind {
    /// Wire name of the kind
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueMismatch => "value_mismatch",
            Self::MissingKeysLegacy => "missing_keys_legacy",
            Self::MissingKeysNew => "missing_keys_new",
            Self::ErrorStateMismatch => "error_state_mismatch",
        }
    }

    /// Kind as seen from the other side of the comparison
    #[inline]
    #[must_use]
    pub fn mirrored(&self) -> Self {
        match self {
            Self::MissingKeysLegacy => Self::MissingKeysNew,
            Self::MissingKeysNew => Self::MissingKeysLegacy,
            other => *other,
        }
    }
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path-addressed difference between two compared values
///
/// `legacy`/`new` are `None` when the side has no value at `path` (an array
/// index past its end, or an errored operation). `keys` is only populated for
/// the two missing-keys kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Dot/bracket path from the compared root (empty for the root itself)
    pub path: String,
    /// Kind of difference
    #[serde(rename = "type")]
    pub kind: DiscrepancyKind,
    /// Value on the legacy side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy: Option<Value>,
    /// Value on the new side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
    /// Keys missing on one side
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl Discrepancy {
    /// Value mismatch at `path`
    #[inline]
    #[must_use]
    pub fn value_mismatch(
        path: impl Into<String>,
        legacy: Option<Value>,
        new: Option<Value>,
    ) -> Self {
        Self {
            path: path.into(),
            kind: DiscrepancyKind::ValueMismatch,
            legacy,
            new,
            keys: Vec::new(),
        }
    }

    /// Keys present on only one side of the object at `path`
    ///
    /// `kind` must be one of the missing-keys kinds.
    #[inline]
    #[must_use]
    pub fn missing_keys(path: impl Into<String>, kind: DiscrepancyKind, keys: Vec<String>) -> Self {
        debug_assert!(matches!(
            kind,
            DiscrepancyKind::MissingKeysLegacy | DiscrepancyKind::MissingKeysNew
        ));
        Self {
            path: path.into(),
            kind,
            legacy: None,
            new: None,
            keys,
        }
    }

    /// One side succeeded while the other failed
    #[inline]
    #[must_use]
    pub fn error_state(legacy: Option<Value>, new: Option<Value>) -> Self {
        Self {
            path: String::new(),
            kind: DiscrepancyKind::ErrorStateMismatch,
            legacy,
            new,
            keys: Vec::new(),
        }
    }

    /// Same discrepancy seen with legacy and new swapped
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            path: self.path.clone(),
            kind: self.kind.mirrored(),
            legacy: self.new.clone(),
            new: self.legacy.clone(),
            keys: self.keys.clone(),
        }
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        match self.kind {
            DiscrepancyKind::MissingKeysLegacy | DiscrepancyKind::MissingKeysNew => {
                write!(f, "{} at {}: [{}]", self.kind, path, self.keys.join(", "))
            }
            _ => write!(
                f,
                "{} at {}: {} != {}",
                self.kind,
                path,
                render(self.legacy.as_ref()),
                render(self.new.as_ref())
            ),
        }
    }
}

fn render(value: Option<&Value>) -> String {
    value.map_or_else(|| "<absent>".to_string(), Value::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_kind_under_type_key() {
        let d = Discrepancy::value_mismatch("id", Some(json!(3)), Some(json!(4)));
        let value = serde_json::to_value(&d).unwrap();

        assert_eq!(
            value,
            json!({"path": "id", "type": "value_mismatch", "legacy": 3, "new": 4})
        );
    }

    #[test]
    fn missing_keys_serialize_key_list() {
        let d = Discrepancy::missing_keys("", DiscrepancyKind::MissingKeysNew, vec!["b".into()]);
        let value = serde_json::to_value(&d).unwrap();

        assert_eq!(value, json!({"path": "", "type": "missing_keys_new", "keys": ["b"]}));
    }

    #[test]
    fn mirrored_swaps_sides_and_kind() {
        let d = Discrepancy::missing_keys("a", DiscrepancyKind::MissingKeysLegacy, vec!["x".into()]);
        assert_eq!(d.mirrored().kind, DiscrepancyKind::MissingKeysNew);

        let v = Discrepancy::value_mismatch("a", Some(json!(1)), None);
        let m = v.mirrored();
        assert_eq!(m.legacy, None);
        assert_eq!(m.new, Some(json!(1)));
        assert_eq!(m.kind, DiscrepancyKind::ValueMismatch);
    }

    #[test]
    fn display_uses_root_marker() {
        let d = Discrepancy::value_mismatch("", Some(json!("a")), None);
        assert_eq!(d.to_string(), "value_mismatch at <root>: \"a\" != <absent>");
    }
}

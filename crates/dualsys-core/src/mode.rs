//! Dispatch mode selection
//!
//! One closed variant per routing outcome, computed from a [`FlagSnapshot`]
//! on every call and never cached.

use crate::flags::FlagSnapshot;
use serde::Serialize;
use std::fmt;

/// Kind of router operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationClass {
    /// `get`, `list`
    Read,
    /// `create`, `remove`, `add_alias`
    Write,
}

/// Which backend(s) serve a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchMode {
    /// Legacy store only
    LegacyOnly,
    /// Target service only, result adapted to the legacy shape
    TargetOnly,
    /// Legacy write, then best-effort target write
    DualWrite,
    /// Both backends read, legacy result returned
    ShadowCompare,
}

impl DispatchMode {
    /// Pick the mode for `class` given current flag values
    ///
    /// Reads: comparison beats target-read beats legacy.
    /// Writes: target-write beats dual-write beats legacy; comparison is
    /// never applied to writes.
    #[must_use]
    pub fn select(class: OperationClass, flags: &FlagSnapshot) -> Self {
        match class {
            OperationClass::Read if flags.comparison => Self::ShadowCompare,
            OperationClass::Read if flags.target_read => Self::TargetOnly,
            OperationClass::Write if flags.target_write => Self::TargetOnly,
            OperationClass::Write if flags.dual_write => Self::DualWrite,
            _ => Self::LegacyOnly,
        }
    }

    /// Stable name used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LegacyOnly => "LEGACY_ONLY",
            Self::TargetOnly => "TARGET_ONLY",
            Self::DualWrite => "DUAL_WRITE",
            Self::ShadowCompare => "SHADOW_COMPARE",
        }
    }

    /// Whether the target service is invoked at all
    #[inline]
    #[must_use]
    pub fn touches_target(&self) -> bool {
        !matches!(self, Self::LegacyOnly)
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{MockFlagSource, COMPARISON_TESTING, TARGET_READ};

    fn snap(target_read: bool, target_write: bool, dual_write: bool, comparison: bool) -> FlagSnapshot {
        FlagSnapshot {
            target_read,
            target_write,
            dual_write,
            comparison,
        }
    }

    #[test]
    fn all_off_is_legacy() {
        let flags = FlagSnapshot::default();
        assert_eq!(DispatchMode::select(OperationClass::Read, &flags), DispatchMode::LegacyOnly);
        assert_eq!(DispatchMode::select(OperationClass::Write, &flags), DispatchMode::LegacyOnly);
    }

    #[test]
    fn comparison_beats_target_read() {
        let flags = snap(true, false, false, true);
        assert_eq!(
            DispatchMode::select(OperationClass::Read, &flags),
            DispatchMode::ShadowCompare
        );
    }

    #[test]
    fn comparison_never_applies_to_writes() {
        let flags = snap(false, false, false, true);
        assert_eq!(
            DispatchMode::select(OperationClass::Write, &flags),
            DispatchMode::LegacyOnly
        );
    }

    #[test]
    fn target_write_beats_dual_write() {
        let flags = snap(false, true, true, false);
        assert_eq!(
            DispatchMode::select(OperationClass::Write, &flags),
            DispatchMode::TargetOnly
        );
        let flags = snap(false, false, true, false);
        assert_eq!(DispatchMode::select(OperationClass::Write, &flags), DispatchMode::DualWrite);
    }

    #[test]
    fn dual_write_irrelevant_for_reads() {
        let flags = snap(false, false, true, false);
        assert_eq!(DispatchMode::select(OperationClass::Read, &flags), DispatchMode::LegacyOnly);
    }

    #[test]
    fn selects_from_mocked_source() {
        let mut source = MockFlagSource::new();
        source
            .expect_is_enabled()
            .returning(|key| key == TARGET_READ || key == COMPARISON_TESTING);

        let flags = FlagSnapshot::capture(&source);
        assert_eq!(
            DispatchMode::select(OperationClass::Read, &flags),
            DispatchMode::ShadowCompare
        );
        assert_eq!(
            DispatchMode::select(OperationClass::Write, &flags),
            DispatchMode::LegacyOnly
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(DispatchMode::DualWrite.to_string(), "DUAL_WRITE");
        assert!(!DispatchMode::LegacyOnly.touches_target());
        assert!(DispatchMode::ShadowCompare.touches_target());
    }
}

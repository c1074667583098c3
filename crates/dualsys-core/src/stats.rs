//! Routing counters
//!
//! Lock-free per-router counters. Each counter is bumped only after the
//! backend call it describes has settled.

use crate::flags::FlagSnapshot;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter
#[derive(Debug, Default)]
pub struct Counter {
    v: AtomicU64,
}

impl Counter {
    /// Create zeroed counter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            v: AtomicU64::new(0),
        }
    }

    /// Add one
    #[inline]
    pub fn inc(&self) {
        self.v.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn load(&self) -> u64 {
        self.v.load(Ordering::Relaxed)
    }

    /// Back to zero
    #[inline]
    pub fn reset(&self) {
        self.v.store(0, Ordering::Relaxed);
    }
}

/// Which counter a routed call lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Read served by the legacy store
    LegacyRead,
    /// Read served by the target service
    NewRead,
    /// Write served by the legacy store alone
    LegacyWrite,
    /// Write served by the target service
    NewWrite,
    /// Write that landed in both backends
    DualWrite,
    /// Read shadow-compared across both backends
    ComparisonTest,
}

/// Per-router call counters
#[derive(Debug, Default)]
pub struct RoutingCounters {
    legacy_reads: Counter,
    new_reads: Counter,
    legacy_writes: Counter,
    new_writes: Counter,
    dual_writes: Counter,
    comparison_tests: Counter,
}

impl RoutingCounters {
    /// Create zeroed counters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one routed call
    pub fn record(&self, kind: RouteKind) {
        match kind {
            RouteKind::LegacyRead => self.legacy_reads.inc(),
            RouteKind::NewRead => self.new_reads.inc(),
            RouteKind::LegacyWrite => self.legacy_writes.inc(),
            RouteKind::NewWrite => self.new_writes.inc(),
            RouteKind::DualWrite => self.dual_writes.inc(),
            RouteKind::ComparisonTest => self.comparison_tests.inc(),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.legacy_reads.reset();
        self.new_reads.reset();
        self.legacy_writes.reset();
        self.new_writes.reset();
        self.dual_writes.reset();
        self.comparison_tests.reset();
    }

    /// Snapshot combined with the current flag state
    #[must_use]
    pub fn snapshot(&self, flags: &FlagSnapshot) -> RoutingStatistics {
        RoutingStatistics {
            legacy_reads: self.legacy_reads.load(),
            new_reads: self.new_reads.load(),
            legacy_writes: self.legacy_writes.load(),
            new_writes: self.new_writes.load(),
            dual_writes: self.dual_writes.load(),
            comparison_tests: self.comparison_tests.load(),
            target_system_active: flags.target_active(),
            comparison_testing_active: flags.comparison,
            dual_write_active: flags.dual_write,
        }
    }
}

/// Point-in-time routing statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingStatistics {
    /// See [`RouteKind::LegacyRead`]
    pub legacy_reads: u64,
    /// See [`RouteKind::NewRead`]
    pub new_reads: u64,
    /// See [`RouteKind::LegacyWrite`]
    pub legacy_writes: u64,
    /// See [`RouteKind::NewWrite`]
    pub new_writes: u64,
    /// See [`RouteKind::DualWrite`]
    pub dual_writes: u64,
    /// See [`RouteKind::ComparisonTest`]
    pub comparison_tests: u64,
    /// Target read or write flag is on
    pub target_system_active: bool,
    /// Comparison testing flag is on
    pub comparison_testing_active: bool,
    /// Dual-write flag is on
    pub dual_write_active: bool,
}

impl RoutingStatistics {
    /// Reads served (including shadow-compared reads)
    #[inline]
    #[must_use]
    pub fn total_reads(&self) -> u64 {
        self.legacy_reads + self.new_reads + self.comparison_tests
    }

    /// Writes served
    #[inline]
    #[must_use]
    pub fn total_writes(&self) -> u64 {
        self.legacy_writes + self.new_writes + self.dual_writes
    }
}

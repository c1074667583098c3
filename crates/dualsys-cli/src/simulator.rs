//! Migration simulator
//!
//! Wires one router over seeded in-memory backends and replays a random,
//! seed-reproducible mix of reads and writes. The target store is seeded
//! with deliberate drift so shadow comparisons have something to report:
//! - every `drift_every`-th personality is missing from the target
//! - the one after it carries a different temperature

use dualsys_core::{
    build_router, CreateOptions, DispatchMode, InMemoryLegacyRegistry, InMemoryTargetService,
    LegacyRegistry, MigrationConfig, OperationClass, RoutingStatistics, TargetService,
};
use dualsys_shadow::ComparatorStatistics;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

const OWNER: &str = "sim-owner";
const INTRUDER: &str = "sim-intruder";

/// Simulator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Routed calls to replay
    pub calls: u64,
    /// Personalities seeded before the run
    pub population: usize,
    /// Drift period between the two stores; 0 disables drift
    pub drift_every: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            calls: 1000,
            population: 12,
            drift_every: 4,
        }
    }
}

/// One replayed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedOperation {
    Get(String),
    List,
    Create(String),
    AddAlias {
        name: String,
        alias: String,
        requester: &'static str,
    },
    Remove {
        name: String,
        requester: &'static str,
    },
}

/// Outcome counts seen by the caller
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatorStats {
    pub reads: u64,
    pub reads_found: u64,
    pub failed_reads: u64,
    pub writes: u64,
    pub rejected_writes: u64,
}

/// Final report
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub read_mode: DispatchMode,
    pub write_mode: DispatchMode,
    pub stats: SimulatorStats,
    pub routing: RoutingStatistics,
    pub comparison: ComparatorStatistics,
}

impl SimulatorReport {
    /// No read failed with an operative error
    pub fn passed(&self) -> bool {
        self.stats.failed_reads == 0
    }

    /// Generate text report
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        let r = &self.routing;

        report.push_str("=== Migration Simulator Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Calls: {}", self.config.calls);
        let _ = writeln!(report, "Read Mode: {}", self.read_mode);
        let _ = writeln!(report, "Write Mode: {}", self.write_mode);

        report.push_str("\n--- Caller View ---\n");
        let _ = writeln!(report, "Reads: {} ({} found)", self.stats.reads, self.stats.reads_found);
        let _ = writeln!(report, "Failed Reads: {}", self.stats.failed_reads);
        let _ = writeln!(report, "Writes: {}", self.stats.writes);
        let _ = writeln!(report, "Rejected Writes: {}", self.stats.rejected_writes);

        report.push_str("\n--- Routing ---\n");
        let _ = writeln!(report, "Legacy Reads: {}", r.legacy_reads);
        let _ = writeln!(report, "New Reads: {}", r.new_reads);
        let _ = writeln!(report, "Comparison Tests: {}", r.comparison_tests);
        let _ = writeln!(report, "Legacy Writes: {}", r.legacy_writes);
        let _ = writeln!(report, "New Writes: {}", r.new_writes);
        let _ = writeln!(report, "Dual Writes: {}", r.dual_writes);

        if self.comparison.total_comparisons > 0 {
            report.push_str("\n--- Shadow Comparisons ---\n");
            let _ = writeln!(
                report,
                "Total: {} ({} matched, {} mismatched, {})",
                self.comparison.total_comparisons,
                self.comparison.matches,
                self.comparison.mismatches,
                self.comparison.overall_success_rate
            );
            for (name, op) in &self.comparison.operation_stats {
                let _ = writeln!(report, "  {name}: {}/{} ({})", op.matches, op.count, op.success_rate);
            }
        }

        let _ = write!(
            report,
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

fn persona(i: usize) -> String {
    format!("persona-{i:03}")
}

fn seed_options(i: usize) -> CreateOptions {
    CreateOptions::new()
        .with_display_name(format!("Persona {i}"))
        .with_temperature(0.7)
        .with_max_word_count(200)
}

async fn seed_backends(
    config: &SimulatorConfig,
    legacy: &InMemoryLegacyRegistry,
    target: &InMemoryTargetService,
) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::with_capacity(config.population);
    for i in 0..config.population {
        let name = persona(i);
        legacy.register(&name, OWNER, &seed_options(i)).await?;

        let drift = config.drift_every > 0 && i % config.drift_every == 0;
        let skewed = config.drift_every > 0 && i % config.drift_every == 1;
        if !drift {
            let options = if skewed {
                seed_options(i).with_temperature(0.9)
            } else {
                seed_options(i)
            };
            target.register(&name, OWNER, &options).await?;
        }
        names.push(name);
    }
    Ok(names)
}

/// Run the simulator against routing settings from `migration`
///
/// # Errors
/// Fails only if seeding the in-memory backends fails.
pub async fn run_simulator(
    config: SimulatorConfig,
    migration: &MigrationConfig,
) -> anyhow::Result<SimulatorReport> {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let legacy = Arc::new(InMemoryLegacyRegistry::new());
    let target = Arc::new(InMemoryTargetService::new());
    let mut names = seed_backends(&config, &legacy, &target).await?;

    let flags = Arc::new(migration.feature_flags());
    let router = build_router(migration, legacy, target, flags);
    let read_mode = router.dispatch_mode(OperationClass::Read);
    let write_mode = router.dispatch_mode(OperationClass::Write);
    tracing::info!(seed = config.seed, calls = config.calls, %read_mode, %write_mode, "simulation started");

    let mut stats = SimulatorStats::default();
    for i in 0..config.calls {
        match generate_operation(&mut rng, &names, i) {
            SimulatedOperation::Get(name) => {
                stats.reads += 1;
                match router.get(&name).await {
                    Ok(Some(_)) => stats.reads_found += 1,
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "simulated read failed");
                        stats.failed_reads += 1;
                    }
                }
            }
            SimulatedOperation::List => {
                stats.reads += 1;
                if let Err(e) = router.list().await {
                    tracing::error!(error = %e, "simulated list failed");
                    stats.failed_reads += 1;
                }
            }
            SimulatedOperation::Create(name) => {
                stats.writes += 1;
                let outcome = router.create(&name, OWNER, &CreateOptions::new()).await;
                if outcome.success {
                    names.push(name);
                } else {
                    stats.rejected_writes += 1;
                }
            }
            SimulatedOperation::AddAlias {
                name,
                alias,
                requester,
            } => {
                stats.writes += 1;
                if !router.add_alias(&name, &alias, requester).await.success {
                    stats.rejected_writes += 1;
                }
            }
            SimulatedOperation::Remove { name, requester } => {
                stats.writes += 1;
                if router.remove(&name, requester).await.success {
                    names.retain(|n| n != &name);
                } else {
                    stats.rejected_writes += 1;
                }
            }
        }
    }

    Ok(SimulatorReport {
        config,
        read_mode,
        write_mode,
        stats,
        routing: router.routing_statistics(),
        comparison: router.comparator().statistics(),
    })
}

/// Generate a random operation
///
/// Weights: 60% get, 10% list, 15% create, 10% add-alias, 5% remove.
fn generate_operation(rng: &mut StdRng, names: &[String], step: u64) -> SimulatedOperation {
    let pick = |rng: &mut StdRng| -> Option<String> {
        if names.is_empty() {
            None
        } else {
            Some(names[rng.gen_range(0..names.len())].clone())
        }
    };
    let requester = |rng: &mut StdRng| if rng.gen_bool(0.9) { OWNER } else { INTRUDER };

    match rng.gen_range(0..20) {
        0..=11 => match pick(&mut *rng) {
            Some(name) if rng.gen_bool(0.9) => SimulatedOperation::Get(name),
            _ => SimulatedOperation::Get(format!("ghost-{step}")),
        },
        12..=13 => SimulatedOperation::List,
        14..=16 => SimulatedOperation::Create(format!("sim-{step}")),
        17..=18 => match pick(&mut *rng) {
            Some(name) => SimulatedOperation::AddAlias {
                alias: format!("{name}-alias-{step}"),
                name,
                requester: requester(&mut *rng),
            },
            None => SimulatedOperation::List,
        },
        _ => match pick(&mut *rng) {
            Some(name) => SimulatedOperation::Remove {
                name,
                requester: requester(&mut *rng),
            },
            None => SimulatedOperation::List,
        },
    }
}

//! `diff` and `flags` subcommands

use anyhow::Context;
use dualsys_core::flags::ROUTING_FLAGS;
use dualsys_core::{env_var_name, DispatchMode, FlagSnapshot, MigrationConfig, OperationClass};
use dualsys_diff::{diff, DiffOptions, DiffReport};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Load config from `path` (or defaults), then apply `FEATURE_FLAG_*` overrides
///
/// # Errors
/// Propagates config loading failures.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<MigrationConfig> {
    let mut config = match path {
        Some(path) => MigrationConfig::load(path)
            .with_context(|| format!("loading migration config from {}", path.display()))?,
        None => MigrationConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
}

/// Diff two JSON documents
///
/// # Errors
/// Fails if either file cannot be read or parsed.
pub fn diff_files(
    legacy: &Path,
    new: &Path,
    ignore: &[String],
    compare_timestamps: bool,
) -> anyhow::Result<DiffReport> {
    let legacy = read_json(legacy)?;
    let new = read_json(new)?;
    let options = DiffOptions::new()
        .ignore_fields(ignore.iter().cloned())
        .compare_timestamps(compare_timestamps);
    Ok(diff(&legacy, &new, &options))
}

/// Human-readable diff listing
pub fn render_diff(report: &DiffReport) -> String {
    if report.is_match() {
        return "match: no discrepancies\n".to_string();
    }
    let mut out = format!("mismatch: {} discrepancies\n", report.discrepancies.len());
    for d in &report.discrepancies {
        let _ = writeln!(out, "  {d}");
    }
    out
}

/// Resolved flags and the modes they select
#[derive(Debug, Clone, Serialize)]
pub struct FlagReport {
    /// Every configured or routing flag with its value
    pub flags: BTreeMap<String, bool>,
    /// Override variable per flag
    pub env: BTreeMap<String, String>,
    pub read_mode: DispatchMode,
    pub write_mode: DispatchMode,
}

impl FlagReport {
    /// Build from a config whose overrides are already applied
    pub fn from_config(config: &MigrationConfig) -> Self {
        let mut flags = config.flags.clone();
        for key in ROUTING_FLAGS {
            flags.entry(key.to_string()).or_insert(false);
        }
        let env = flags.keys().map(|k| (k.clone(), env_var_name(k))).collect();

        let table = config.feature_flags();
        let snapshot = FlagSnapshot::capture(&table);
        Self {
            flags,
            env,
            read_mode: DispatchMode::select(OperationClass::Read, &snapshot),
            write_mode: DispatchMode::select(OperationClass::Write, &snapshot),
        }
    }

    /// Generate text report
    pub fn generate_text(&self) -> String {
        let mut out = String::from("Flags\n=====\n");
        for (key, enabled) in &self.flags {
            let var = self.env.get(key).map_or("", String::as_str);
            let _ = writeln!(out, "  {key:<40} {:<5}  ({var})", if *enabled { "on" } else { "off" });
        }
        let _ = write!(
            out,
            "\nRead mode:  {}\nWrite mode: {}\n",
            self.read_mode, self.write_mode
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualsys_core::flags::{DUAL_WRITE, TARGET_READ};
    use pretty_assertions::assert_eq;

    #[test]
    fn diff_files_reports_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("legacy.json");
        let b = dir.path().join("new.json");
        std::fs::write(&a, r#"{"name":"albert","updatedAt":"2024-01-01","tags":[1,2]}"#).unwrap();
        std::fs::write(&b, r#"{"name":"albert","updatedAt":"2025-01-01","tags":[1,3]}"#).unwrap();

        let report = diff_files(&a, &b, &[], true).unwrap();
        assert_eq!(report.paths(), vec!["tags[1]", "updatedAt"]);

        let report = diff_files(&a, &b, &["tags".to_string()], false).unwrap();
        assert!(report.is_match());
        assert_eq!(render_diff(&report), "match: no discrepancies\n");
    }

    #[test]
    fn diff_files_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        std::fs::write(&a, "{not json").unwrap();
        let err = diff_files(&a, &a, &[], true).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn flag_report_lists_routing_flags() {
        let config = MigrationConfig::new()
            .with_flag(TARGET_READ, true)
            .with_flag(DUAL_WRITE, true)
            .with_flag("unrelated.flag", true);
        let report = FlagReport::from_config(&config);

        assert_eq!(report.flags.len(), 5);
        assert_eq!(report.read_mode, DispatchMode::TargetOnly);
        assert_eq!(report.write_mode, DispatchMode::DualWrite);
        assert_eq!(
            report.env[DUAL_WRITE],
            "FEATURE_FLAG_PERSONALITY_TARGET_DUAL_WRITE"
        );
        assert!(report.generate_text().contains("Write mode: DUAL_WRITE"));
    }
}

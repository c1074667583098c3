//! Dualsys CLI - drivers behind the `dualsys` binary
//!
//! - `simulate`: replay a seeded call mix through one router
//! - `diff`: structural diff of two JSON documents
//! - `flags`: resolved flag table and the dispatch modes it selects

#![allow(missing_docs)]

pub mod commands;
pub mod simulator;

pub use commands::{diff_files, load_config, render_diff, FlagReport};
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport};

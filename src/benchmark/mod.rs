//! Benchmark execution and sweep orchestration
//!
//! This module provides:
//! - `BenchmarkExecutor`/`FlentExecutor`: run flent and capture its report
//! - `TrialRunner`: one trial at one target, gateway update included
//! - `Sweep`: baseline and search passes over every tunnel and test

pub mod executor;
pub mod orchestrator;
pub mod trial;

pub use executor::{write_error_artifact, BenchmarkExecutor, BenchmarkOutput, BenchmarkRequest, FlentExecutor};
pub use orchestrator::{print_summary, Sweep, TestOutcome};
pub use trial::TrialRunner;

//! Benchmark report parsing
//!
//! This module provides:
//! - `Measurement`: the structured result of one flent run
//! - Summary statistics (mean, standard deviation, coefficient of variation)
//!   over per-stream throughput samples

pub mod parser;
pub mod stats;

pub use parser::Measurement;
pub use stats::{coefvar, mean, stddev};

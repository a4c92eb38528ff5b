//! Configuration module

pub mod cli;
pub mod link;
pub mod tuning_config;

pub use cli::CliArgs;
pub use link::{LinkConfig, Tunnel};
pub use tuning_config::{TuningConfig, ASCENT_FACTORS, DESCENT_FACTOR, LATENCY_FACTOR};

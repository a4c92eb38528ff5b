//! sqm-autotune library
//!
//! Searches for the SQM shaping target that gives a gateway the best balance
//! of throughput and latency, measured with flent.

pub mod benchmark;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod gateway;
pub mod history;
pub mod measurement;
pub mod utils;

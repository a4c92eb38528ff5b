//! Tuning configuration derived from CLI arguments

use chrono::{DateTime, Local};
use std::path::PathBuf;

use super::cli::CliArgs;
use super::link::Tunnel;
use crate::controller::{AscendingConfig, DescendingConfig, OddRunCount};
use crate::utils::{protect_for_filename, Result, TunerError};

/// Factor of the first descending pass
pub const DESCENT_FACTOR: f64 = 0.7;
/// Factors of the two ascending refinement passes
pub const ASCENT_FACTORS: [f64; 2] = [1.15, 1.05];
/// Factor of the latency pass
pub const LATENCY_FACTOR: f64 = 0.95;

/// Complete sweep configuration
#[derive(Debug, Clone)]
pub struct TuningConfig {
    pub device: String,
    pub router_host: String,
    pub router_user: String,
    pub tunnels: Vec<Tunnel>,
    pub tests: Vec<String>,
    pub baseline_runs: OddRunCount,
    pub ping_limit: f64,
    pub start_at: Option<f64>,
    pub upper_limit: f64,
    pub lower_limit: f64,
    pub output_dir: Option<PathBuf>,
    pub json: bool,
    pub flent: String,
    pub quiet: bool,
}

impl TuningConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        args.validate().map_err(TunerError::Config)?;

        let tunnels = args
            .tunnels
            .iter()
            .map(|t| t.trim().parse())
            .collect::<Result<Vec<Tunnel>>>()?;

        Ok(Self {
            device: args.device.clone(),
            router_host: args.router.clone(),
            router_user: args.user.clone(),
            tunnels,
            tests: args.tests.iter().map(|t| t.trim().to_string()).collect(),
            baseline_runs: OddRunCount::new(args.baseline_runs)?,
            ping_limit: args.ping_limit,
            start_at: args.start_at,
            upper_limit: args.upper_limit,
            lower_limit: args.lower_limit,
            output_dir: args.output_dir.clone(),
            json: args.json,
            flent: args.flent.clone(),
            quiet: args.quiet,
        })
    }

    /// `<device>_<YYYY-mm-dd_HHMM>` unless overridden
    pub fn base_dir(&self, now: DateTime<Local>) -> PathBuf {
        match self.output_dir {
            Some(ref dir) => dir.clone(),
            None => PathBuf::from(protect_for_filename(&format!(
                "{}_{}",
                self.device,
                now.format("%Y-%m-%d_%H%M")
            ))),
        }
    }

    pub fn descending(&self, start_at: f64, factor: f64) -> DescendingConfig {
        DescendingConfig {
            lower_limit: self.lower_limit,
            ..DescendingConfig::new(start_at, factor)
        }
    }

    pub fn ascending(&self, start_at: f64, factor: f64) -> AscendingConfig {
        AscendingConfig {
            upper_limit: self.upper_limit,
            lower_limit: self.lower_limit,
            ..AscendingConfig::new(start_at, factor)
        }
    }
}

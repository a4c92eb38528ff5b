//! Command-line argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Find the best SQM shaping target for a gateway with flent
#[derive(Parser, Debug, Clone)]
#[command(name = "sqm-autotune")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Device name, used in run titles and the output directory name
    pub device: String,

    // ===== Gateway =====
    /// Gateway address reached over ssh
    #[arg(long = "router", default_value = "192.168.1.1")]
    pub router: String,

    /// ssh user on the gateway
    #[arg(long = "user", default_value = "root")]
    pub user: String,

    // ===== Sweep =====
    /// Link encapsulations to test (None, WireGuard, OpenVPN)
    #[arg(long = "tunnels", value_delimiter = ',', default_values = ["None", "WireGuard", "OpenVPN"])]
    pub tunnels: Vec<String>,

    /// flent tests to run per tunnel
    #[arg(long = "tests", value_delimiter = ',', default_values = ["tcp_8down", "tcp_8up", "rrul"])]
    pub tests: Vec<String>,

    /// Unshaped runs used to find the baseline median (odd)
    #[arg(long = "baseline-runs", default_value_t = 5)]
    pub baseline_runs: u32,

    /// Latency limit in ms; a slower selection triggers a latency pass
    #[arg(long = "ping-limit", default_value_t = 10.0)]
    pub ping_limit: f64,

    /// First target of the descending pass in Mbit/s (default: twice the baseline median)
    #[arg(long = "start-at")]
    pub start_at: Option<f64>,

    /// Highest target the ascending passes may try, Mbit/s
    #[arg(long = "upper-limit", default_value_t = 2000.0)]
    pub upper_limit: f64,

    /// Lowest target the descending passes may try, Mbit/s
    #[arg(long = "lower-limit", default_value_t = 1.0)]
    pub lower_limit: f64,

    // ===== Output =====
    /// Output directory (default: <device>_<YYYY-mm-dd_HHMM>)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Also write each run log as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// flent executable
    #[arg(long = "flent", default_value = "flent")]
    pub flent: String,

    /// Only log errors and hide the progress spinner
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.device.trim().is_empty() {
            return Err("device name must not be empty".to_string());
        }

        if self.tunnels.is_empty() {
            return Err("--tunnels must name at least one tunnel".to_string());
        }

        if self.tests.is_empty() || self.tests.iter().any(|t| t.trim().is_empty()) {
            return Err("--tests must name at least one test".to_string());
        }

        if !(self.ping_limit > 0.0) {
            return Err("--ping-limit must be positive".to_string());
        }

        if !(self.lower_limit > 0.0) {
            return Err("--lower-limit must be positive".to_string());
        }

        if self.upper_limit <= self.lower_limit {
            return Err("--upper-limit must be above --lower-limit".to_string());
        }

        if let Some(start_at) = self.start_at {
            if start_at < self.lower_limit || start_at > self.upper_limit {
                return Err(format!(
                    "--start-at must be between {} and {}",
                    self.lower_limit, self.upper_limit
                ));
            }
        }

        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        Ok(())
    }
}

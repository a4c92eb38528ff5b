//! Reader for rendered run logs
//!
//! Collects the run lines of every per-test log below a sweep directory and
//! lists them ordered by SQM target, which makes it easy to eyeball where
//! throughput and latency fall off across passes.

use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Tunnel directories written by a sweep
pub const TUNNEL_DIRS: [&str; 3] = ["None", "WireGuard", "OpenVPN"];

/// Log files written per tunnel directory
pub const LOG_NAMES: [&str; 6] = [
    "tcp_8down.log",
    "tcp_8up.log",
    "rrul.log",
    "tcp_8down_sqm.log",
    "tcp_8up_sqm.log",
    "rrul_sqm.log",
];

fn run_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^.*?([0-9.]+) Mbps.*?([0-9.]+) Mbps").unwrap())
}

/// A run line recovered from a log
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedRun {
    pub throughput: f64,
    pub target: f64,
    pub line: String,
}

impl LoggedRun {
    /// Recognize a line carrying both a throughput and a target in Mbps
    ///
    /// Runs with shaping disabled carry no target and are not recognized.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = run_line_pattern().captures(line)?;
        Some(Self {
            throughput: caps[1].parse().ok()?,
            target: caps[2].parse().ok()?,
            line: line.to_string(),
        })
    }

    /// The line without the trailing data file column
    pub fn without_filename(&self) -> &str {
        strip_filename(&self.line)
    }
}

fn strip_filename(line: &str) -> &str {
    line.split('\t').next().unwrap_or(line).trim_end()
}

/// Echo the non-run lines, then the run lines ordered by target
pub fn summarize_log(content: &str) -> String {
    let mut out = String::new();
    let mut runs = Vec::new();

    for line in content.lines() {
        match LoggedRun::parse(line) {
            Some(run) => runs.push(run),
            None => {
                out.push_str(strip_filename(line));
                out.push('\n');
            }
        }
    }

    runs.sort_by(|a, b| a.target.total_cmp(&b.target));
    for run in &runs {
        out.push_str(&format!("{}\n", run.without_filename()));
    }
    out
}

/// Summaries for every tunnel/log combination below `basedir`
pub fn summarize_sweep(basedir: Option<&Path>) -> String {
    let mut out = String::new();

    for tunnel in TUNNEL_DIRS {
        for logname in LOG_NAMES {
            let mut path = PathBuf::from(tunnel).join(logname);
            if let Some(base) = basedir {
                path = base.join(path);
            }

            match fs::read_to_string(&path) {
                Ok(content) => {
                    out.push_str(&format!("{}\n\n", path.display()));
                    out.push_str(&summarize_log(&content));
                    out.push_str("\n\n");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    out.push_str(&format!("=====> Missing: {}\n", path.display()));
                }
                Err(e) => {
                    out.push_str(&format!("=====> Unreadable: {} ({})\n", path.display(), e));
                }
            }
        }
    }

    out
}

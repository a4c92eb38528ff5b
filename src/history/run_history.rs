//! Append-only run log for one (device, tunnel, test) combination
//!
//! The rendered form is line-oriented and is read back by `show_logs`, which
//! relies on the column order, the two "Mbps" quantities per run line and the
//! tab before the data file name. Keep the layout stable.

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use super::record::{RunId, RunRecord};
use crate::controller::Quantizer;
use crate::utils::Result;

/// History shared by the sequential passes run against one profile
pub type SharedHistory = Arc<Mutex<RunHistory>>;

/// Column header printed under the device/tunnel/test line
pub const COLUMN_HEADER: &str =
    "    Total          Ping       CoV        down     up        Target     sigma";

/// Ordered log of executed runs
#[derive(Debug, Clone)]
pub struct RunHistory {
    device: String,
    tunnel: String,
    test: String,
    quantizer: Quantizer,
    runs: Vec<RunRecord>,
}

impl RunHistory {
    pub fn new(device: impl Into<String>, tunnel: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            tunnel: tunnel.into(),
            test: test.into(),
            quantizer: Quantizer::default(),
            runs: Vec::new(),
        }
    }

    /// Use a non-default fractional threshold when rendering targets
    pub fn with_quantizer(mut self, quantizer: Quantizer) -> Self {
        self.quantizer = quantizer;
        self
    }

    /// Wrap into the shared form handed to controllers
    pub fn shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    pub fn push(&mut self, record: RunRecord) -> RunId {
        self.runs.push(record);
        RunId(self.runs.len() - 1)
    }

    pub fn get(&self, id: RunId) -> Option<&RunRecord> {
        self.runs.get(id.0)
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn mark_good(&mut self, id: RunId) {
        if let Some(run) = self.runs.get_mut(id.0) {
            run.marked_good = true;
        }
    }

    pub fn mark_bad(&mut self, id: RunId) {
        if let Some(run) = self.runs.get_mut(id.0) {
            run.marked_bad = true;
        }
    }

    pub fn mark_selected(&mut self, id: RunId) {
        if let Some(run) = self.runs.get_mut(id.0) {
            run.marked_selected = true;
        }
    }

    /// Selected runs in insertion order
    pub fn selected(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs.iter().filter(|run| run.marked_selected)
    }

    /// Most recently recorded selected run
    pub fn last_selected(&self) -> Option<&RunRecord> {
        self.runs.iter().rev().find(|run| run.marked_selected)
    }

    /// Run ids ordered ascending by `key` (stable for equal keys)
    pub fn ids_sorted_by<F>(&self, mut key: F) -> Vec<RunId>
    where
        F: FnMut(&RunRecord) -> f64,
    {
        let mut keyed: Vec<(f64, RunId)> = self
            .runs
            .iter()
            .enumerate()
            .map(|(i, run)| (key(run), RunId(i)))
            .collect();
        keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    /// Device/tunnel/test line plus column header
    pub fn render_header(&self) -> String {
        format!("{} {} {}\n{}\n", self.device, self.tunnel, self.test, COLUMN_HEADER)
    }

    /// One fixed-width run line
    pub fn render_run(&self, run: &RunRecord, with_output_filename: bool) -> String {
        let m = &run.measurement;
        let mut line = String::new();

        line.push_str(if run.marked_bad {
            " x"
        } else if run.marked_selected {
            "=>"
        } else {
            "  "
        });

        line.push_str(&format!("{:7.2} Mbps  ", run.totals()));
        line.push_str(&match m.ping() {
            Some(ping) => format!("{:6.2} ms  ", ping),
            None => format!("{:6} ms  ", ""),
        });
        line.push_str(&match m.coefvar_both() {
            Some(cov) => format!("{:6.2} %   ", cov * 100.0),
            None => format!("{:6}     ", ""),
        });
        for cov in [m.coefvar_download(), m.coefvar_upload()] {
            line.push_str(&match cov {
                Some(cov) => format!("{:6.2} % ", cov * 100.0),
                None => format!("{:6}  ", ""),
            });
        }
        line.push_str(&self.quantizer.column(run.target));
        line.push_str("    ");
        if let Some(sigma) = m.stddev_both() {
            line.push_str(&format!("{:.4}", sigma));
        }
        if with_output_filename {
            line.push_str(&format!("\t{}", m.data_file().unwrap_or("None")));
        }
        line.push('\n');
        line
    }

    /// Render all runs in insertion order
    pub fn render(&self, with_output_filename: bool) -> String {
        let mut out = self.render_header();
        for run in &self.runs {
            out.push_str(&self.render_run(run, with_output_filename));
        }
        out
    }

    /// Render all runs ordered ascending by `key`
    pub fn render_sorted_by<F>(&self, key: F, with_output_filename: bool) -> String
    where
        F: FnMut(&RunRecord) -> f64,
    {
        let mut out = self.render_header();
        for id in self.ids_sorted_by(key) {
            out.push_str(&self.render_run(&self.runs[id.0], with_output_filename));
        }
        out
    }

    /// Export every run with its derived statistics
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "device": self.device,
            "tunnel": self.tunnel,
            "test": self.test,
            "runs": self.runs.iter().map(|run| {
                let m = &run.measurement;
                serde_json::json!({
                    "target": run.target,
                    "good": run.marked_good,
                    "bad": run.marked_bad,
                    "selected": run.marked_selected,
                    "totals": run.totals(),
                    "ping_ms": m.ping(),
                    "download": m.download(),
                    "upload": m.upload(),
                    "coefvar": m.coefvar_both(),
                    "coefvar_download": m.coefvar_download(),
                    "coefvar_upload": m.coefvar_upload(),
                    "stddev": m.stddev_both(),
                    "data_file": m.data_file(),
                    "measurement": m,
                })
            }).collect::<Vec<_>>()
        })
    }

    /// Write the JSON export to a file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        writeln!(file, "{}", serde_json::to_string_pretty(&self.to_json())?)?;
        Ok(())
    }
}

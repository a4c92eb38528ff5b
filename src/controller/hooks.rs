//! Per-pass context and overridable hooks
//!
//! A pass is one controller invocation against one (device, tunnel, test)
//! combination. `PassHooks` groups the pieces a caller may want to swap out
//! for a pass: run titles and notes, gateway preparation, what happens with
//! the raw report, and how the history is dumped between trials. Hooks are
//! handed to the `TrialRunner` when it is built.

use std::fs;
use std::path::PathBuf;
use tracing::warn;

use super::target::{Quantizer, Target};
use crate::config::LinkConfig;
use crate::gateway::{RemoteShell, SqmControl};
use crate::history::{RunHistory, RunRecord};
use crate::utils::{protect_for_filename, Result};

/// Everything a pass needs to know about where and what it is testing
#[derive(Debug, Clone)]
pub struct PassContext {
    pub device: String,
    pub link: LinkConfig,
    /// flent test profile (`tcp_8down`, `rrul`, ...)
    pub test: String,
    /// Directory flent writes its data files into
    pub dest_dir: PathBuf,
    /// Rendered history is rewritten here after every trial
    pub logname: Option<PathBuf>,
    /// Also export the history as JSON next to `logname`
    pub write_json: bool,
    pub quantizer: Quantizer,
}

impl PassContext {
    pub fn new(device: impl Into<String>, link: LinkConfig, test: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            link,
            test: test.into(),
            dest_dir: dest_dir.into(),
            logname: None,
            write_json: false,
            quantizer: Quantizer::default(),
        }
    }

    pub fn with_logname(mut self, logname: impl Into<PathBuf>) -> Self {
        self.logname = Some(logname.into());
        self
    }

    pub fn with_json(mut self, write_json: bool) -> Self {
        self.write_json = write_json;
        self
    }

    pub fn tunnel_name(&self) -> &'static str {
        self.link.tunnel.as_str()
    }

    /// Target label used in titles and notes
    pub fn label(&self, target: Target) -> String {
        self.quantizer.label(target)
    }

    /// Fresh, empty history for this context
    pub fn new_history(&self) -> RunHistory {
        RunHistory::new(self.device.as_str(), self.tunnel_name(), self.test.as_str())
            .with_quantizer(self.quantizer)
    }
}

/// Overridable steps around each trial
pub trait PassHooks {
    /// flent run title, also used in the data file name
    fn title(&self, ctx: &PassContext, target: Target) -> String {
        let label = ctx.label(target);
        protect_for_filename(&format!(
            "{}_{}_SQM_{}_{}",
            ctx.device,
            ctx.tunnel_name(),
            label,
            label
        ))
    }

    /// Free-form flent note
    fn note(&self, ctx: &PassContext, target: Target) -> String {
        let label = ctx.label(target);
        format!("{} {} {} {}/{}", ctx.device, ctx.tunnel_name(), ctx.test, label, label)
    }

    /// Push interface and overhead, then switch shaping on or off
    ///
    /// Gateway failures are logged; the trials that follow will show them.
    fn prepare(&self, gateway: &mut dyn RemoteShell, ctx: &PassContext, target: Target) {
        if let Err(e) = gateway.sqm_set_params(&ctx.link.iface, ctx.link.overhead) {
            warn!("Failed to set SQM parameters on {}: {}", gateway.describe(), e);
        }
        if let Err(e) = gateway.sqm_enable(target.is_enabled()) {
            warn!("Failed to switch SQM on {}: {}", gateway.describe(), e);
        }
    }

    /// Called with every freshly recorded run
    fn after_run(&self, record: &RunRecord) {
        println!("{}", record.report);
    }

    /// Print the history and rewrite the pass log
    fn dump(&self, ctx: &PassContext, history: &RunHistory, sorted_by_totals: bool) -> Result<()> {
        let render = |with_output_filename| {
            if sorted_by_totals {
                history.render_sorted_by(RunRecord::totals, with_output_filename)
            } else {
                history.render(with_output_filename)
            }
        };

        println!("{}", render(false));
        if let Some(ref logname) = ctx.logname {
            fs::write(logname, format!("{}\n", render(true)))?;
            if ctx.write_json {
                history.write_json(&logname.with_extension("json"))?;
            }
        }
        Ok(())
    }
}

/// Hooks with every default left in place
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl PassHooks for DefaultHooks {}

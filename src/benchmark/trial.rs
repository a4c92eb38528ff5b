//! One benchmark trial, end to end
//!
//! A trial pushes the target to the gateway, restarts SQM, runs the
//! benchmark and parses whatever report came back. Nothing in here fails
//! the search: gateway and benchmark problems are logged (the latter also to
//! an `.err` file) and the possibly empty report is recorded as is.

use tracing::{debug, info, warn};

use super::executor::{write_error_artifact, BenchmarkExecutor, BenchmarkOutput, BenchmarkRequest};
use crate::controller::{PassContext, PassHooks, Target};
use crate::gateway::{RemoteShell, SqmControl};
use crate::history::{RunRecord, SharedHistory};
use crate::utils::Result;

/// Runs trials for one pass against a gateway and benchmark executor
pub struct TrialRunner<'a> {
    gateway: &'a mut dyn RemoteShell,
    executor: &'a mut dyn BenchmarkExecutor,
    hooks: &'a dyn PassHooks,
    context: PassContext,
}

impl<'a> TrialRunner<'a> {
    pub fn new(
        gateway: &'a mut dyn RemoteShell,
        executor: &'a mut dyn BenchmarkExecutor,
        hooks: &'a dyn PassHooks,
        context: PassContext,
    ) -> Self {
        Self {
            gateway,
            executor,
            hooks,
            context,
        }
    }

    pub fn context(&self) -> &PassContext {
        &self.context
    }

    /// Configure the gateway for a pass starting at `target`
    pub fn prepare(&mut self, target: Target) {
        self.hooks.prepare(&mut *self.gateway, &self.context, target);
    }

    fn apply_target(&mut self, target: Target) {
        let applied = match target.kbps() {
            Some(kbps) => self.gateway.sqm_set_targets(kbps, kbps),
            None => self.gateway.sqm_enable(false).map(|_| ()),
        };
        if let Err(e) = applied {
            warn!("Failed to apply target {} on {}: {}", target, self.gateway.describe(), e);
        }
        match self.gateway.sqm_restart() {
            Ok(output) => debug!("sqm restart: {}", output.stdout.trim_end()),
            Err(e) => warn!("Failed to restart SQM on {}: {}", self.gateway.describe(), e),
        }
    }

    fn request(&self, target: Target) -> BenchmarkRequest {
        BenchmarkRequest {
            target,
            host: self.context.link.host.clone(),
            test: self.context.test.clone(),
            title: self.hooks.title(&self.context, target),
            note: self.hooks.note(&self.context, target),
            dest_dir: self.context.dest_dir.clone(),
        }
    }

    /// Run one benchmark at `target` and parse its report
    pub fn run_trial(&mut self, target: Target) -> RunRecord {
        self.apply_target(target);

        let request = self.request(target);
        info!("Starting test: {}", request.note);

        let output = match self.executor.execute(&request) {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to start {}: {}", self.executor.program(), e);
                BenchmarkOutput::spawn_failure(self.executor.program(), &request, &e)
            }
        };

        if !output.is_clean() {
            warn!(
                "{} returned {:?}: {}",
                self.executor.program(),
                output.status,
                output.stderr.trim_end()
            );
            match write_error_artifact(&request.dest_dir, &output) {
                Ok(path) => warn!("Diagnostics written to {}", path.display()),
                Err(e) => warn!("Failed to write diagnostics to {}: {}", request.dest_dir.display(), e),
            }
        }

        let record = RunRecord::from_report(output.stdout, target);
        self.hooks.after_run(&record);
        record
    }

    /// Dump the history through the pass hooks
    pub fn checkpoint(&self, history: &SharedHistory, sorted_by_totals: bool) -> Result<()> {
        let history = history.lock();
        self.hooks.dump(&self.context, &history, sorted_by_totals)
    }
}

//! Per-target hysteresis counters and the shared trial step

use tracing::debug;

use super::target::Target;
use crate::benchmark::TrialRunner;
use crate::classifier::RunClassifier;
use crate::history::{RunId, SharedHistory};

/// Successes and failures observed at the current target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetTally {
    pub successes: u32,
    pub failures: u32,
}

impl TargetTally {
    pub fn record(&mut self, successful: bool) {
        if successful {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    /// Neither threshold reached yet, so the target needs more trials
    pub fn undecided(&self, success_requires: u32, failure_requires: u32) -> bool {
        self.successes < success_requires && self.failures < failure_requires
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Run one trial, classify it, append it and mark it good or bad
///
/// The history lock is only taken after the trial has finished.
pub(crate) fn classify_trial<C: RunClassifier + ?Sized>(
    trials: &mut TrialRunner<'_>,
    history: &SharedHistory,
    classifier: &C,
    target: Target,
    tally: &mut TargetTally,
) -> RunId {
    let record = trials.run_trial(target);
    let successful = classifier.is_successful(&record.measurement, target);
    if classifier.no_progress(&record.measurement, target) {
        debug!("No progress reported at {}", target);
    }

    let id = {
        let mut history = history.lock();
        let id = history.push(record);
        if successful {
            history.mark_good(id);
        } else {
            history.mark_bad(id);
        }
        id
    };

    tally.record(successful);
    debug!(
        "{}: {} (successes {}, failures {})",
        target,
        if successful { "good" } else { "bad" },
        tally.successes,
        tally.failures
    );
    id
}

//! Fixed-repetition sampler
//!
//! Runs a fixed, odd number of trials at one target and selects the median
//! run by total throughput. The median is taken over the whole shared
//! history, not only over the runs of this pass.

use tracing::info;

use super::target::Target;
use crate::benchmark::TrialRunner;
use crate::history::{RunRecord, SharedHistory};
use crate::utils::{Result, TunerError};

/// Positive odd number of repetitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OddRunCount(u32);

impl OddRunCount {
    pub fn new(runs: u32) -> Result<Self> {
        if runs % 2 == 1 {
            Ok(Self(runs))
        } else {
            Err(TunerError::InvalidRunCount(runs))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Index of the median after sorting
    pub fn median_index(&self) -> usize {
        (self.0 / 2) as usize
    }
}

impl Default for OddRunCount {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u32> for OddRunCount {
    type Error = TunerError;

    fn try_from(runs: u32) -> Result<Self> {
        Self::new(runs)
    }
}

/// Median-of-N sampling at a fixed target
#[derive(Debug, Clone)]
pub struct FixedRepetitionSampler {
    runs: OddRunCount,
    target: Target,
}

impl FixedRepetitionSampler {
    pub fn new(runs: OddRunCount, target: Target) -> Self {
        Self { runs, target }
    }

    /// Baseline sampler with shaping switched off
    pub fn unshaped(runs: OddRunCount) -> Self {
        Self::new(runs, Target::Disabled)
    }

    pub fn run(&self, trials: &mut TrialRunner<'_>, history: &SharedHistory) -> Result<RunRecord> {
        let quantizer = trials.context().quantizer;
        info!(
            "Sampling {} runs at {}",
            self.runs.get(),
            quantizer.label(self.target)
        );
        trials.prepare(self.target);

        for _ in 0..self.runs.get() {
            let record = trials.run_trial(self.target);
            history.lock().push(record);
        }

        let median = {
            let mut history = history.lock();
            let sorted = history.ids_sorted_by(RunRecord::totals);
            // history holds at least `runs` records, so the index exists
            let id = sorted[self.runs.median_index()];
            history.mark_selected(id);
            history.records()[id.0].clone()
        };
        trials.checkpoint(history, true)?;

        info!("Median run: {:.2} Mbps", median.totals());
        Ok(median)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::trial::tests::{wireguard_context, FakeFlent};
    use crate::controller::DefaultHooks;
    use crate::gateway::remote_shell::tests::MockShell;
    use crate::history::RunHistory;

    fn sample(runs: u32, totals: &[f64], history: RunHistory) -> (RunRecord, RunHistory, Vec<Target>) {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = MockShell::default();
        let mut flent = FakeFlent::with_totals(totals);
        let ctx = wireguard_context(dir.path()).with_logname(dir.path().join("tcp_8down.log"));
        let history = history.shared();

        let sampler = FixedRepetitionSampler::unshaped(OddRunCount::new(runs).unwrap());
        let median = {
            let mut trials = TrialRunner::new(&mut shell, &mut flent, &DefaultHooks, ctx);
            sampler.run(&mut trials, &history).unwrap()
        };
        let log = std::fs::read_to_string(dir.path().join("tcp_8down.log")).unwrap();
        assert!(log.contains("=>"));
        let history = history.lock().clone();
        (median, history, flent.targets())
    }

    fn empty_history() -> RunHistory {
        RunHistory::new("EA8300", "WireGuard", "tcp_8down")
    }

    #[test]
    fn test_run_count_validation() {
        assert_eq!(OddRunCount::new(5).unwrap().get(), 5);
        assert_eq!(OddRunCount::new(1).unwrap().median_index(), 0);
        assert_eq!(OddRunCount::default().median_index(), 2);

        let err = OddRunCount::new(4).unwrap_err();
        assert!(matches!(err, TunerError::InvalidRunCount(4)));
        assert!(err.is_config());
        assert!(OddRunCount::new(0).is_err());
        assert!(OddRunCount::try_from(7u32).is_ok());
    }

    #[test]
    fn test_selects_median() {
        let (median, history, targets) = sample(5, &[210.0, 190.0, 230.0, 200.0, 220.0], empty_history());
        assert_eq!(targets, vec![Target::Disabled; 5]);
        assert_eq!(median.totals(), 210.0);

        let selected: Vec<f64> = history.selected().map(RunRecord::totals).collect();
        assert_eq!(selected, vec![210.0]);
        assert!(history.records().iter().all(|r| !r.marked_good && !r.marked_bad));
    }

    #[test]
    fn test_median_over_whole_history() {
        let mut history = empty_history();
        for total in [100.0, 110.0, 120.0] {
            history.push(RunRecord::from_report(
                crate::benchmark::trial::tests::steady_report(total, 3.0),
                Target::Disabled,
            ));
        }
        let (median, history, _) = sample(3, &[300.0, 310.0, 320.0], history);
        // sorted: 100 110 120 300 310 320, index 3 / 2 = 1
        assert_eq!(median.totals(), 110.0);
        assert_eq!(history.selected().count(), 1);
        assert_eq!(history.len(), 6);
    }
}

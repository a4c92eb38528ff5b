//! Ascending search
//!
//! Walks the target up from a known-good point. Every confirmed target
//! becomes the best known good one and the search keeps climbing; the first
//! target that fails twice after that ends the pass on the best one. If the
//! starting point itself fails, the search backs off by `factor^backoff_exponent`
//! and climbs again.

use tracing::info;

use super::tally::{classify_trial, TargetTally};
use super::target::Target;
use crate::benchmark::TrialRunner;
use crate::classifier::RunClassifier;
use crate::history::{RunId, RunRecord, SharedHistory};
use crate::utils::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct AscendingConfig {
    pub start_at: f64,
    /// Multiplier applied per step, above 1
    pub factor: f64,
    pub success_requires: u32,
    pub failure_requires: u32,
    /// Search stops once the next target would exceed this
    pub upper_limit: f64,
    /// Without a best known good, the search ends instead of trying a target below this
    pub lower_limit: f64,
    pub backoff_exponent: i32,
}

impl AscendingConfig {
    pub fn new(start_at: f64, factor: f64) -> Self {
        Self {
            start_at,
            factor,
            success_requires: 2,
            failure_requires: 2,
            upper_limit: 2000.0,
            lower_limit: 1.0,
            backoff_exponent: 5,
        }
    }
}

/// Upward search for the ceiling above a confirmed target
pub struct AscendingSearch<C: RunClassifier> {
    config: AscendingConfig,
    classifier: C,
}

impl<C: RunClassifier> AscendingSearch<C> {
    pub fn new(config: AscendingConfig, classifier: C) -> Self {
        Self { config, classifier }
    }

    fn select(history: &SharedHistory, best: Option<RunId>) -> Option<RunRecord> {
        let id = best?;
        let mut history = history.lock();
        history.mark_selected(id);
        history.get(id).cloned()
    }

    fn best_run(history: &SharedHistory, best: Option<RunId>) -> Option<RunRecord> {
        best.and_then(|id| history.lock().get(id).cloned())
    }

    /// Run the pass; `None` when no target was ever confirmed
    pub fn run(&self, trials: &mut TrialRunner<'_>, history: &SharedHistory) -> Result<Option<RunRecord>> {
        let cfg = &self.config;
        let quantizer = trials.context().quantizer;
        let mut current = cfg.start_at;
        let mut tally = TargetTally::default();
        let mut best: Option<RunId> = None;

        info!("Ascending from {} (factor {})", quantizer.label(Target::Rate(current)), cfg.factor);
        trials.prepare(Target::Rate(current));

        loop {
            let target = Target::Rate(current);
            let id = classify_trial(trials, history, &self.classifier, target, &mut tally);

            if tally.undecided(cfg.success_requires, cfg.failure_requires) {
                trials.checkpoint(history, false)?;
                continue;
            }

            if tally.successes >= cfg.success_requires {
                info!("Target {} confirmed", quantizer.label(target));
                best = Some(id);
            }

            if tally.failures >= cfg.failure_requires {
                if best.is_some() {
                    let selected = Self::select(history, best);
                    if let Some(ref run) = selected {
                        info!(
                            "Target {} failed, keeping {}",
                            quantizer.label(target),
                            quantizer.label(run.target)
                        );
                    }
                    trials.checkpoint(history, false)?;
                    return Ok(selected);
                }
                if current <= cfg.lower_limit {
                    info!("Target {} failed with nothing confirmed", quantizer.label(target));
                    trials.checkpoint(history, false)?;
                    return Ok(None);
                }
                current /= cfg.factor.powi(cfg.backoff_exponent);
                info!("Target {} failed, backing off", quantizer.label(target));
            }

            let next = quantizer.step_up(current, current * cfg.factor);
            if next > cfg.upper_limit {
                info!(
                    "Next target {} is above {}",
                    quantizer.label(Target::Rate(next)),
                    quantizer.label(Target::Rate(cfg.upper_limit))
                );
                trials.checkpoint(history, false)?;
                return Ok(Self::best_run(history, best));
            }
            if best.is_none() && next < cfg.lower_limit {
                info!(
                    "Next target {} is below {} with nothing confirmed",
                    quantizer.label(Target::Rate(next)),
                    quantizer.label(Target::Rate(cfg.lower_limit))
                );
                trials.checkpoint(history, false)?;
                return Ok(None);
            }

            info!("Trying {}", quantizer.label(Target::Rate(next)));
            current = next;
            tally.reset();
            trials.checkpoint(history, false)?;
        }
    }
}

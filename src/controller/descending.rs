//! Descending search
//!
//! Starts high and walks the target down until one holds up. A single bad
//! run abandons a target, two good runs confirm it and end the pass.
//! Below `gentle_breakpoint` the target shrinks by `sqrt(factor)` instead of
//! `factor`, so small devices do not overshoot toward zero.

use tracing::info;

use super::tally::{classify_trial, TargetTally};
use super::target::Target;
use crate::benchmark::TrialRunner;
use crate::classifier::RunClassifier;
use crate::history::{RunRecord, SharedHistory};
use crate::utils::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct DescendingConfig {
    pub start_at: f64,
    /// Multiplier applied per step, below 1
    pub factor: f64,
    pub success_requires: u32,
    pub failure_requires: u32,
    /// Search gives up once the next target falls below this
    pub lower_limit: f64,
    pub gentle_breakpoint: f64,
}

impl Default for DescendingConfig {
    fn default() -> Self {
        Self {
            start_at: 1024.0,
            factor: 0.7,
            success_requires: 2,
            failure_requires: 1,
            lower_limit: 1.0,
            gentle_breakpoint: 20.0,
        }
    }
}

impl DescendingConfig {
    pub fn new(start_at: f64, factor: f64) -> Self {
        Self {
            start_at,
            factor,
            ..Self::default()
        }
    }
}

/// Downward search for the highest sustainable target
pub struct DescendingSearch<C: RunClassifier> {
    config: DescendingConfig,
    classifier: C,
}

impl<C: RunClassifier> DescendingSearch<C> {
    pub fn new(config: DescendingConfig, classifier: C) -> Self {
        Self { config, classifier }
    }

    fn scaled(&self, current: f64) -> f64 {
        if current > self.config.gentle_breakpoint {
            current * self.config.factor
        } else {
            current * self.config.factor.sqrt()
        }
    }

    /// Run the pass; `None` when no target down to `lower_limit` held up
    pub fn run(&self, trials: &mut TrialRunner<'_>, history: &SharedHistory) -> Result<Option<RunRecord>> {
        let cfg = &self.config;
        let quantizer = trials.context().quantizer;
        let mut current = cfg.start_at;
        let mut tally = TargetTally::default();

        info!("Descending from {} (factor {})", quantizer.label(Target::Rate(current)), cfg.factor);
        trials.prepare(Target::Rate(current));

        loop {
            let target = Target::Rate(current);
            let id = classify_trial(trials, history, &self.classifier, target, &mut tally);

            if tally.undecided(cfg.success_requires, cfg.failure_requires) {
                trials.checkpoint(history, false)?;
                continue;
            }

            if tally.successes >= cfg.success_requires {
                let selected = {
                    let mut history = history.lock();
                    history.mark_selected(id);
                    history.get(id).cloned()
                };
                info!("Target {} confirmed", quantizer.label(target));
                trials.checkpoint(history, false)?;
                return Ok(selected);
            }

            let next = quantizer.step_down(current, self.scaled(current));
            if next < cfg.lower_limit || next <= 0.0 {
                info!(
                    "No target held up down to {}",
                    quantizer.label(Target::Rate(cfg.lower_limit))
                );
                trials.checkpoint(history, false)?;
                return Ok(None);
            }

            info!(
                "Target {} failed, trying {}",
                quantizer.label(target),
                quantizer.label(Target::Rate(next))
            );
            current = next;
            tally.reset();
            trials.checkpoint(history, false)?;
        }
    }
}

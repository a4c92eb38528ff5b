//! Run classification
//!
//! Decides from one `Measurement` whether the trial counts as a success at
//! the target it ran at. Controllers receive their classifier at
//! construction, so a pass can swap in a stricter latency limit or a
//! scripted predicate without touching the search loop.

use crate::controller::Target;
use crate::measurement::Measurement;

/// Success and stop predicates consulted after every trial
pub trait RunClassifier {
    /// Whether the run satisfies every applicable gate
    fn is_successful(&self, measurement: &Measurement, target: Target) -> bool;

    /// Reserved stopping hint; the default never reports one
    fn no_progress(&self, _measurement: &Measurement, _target: Target) -> bool {
        false
    }
}

/// Variability, target-adequacy and latency gates
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdClassifier {
    /// Pooled coefficient of variation must be below this...
    pub max_coefvar: f64,
    /// ...or pooled standard deviation (Mbit/s) below this
    pub max_stddev: f64,
    /// Each present aggregate direction must reach this share of the target
    pub min_target_fraction: f64,
    /// Latency must be strictly below this many ms when set
    pub ping_limit: Option<f64>,
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self {
            max_coefvar: 0.01,
            max_stddev: 0.02,
            min_target_fraction: 0.7,
            ping_limit: None,
        }
    }
}

impl ThresholdClassifier {
    pub fn with_ping_limit(ping_limit: f64) -> Self {
        Self {
            ping_limit: Some(ping_limit),
            ..Self::default()
        }
    }

    /// Low relative spread or low absolute spread
    pub fn variability_ok(&self, m: &Measurement) -> bool {
        let cov_ok = m.coefvar_both().is_some_and(|cov| cov < self.max_coefvar);
        let sigma_ok = m.stddev_both().is_some_and(|sigma| sigma < self.max_stddev);
        cov_ok || sigma_ok
    }

    /// Shaped runs must deliver a reasonable share of the target per direction
    pub fn target_ok(&self, m: &Measurement, target: Target) -> bool {
        let Some(rate) = target.rate() else {
            return true;
        };
        let floor = rate * self.min_target_fraction;
        [m.download(), m.upload()]
            .into_iter()
            .flatten()
            .all(|throughput| throughput >= floor)
    }

    pub fn latency_ok(&self, m: &Measurement) -> bool {
        match self.ping_limit {
            Some(limit) => m.ping().is_some_and(|ping| ping < limit),
            None => true,
        }
    }
}

impl RunClassifier for ThresholdClassifier {
    fn is_successful(&self, m: &Measurement, target: Target) -> bool {
        self.target_ok(m, target) && self.variability_ok(m) && self.latency_ok(m)
    }
}

/// Classifier backed by a closure
pub struct FnClassifier<F>
where
    F: Fn(&Measurement, Target) -> bool,
{
    predicate: F,
}

impl<F> FnClassifier<F>
where
    F: Fn(&Measurement, Target) -> bool,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> RunClassifier for FnClassifier<F>
where
    F: Fn(&Measurement, Target) -> bool,
{
    fn is_successful(&self, measurement: &Measurement, target: Target) -> bool {
        (self.predicate)(measurement, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a report with the given per-stream download values
    fn report(ping: Option<f64>, download_streams: &[f64], upload_streams: &[f64]) -> Measurement {
        let mut text = String::new();
        if let Some(ping) = ping {
            text.push_str(&format!(
                " Ping (ms) ICMP   :  {:>10.2}  {:>10.2} ms              349\n",
                ping, ping
            ));
        }
        for (label, streams) in [("download", download_streams), ("upload", upload_streams)] {
            if streams.is_empty() {
                continue;
            }
            let sum: f64 = streams.iter().sum();
            text.push_str(&format!(
                " TCP {} sum :  {:>10.2}  {:>10.2} Mbits/s         301\n",
                label, sum, sum
            ));
            for (i, s) in streams.iter().enumerate() {
                text.push_str(&format!(
                    " TCP {}::{}  :  {:>10.2}  {:>10.2} Mbits/s         299\n",
                    label,
                    i + 1,
                    s,
                    s
                ));
            }
        }
        Measurement::parse(&text)
    }

    #[test]
    fn test_steady_run_succeeds() {
        let c = ThresholdClassifier::default();
        let m = report(Some(3.04), &[27.11, 27.12, 27.11, 27.12], &[]);
        assert!(c.is_successful(&m, Target::Rate(120.0)));
        assert!(c.is_successful(&m, Target::Disabled));
    }

    #[test]
    fn test_variability_gate_is_either_or() {
        let c = ThresholdClassifier::default();

        // large absolute spread, small relative spread
        let m = report(None, &[1000.0, 1004.0], &[]);
        assert!(m.stddev_both().unwrap() >= 0.02);
        assert!(m.coefvar_both().unwrap() < 0.01);
        assert!(c.variability_ok(&m));

        // small absolute spread, large relative spread
        let m = report(None, &[0.02, 0.05], &[]);
        assert!(m.stddev_both().unwrap() < 0.02);
        assert!(m.coefvar_both().unwrap() >= 0.01);
        assert!(c.variability_ok(&m));

        // both large
        let m = report(None, &[10.0, 20.0], &[]);
        assert!(!c.variability_ok(&m));
    }

    #[test]
    fn test_missing_samples_fail_variability() {
        let c = ThresholdClassifier::default();
        let m = Measurement::parse("");
        assert!(!c.variability_ok(&m));
        assert!(!c.is_successful(&m, Target::Disabled));
    }

    #[test]
    fn test_target_adequacy_fails_despite_low_variance() {
        let c = ThresholdClassifier::default();
        // four steady streams summing to 68 against a target of 100
        let m = report(Some(3.0), &[16.9, 17.1, 17.0, 17.0], &[]);
        assert_eq!(m.download(), Some(68.0));
        let cov = m.coefvar_both().unwrap();
        assert!(cov > 0.004 && cov < 0.005);
        assert!(c.variability_ok(&m));
        assert!(!c.target_ok(&m, Target::Rate(100.0)));
        assert!(!c.is_successful(&m, Target::Rate(100.0)));

        // the same run is fine at a target it can fill
        assert!(c.is_successful(&m, Target::Rate(90.0)));
        // and is not checked when shaping is off
        assert!(c.is_successful(&m, Target::Disabled));
    }

    #[test]
    fn test_target_adequacy_checks_upload_too() {
        let c = ThresholdClassifier::default();
        let m = report(None, &[40.0, 40.0], &[30.0, 30.0]);
        assert!(!c.target_ok(&m, Target::Rate(100.0)));
        assert!(c.target_ok(&m, Target::Rate(85.0)));
    }

    #[test]
    fn test_latency_gate() {
        let c = ThresholdClassifier::with_ping_limit(10.0);
        let steady = [27.11, 27.12];
        assert!(c.is_successful(&report(Some(9.99), &steady, &[]), Target::Disabled));
        assert!(!c.is_successful(&report(Some(10.0), &steady, &[]), Target::Disabled));
        assert!(!c.is_successful(&report(None, &steady, &[]), Target::Disabled));

        let unlimited = ThresholdClassifier::default();
        assert!(unlimited.is_successful(&report(Some(250.0), &steady, &[]), Target::Disabled));
    }

    #[test]
    fn test_no_progress_defaults_to_false() {
        let c = ThresholdClassifier::default();
        assert!(!c.no_progress(&Measurement::default(), Target::Rate(10.0)));
    }

    #[test]
    fn test_fn_classifier() {
        let c = FnClassifier::new(|_: &Measurement, target: Target| {
            target.rate().is_some_and(|rate| rate < 10.0)
        });
        assert!(c.is_successful(&Measurement::default(), Target::Rate(9.9)));
        assert!(!c.is_successful(&Measurement::default(), Target::Rate(10.0)));
        assert!(!c.is_successful(&Measurement::default(), Target::Disabled));
    }
}

//! Sweep over tunnels and tests
//!
//! Per (tunnel, test) the sweep runs:
//! 1. an unshaped baseline sampler, logged to `<test>.log`
//! 2. a descending pass from twice the baseline median (or `--start-at`)
//! 3. two ascending refinement passes from the last selection
//! 4. a latency pass if the last selection is still above the ping limit
//!
//! Passes 2-4 share one history, logged to `<test>_sqm.log`.

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::executor::BenchmarkExecutor;
use super::trial::TrialRunner;
use crate::classifier::ThresholdClassifier;
use crate::config::{LinkConfig, TuningConfig, ASCENT_FACTORS, DESCENT_FACTOR, LATENCY_FACTOR};
use crate::controller::{
    AscendingSearch, DescendingSearch, FixedRepetitionSampler, PassContext, PassHooks, Target,
};
use crate::gateway::{RemoteShell, SqmControl};
use crate::history::{RunRecord, SharedHistory};
use crate::utils::{protect_for_filename, Result, TunerError};

/// Result of all passes for one (tunnel, test)
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub tunnel: String,
    pub test: String,
    pub baseline: RunRecord,
    /// Last selected shaped run, if any pass confirmed a target
    pub selected: Option<RunRecord>,
}

impl TestOutcome {
    /// One summary line
    pub fn summary_line(&self) -> String {
        let selected = match self.selected {
            Some(ref run) => format!(
                "{} -> {:.2} Mbps, ping {}",
                run.target,
                run.totals(),
                format_ping(run.ping())
            ),
            None => "no target held up".to_string(),
        };
        format!(
            "{:<10} {:<10} baseline {:.2} Mbps, ping {} | SQM {}",
            self.tunnel,
            self.test,
            self.baseline.totals(),
            format_ping(self.baseline.ping()),
            selected
        )
    }
}

fn format_ping(ping: Option<f64>) -> String {
    match ping {
        Some(ping) => format!("{:.2} ms", ping),
        None => "n/a".to_string(),
    }
}

/// Print the per-test outcomes
pub fn print_summary(outcomes: &[TestOutcome]) {
    println!("\n=== Summary ===");
    for outcome in outcomes {
        println!("{}", outcome.summary_line());
    }
}

fn last_selected_rate(history: &SharedHistory) -> Option<f64> {
    history.lock().last_selected().and_then(|run| run.target.rate())
}

/// Drives the full sweep against one gateway
pub struct Sweep<'a> {
    config: &'a TuningConfig,
    gateway: &'a mut dyn RemoteShell,
    executor: &'a mut dyn BenchmarkExecutor,
    hooks: &'a dyn PassHooks,
}

impl<'a> Sweep<'a> {
    pub fn new(
        config: &'a TuningConfig,
        gateway: &'a mut dyn RemoteShell,
        executor: &'a mut dyn BenchmarkExecutor,
        hooks: &'a dyn PassHooks,
    ) -> Self {
        Self {
            config,
            gateway,
            executor,
            hooks,
        }
    }

    fn trials(&mut self, ctx: PassContext) -> TrialRunner<'_> {
        TrialRunner::new(&mut *self.gateway, &mut *self.executor, self.hooks, ctx)
    }

    /// Run every tunnel and test below `base_dir`, which must not exist yet
    pub fn run(&mut self, base_dir: &Path) -> Result<Vec<TestOutcome>> {
        let config = self.config;
        if base_dir.exists() {
            return Err(TunerError::OutputDirExists(base_dir.to_path_buf()));
        }

        // resolve every link first so a bad tunnel aborts before any benchmark
        let links = config
            .tunnels
            .iter()
            .map(|&tunnel| LinkConfig::resolve(tunnel, &mut *self.gateway))
            .collect::<Result<Vec<_>>>()?;

        match self.gateway.sqm_show() {
            Ok(current) => debug!("SQM configuration on {}:\n{}", self.gateway.describe(), current),
            Err(e) => warn!("Failed to read SQM configuration: {}", e),
        }

        fs::create_dir_all(base_dir)?;
        info!("Writing results to {}", base_dir.display());

        let mut outcomes = Vec::new();
        for link in &links {
            let dest_dir = base_dir.join(protect_for_filename(link.tunnel.as_str()));
            fs::create_dir_all(&dest_dir)?;

            for test in &config.tests {
                info!("=== {} {} ===", link.tunnel, test);
                let ctx = PassContext::new(config.device.as_str(), link.clone(), test.as_str(), &dest_dir)
                    .with_json(config.json);
                outcomes.push(self.run_test(ctx)?);
            }
        }
        Ok(outcomes)
    }

    /// Baseline plus search passes for one test
    pub fn run_test(&mut self, ctx: PassContext) -> Result<TestOutcome> {
        let config = self.config;
        let test_log = |suffix: &str| ctx.dest_dir.join(format!("{}{}.log", ctx.test, suffix));

        let baseline_ctx = ctx.clone().with_logname(test_log(""));
        let baseline_history = baseline_ctx.new_history().shared();
        let baseline = FixedRepetitionSampler::unshaped(config.baseline_runs)
            .run(&mut self.trials(baseline_ctx), &baseline_history)?;

        let sqm_ctx = ctx.clone().with_logname(test_log("_sqm"));
        let history = sqm_ctx.new_history().shared();
        let mut outcome = TestOutcome {
            tunnel: ctx.tunnel_name().to_string(),
            test: ctx.test.clone(),
            baseline,
            selected: None,
        };

        let start_at = config
            .start_at
            .unwrap_or_else(|| (2.0 * outcome.baseline.totals()).trunc());
        if start_at < config.lower_limit {
            warn!(
                "Baseline for {} {} is too low to start a search ({} Mbps)",
                outcome.tunnel, outcome.test, start_at
            );
            return Ok(outcome);
        }

        let classifier = ThresholdClassifier::default();
        DescendingSearch::new(config.descending(start_at, DESCENT_FACTOR), classifier.clone())
            .run(&mut self.trials(sqm_ctx.clone()), &history)?;

        for factor in ASCENT_FACTORS {
            let Some(start_at) = last_selected_rate(&history) else {
                warn!(
                    "No selected target for {} {}, skipping remaining passes",
                    outcome.tunnel, outcome.test
                );
                return Ok(outcome);
            };
            AscendingSearch::new(config.ascending(start_at, factor), classifier.clone())
                .run(&mut self.trials(sqm_ctx.clone()), &history)?;
        }

        let last = history.lock().last_selected().cloned();
        if let Some(run) = last {
            let too_slow = run.ping().map_or(true, |ping| ping > config.ping_limit);
            if let (true, Target::Rate(start_at)) = (too_slow, run.target) {
                info!(
                    "Ping {} above {} ms, starting latency pass",
                    format_ping(run.ping()),
                    config.ping_limit
                );
                let mut latency = config.descending(start_at, LATENCY_FACTOR);
                latency.failure_requires = 2;
                DescendingSearch::new(latency, ThresholdClassifier::with_ping_limit(config.ping_limit))
                    .run(&mut self.trials(sqm_ctx), &history)?;
            }
        }

        outcome.selected = history.lock().last_selected().cloned();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::executor::{BenchmarkOutput, BenchmarkRequest};
    use crate::benchmark::trial::tests::steady_report;
    use crate::controller::{DefaultHooks, OddRunCount};
    use crate::config::Tunnel;
    use crate::gateway::remote_shell::tests::MockShell;
    use std::io;

    /// Link that delivers `min(target, capacity)` with a fixed ping
    struct FakeLink {
        capacity: f64,
        ping: f64,
        requests: Vec<BenchmarkRequest>,
    }

    impl BenchmarkExecutor for FakeLink {
        fn execute(&mut self, request: &BenchmarkRequest) -> io::Result<BenchmarkOutput> {
            self.requests.push(request.clone());
            let total = match request.target.rate() {
                Some(rate) => rate.min(self.capacity),
                None => self.capacity,
            };
            Ok(BenchmarkOutput {
                status: Some(0),
                stdout: steady_report(total, self.ping),
                stderr: String::new(),
                args: request.flent_args(),
            })
        }
    }

    fn config(base: &Path, tunnels: Vec<Tunnel>) -> TuningConfig {
        TuningConfig {
            device: "EA8300".to_string(),
            router_host: "192.168.1.1".to_string(),
            router_user: "root".to_string(),
            tunnels,
            tests: vec!["tcp_8down".to_string()],
            baseline_runs: OddRunCount::new(3).unwrap(),
            ping_limit: 10.0,
            start_at: None,
            upper_limit: 2000.0,
            lower_limit: 1.0,
            output_dir: Some(base.to_path_buf()),
            json: false,
            flent: "flent".to_string(),
            quiet: true,
        }
    }

    #[test]
    fn test_sweep_writes_logs() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("sweep");
        let cfg = config(&base, vec![Tunnel::WireGuard]);
        let mut shell = MockShell::default();
        let mut link = FakeLink {
            capacity: 100.0,
            ping: 3.0,
            requests: Vec::new(),
        };

        let outcomes = Sweep::new(&cfg, &mut shell, &mut link, &DefaultHooks)
            .run(&base)
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert_eq!(outcome.tunnel, "WireGuard");
        assert_eq!(outcome.baseline.totals(), 100.0);
        assert!(outcome.selected.is_some());

        // the descending pass starts at twice the baseline median
        let shaped: Vec<&BenchmarkRequest> =
            link.requests.iter().filter(|r| r.target.is_enabled()).collect();
        assert_eq!(shaped[0].target, Target::Rate(200.0));
        assert!(link.requests[..3].iter().all(|r| r.target == Target::Disabled));

        assert!(base.join("WireGuard").join("tcp_8down.log").exists());
        let sqm_log = fs::read_to_string(base.join("WireGuard").join("tcp_8down_sqm.log")).unwrap();
        assert!(sqm_log.starts_with("EA8300 WireGuard tcp_8down\n"));
        assert!(sqm_log.contains("=>"));
    }

    #[test]
    fn test_existing_output_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), vec![Tunnel::WireGuard]);
        let mut shell = MockShell::default();
        let mut link = FakeLink {
            capacity: 100.0,
            ping: 3.0,
            requests: Vec::new(),
        };
        let err = Sweep::new(&cfg, &mut shell, &mut link, &DefaultHooks)
            .run(dir.path())
            .unwrap_err();
        assert!(matches!(err, TunerError::OutputDirExists(_)));
        assert!(link.requests.is_empty());
    }

    #[test]
    fn test_missing_wan_aborts_before_benchmarks() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("sweep");
        let cfg = config(&base, vec![Tunnel::WireGuard, Tunnel::None]);
        let mut shell = MockShell::with_responses(&[""]);
        let mut link = FakeLink {
            capacity: 100.0,
            ping: 3.0,
            requests: Vec::new(),
        };
        let err = Sweep::new(&cfg, &mut shell, &mut link, &DefaultHooks)
            .run(&base)
            .unwrap_err();
        assert!(matches!(err, TunerError::Gateway(_)));
        assert!(link.requests.is_empty());
        assert!(!base.exists());
    }

    #[test]
    fn test_slow_link_gets_latency_pass() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("sweep");
        let cfg = config(&base, vec![Tunnel::OpenVpn]);
        let mut shell = MockShell::default();
        let mut link = FakeLink {
            capacity: 50.0,
            ping: 25.0,
            requests: Vec::new(),
        };

        let outcomes = Sweep::new(&cfg, &mut shell, &mut link, &DefaultHooks)
            .run(&base)
            .unwrap();

        // the latency pass can never satisfy a 25 ms ping and walks down to the floor
        let last = link.requests.last().unwrap();
        assert!(last.target.rate().unwrap() < 2.0);
        assert!(outcomes[0].selected.is_some());
    }
}

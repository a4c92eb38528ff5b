//! Scan a range of SQM targets with one descending pass
//!
//! Every target from `--start-at` down to `--floor` is run once and logged;
//! the pass stops at the first target below the floor.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use sqm_autotune::benchmark::{FlentExecutor, TrialRunner};
use sqm_autotune::classifier::FnClassifier;
use sqm_autotune::config::{LinkConfig, Tunnel};
use sqm_autotune::controller::{DefaultHooks, DescendingConfig, DescendingSearch, PassContext, Target};
use sqm_autotune::gateway::SshRouter;
use sqm_autotune::measurement::Measurement;
use sqm_autotune::utils::{protect_for_filename, setup_logging, TunerError};

/// Run flent across a descending range of SQM targets
#[derive(Parser, Debug)]
#[command(name = "sqm-scan")]
#[command(version, about, long_about = None)]
struct ScanArgs {
    /// Device name
    device: String,

    /// Link encapsulation to test
    #[arg(long = "tunnel", default_value = "WireGuard")]
    tunnel: String,

    /// flent test
    #[arg(long = "test", default_value = "tcp_8down")]
    test: String,

    /// First target in Mbit/s
    #[arg(long = "start-at", default_value_t = 380.0)]
    start_at: f64,

    /// Multiplier per step
    #[arg(long = "factor", default_value_t = 0.7)]
    factor: f64,

    /// Scan stops at the first target below this
    #[arg(long = "floor", default_value_t = 10.0)]
    floor: f64,

    /// Gateway address reached over ssh
    #[arg(long = "router", default_value = "192.168.1.1")]
    router: String,

    /// ssh user on the gateway
    #[arg(long = "user", default_value = "root")]
    user: String,

    /// Output directory (default: <device>_<YYYY-mm-dd_HHMM>)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn run() -> Result<()> {
    let args = ScanArgs::parse();
    setup_logging(args.verbose, args.quiet);

    if !(args.factor > 0.0 && args.factor < 1.0) {
        return Err(TunerError::Config("--factor must be between 0 and 1".to_string()).into());
    }
    if !(args.floor > 0.0) {
        return Err(TunerError::Config("--floor must be above 0".to_string()).into());
    }
    let start = Target::positive(args.start_at)?;
    let tunnel: Tunnel = args.tunnel.parse()?;

    let mut router = SshRouter::new(args.router.as_str(), args.user.as_str());
    let link = LinkConfig::resolve(tunnel, &mut router)?;

    let base_dir = args.output_dir.clone().unwrap_or_else(|| {
        PathBuf::from(protect_for_filename(&format!(
            "{}_{}",
            args.device,
            Local::now().format("%Y-%m-%d_%H%M")
        )))
    });
    if base_dir.exists() {
        return Err(TunerError::OutputDirExists(base_dir).into());
    }
    let dest_dir = base_dir.join(protect_for_filename(tunnel.as_str()));
    fs::create_dir_all(&dest_dir)?;

    let ctx = PassContext::new(args.device.as_str(), link, args.test.as_str(), &dest_dir)
        .with_logname(dest_dir.join(format!("{}_sqm.log", args.test)));
    let history = ctx.new_history().shared();

    let floor = args.floor;
    let classifier = FnClassifier::new(move |_: &Measurement, target: Target| {
        target.rate().is_some_and(|rate| rate < floor)
    });
    let config = DescendingConfig {
        success_requires: 1,
        failure_requires: 1,
        ..DescendingConfig::new(args.start_at, args.factor)
    };
    info!("Scanning {} down to {} Mbps", start, args.floor);

    let mut flent = FlentExecutor::new(args.quiet);
    let hooks = DefaultHooks;
    let mut trials = TrialRunner::new(&mut router, &mut flent, &hooks, ctx);
    DescendingSearch::new(config, classifier).run(&mut trials, &history)?;

    info!("Scan of {} runs written to {}", history.lock().len(), dest_dir.display());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        let code = e.downcast_ref::<TunerError>().map_or(1, TunerError::exit_code);
        std::process::exit(code);
    }
}

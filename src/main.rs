//! sqm-autotune - find the best SQM shaping target with flent
//!
//! For every tunnel and test this runs an unshaped baseline, then descending
//! and ascending searches for the highest target that keeps throughput
//! steady, and finally a latency pass when the result is still too slow.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::fs;
use tracing::{error, info};

use sqm_autotune::benchmark::{print_summary, FlentExecutor, Sweep};
use sqm_autotune::config::{CliArgs, TuningConfig};
use sqm_autotune::controller::DefaultHooks;
use sqm_autotune::gateway::SshRouter;
use sqm_autotune::utils::{setup_logging, TunerError};

fn print_banner(config: &TuningConfig) {
    if config.quiet {
        return;
    }

    println!("sqm-autotune v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("Device: {}", config.device);
    println!("Gateway: {}@{}", config.router_user, config.router_host);
    println!(
        "Tunnels: {:?}",
        config.tunnels.iter().map(|t| t.as_str()).collect::<Vec<_>>()
    );
    println!("Tests: {:?}", config.tests);
    println!(
        "Baseline runs: {}, ping limit: {} ms",
        config.baseline_runs.get(),
        config.ping_limit
    );
    println!("====================================\n");
}

fn run() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose, args.quiet);

    let config = TuningConfig::from_cli(&args)?;
    print_banner(&config);

    let base_dir = config.base_dir(Local::now());
    let mut router = SshRouter::new(config.router_host.as_str(), config.router_user.as_str());
    let mut flent = FlentExecutor::new(config.quiet).with_program(config.flent.as_str());
    let hooks = DefaultHooks;

    let outcomes = Sweep::new(&config, &mut router, &mut flent, &hooks).run(&base_dir)?;

    if config.json {
        let path = base_dir.join("summary.json");
        info!("Writing summary to {}", path.display());
        fs::write(&path, serde_json::to_string_pretty(&outcomes)?)?;
    }

    print_summary(&outcomes);
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        let code = e.downcast_ref::<TunerError>().map_or(1, TunerError::exit_code);
        std::process::exit(code);
    }
}

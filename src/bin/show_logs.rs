//! Print every sweep log below a directory with run lines ordered by target

use clap::Parser;
use std::path::PathBuf;

use sqm_autotune::history::summarize_sweep;

/// Show sqm-autotune logs sorted by SQM target
#[derive(Parser, Debug)]
#[command(name = "show-logs")]
#[command(version, about, long_about = None)]
struct ShowArgs {
    /// Sweep directory (default: current directory)
    basedir: Option<PathBuf>,
}

fn main() {
    let args = ShowArgs::parse();
    print!("{}", summarize_sweep(args.basedir.as_deref()));
}

//! tracing subscriber setup shared by the binaries

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Level for the `--quiet`/`--verbose` flags
pub fn log_level(verbose: bool, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

pub fn setup_logging(verbose: bool, quiet: bool) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(verbose, quiet))
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(false, false), Level::INFO);
        assert_eq!(log_level(true, false), Level::DEBUG);
        assert_eq!(log_level(true, true), Level::ERROR);
    }
}

//! Run history
//!
//! This module provides:
//! - `RunRecord`: one executed benchmark with its good/bad/selected marks
//! - `RunHistory`: the ordered, append-only log shared by the passes run
//!   against one (device, tunnel, test) combination, with text and JSON output
//! - `log_reader`: recovery of run lines from rendered logs

pub mod log_reader;
pub mod record;
pub mod run_history;

pub use log_reader::{summarize_log, summarize_sweep, LoggedRun};
pub use record::{RunId, RunRecord};
pub use run_history::{RunHistory, SharedHistory, COLUMN_HEADER};

//! Error types for sqm-autotune

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum TunerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("runs={0} is not a positive odd integer")]
    InvalidRunCount(u32),

    #[error("Output directory '{}' already exists. Wait a minute and try again.", .0.display())]
    OutputDirExists(PathBuf),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TunerError {
    /// Configuration errors abort before any benchmarking and use a distinct exit status
    pub fn is_config(&self) -> bool {
        matches!(self, TunerError::Config(_) | TunerError::InvalidRunCount(_))
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_config() {
            2
        } else {
            1
        }
    }
}

/// Remote gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to run '{command}' on {host}: {source}")]
    CommandFailed {
        host: String,
        command: String,
        source: io::Error,
    },

    #[error("No interface for wan returned")]
    NoWanInterface,
}

pub type Result<T> = std::result::Result<T, TunerError>;

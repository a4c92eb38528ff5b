//! Utility modules

pub mod error;
pub mod logging;
pub mod naming;

pub use error::{GatewayError, Result, TunerError};
pub use logging::setup_logging;
pub use naming::protect_for_filename;

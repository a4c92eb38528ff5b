//! Gateway configuration
//!
//! - `RemoteShell`: command execution on the gateway
//! - `SqmControl`: uci-based SQM operations built on any `RemoteShell`
//! - `SshRouter`: ssh-backed implementation for OpenWrt routers

pub mod remote_shell;
pub mod ssh_router;

pub use remote_shell::{CommandOutput, RemoteShell, SqmControl};
pub use ssh_router::SshRouter;

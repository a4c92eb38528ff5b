//! Remote shell trait for gateway configuration
//!
//! The trait abstracts how commands reach the gateway so the search passes
//! can be exercised against a recording mock instead of a real router.
//! SQM operations are built on top as an extension trait.

use std::io;

use crate::utils::GatewayError;

/// Captured result of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, `None` if terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Execute a command on the gateway
pub trait RemoteShell {
    /// Run `cmd` (whitespace separated arguments) and capture its output
    fn run_cmd(&mut self, cmd: &str) -> io::Result<CommandOutput>;

    /// Human-readable name of the remote end, used in log lines
    fn describe(&self) -> String {
        "gateway".to_string()
    }
}

/// SQM configuration through `uci`, available on every `RemoteShell`
pub trait SqmControl: RemoteShell {
    /// Print the current SQM configuration
    fn sqm_show(&mut self) -> io::Result<String> {
        Ok(self.run_cmd("uci show sqm")?.stdout)
    }

    fn sqm_restart(&mut self) -> io::Result<CommandOutput> {
        self.run_cmd("/etc/init.d/sqm restart")
    }

    /// Switch shaping on or off and restart SQM
    fn sqm_enable(&mut self, enabled: bool) -> io::Result<CommandOutput> {
        let state = if enabled { 1 } else { 0 };
        self.run_cmd(&format!("uci set sqm.test.enabled='{}'", state))?;
        self.run_cmd("uci commit")?;
        self.sqm_restart()
    }

    /// Set the shaped interface and per-packet overhead
    fn sqm_set_params(&mut self, interface: &str, overhead: u32) -> io::Result<()> {
        self.run_cmd(&format!("uci set sqm.test.interface='{}'", interface))?;
        self.run_cmd(&format!("uci set sqm.test.overhead='{}'", overhead))?;
        self.run_cmd("uci commit")?;
        Ok(())
    }

    /// Set download/upload limits in kbit/s
    fn sqm_set_targets(&mut self, download_kbps: u64, upload_kbps: u64) -> io::Result<()> {
        self.run_cmd(&format!("uci set sqm.test.download='{}'", download_kbps))?;
        self.run_cmd(&format!("uci set sqm.test.upload='{}'", upload_kbps))?;
        self.run_cmd("uci commit")?;
        Ok(())
    }

    /// Name of the WAN interface (`network.wan.ifname`)
    fn wan_interface(&mut self) -> Result<String, GatewayError> {
        let output = self
            .run_cmd("uci get network.wan.ifname")
            .map_err(|source| GatewayError::CommandFailed {
                host: self.describe(),
                command: "uci get network.wan.ifname".to_string(),
                source,
            })?;
        let iface = output.stdout.trim();
        if iface.is_empty() {
            return Err(GatewayError::NoWanInterface);
        }
        Ok(iface.to_string())
    }
}

impl<T: RemoteShell + ?Sized> SqmControl for T {}

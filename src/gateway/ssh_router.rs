//! OpenWrt router reached over ssh

use std::io;
use std::process::Command;
use tracing::{debug, warn};

use super::remote_shell::{CommandOutput, RemoteShell};

/// Router configured through `ssh <user>@<host> <command>`
#[derive(Debug, Clone)]
pub struct SshRouter {
    host: String,
    user: String,
}

impl Default for SshRouter {
    fn default() -> Self {
        Self::new("192.168.1.1", "root")
    }
}

impl SshRouter {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
        }
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Full argument vector handed to `ssh`
    pub fn ssh_args(&self, cmd: &str) -> Vec<String> {
        let mut args = vec![self.destination()];
        args.extend(cmd.split_whitespace().map(str::to_string));
        args
    }
}

impl RemoteShell for SshRouter {
    fn run_cmd(&mut self, cmd: &str) -> io::Result<CommandOutput> {
        debug!("{}: {}", self.destination(), cmd);
        let output = Command::new("ssh").args(self.ssh_args(cmd)).output()?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.stderr.is_empty() {
            warn!("{} '{}': {}", self.destination(), cmd, result.stderr.trim_end());
        }
        if !result.success() {
            warn!("{} '{}' exited with {:?}", self.destination(), cmd, result.status);
        }
        Ok(result)
    }

    fn describe(&self) -> String {
        self.destination()
    }
}

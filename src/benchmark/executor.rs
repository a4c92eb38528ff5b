//! flent subprocess execution

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::debug;

use crate::controller::Target;

/// One benchmark invocation
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRequest {
    pub target: Target,
    pub host: String,
    pub test: String,
    pub title: String,
    pub note: String,
    pub dest_dir: PathBuf,
}

impl BenchmarkRequest {
    /// Arguments passed to flent
    pub fn flent_args(&self) -> Vec<String> {
        vec![
            "-D".to_string(),
            self.dest_dir.display().to_string(),
            "-t".to_string(),
            self.title.clone(),
            "-n".to_string(),
            format!("\"{}\"", self.note),
            "-x".to_string(),
            "-H".to_string(),
            self.host.clone(),
            self.test.clone(),
        ]
    }
}

/// Captured result of a benchmark run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchmarkOutput {
    /// Exit status, `None` if killed by a signal or never started
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Full command line, for diagnostics
    pub args: Vec<String>,
}

impl BenchmarkOutput {
    /// Output standing in for a benchmark that could not be started
    pub fn spawn_failure(program: &str, request: &BenchmarkRequest, error: &io::Error) -> Self {
        let mut args = vec![program.to_string()];
        args.extend(request.flent_args());
        Self {
            status: None,
            stdout: String::new(),
            stderr: error.to_string(),
            args,
        }
    }

    /// Zero exit status and nothing on stderr
    pub fn is_clean(&self) -> bool {
        self.status == Some(0) && self.stderr.is_empty()
    }

    fn status_text(&self) -> String {
        match self.status {
            Some(code) => code.to_string(),
            None => "no status".to_string(),
        }
    }

    /// Diagnostic text written to the `.err` artifact
    pub fn error_report(&self) -> String {
        format!(
            "flent returned {}\nargs: {:?}\nstderr:\n{}\nstdout:\n{}\n",
            self.status_text(),
            self.args,
            self.stderr,
            self.stdout
        )
    }
}

/// Write `<dest_dir>/<YYYY-mm-dd_HHMMSS>.err` for a run that did not finish cleanly
///
/// A second failure within the same second gets a `_<n>` suffix.
pub fn write_error_artifact(dest_dir: &Path, output: &BenchmarkOutput) -> io::Result<PathBuf> {
    let stamp = Local::now().format("%Y-%m-%d_%H%M%S").to_string();
    let mut path = dest_dir.join(format!("{}.err", stamp));
    let mut n = 1;
    while path.exists() {
        path = dest_dir.join(format!("{}_{}.err", stamp, n));
        n += 1;
    }
    fs::write(&path, output.error_report())?;
    Ok(path)
}

/// Runs a benchmark and hands back its raw report
pub trait BenchmarkExecutor {
    fn execute(&mut self, request: &BenchmarkRequest) -> io::Result<BenchmarkOutput>;

    /// Program name shown in diagnostics
    fn program(&self) -> &str {
        "flent"
    }
}

/// Executes `flent` as a child process
#[derive(Debug, Clone)]
pub struct FlentExecutor {
    program: String,
    quiet: bool,
}

impl Default for FlentExecutor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl FlentExecutor {
    pub fn new(quiet: bool) -> Self {
        Self {
            program: "flent".to_string(),
            quiet,
        }
    }

    /// Use a different flent binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn spinner(&self, request: &BenchmarkRequest) -> Option<ProgressBar> {
        if self.quiet {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.set_message(format!("{} {}", request.test, request.title));
        pb.enable_steady_tick(Duration::from_millis(200));
        Some(pb)
    }
}

impl BenchmarkExecutor for FlentExecutor {
    fn execute(&mut self, request: &BenchmarkRequest) -> io::Result<BenchmarkOutput> {
        let args = request.flent_args();
        debug!("{} {}", self.program, args.join(" "));

        let pb = self.spinner(request);
        let result = Command::new(&self.program).args(&args).output();
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        let output = result?;

        let mut full_args = vec![self.program.clone()];
        full_args.extend(args);
        Ok(BenchmarkOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            args: full_args,
        })
    }

    fn program(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dest_dir: &Path) -> BenchmarkRequest {
        BenchmarkRequest {
            target: Target::Rate(717.0),
            host: "172.16.0.2".to_string(),
            test: "tcp_8down".to_string(),
            title: "EA8300_WireGuard_SQM_717_717".to_string(),
            note: "EA8300 WireGuard tcp_8down 717/717".to_string(),
            dest_dir: dest_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_flent_args() {
        let args = request(Path::new("EA8300_2019-09-13_0643/WireGuard")).flent_args();
        assert_eq!(
            args,
            vec![
                "-D",
                "EA8300_2019-09-13_0643/WireGuard",
                "-t",
                "EA8300_WireGuard_SQM_717_717",
                "-n",
                "\"EA8300 WireGuard tcp_8down 717/717\"",
                "-x",
                "-H",
                "172.16.0.2",
                "tcp_8down",
            ]
        );
    }

    #[test]
    fn test_clean_output() {
        let mut output = BenchmarkOutput {
            status: Some(0),
            ..BenchmarkOutput::default()
        };
        assert!(output.is_clean());
        output.stderr = "WARNING: netperf not found".to_string();
        assert!(!output.is_clean());
        output.stderr.clear();
        output.status = Some(1);
        assert!(!output.is_clean());
    }

    #[test]
    fn test_spawn_failure_and_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let err = io::Error::new(io::ErrorKind::NotFound, "No such file or directory");
        let output = BenchmarkOutput::spawn_failure("flent", &req, &err);
        assert!(!output.is_clean());
        assert!(output.stdout.is_empty());
        assert_eq!(output.args[0], "flent");

        let path = write_error_artifact(dir.path(), &output).unwrap();
        assert_eq!(path.extension().unwrap(), "err");
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("flent returned no status\n"));
        assert!(text.contains("stderr:\nNo such file or directory\n"));
        assert!(text.contains("\"tcp_8down\""));
    }

    #[test]
    fn test_artifacts_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = BenchmarkOutput {
            status: Some(1),
            ..BenchmarkOutput::default()
        };
        let paths: Vec<PathBuf> = (0..3)
            .map(|_| write_error_artifact(dir.path(), &output).unwrap())
            .collect();
        assert_ne!(paths[0], paths[1]);
        assert_ne!(paths[1], paths[2]);
        assert_ne!(paths[0], paths[2]);
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = FlentExecutor::new(true).with_program("/nonexistent/flent-binary");
        assert!(executor.execute(&request(dir.path())).is_err());
    }
}

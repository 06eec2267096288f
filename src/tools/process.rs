//! Timeout-bounded execution of external programs.
//!
//! Output of the child is never buffered in memory: it goes to `/dev/null`
//! in normal operation, or straight to per-module diagnostic files when
//! debug capture is enabled.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;

use crate::layout::ModuleDir;

/// Failure of a single external invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("'{0}' not found")]
    Missing(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("exited with {0}")]
    Failed(ExitStatus),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where to send the child's standard streams.
#[derive(Debug, Clone)]
pub enum Diagnostics {
    Discard,
    /// Capture into `<tool>_stdout` / `<tool>_stderr` and record failures in
    /// `<tool>_err.txt` inside the module directory
    Capture { dir: ModuleDir, tool: String },
}

impl Diagnostics {
    pub fn for_module(debug: bool, dir: &ModuleDir, tool: &str) -> Self {
        if debug {
            Self::Capture {
                dir: dir.clone(),
                tool: tool.to_string(),
            }
        } else {
            Self::Discard
        }
    }

    /// Record a failure reason; a no-op unless capturing.
    pub fn record_failure(&self, reason: &str) {
        if let Self::Capture { dir, tool } = self {
            if let Err(e) = std::fs::write(dir.error_marker(tool), reason) {
                log::debug!("Could not write error marker in {}: {}", dir.name(), e);
            }
        }
    }

    fn streams(&self) -> io::Result<(Stdio, Stdio)> {
        match self {
            Self::Discard => Ok((Stdio::null(), Stdio::null())),
            Self::Capture { dir, tool } => {
                let out = File::create(dir.diagnostic_stdout(tool))?;
                let err = File::create(dir.diagnostic_stderr(tool))?;
                Ok((Stdio::from(out), Stdio::from(err)))
            }
        }
    }
}

/// A fully described external invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Duration,
    diagnostics: Diagnostics,
    stdout_file: Option<PathBuf>,
    outputs: Vec<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout,
            diagnostics: Diagnostics::Discard,
            stdout_file: None,
            outputs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Send stdout to `path` instead of the diagnostics target.
    ///
    /// Used by tools whose output is their result.
    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout_file = Some(path.to_path_buf());
        self
    }

    /// Declare a file the tool writes.
    ///
    /// Declared outputs are removed when the run fails, so a partial
    /// artifact never stands in for a finished stage.
    pub fn produces(mut self, path: &Path) -> Self {
        self.outputs.push(path.to_path_buf());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Run to completion or until the timeout expires.
    ///
    /// A non-zero exit status is an error; on failure the reason is written
    /// to the diagnostics target and every declared output is removed.
    pub fn run(&self) -> Result<(), ToolError> {
        let result = self.run_inner();
        if let Err(ref e) = result {
            self.diagnostics
                .record_failure(&format!("{} {}: {}", self.program, self.args.join(" "), e));
            for output in &self.outputs {
                remove_partial(output);
            }
        }
        result
    }

    fn run_inner(&self) -> Result<(), ToolError> {
        let (stdout, stderr) = self.diagnostics.streams()?;
        let stdout = match &self.stdout_file {
            Some(path) => Stdio::from(File::create(path)?),
            None => stdout,
        };

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);
        if let Some(ref cwd) = self.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ToolError::Missing(self.program.clone())
            } else {
                ToolError::Io(e)
            }
        })?;

        match child.wait_timeout(self.timeout)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(ToolError::Failed(status)),
            None => {
                // Kill and reap so no zombie outlives the item
                let _ = child.kill();
                let _ = child.wait();
                Err(ToolError::Timeout(self.timeout))
            }
        }
    }
}

/// Remove an artifact that must not survive a failed step.
pub(crate) fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::debug!("Could not remove partial output {}: {}", path.display(), e),
    }
}

/// Write an executable shell script standing in for an external tool.
#[cfg(all(test, unix))]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_successful_command() {
        let cmd = ToolCommand::new("true", Duration::from_secs(5));
        assert!(cmd.run().is_ok());
    }

    #[test]
    fn test_failing_command() {
        let cmd = ToolCommand::new("false", Duration::from_secs(5));
        assert!(matches!(cmd.run(), Err(ToolError::Failed(_))));
    }

    #[test]
    fn test_missing_program() {
        let cmd = ToolCommand::new("wavebench-no-such-tool", Duration::from_secs(5));
        assert!(matches!(cmd.run(), Err(ToolError::Missing(_))));
    }

    #[test]
    fn test_timeout_kills_child() {
        let cmd = ToolCommand::new("sleep", Duration::from_millis(200)).arg("5");
        let started = std::time::Instant::now();
        assert!(matches!(cmd.run(), Err(ToolError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_capture_writes_diagnostics() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path());
        let cmd = ToolCommand::new("sh", Duration::from_secs(5))
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .diagnostics(Diagnostics::for_module(true, &dir, "sim"));

        assert!(cmd.run().is_err());
        let out = std::fs::read_to_string(dir.diagnostic_stdout("sim")).unwrap();
        let err = std::fs::read_to_string(dir.diagnostic_stderr("sim")).unwrap();
        assert_eq!(out.trim(), "out");
        assert_eq!(err.trim(), "err");
        assert!(dir.has_error_marker("sim"));
    }

    #[test]
    fn test_discard_leaves_no_files() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path());
        let cmd = ToolCommand::new("false", Duration::from_secs(5))
            .diagnostics(Diagnostics::for_module(false, &dir, "sim"));

        assert!(cmd.run().is_err());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_stdout_to_file() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("result.json");
        let cmd = ToolCommand::new("echo", Duration::from_secs(5))
            .arg("{}")
            .stdout_to(&out);

        cmd.run().unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap().trim(), "{}");
    }

    #[test]
    fn test_failed_run_removes_declared_outputs() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dump.vcd");
        let cmd = ToolCommand::new("sh", Duration::from_secs(5))
            .args(["-c", "echo partial > dump.vcd; exit 1"])
            .current_dir(temp.path())
            .produces(&out);

        assert!(matches!(cmd.run(), Err(ToolError::Failed(_))));
        assert!(!out.exists());
    }

    #[test]
    fn test_successful_run_keeps_declared_outputs() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dump.vcd");
        let cmd = ToolCommand::new("sh", Duration::from_secs(5))
            .args(["-c", "echo done > dump.vcd"])
            .current_dir(temp.path())
            .produces(&out);

        cmd.run().unwrap();
        assert!(out.is_file());
    }
}

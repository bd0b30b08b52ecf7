//! External tool invocation
//!
//! Assessors that shell out (dependency audits, outdated-package listings,
//! `git log`) go through the [`ToolRunner`] trait so tests can substitute a
//! fake and real runs stay bounded:
//!
//! 1. Every call carries its own timeout
//! 2. A missing binary is reported as `unavailable`, never as an error
//! 3. A shared [`CancellationToken`] kills in-flight children when the run
//!    is cancelled or hits its global deadline
//!
//! No call is retried. A failure is recorded once by the caller.

use serde_json::Value as JsonValue;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Cooperative cancellation flag shared by the orchestrator, assessors and
/// the tool runner
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A single command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl ToolInvocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `program arg1 arg2` for logs and findings
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Result from running an external tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit code (None if it never ran to completion)
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// The per-call timeout elapsed and the child was killed
    pub timed_out: bool,
    /// The binary is not installed
    pub unavailable: bool,
    /// The run was cancelled while the child was running
    pub cancelled: bool,
    /// Spawn/wait error message, if any
    pub error: Option<String>,
}

impl ToolOutput {
    /// Create a completed result
    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// Create a "tool unavailable" sentinel
    pub fn unavailable(program: &str) -> Self {
        Self {
            unavailable: true,
            error: Some(format!("{} not found", program)),
            ..Default::default()
        }
    }

    /// Create a timeout result
    pub fn timeout(program: &str, timeout: Duration) -> Self {
        Self {
            timed_out: true,
            error: Some(format!(
                "{} timed out after {}s",
                program,
                timeout.as_secs_f32()
            )),
            ..Default::default()
        }
    }

    /// Create a cancelled result
    pub fn cancelled(program: &str) -> Self {
        Self {
            cancelled: true,
            error: Some(format!("{} cancelled", program)),
            ..Default::default()
        }
    }

    /// Create a failed result (spawn or wait error)
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// The process ran to completion (any exit code)
    pub fn ran(&self) -> bool {
        self.exit_code.is_some()
    }

    /// The process ran and exited 0
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Parse stdout as JSON
    pub fn json_output(&self) -> Option<JsonValue> {
        let trimmed = self.stdout.trim();
        if trimmed.is_empty() {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }

    /// Why the tool gave no usable output, for INFO findings
    pub fn degraded_reason(&self) -> Option<String> {
        if self.unavailable {
            Some("not installed".to_string())
        } else if self.timed_out {
            Some("timed out".to_string())
        } else if self.cancelled {
            Some("cancelled".to_string())
        } else {
            self.error.clone()
        }
    }
}

/// Runs external commands. Implementations must never panic on a missing
/// binary and must honour `invocation.timeout`.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation) -> ToolOutput;
}

/// Spawns real processes
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner {
    cancel: CancellationToken,
}

impl SystemToolRunner {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> ToolOutput {
        if self.cancel.is_cancelled() {
            return ToolOutput::cancelled(&invocation.program);
        }

        debug!("Running {}", invocation.display());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not installed", invocation.program);
                return ToolOutput::unavailable(&invocation.program);
            }
            Err(e) => {
                return ToolOutput::failure(format!(
                    "Failed to run {}: {}",
                    invocation.program, e
                ));
            }
        };

        wait_with_deadline(child, invocation, &self.cancel)
    }
}

/// Drain a pipe on its own thread so a chatty child cannot block on a full
/// pipe buffer while we poll for exit
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_output(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Poll for completion until the deadline or cancellation
fn wait_with_deadline(
    mut child: Child,
    invocation: &ToolInvocation,
    cancel: &CancellationToken,
) -> ToolOutput {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return ToolOutput::completed(
                    status.code().unwrap_or(-1),
                    join_output(stdout),
                    join_output(stderr),
                );
            }
            Ok(None) => {
                if cancel.is_cancelled() {
                    let _ = child.kill();
                    let _ = child.wait();
                    debug!("{} cancelled", invocation.program);
                    return ToolOutput::cancelled(&invocation.program);
                }
                if start.elapsed() >= invocation.timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(
                        "{} timed out after {:?}",
                        invocation.display(),
                        invocation.timeout
                    );
                    return ToolOutput::timeout(&invocation.program, invocation.timeout);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                return ToolOutput::failure(format!(
                    "Failed to wait for {}: {}",
                    invocation.program, e
                ));
            }
        }
    }
}

/// Runner used when external tools are disabled: every tool is unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledToolRunner;

impl ToolRunner for DisabledToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> ToolOutput {
        ToolOutput {
            unavailable: true,
            error: Some(format!(
                "{} skipped (external tools disabled)",
                invocation.program
            )),
            ..Default::default()
        }
    }
}

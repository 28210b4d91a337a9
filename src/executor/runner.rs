//! Async command execution with timeout support
//!
//! Every command is started from a program and a discrete argument list,
//! never through a shell. Stdout and stderr are drained concurrently so a
//! child that writes a lot to one stream cannot block on the other.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

/// Default capture limit for tool diagnostics (in bytes)
pub const DEFAULT_MAX_OUTPUT: usize = 100_000;

/// Truncation marker for large outputs
const TRUNCATION_MARKER: &str = "\n... [output truncated] ...\n";

/// Low-level failure to run a command to completion
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started
    #[error("Failed to spawn command: {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command did not finish within the timeout
    #[error("Command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    /// Waiting on or reading from the child failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for async command execution
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Working directory for the command
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Timeout duration (None = no timeout)
    pub timeout: Option<Duration>,
    /// Capture stderr (false = inherit the caller's stderr)
    pub capture_stderr: bool,
    /// Maximum captured size per stream (None = unlimited)
    pub max_output_size: Option<usize>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            env: HashMap::new(),
            timeout: None,
            capture_stderr: true,
            max_output_size: Some(DEFAULT_MAX_OUTPUT),
        }
    }
}

impl ExecOptions {
    /// Create options with a working directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add several environment variables
    pub fn with_envs(mut self, vars: &HashMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Set maximum output size
    pub fn with_max_output(mut self, size: usize) -> Self {
        self.max_output_size = Some(size);
        self
    }

    /// Capture output without any size limit
    pub fn unlimited_output(mut self) -> Self {
        self.max_output_size = None;
        self
    }

    /// Let the child write its stderr straight to ours
    pub fn inherit_stderr(mut self) -> Self {
        self.capture_stderr = false;
        self
    }
}

/// Result of async command execution
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code if the process exited normally
    pub exit_code: Option<i32>,
    /// Signal number if the process was killed by a signal
    pub signal: Option<i32>,
    /// Standard output (may be truncated)
    pub stdout: String,
    /// Whether stdout was truncated
    pub stdout_truncated: bool,
    /// Standard error (empty when inherited)
    pub stderr: String,
    /// Whether stderr was truncated
    pub stderr_truncated: bool,
    /// Duration of execution
    pub duration: Duration,
}

impl ExecResult {
    /// Successful result with the given stdout
    pub fn completed(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// Failed result with the given exit code and stderr
    pub fn exited(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// Duration in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Render a program and its arguments for logs and error messages
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Execute a command asynchronously with timeout support
///
/// # Errors
/// * `ExecError::Spawn` - If the command couldn't be spawned
/// * `ExecError::Timeout` - If the command timed out (when timeout is set)
pub async fn exec_command(
    program: &str,
    args: &[String],
    options: &ExecOptions,
) -> Result<ExecResult, ExecError> {
    let start = Instant::now();
    let command_str = display_command(program, args);

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(if options.capture_stderr {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.kill_on_drop(true);

    if let Some(ref dir) = options.working_dir {
        cmd.current_dir(dir);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    tracing::debug!("Executing: {}", command_str);

    let child = cmd.spawn().map_err(|source| ExecError::Spawn {
        command: command_str.clone(),
        source,
    })?;

    let result = if let Some(timeout_duration) = options.timeout {
        match timeout(timeout_duration, wait_for_output(child, options.max_output_size)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExecError::Timeout {
                    command: command_str,
                    timeout_secs: whole_secs_rounded_up(timeout_duration),
                });
            }
        }
    } else {
        wait_for_output(child, options.max_output_size).await?
    };

    let duration = start.elapsed();
    tracing::debug!(
        "Finished in {}ms with exit code {:?}: {}",
        duration.as_millis(),
        result.exit_code,
        command_str
    );

    Ok(ExecResult {
        success: result.exit_code == Some(0),
        exit_code: result.exit_code,
        signal: result.signal,
        stdout: result.stdout,
        stdout_truncated: result.stdout_truncated,
        stderr: result.stderr,
        stderr_truncated: result.stderr_truncated,
        duration,
    })
}

/// Seconds for reporting, so a sub-second timeout never reads as 0s
fn whole_secs_rounded_up(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Internal result from waiting for process output
struct WaitResult {
    exit_code: Option<i32>,
    signal: Option<i32>,
    stdout: String,
    stderr: String,
    stdout_truncated: bool,
    stderr_truncated: bool,
}

/// Wait for a child process and capture its output
async fn wait_for_output(
    mut child: tokio::process::Child,
    max_output_size: Option<usize>,
) -> Result<WaitResult, ExecError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_handle = tokio::spawn(async move {
        match stdout {
            Some(stdout) => read_and_truncate(stdout, max_output_size).await,
            None => (String::new(), false),
        }
    });

    let stderr_handle = tokio::spawn(async move {
        match stderr {
            Some(stderr) => read_and_truncate(stderr, max_output_size).await,
            None => (String::new(), false),
        }
    });

    let status = child.wait().await?;

    let (stdout, stdout_truncated) = stdout_handle
        .await
        .map_err(|e| std::io::Error::other(format!("stdout task failed: {}", e)))?;

    let (stderr, stderr_truncated) = stderr_handle
        .await
        .map_err(|e| std::io::Error::other(format!("stderr task failed: {}", e)))?;

    Ok(WaitResult {
        exit_code: status.code(),
        signal: exit_signal(&status),
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    })
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Read from an async reader, truncating past `max_size` bytes
///
/// Reads raw bytes so that output without a trailing newline, or with
/// invalid UTF-8, is kept as written (invalid sequences are replaced).
async fn read_and_truncate<R: AsyncRead + Unpin>(
    reader: R,
    max_size: Option<usize>,
) -> (String, bool) {
    let limit = max_size.unwrap_or(usize::MAX);
    let mut buf_reader = BufReader::new(reader);
    let mut output: Vec<u8> = Vec::with_capacity(limit.min(64 * 1024));
    let mut line: Vec<u8> = Vec::with_capacity(4096);
    let mut truncated = false;

    loop {
        line.clear();
        match buf_reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if output.len().saturating_add(line.len()) > limit {
                    let remaining = limit.saturating_sub(output.len());
                    output.extend_from_slice(&line[..remaining.min(line.len())]);
                    output.extend_from_slice(TRUNCATION_MARKER.as_bytes());
                    truncated = true;
                    // Keep the pipe open until EOF so the child never sees SIGPIPE
                    if let Err(e) = tokio::io::copy(&mut buf_reader, &mut tokio::io::sink()).await {
                        tracing::warn!("Error draining output: {}", e);
                    }
                    break;
                }
                output.extend_from_slice(&line);
            }
            Err(e) => {
                tracing::warn!("Error reading output: {}", e);
                break;
            }
        }
    }

    (String::from_utf8_lossy(&output).into_owned(), truncated)
}

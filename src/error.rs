//! Error types for buildrun
//!
//! Provides structured error types with suggestions for common compiler
//! and linker diagnostics.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::executor::ExecError;
use crate::pipeline::Stage;

/// Matches GNU ld / lld undefined symbol reports: "undefined reference to `foo'"
static UNDEFINED_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"undefined (?:reference to|symbol:?) [`'"]?([A-Za-z_][A-Za-z0-9_]*)"#).unwrap()
});

/// Matches missing headers: "fatal error: netcdf.h: No such file or directory"
static MISSING_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"fatal error: ([^\s:]+\.h): No such file").unwrap());

/// Matches missing libraries: "cannot find -lnetcdff"
static MISSING_LIB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"cannot find -l([A-Za-z0-9_+.-]+)").unwrap());

/// Process exit codes reported by the binary, one per failing stage
pub mod exit_codes {
    pub const CONFIG: u8 = 1;
    pub const COMPILE: u8 = 10;
    pub const LINK: u8 = 11;
    pub const EXECUTION: u8 = 12;
    pub const TOOL_INVOCATION: u8 = 13;
    pub const TIMEOUT: u8 = 14;
}

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum BuildError {
    /// The compiler, linker or built program could not be started
    #[error("Failed to start {stage} tool: {command}")]
    ToolInvocation {
        stage: Stage,
        command: String,
        error: String,
    },

    /// The compiler exited with a non-zero status
    #[error("Compilation failed: {command}")]
    Compile {
        command: String,
        exit_code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
        suggestion: Option<String>,
    },

    /// The linker exited with a non-zero status
    #[error("Linking failed: {command}")]
    Link {
        command: String,
        exit_code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
        suggestion: Option<String>,
    },

    /// The built program exited with a non-zero status or was killed
    #[error("Program failed: {command}")]
    Execution {
        command: String,
        exit_code: Option<i32>,
        signal: Option<i32>,
        stdout: String,
        stderr: String,
        suggestion: Option<String>,
    },

    /// A stage exceeded the configured timeout
    #[error("{stage} stage timed out after {timeout_secs}s: {command}")]
    Timeout {
        stage: Stage,
        command: String,
        timeout_secs: u64,
    },

    /// A module or executable name is not a usable path component
    #[error("Invalid module name '{name}': {reason}")]
    InvalidModule { name: String, reason: String },

    /// The build configuration as a whole is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Attach a stage to a low-level execution failure
    pub fn from_exec(stage: Stage, err: ExecError) -> Self {
        match err {
            ExecError::Spawn { command, source } => BuildError::ToolInvocation {
                stage,
                command,
                error: source.to_string(),
            },
            ExecError::Timeout {
                command,
                timeout_secs,
            } => BuildError::Timeout {
                stage,
                command,
                timeout_secs,
            },
            ExecError::Io(e) => BuildError::Io(e),
        }
    }

    /// The pipeline stage this error belongs to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BuildError::ToolInvocation { stage, .. } | BuildError::Timeout { stage, .. } => {
                Some(*stage)
            }
            BuildError::Compile { .. } => Some(Stage::Compile),
            BuildError::Link { .. } => Some(Stage::Link),
            BuildError::Execution { .. } => Some(Stage::Run),
            _ => None,
        }
    }

    /// Exit code the CLI terminates with for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            BuildError::Compile { .. } => exit_codes::COMPILE,
            BuildError::Link { .. } => exit_codes::LINK,
            BuildError::Execution { .. } => exit_codes::EXECUTION,
            BuildError::ToolInvocation { .. } => exit_codes::TOOL_INVOCATION,
            BuildError::Timeout { .. } => exit_codes::TIMEOUT,
            BuildError::InvalidModule { .. }
            | BuildError::InvalidConfiguration(_)
            | BuildError::Io(_) => exit_codes::CONFIG,
        }
    }

    /// Signal that killed the failing tool or program
    pub fn signal(&self) -> Option<i32> {
        match self {
            BuildError::Compile { signal, .. }
            | BuildError::Link { signal, .. }
            | BuildError::Execution { signal, .. } => *signal,
            _ => None,
        }
    }

    /// Diagnostic text captured from the failing tool
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            BuildError::Compile { stderr, .. }
            | BuildError::Link { stderr, .. }
            | BuildError::Execution { stderr, .. }
                if !stderr.is_empty() =>
            {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }
}

/// Serializable error info for JSON reports
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl From<&BuildError> for ErrorInfo {
    fn from(err: &BuildError) -> Self {
        let base = ErrorInfo {
            message: err.to_string(),
            error_type: String::new(),
            stage: err.stage(),
            suggestion: None,
            exit_code: None,
            signal: err.signal(),
            stderr: None,
        };

        match err {
            BuildError::ToolInvocation { error, .. } => ErrorInfo {
                error_type: "tool_invocation".to_string(),
                suggestion: Some(format!("Check that the tool exists and is executable: {}", error)),
                ..base
            },
            BuildError::Compile {
                exit_code,
                stderr,
                suggestion,
                ..
            } => ErrorInfo {
                error_type: "compile_failed".to_string(),
                suggestion: suggestion.clone(),
                exit_code: *exit_code,
                stderr: Some(stderr.clone()),
                ..base
            },
            BuildError::Link {
                exit_code,
                stderr,
                suggestion,
                ..
            } => ErrorInfo {
                error_type: "link_failed".to_string(),
                suggestion: suggestion.clone(),
                exit_code: *exit_code,
                stderr: Some(stderr.clone()),
                ..base
            },
            BuildError::Execution {
                exit_code,
                stderr,
                suggestion,
                ..
            } => ErrorInfo {
                error_type: "execution_failed".to_string(),
                suggestion: suggestion.clone(),
                exit_code: *exit_code,
                stderr: (!stderr.is_empty()).then(|| stderr.clone()),
                ..base
            },
            BuildError::Timeout { .. } => ErrorInfo {
                error_type: "timeout".to_string(),
                suggestion: Some(
                    "Increase --timeout or check whether the command hangs".to_string(),
                ),
                ..base
            },
            BuildError::InvalidModule { .. } => ErrorInfo {
                error_type: "invalid_module".to_string(),
                suggestion: Some(
                    "Module names are file names without extension, e.g. 'main' for main.c"
                        .to_string(),
                ),
                ..base
            },
            BuildError::InvalidConfiguration(_) => ErrorInfo {
                error_type: "invalid_configuration".to_string(),
                suggestion: Some("Check the [build] section of your buildrun config".to_string()),
                ..base
            },
            BuildError::Io(_) => ErrorInfo {
                error_type: "io_error".to_string(),
                ..base
            },
        }
    }
}

/// Suggest fixes for common compiler, linker and runtime diagnostics
pub fn suggest_fix(command: &str, stderr: &str) -> Option<String> {
    if let Some(caps) = MISSING_HEADER_RE.captures(stderr) {
        return Some(format!(
            "Header '{}' not found. Add its directory to toolchain.include_dirs.",
            &caps[1]
        ));
    }

    if let Some(caps) = MISSING_LIB_RE.captures(stderr) {
        return Some(format!(
            "Library '{}' not found. Add its directory to toolchain.lib_dirs.",
            &caps[1]
        ));
    }

    if let Some(caps) = UNDEFINED_REF_RE.captures(stderr) {
        return Some(format!(
            "Symbol '{}' is not defined by any module. Check the module list or toolchain.libs.",
            &caps[1]
        ));
    }

    if stderr.contains("multiple definition of") || stderr.contains("duplicate symbol") {
        return Some(
            "A symbol is defined in more than one module. Check for duplicate modules.".to_string(),
        );
    }

    // Permission errors
    if stderr.contains("Permission denied") {
        return Some(
            "Permission denied. Check file permissions in the working directory.".to_string(),
        );
    }

    // Command not found
    if stderr.contains("command not found") {
        if command.contains("gcc") || command.contains("cc") {
            return Some("C compiler not found. Install gcc or set --compiler.".to_string());
        }
        return Some("Required command not found. Check PATH and dependencies.".to_string());
    }

    // File not found
    if stderr.contains("No such file") {
        if command.contains(" -c ") || command.ends_with(" -c") {
            return Some(
                "Source file not found. Check the module names and --dir.".to_string(),
            );
        }
        return Some("File not found. Check the working directory.".to_string());
    }

    None
}

/// Suggest a fix for a tool or program killed by a signal
pub fn suggest_signal_fix(signal: i32) -> Option<String> {
    match signal {
        11 => Some("Segmentation fault. Rebuild with '-g' in toolchain.cflags and debug.".to_string()),
        6 => Some("The program aborted. Look for a failed assertion in its output.".to_string()),
        8 => Some("Floating point exception, often an integer division by zero.".to_string()),
        9 => Some("Killed. The system may have run out of memory.".to_string()),
        _ => None,
    }
}

//! Stage identifiers and per-stage results

use serde::Serialize;

use crate::executor::ExecResult;

/// One step of the compile → link → run pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Compile,
    Link,
    Run,
}

impl Stage {
    /// Banner printed when the stage starts
    pub fn banner(&self) -> &'static str {
        match self {
            Stage::Compile => "Compiling programs",
            Stage::Link => "Linking programs",
            Stage::Run => "Running program",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Stage::Compile => "compile",
            Stage::Link => "link",
            Stage::Run => "run",
        })
    }
}

/// Result of a stage that finished successfully
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    /// Command line that was executed (display form)
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub stdout: String,
    /// Warnings from the compiler or linker; empty for the run stage
    pub stderr: String,
    /// Captured output hit the size limit and was cut short
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    pub duration_ms: u64,
}

impl StageOutcome {
    pub fn from_exec(stage: Stage, command: impl Into<String>, result: ExecResult) -> Self {
        let duration_ms = result.duration_ms();
        Self {
            stage,
            command: command.into(),
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
            truncated: result.stdout_truncated || result.stderr_truncated,
            duration_ms,
        }
    }
}

/// Notified as a pipeline run moves from stage to stage
pub trait StageObserver {
    /// `stage` is about to start its process
    fn stage_started(&mut self, _stage: Stage) {}

    /// A stage exited successfully
    fn stage_finished(&mut self, _outcome: &StageOutcome) {}
}

impl StageObserver for () {}

/// Outcomes of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub compile: StageOutcome,
    pub link: StageOutcome,
    pub run: StageOutcome,
}

impl PipelineOutput {
    /// The program's captured standard output
    pub fn output(&self) -> &str {
        &self.run.stdout
    }

    /// Total wall time across the three stages
    pub fn total_duration_ms(&self) -> u64 {
        self.compile.duration_ms + self.link.duration_ms + self.run.duration_ms
    }

    pub fn into_output(self) -> String {
        self.run.stdout
    }
}

//! The compile → link → run pipeline
//!
//! Each stage waits for its process to exit before the next one starts, and
//! the first failing stage ends the pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{suggest_fix, suggest_signal_fix, BuildError};
use crate::executor::{ExecOptions, ExecResult};

use super::launcher::ProcessLauncher;
use super::module::{BuildConfiguration, ModuleName};
use super::outcome::{PipelineOutput, Stage, StageObserver, StageOutcome};
use super::toolchain::{Invocation, Toolchain};

/// Runs the build pipeline in a working directory
pub struct BuildRunner<L: ProcessLauncher> {
    launcher: L,
    toolchain: Toolchain,
    working_dir: PathBuf,
    timeout: Option<Duration>,
    env: HashMap<String, String>,
}

impl<L: ProcessLauncher> BuildRunner<L> {
    /// Create a runner working in the current directory
    pub fn new(launcher: L, toolchain: Toolchain) -> Self {
        Self {
            launcher,
            toolchain,
            working_dir: PathBuf::from("."),
            timeout: None,
            env: HashMap::new(),
        }
    }

    /// Set the directory holding sources, objects and the executable
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Bound every stage by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Environment variables set for every stage
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn options(&self) -> ExecOptions {
        let mut options = ExecOptions::in_dir(&self.working_dir).with_envs(&self.env);
        options.timeout = self.timeout;
        options
    }

    fn launch(&self, invocation: &Invocation, options: &ExecOptions) -> Result<ExecResult, BuildError> {
        tracing::debug!("{} stage: {}", invocation.stage, invocation);
        let result = self
            .launcher
            .launch(invocation, options)
            .map_err(|e| BuildError::from_exec(invocation.stage, e))?;
        if result.stdout_truncated || result.stderr_truncated {
            tracing::warn!(
                "{} stage output exceeded the capture limit and was truncated",
                invocation.stage
            );
        }
        Ok(result)
    }

    /// Absolute path of `executable` inside the working directory
    pub fn executable_path(&self, executable: &str) -> Result<PathBuf, BuildError> {
        let dir = if self.working_dir.is_absolute() {
            self.working_dir.clone()
        } else {
            std::env::current_dir()?.join(&self.working_dir)
        };
        Ok(dir.join(executable))
    }

    /// Compile every module's source into an object file
    ///
    /// # Errors
    /// * `BuildError::ToolInvocation` - The compiler could not be started
    /// * `BuildError::Compile` - The compiler exited with a non-zero status
    pub fn compile(&self, modules: &[ModuleName]) -> Result<StageOutcome, BuildError> {
        let invocation = self.toolchain.compile_invocation(modules);
        let command = invocation.command_line();
        let result = self.launch(&invocation, &self.options())?;

        if !result.success {
            return Err(BuildError::Compile {
                suggestion: suggest_fix(&command, &result.stderr)
                    .or_else(|| result.signal.and_then(suggest_signal_fix)),
                command,
                exit_code: result.exit_code,
                signal: result.signal,
                stderr: result.stderr,
            });
        }

        Ok(StageOutcome::from_exec(Stage::Compile, command, result))
    }

    /// Link the modules' object files into `executable`
    ///
    /// # Errors
    /// * `BuildError::ToolInvocation` - The linker could not be started
    /// * `BuildError::Link` - The linker exited with a non-zero status
    pub fn link(&self, modules: &[ModuleName], executable: &str) -> Result<StageOutcome, BuildError> {
        let invocation = self.toolchain.link_invocation(modules, executable);
        let command = invocation.command_line();
        let result = self.launch(&invocation, &self.options())?;

        if !result.success {
            return Err(BuildError::Link {
                suggestion: suggest_fix(&command, &result.stderr)
                    .or_else(|| result.signal.and_then(suggest_signal_fix)),
                command,
                exit_code: result.exit_code,
                signal: result.signal,
                stderr: result.stderr,
            });
        }

        Ok(StageOutcome::from_exec(Stage::Link, command, result))
    }

    /// Run the built program, capturing its full stdout
    ///
    /// The program's stderr goes straight to ours. A failing program still
    /// hands back what it printed, inside `BuildError::Execution`.
    pub fn execute(&self, executable: &str) -> Result<StageOutcome, BuildError> {
        let invocation = Invocation::program(&self.executable_path(executable)?);
        let command = invocation.command_line();
        let options = self.options().unlimited_output().inherit_stderr();
        let result = self.launch(&invocation, &options)?;

        if !result.success {
            return Err(BuildError::Execution {
                suggestion: result.signal.and_then(suggest_signal_fix),
                command,
                exit_code: result.exit_code,
                signal: result.signal,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }

        Ok(StageOutcome::from_exec(Stage::Run, command, result))
    }

    /// Run the built program and return its stdout unmodified
    pub fn run_executable(&self, executable: &str) -> Result<String, BuildError> {
        self.execute(executable).map(|outcome| outcome.stdout)
    }

    /// Compile, link and run, telling `observer` as each stage starts and
    /// as each one succeeds
    pub fn run_stages_with<O>(
        &self,
        config: &BuildConfiguration,
        observer: &mut O,
    ) -> Result<PipelineOutput, BuildError>
    where
        O: StageObserver + ?Sized,
    {
        observer.stage_started(Stage::Compile);
        let compile = self.compile(config.modules())?;
        observer.stage_finished(&compile);

        observer.stage_started(Stage::Link);
        let link = self.link(config.modules(), config.executable())?;
        observer.stage_finished(&link);

        observer.stage_started(Stage::Run);
        let run = self.execute(config.executable())?;
        observer.stage_finished(&run);

        Ok(PipelineOutput { compile, link, run })
    }

    /// Compile, link and run, keeping every stage's outcome
    pub fn run_stages(&self, config: &BuildConfiguration) -> Result<PipelineOutput, BuildError> {
        self.run_stages_with(config, &mut ())
    }

    /// Compile, link and run; returns the program's stdout
    pub fn run(&self, config: &BuildConfiguration) -> Result<String, BuildError> {
        self.run_stages(config).map(PipelineOutput::into_output)
    }

    /// The three command lines `run` would execute, without running them
    pub fn plan(&self, config: &BuildConfiguration) -> Result<Vec<Invocation>, BuildError> {
        Ok(vec![
            self.toolchain.compile_invocation(config.modules()),
            self.toolchain
                .link_invocation(config.modules(), config.executable()),
            Invocation::program(&self.executable_path(config.executable())?),
        ])
    }

    /// Remove the object files and executable named by `config`
    ///
    /// Missing files are skipped. Returns the paths actually removed.
    pub fn clean(&self, config: &BuildConfiguration) -> Result<Vec<PathBuf>, BuildError> {
        let mut targets: Vec<PathBuf> = self
            .toolchain
            .object_files(config.modules())
            .into_iter()
            .map(|object| self.working_dir.join(object))
            .collect();
        targets.push(self.working_dir.join(config.executable()));

        let mut removed = Vec::new();
        for path in targets {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("Removed {}", path.display());
                    removed.push(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(BuildError::Io(e)),
            }
        }

        Ok(removed)
    }
}

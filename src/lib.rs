//! buildrun - compile, link and run a small C program
//!
//! Drives a compiler through a fixed three-stage pipeline:
//! - **Compile** - every module's `.c` source into a `.o` object
//! - **Link** - the objects into one named executable
//! - **Run** - the executable, returning its standard output verbatim
//!
//! ## Features
//!
//! - Commands are built as argument vectors; no shell is involved
//! - Every exit status is checked and the first failure stops the pipeline
//! - Failures carry the tool's diagnostics and a hint for common mistakes
//! - XDG-compliant layered configuration with `BUILDRUN_*` overrides
//!
//! ## Example
//!
//! ```no_run
//! use buildrun::pipeline::{BuildConfiguration, BuildRunner, SystemLauncher, Toolchain};
//!
//! let config = BuildConfiguration::from_names(["flexpart_helpers", "multi_rddep_w"], "ddep2bin")?;
//! let runner = BuildRunner::new(SystemLauncher::new()?, Toolchain::default());
//! print!("{}", runner.run(&config)?);
//! # Ok::<(), buildrun::BuildError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{BuildError, ErrorInfo};
pub use executor::{exec_command, ExecError, ExecOptions, ExecResult};
pub use pipeline::{
    BuildConfiguration, BuildRunner, Invocation, ModuleName, PipelineOutput, ProcessLauncher,
    Stage, StageObserver, StageOutcome, SystemLauncher, Toolchain,
};

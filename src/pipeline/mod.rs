//! Build pipeline: compile sources, link objects, run the executable
//!
//! - [`module`] - module names and the immutable build configuration
//! - [`toolchain`] - compiler driver settings and command-line construction
//! - [`launcher`] - the seam through which processes are started
//! - [`builder`] - the `BuildRunner` sequencing the three stages

pub mod builder;
pub mod launcher;
pub mod module;
pub mod outcome;
pub mod toolchain;

pub use builder::BuildRunner;
pub use launcher::{ProcessLauncher, SystemLauncher};
pub use module::{BuildConfiguration, ModuleName, DEFAULT_EXECUTABLE, DEFAULT_MODULES};
pub use outcome::{PipelineOutput, Stage, StageObserver, StageOutcome};
pub use toolchain::{Invocation, Toolchain};

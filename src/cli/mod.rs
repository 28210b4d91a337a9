//! CLI module for buildrun
//!
//! Provides command-line interface with the following subcommands:
//! - `run` - Compile, link and run (the default)
//! - `compile` / `link` / `exec` - A single stage
//! - `plan` - Show the commands without running them
//! - `clean` - Remove build artifacts
//! - `config` - Show configuration

pub mod commands;
pub mod logging;

pub use commands::{BuildArgs, Cli, Commands, OutputFormat};
pub use logging::init_logging;

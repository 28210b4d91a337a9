//! Process execution module
//!
//! Runs external tools asynchronously with:
//! - Optional timeout
//! - Byte-preserving output capture with optional truncation
//! - Environment variable injection
//! - Working directory control

pub mod runner;

pub use runner::*;

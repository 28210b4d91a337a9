//! Configuration module for buildrun
//!
//! Provides XDG-compliant layered configuration loading with
//! environment variable interpolation of path-like values.

pub mod interpolate;
pub mod loader;
pub mod model;

pub use interpolate::interpolate_config;
pub use loader::{config_paths, find_config_files, load_config};
pub use model::*;

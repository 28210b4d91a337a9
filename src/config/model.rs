//! Configuration model for buildrun
//!
//! Defines the structure for XDG-compliant layered configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::BuildError;
use crate::pipeline::{BuildConfiguration, Toolchain, DEFAULT_EXECUTABLE, DEFAULT_MODULES};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    /// What to build and where
    #[serde(default)]
    pub build: BuildSettings,

    /// Compiler driver settings
    #[serde(default)]
    pub toolchain: Toolchain,
}

/// What to build and where
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BuildSettings {
    /// Module base names, in compile and link order
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,

    /// Name of the linked executable
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Directory holding the sources; objects and executable land here too
    #[serde(default = "default_working_dir")]
    pub working_dir: String,

    /// Per-stage timeout in seconds (0 = wait indefinitely)
    #[serde(default)]
    pub timeout: u64,

    /// Environment variables for the compiler, linker and program
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_modules() -> Vec<String> {
    DEFAULT_MODULES.iter().map(|m| m.to_string()).collect()
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

fn default_working_dir() -> String {
    ".".to_string()
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            modules: default_modules(),
            executable: default_executable(),
            working_dir: default_working_dir(),
            timeout: 0,
            env: HashMap::new(),
        }
    }
}

/// Values given on the command line, applied over every config layer
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub modules: Option<Vec<String>>,
    pub executable: Option<String>,
    pub compiler: Option<String>,
    pub working_dir: Option<String>,
    pub timeout: Option<u64>,
}

impl Config {
    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(ref modules) = overrides.modules {
            self.build.modules = modules.clone();
        }
        if let Some(ref executable) = overrides.executable {
            self.build.executable = executable.clone();
        }
        if let Some(ref compiler) = overrides.compiler {
            self.toolchain.compiler = compiler.clone();
        }
        if let Some(ref dir) = overrides.working_dir {
            self.build.working_dir = dir.clone();
        }
        if let Some(timeout) = overrides.timeout {
            self.build.timeout = timeout;
        }
    }

    /// Validated, immutable module list and executable name
    pub fn build_configuration(&self) -> Result<BuildConfiguration, BuildError> {
        BuildConfiguration::from_names(self.build.modules.iter().cloned(), &self.build.executable)
    }

    /// Stage timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        (self.build.timeout > 0).then(|| Duration::from_secs(self.build.timeout))
    }

    pub fn working_dir(&self) -> PathBuf {
        PathBuf::from(&self.build.working_dir)
    }
}

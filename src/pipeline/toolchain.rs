//! Compiler driver description and command-line construction
//!
//! Command lines are built as discrete argument vectors. Nothing here is
//! ever passed through a shell, so module names need no quoting.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::module::ModuleName;
use super::outcome::Stage;
use crate::executor::display_command;

/// A fully-built external command for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub stage: Stage,
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Invocation that runs a built program with no arguments
    pub fn program(path: &Path) -> Self {
        Self {
            stage: Stage::Run,
            program: path.to_string_lossy().into_owned(),
            args: vec![],
        }
    }

    /// Space-joined form for logs and `plan` output
    pub fn command_line(&self) -> String {
        display_command(&self.program, &self.args)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Compiler driver used for both compiling and linking
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Toolchain {
    /// Compiler driver executable
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Linker executable (defaults to the compiler driver)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linker: Option<String>,

    /// Flag requesting compilation without linking
    #[serde(default = "default_compile_flag")]
    pub compile_flag: String,

    /// Flag preceding the output file name when linking
    #[serde(default = "default_output_flag")]
    pub output_flag: String,

    /// Extension appended to module names to find sources
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Extension of the object files the compiler writes
    #[serde(default = "default_object_extension")]
    pub object_extension: String,

    /// Extra compiler flags, placed before the sources
    #[serde(default)]
    pub cflags: Vec<String>,

    /// Header search directories (`-I<dir>`)
    #[serde(default)]
    pub include_dirs: Vec<String>,

    /// Extra linker flags, placed after the output name
    #[serde(default)]
    pub ldflags: Vec<String>,

    /// Library search directories (`-L<dir>`)
    #[serde(default)]
    pub lib_dirs: Vec<String>,

    /// Libraries to link (`-l<lib>`)
    #[serde(default)]
    pub libs: Vec<String>,
}

fn default_compiler() -> String {
    "gcc".to_string()
}

fn default_compile_flag() -> String {
    "-c".to_string()
}

fn default_output_flag() -> String {
    "-o".to_string()
}

fn default_source_extension() -> String {
    "c".to_string()
}

fn default_object_extension() -> String {
    "o".to_string()
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            linker: None,
            compile_flag: default_compile_flag(),
            output_flag: default_output_flag(),
            source_extension: default_source_extension(),
            object_extension: default_object_extension(),
            cflags: vec![],
            include_dirs: vec![],
            ldflags: vec![],
            lib_dirs: vec![],
            libs: vec![],
        }
    }
}

impl Toolchain {
    /// Toolchain driven by the given compiler, other settings at defaults
    pub fn with_compiler(compiler: impl Into<String>) -> Self {
        Self {
            compiler: compiler.into(),
            ..Default::default()
        }
    }

    /// Executable used for the link stage
    pub fn linker(&self) -> &str {
        self.linker.as_deref().unwrap_or(&self.compiler)
    }

    pub fn source_files(&self, modules: &[ModuleName]) -> Vec<String> {
        modules
            .iter()
            .map(|m| m.with_extension(&self.source_extension))
            .collect()
    }

    pub fn object_files(&self, modules: &[ModuleName]) -> Vec<String> {
        modules
            .iter()
            .map(|m| m.with_extension(&self.object_extension))
            .collect()
    }

    /// `<cc> -c [cflags] [-I<dir>] <src1> <src2> ...`
    pub fn compile_invocation(&self, modules: &[ModuleName]) -> Invocation {
        let mut args = vec![self.compile_flag.clone()];
        args.extend(self.cflags.iter().cloned());
        args.extend(self.include_dirs.iter().map(|d| format!("-I{}", d)));
        args.extend(self.source_files(modules));

        Invocation {
            stage: Stage::Compile,
            program: self.compiler.clone(),
            args,
        }
    }

    /// `<cc> <obj1> <obj2> ... -o <executable> [ldflags] [-L<dir>] [-l<lib>]`
    pub fn link_invocation(&self, modules: &[ModuleName], executable: &str) -> Invocation {
        let mut args = self.object_files(modules);
        args.push(self.output_flag.clone());
        args.push(executable.to_string());
        args.extend(self.ldflags.iter().cloned());
        args.extend(self.lib_dirs.iter().map(|d| format!("-L{}", d)));
        args.extend(self.libs.iter().map(|l| format!("-l{}", l)));

        Invocation {
            stage: Stage::Link,
            program: self.linker().to_string(),
            args,
        }
    }
}

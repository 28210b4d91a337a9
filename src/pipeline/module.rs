//! Module names and the immutable build configuration

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::BuildError;

/// Modules built when nothing else is configured
pub const DEFAULT_MODULES: &[&str] = &["flexpart_helpers", "multi_rddep_w"];

/// Executable produced when nothing else is configured
pub const DEFAULT_EXECUTABLE: &str = "ddep2bin";

/// Check that `name` can be used as a single file name in the working directory.
///
/// Names starting with `-` are refused so that a module can never be read
/// as a compiler option.
fn check_component(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name == "." || name == ".." {
        return Err("name refers to a directory".to_string());
    }
    if name.contains('/') || name.contains('\\') {
        return Err("name contains a path separator".to_string());
    }
    if name.contains('\0') {
        return Err("name contains a NUL byte".to_string());
    }
    if name.starts_with('-') {
        return Err("name starts with '-'".to_string());
    }
    Ok(())
}

/// A compilation unit, named without extension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Result<Self, BuildError> {
        let name = name.into();
        check_component(&name).map_err(|reason| BuildError::InvalidModule {
            name: name.clone(),
            reason,
        })?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name for this module with the given extension (`a` + `c` → `a.c`)
    pub fn with_extension(&self, extension: &str) -> String {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            self.0.clone()
        } else {
            format!("{}.{}", self.0, extension)
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ModuleName {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The ordered module list and the executable they link into.
///
/// Built once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    modules: Vec<ModuleName>,
    executable: String,
}

impl BuildConfiguration {
    /// # Errors
    /// * `BuildError::InvalidConfiguration` - empty or duplicated module list,
    ///   or an executable name that is not a plain file name
    pub fn new(modules: Vec<ModuleName>, executable: impl Into<String>) -> Result<Self, BuildError> {
        let executable = executable.into();

        if modules.is_empty() {
            return Err(BuildError::InvalidConfiguration(
                "at least one module is required".to_string(),
            ));
        }

        for (i, module) in modules.iter().enumerate() {
            if modules[..i].contains(module) {
                return Err(BuildError::InvalidConfiguration(format!(
                    "module '{}' is listed more than once",
                    module
                )));
            }
        }

        check_component(&executable).map_err(|reason| {
            BuildError::InvalidConfiguration(format!(
                "invalid executable name '{}': {}",
                executable, reason
            ))
        })?;

        Ok(Self {
            modules,
            executable,
        })
    }

    /// Validate and collect plain names into a configuration
    pub fn from_names<I, S>(names: I, executable: impl Into<String>) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let modules = names
            .into_iter()
            .map(ModuleName::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(modules, executable)
    }

    pub fn modules(&self) -> &[ModuleName] {
        &self.modules
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            modules: DEFAULT_MODULES
                .iter()
                .map(|m| ModuleName(m.to_string()))
                .collect(),
            executable: DEFAULT_EXECUTABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_valid() {
        let module = ModuleName::new("flexpart_helpers").unwrap();
        assert_eq!(module.as_str(), "flexpart_helpers");
        assert_eq!(module.to_string(), "flexpart_helpers");
    }

    #[test]
    fn test_module_name_rejects_bad_components() {
        for bad in ["", ".", "..", "src/a", "a\\b", "nul\0", "-o"] {
            match ModuleName::new(bad) {
                Err(BuildError::InvalidModule { name, .. }) => assert_eq!(name, bad),
                other => panic!("Expected InvalidModule for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_module_name_with_extension() {
        let module = ModuleName::new("a").unwrap();
        assert_eq!(module.with_extension("c"), "a.c");
        assert_eq!(module.with_extension(".o"), "a.o");
        assert_eq!(module.with_extension(""), "a");
    }

    #[test]
    fn test_module_name_from_str() {
        let module: ModuleName = "multi_rddep_w".parse().unwrap();
        assert_eq!(module.as_ref(), "multi_rddep_w");
        assert!("".parse::<ModuleName>().is_err());
    }

    #[test]
    fn test_build_configuration_keeps_order() {
        let config = BuildConfiguration::from_names(["b", "a", "c"], "prog").unwrap();
        let names: Vec<&str> = config.modules().iter().map(ModuleName::as_str).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(config.executable(), "prog");
    }

    #[test]
    fn test_build_configuration_rejects_empty() {
        let result = BuildConfiguration::from_names(Vec::<String>::new(), "prog");
        assert!(matches!(result, Err(BuildError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_build_configuration_rejects_duplicates() {
        let result = BuildConfiguration::from_names(["a", "b", "a"], "prog");
        match result {
            Err(BuildError::InvalidConfiguration(msg)) => assert!(msg.contains("'a'")),
            other => panic!("Expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_build_configuration_rejects_bad_executable() {
        for bad in ["", "bin/prog", "-prog"] {
            let result = BuildConfiguration::from_names(["a"], bad);
            assert!(
                matches!(result, Err(BuildError::InvalidConfiguration(_))),
                "executable {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_build_configuration_propagates_module_error() {
        let result = BuildConfiguration::from_names(["a", "../b"], "prog");
        assert!(matches!(result, Err(BuildError::InvalidModule { .. })));
    }

    #[test]
    fn test_default_configuration() {
        let config = BuildConfiguration::default();
        let names: Vec<&str> = config.modules().iter().map(ModuleName::as_str).collect();
        assert_eq!(names, DEFAULT_MODULES);
        assert_eq!(config.executable(), "ddep2bin");
    }
}

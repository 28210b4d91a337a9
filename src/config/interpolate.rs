//! Configuration value interpolation
//!
//! Path-like values and environment values may reference the environment:
//! - `~` or `~/dir` - Home directory
//! - `$VAR` or `${VAR}` - Environment variable substitution
//!
//! There is no command substitution.

/// Expand `~` and environment variables in `value`
///
/// An unset variable leaves the value unchanged and logs a warning, so the
/// literal text shows up in later error messages.
///
/// # Examples
///
/// ```
/// use buildrun::config::interpolate::interpolate_string;
///
/// std::env::set_var("BUILDRUN_DOC_PREFIX", "/opt/gcc");
/// let result = interpolate_string("$BUILDRUN_DOC_PREFIX/bin/gcc");
/// assert_eq!(result, "/opt/gcc/bin/gcc");
/// std::env::remove_var("BUILDRUN_DOC_PREFIX");
/// ```
pub fn interpolate_string(value: &str) -> String {
    match shellexpand::full(value) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            tracing::warn!("Failed to expand config value '{}': {}", value, e);
            value.to_string()
        }
    }
}

fn interpolate_all(values: &mut [String]) {
    for value in values {
        *value = interpolate_string(value);
    }
}

/// Interpolate the path-like and environment values of a Config
pub fn interpolate_config(config: &mut super::model::Config) {
    config.build.working_dir = interpolate_string(&config.build.working_dir);
    for value in config.build.env.values_mut() {
        *value = interpolate_string(value);
    }

    let toolchain = &mut config.toolchain;
    toolchain.compiler = interpolate_string(&toolchain.compiler);
    if let Some(ref mut linker) = toolchain.linker {
        *linker = interpolate_string(linker);
    }
    interpolate_all(&mut toolchain.include_dirs);
    interpolate_all(&mut toolchain.lib_dirs);
}

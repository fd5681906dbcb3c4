//! Resolution of configured source paths.
//!
//! A path string from `cifly.toml` goes through two steps:
//! 1. Shell-style expansion: `${VAR}`, `${VAR:-default}`, bare `$VAR`, and a
//!    leading `~` for the home directory.
//! 2. Anchoring: relative results are joined onto the config file's directory,
//!    absolute results are kept as they are.

use std::env::VarError;
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Expand `value` and resolve it against `base`.
///
/// `field` is the dotted config key used in error messages
/// (e.g. `content.code_raw.dirs`).
pub(crate) fn resolve_source_path(value: &str, base: &Path, field: &str) -> Result<PathBuf, ConfigError> {
    let expanded = shellexpand::full_with_context(value, home_dir, lookup_var).map_err(|e| {
        ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        }
    })?;

    let path = Path::new(&*expanded);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(base.join(path))
    }
}

fn lookup_var(name: &str) -> Result<Option<String>, VarError> {
    std::env::var(name).map(Some)
}

fn home_dir() -> Option<String> {
    std::env::var("HOME").ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const BASE: &str = "/site/website";

    fn resolve(value: &str) -> Result<PathBuf, ConfigError> {
        resolve_source_path(value, Path::new(BASE), "content.code_raw.dirs")
    }

    #[test]
    fn test_relative_path_joined_onto_config_dir() {
        assert_eq!(
            resolve("../ruletables").unwrap(),
            PathBuf::from("/site/website/../ruletables")
        );
    }

    #[test]
    fn test_variable_inside_relative_path() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("CF_TEST_EXAMPLES_SUBDIR", "ciflypy-examples");
        }
        let path = resolve("../examples/${CF_TEST_EXAMPLES_SUBDIR}/ciflypy_examples").unwrap();
        unsafe {
            std::env::remove_var("CF_TEST_EXAMPLES_SUBDIR");
        }

        assert_eq!(
            path,
            PathBuf::from("/site/website/../examples/ciflypy-examples/ciflypy_examples")
        );
    }

    #[test]
    fn test_variable_expanding_to_absolute_path_not_joined() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("CF_TEST_EXAMPLES_ROOT", "/srv/examples");
        }
        let path = resolve("${CF_TEST_EXAMPLES_ROOT}/R").unwrap();
        unsafe {
            std::env::remove_var("CF_TEST_EXAMPLES_ROOT");
        }

        assert_eq!(path, PathBuf::from("/srv/examples/R"));
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("CF_TEST_UNSET_TABLES");
        }
        assert_eq!(
            resolve("${CF_TEST_UNSET_TABLES:-../ruletables}").unwrap(),
            PathBuf::from("/site/website/../ruletables")
        );
    }

    #[test]
    fn test_missing_variable_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("CF_TEST_MISSING_ROOT");
        }
        let err = resolve("${CF_TEST_MISSING_ROOT}/py").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("CF_TEST_MISSING_ROOT"));
        assert!(err.to_string().contains("content.code_raw.dirs"));
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let Some(home) = home_dir() else {
            return;
        };

        assert_eq!(resolve("~/cifly/ruletables").unwrap(), Path::new(&home).join("cifly/ruletables"));
    }
}

use std::env::{self, VarError};

use crate::config::ConfigError;

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) => Ok(v),
        Err(VarError::NotPresent) => Err(ConfigError::MissingEnvVar(name.to_string())),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(name.to_string())),
    }
}

/// Reads an optional override from the environment.
///
/// Unset and empty (after trimming) both come back as `Ok(None)`, so callers can
/// fall back to a file or built-in default.
pub fn get_env_var_opt(name: &str) -> Result<Option<String>, ConfigError> {
    match get_env_var(name) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(ConfigError::MissingEnvVar(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VAR: &str = "SHARED_UTILS_TEST_VAR";

    #[test]
    #[serial]
    fn missing_var_is_structured_error() {
        unsafe { env::remove_var(VAR) };
        let err = get_env_var(VAR).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref n) if n == VAR));
        assert_eq!(err.to_string(), format!("Missing environment variable: {VAR}"));
    }

    #[test]
    #[serial]
    fn present_var_is_returned() {
        unsafe { env::set_var(VAR, "sqlite.db") };
        assert_eq!(get_env_var(VAR).unwrap(), "sqlite.db");
        unsafe { env::remove_var(VAR) };
    }

    #[test]
    #[serial]
    fn optional_treats_blank_as_unset() {
        unsafe { env::set_var(VAR, "   ") };
        assert_eq!(get_env_var_opt(VAR).unwrap(), None);
        unsafe { env::remove_var(VAR) };
        assert_eq!(get_env_var_opt(VAR).unwrap(), None);
    }
}

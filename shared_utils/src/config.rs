use thiserror::Error;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable is set but holds something other than valid unicode.
    #[error("Environment variable {0} is not valid unicode")]
    NotUnicode(String),
}

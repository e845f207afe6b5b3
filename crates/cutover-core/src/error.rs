//! Error types for deployment configuration.

use thiserror::Error;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building or validating a deployment config.
///
/// Every variant is caught before the first cluster call: a config that
/// fails here never causes a mutation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported strategy: {0}")]
    UnsupportedStrategy(String),

    #[error("replicas must be positive")]
    InvalidReplicas,

    #[error("timeout must be positive")]
    InvalidTimeout,

    #[error("invalid canary steps: {0}")]
    InvalidCanarySteps(String),

    #[error("failed to read {0}: {1}")]
    Read(String, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

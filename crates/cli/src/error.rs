//! CLI error type.

use souk_client::ClientError;
use souk_client::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Text shown to the user on failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    /// Log the failure and send client errors to Sentry.
    pub fn report(&self) {
        match self {
            Self::Client(e) => e.report(),
            other => tracing::error!(error = %other, "Command failed"),
        }
    }
}

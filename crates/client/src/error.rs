//! Unified error handling with Sentry integration.
//!
//! Every fallible client operation returns [`ClientError`]. Reads swallow
//! and log transport failures; writes hand them back so the caller can show
//! [`ClientError::user_message`].

use thiserror::Error;

use crate::storage::StorageError;

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A mutation was attempted without a signed-in session.
    #[error("Not signed in")]
    Unauthenticated,

    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body did not match any known shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A local precondition failed; nothing was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Durable client storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether this error came from the remote side or the network.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Api { .. } | Self::RateLimited(_) | Self::Parse(_)
        )
    }

    /// A notice suitable for showing to the shopper.
    ///
    /// Remote failures collapse into one generic message; internal details
    /// stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Please log in to continue".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} was not found"),
            Self::RateLimited(secs) => {
                format!("Too many requests, please try again in {secs} seconds")
            }
            Self::Api { status: 401, .. } => {
                "Your session has expired, please log in again".to_string()
            }
            Self::Storage(_) => "Could not save your changes on this device".to_string(),
            _ => "Something went wrong, please try again".to_string(),
        }
    }

    /// Send remote failures to Sentry and log them.
    pub fn report(&self) {
        if self.is_remote() || matches!(self, Self::Storage(_) | Self::InvalidUrl(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront client error"
            );
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

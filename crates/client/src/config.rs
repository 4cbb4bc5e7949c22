//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SOUK_API_URL` - Base URL of the storefront REST API
//!
//! ## Optional
//! - `SOUK_STATE_DIR` - Directory for durable client state (default: `.souk`)
//! - `SOUK_TAX_RATE` - Tax fraction applied at checkout (default: 0.14)
//! - `SOUK_FREE_SHIPPING_THRESHOLD` - Subtotal above which shipping is free (default: 100)
//! - `SOUK_FLAT_SHIPPING_FEE` - Shipping charged otherwise (default: 10)
//! - `SOUK_PRODUCT_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use souk_core::PricingPolicy;
use thiserror::Error;
use url::Url;

const DEFAULT_STATE_DIR: &str = ".souk";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API connection settings
    pub api: ApiConfig,
    /// Directory holding the durable key-value files
    pub state_dir: PathBuf,
    /// Tax and shipping rules shared by every price calculation
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// REST API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; always ends with `/` so endpoint paths append cleanly
    pub base_url: Url,
    /// How long catalog reads are served from memory
    pub product_cache_ttl: Duration,
}

impl ApiConfig {
    /// Build an API config from a base URL string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is
    /// not http(s).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("SOUK_API_URL", base_url)?,
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
        })
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let base_url = parse_base_url("SOUK_API_URL", &env.required("SOUK_API_URL")?)?;
        let product_cache_ttl = Duration::from_secs(
            env.parsed("SOUK_PRODUCT_CACHE_TTL_SECS", DEFAULT_PRODUCT_CACHE_TTL_SECS)?,
        );

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy::new(
            env.parsed("SOUK_TAX_RATE", defaults.tax_rate)?,
            env.parsed(
                "SOUK_FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            )?,
            env.parsed("SOUK_FLAT_SHIPPING_FEE", defaults.flat_shipping_fee)?,
        );
        validate_pricing(&pricing)?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                product_cache_ttl,
            },
            state_dir: env
                .optional("SOUK_STATE_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from),
            pricing,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse a base URL and make sure relative endpoint paths append to it.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Reject pricing settings that would produce nonsense totals.
fn validate_pricing(policy: &PricingPolicy) -> Result<(), ConfigError> {
    if policy.tax_rate < Decimal::ZERO || policy.tax_rate >= Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "SOUK_TAX_RATE".to_string(),
            "must be a fraction in [0, 1)".to_string(),
        ));
    }
    if policy.free_shipping_threshold < Decimal::ZERO {
        return Err(ConfigError::InvalidEnvVar(
            "SOUK_FREE_SHIPPING_THRESHOLD".to_string(),
            "must not be negative".to_string(),
        ));
    }
    if policy.flat_shipping_fee < Decimal::ZERO {
        return Err(ConfigError::InvalidEnvVar(
            "SOUK_FLAT_SHIPPING_FEE".to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(())
}

//! Cart drawer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_BASE_URL` - Storefront origin serving `/cart.js` (e.g., <https://shop.example.com>)
//!
//! ## Optional
//! - `CART_TOKEN` - Existing cart token to resume a session cart
//! - `CART_CONTINUE_SHOPPING_URL` - Link shown in the empty cart (default: /collections/all)
//! - `CART_SYNC_POLICY` - `serialized` or `unguarded` (default: serialized)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::controller::SyncPolicy;

/// Default target of the empty cart's "Continue Shopping" link.
pub const DEFAULT_CONTINUE_SHOPPING_URL: &str = "/collections/all";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart drawer configuration.
#[derive(Debug, Clone)]
pub struct DrawerConfig {
    /// Storefront origin hosting the cart endpoints
    pub base_url: Url,
    /// Cart token of an existing session cart
    pub cart_token: Option<SecretString>,
    /// Target of the empty cart's "Continue Shopping" link
    pub continue_shopping_url: String,
    /// How concurrent cart operations are ordered
    pub sync_policy: SyncPolicy,
}

impl DrawerConfig {
    /// Create a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            cart_token: None,
            continue_shopping_url: DEFAULT_CONTINUE_SHOPPING_URL.to_string(),
            sync_policy: SyncPolicy::default(),
        }
    }

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

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = get_required(&lookup, "CART_BASE_URL")?;
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CART_BASE_URL".to_string(), e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "CART_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let cart_token = get_optional(&lookup, "CART_TOKEN").map(SecretString::from);
        let continue_shopping_url = get_optional(&lookup, "CART_CONTINUE_SHOPPING_URL")
            .unwrap_or_else(|| DEFAULT_CONTINUE_SHOPPING_URL.to_string());
        let sync_policy = get_optional(&lookup, "CART_SYNC_POLICY")
            .map(|value| {
                value.parse::<SyncPolicy>().map_err(|e| {
                    ConfigError::InvalidEnvVar("CART_SYNC_POLICY".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            base_url,
            cart_token,
            continue_shopping_url,
            sync_policy,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    get_optional(lookup, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional variable, treating blank values as unset.
fn get_optional(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPHUB_BACKEND_URL` - Base URL of the managed backend
//! - `SHOPHUB_ANON_KEY` - Publishable API key sent with every request
//!
//! ## Optional
//! - `SHOPHUB_ACCESS_TOKEN` - Bearer token of the signed-in user; without
//!   it the client operates as a guest (local cart only)
//! - `SHOPHUB_DATA_DIR` - Directory for persisted snapshots (default:
//!   `.shophub`)

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_KEY_LENGTH: usize = 20;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the managed backend.
    pub backend_url: Url,
    /// Publishable API key (row access is still policy-gated server-side).
    pub anon_key: SecretString,
    /// Bearer token identifying the signed-in user, if any.
    pub access_token: Option<SecretString>,
    /// Directory for persisted local snapshots.
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("backend_url", &self.backend_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if keys fail validation (placeholder detection, minimum length).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend_url = get_required_env("SHOPHUB_BACKEND_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPHUB_BACKEND_URL".to_string(), e.to_string())
            })?;
        let anon_key = get_validated_secret("SHOPHUB_ANON_KEY")?;
        let access_token = match get_optional_env("SHOPHUB_ACCESS_TOKEN") {
            Some(token) => {
                validate_secret("SHOPHUB_ACCESS_TOKEN", &token)?;
                Some(SecretString::from(token))
            }
            None => None,
        };
        let data_dir = PathBuf::from(get_env_or_default("SHOPHUB_DATA_DIR", ".shophub"));

        Ok(Self {
            backend_url,
            anon_key,
            access_token,
            data_dir,
        })
    }

    /// Expose the anon key for request headers.
    #[must_use]
    pub fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }

    /// Expose the access token for request headers, if configured.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(ExposeSecret::expose_secret)
    }
}

// =============================================================================
// Environment Helpers
// =============================================================================

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_validated_secret(name: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(name)?;
    validate_secret(name, &value)?;
    Ok(SecretString::from(value))
}

/// Reject obviously unusable keys before the first request fails with a
/// confusing 401.
fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_string(),
            format!("must be at least {MIN_KEY_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lowered.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                name.to_string(),
                format!("looks like a placeholder (contains {pattern:?})"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_rejects_short_keys() {
        let err = validate_secret("TEST_KEY", "short").expect_err("too short");
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_rejects_placeholders() {
        let err = validate_secret("TEST_KEY", "your-anon-key-goes-here-1234")
            .expect_err("placeholder");
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_accepts_real_looking_keys() {
        assert!(validate_secret("TEST_KEY", "sb_pk_4f8a2cc19ed04b779e1d3f52").is_ok());
    }
}

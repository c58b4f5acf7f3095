//! Unified error type for the client crate.
//!
//! Each layer defines its own error enum; `ClientError` is the umbrella the
//! application root sees. Store operations deliberately do NOT return these
//! for expected failure modes (a failed fetch, a failed optimistic write):
//! those are caught internally, logged, and surfaced through the store's
//! `last_error` accessor so the UI can keep rendering the last-known state.

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::persist::PersistError;
use crate::realtime::RealtimeError;
use crate::stores::AuthError;

/// Application-level error type for the sync core.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend row operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Realtime channel operation failed.
    #[error("Realtime error: {0}")]
    Realtime(#[from] RealtimeError),

    /// Local persistence failed.
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Authentication handshake failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Backend(BackendError::NotFound("product-123".to_string()));
        assert_eq!(err.to_string(), "Backend error: Not found: product-123");
    }
}

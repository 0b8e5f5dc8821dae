//! Object-storage transport error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors surfaced by the object-storage transport.
///
/// Each variant carries enough context to decide whether the failed call is
/// worth retrying; the retry loop lives with the storage client, not here.
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StorageError {
    #[error("request timeout during {operation} for {target}")]
    Timeout { operation: String, target: String },

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("rate limited: retry after {seconds} seconds")]
    RateLimited { seconds: u64 },

    #[error("no such key: {key}")]
    NoSuchKey { key: String },

    #[error("no such bucket: {bucket}")]
    NoSuchBucket { bucket: String },

    #[error("access denied: {message}")]
    AccessDenied { message: String },

    #[error("content read interrupted for {key}: {message}")]
    ReadInterrupted { key: String, message: String },

    #[error("malformed response: {message}")]
    InvalidResponse { message: String },

    #[error("storage backend error: {message}")]
    Backend { message: String, retriable: bool },
}

impl StorageError {
    /// Whether the failed call may succeed if repeated.
    ///
    /// Timeouts, connection drops, server-side errors, and throttling are
    /// transient; missing keys, auth failures, and malformed responses are not.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout { .. }
            | Self::ConnectionFailed(_)
            | Self::RateLimited { .. }
            | Self::ReadInterrupted { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Backend { retriable, .. } => *retriable,
            Self::NoSuchKey { .. }
            | Self::NoSuchBucket { .. }
            | Self::AccessDenied { .. }
            | Self::InvalidResponse { .. } => false,
        }
    }
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::AccessDenied { .. } => {
                Some("Check AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY and bucket permissions.")
            }
            Self::NoSuchBucket { .. } => Some("Check the bucket name and endpoint."),
            Self::RateLimited { .. } => {
                Some("Lower --concurrency to stay under the backend's request limits.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        self.is_retriable()
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Timeout { .. } => "storage.timeout",
            Self::ConnectionFailed(_) => "storage.connection_failed",
            Self::Http { .. } => "storage.http",
            Self::RateLimited { .. } => "storage.rate_limited",
            Self::NoSuchKey { .. } => "storage.no_such_key",
            Self::NoSuchBucket { .. } => "storage.no_such_bucket",
            Self::AccessDenied { .. } => "storage.access_denied",
            Self::ReadInterrupted { .. } => "storage.read_interrupted",
            Self::InvalidResponse { .. } => "storage.invalid_response",
            Self::Backend { .. } => "storage.backend",
        })
    }
}

//! Digest computation and multipart-layout error types

use crate::UserFacingError;
use std::borrow::Cow;
use thiserror::Error;

/// Errors from digest computation and multipart-layout resolution.
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum DigestError {
    /// The multipart layout cannot be reconstructed from the stored metadata.
    /// Not transient; retrying cannot help.
    #[error("unknown multipart layout: {reason}")]
    UnknownLayout { reason: String },

    /// The content stream ended at a different length than the metadata declared.
    #[error("content length mismatch: expected {expected} bytes, read {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// Reading the content stream failed partway through.
    #[error("content read failed: {message}")]
    ReadFailed { message: String },
}

impl UserFacingError for DigestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ReadFailed { .. } | Self::LengthMismatch { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::UnknownLayout { .. } => "digest.unknown_layout",
            Self::LengthMismatch { .. } => "digest.length_mismatch",
            Self::ReadFailed { .. } => "digest.read_failed",
        })
    }
}

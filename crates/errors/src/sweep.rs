//! Sweep-level error types

use crate::UserFacingError;
use std::borrow::Cow;
use thiserror::Error;

/// Errors that abort an entire sweep.
///
/// Per-object failures never appear here; they are classified into verdicts
/// at the checker boundary. Only failures that make the whole sweep
/// unreliable (the object listing itself) are sweep-level.
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SweepError {
    /// A listing page could not be fetched after the transport's retry budget.
    /// Fatal: without a complete listing the total object count is unknown,
    /// so no partial report is produced.
    #[error("enumeration of bucket {bucket} failed after {pages_listed} pages: {message}")]
    EnumerationFailed {
        bucket: String,
        pages_listed: usize,
        message: String,
    },

    /// A worker task terminated abnormally instead of producing a verdict.
    #[error("check worker for {key} terminated abnormally: {message}")]
    WorkerPanicked { key: String, message: String },
}

impl UserFacingError for SweepError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::EnumerationFailed { .. } => {
                Some("Verify the bucket exists and the endpoint is reachable, then rerun.")
            }
            Self::WorkerPanicked { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::EnumerationFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::EnumerationFailed { .. } => "sweep.enumeration_failed",
            Self::WorkerPanicked { .. } => "sweep.worker_panicked",
        })
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Object-storage access for tagsweep
//!
//! The engine talks to buckets through the [`ObjectStore`] capability; this
//! crate provides the trait, the wire-level records it traffics in, the
//! retry policy, and the production implementation backed by the AWS SDK
//! (which also serves any S3-compatible endpoint via an endpoint override).
//!
//! Connection pooling, authentication, and request-level retry/backoff all
//! live here; the engine is agnostic to endpoints and credentials beyond
//! receiving a configured store handle.

mod retry;
mod s3;

pub use retry::{calculate_backoff_delay, with_retry, RetryPolicy};
pub use s3::{build_client, S3ObjectStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tagsweep_errors::Result;
use tokio::io::AsyncRead;

/// One raw entry from a bucket listing page.
///
/// Listing responses carry less metadata than HEAD responses (no part
/// count); the engine upgrades these to full descriptors.
#[derive(Debug, Clone)]
pub struct RawObjectEntry {
    pub key: String,
    pub size_bytes: u64,
    pub stored_tag: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a bucket listing.
#[derive(Debug, Clone)]
pub struct ObjectPage {
    /// Entries in listing order
    pub entries: Vec<RawObjectEntry>,
    /// Continuation token for the next page; `None` once exhausted
    pub next_token: Option<String>,
}

/// Metadata from a HEAD request for a single object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub stored_tag: String,
    pub size_bytes: u64,
    /// Multipart part count, when the backend reports one
    pub part_count: Option<u32>,
}

/// Streamed object content.
pub type ObjectBody = Box<dyn AsyncRead + Send + Unpin>;

/// Abstract storage-access capability consumed by the sweep engine.
///
/// Implementations own authentication, pooling, endpoint selection, and
/// retry/backoff; every method returns only after the retry budget for
/// transient failures is exhausted. All failures surface as
/// `Error::Storage` with a retriability classification.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one listing page, in listing order.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
    ) -> Result<ObjectPage>;

    /// Fetch stored metadata for a single object.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta>;

    /// Open the object's content for streaming. The returned stream is
    /// consumed at most once; mid-stream failures are the caller's to
    /// classify.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody>;
}

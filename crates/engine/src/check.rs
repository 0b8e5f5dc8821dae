//! Per-object consistency checking
//!
//! `check_object` is the boundary where every per-object failure dies:
//! whatever goes wrong while verifying one object becomes a verdict, never
//! an error, so a single bad object cannot unwind the sweep.

use std::sync::Arc;
use tagsweep_digest::{compute_digest, resolve_layout};
use tagsweep_errors::{DigestError, Error};
use tagsweep_events::{EventEmitter, EventSender};
use tagsweep_storage::{calculate_backoff_delay, ObjectStore, RetryPolicy};
use tagsweep_types::{EntityTag, ObjectDescriptor, UnreadableKind, Verdict};

/// Shared context for check workers.
#[derive(Clone)]
pub(crate) struct CheckContext {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    /// Retry budget for the content phase (re-fetch + re-digest after a
    /// mid-stream read failure). Request-level retries live in the store.
    pub content_retry: RetryPolicy,
    pub tx: EventSender,
}

/// Verify one object and classify the outcome.
///
/// Pure from the caller's perspective: no shared state is touched, the
/// verdict is the only output. Re-checking an unchanged object yields the
/// same verdict, modulo transient transport failures.
pub(crate) async fn check_object(ctx: &CheckContext, descriptor: &ObjectDescriptor) -> Verdict {
    if descriptor.is_directory_placeholder() {
        return Verdict::Skipped {
            reason: "zero-byte directory placeholder".to_string(),
        };
    }

    // Refresh metadata: HEAD is authoritative over the listing snapshot and
    // is the only source for a part count.
    let meta = match ctx.store.head_object(&ctx.bucket, &descriptor.key).await {
        Ok(meta) => meta,
        Err(e) => {
            return Verdict::Unreadable {
                cause: format!("metadata retrieval failed: {e}"),
                kind: UnreadableKind::Transport,
            };
        }
    };

    let refreshed = ObjectDescriptor {
        key: descriptor.key.clone(),
        size_bytes: meta.size_bytes,
        stored_tag: EntityTag::new(&meta.stored_tag),
        part_count: meta.part_count,
        last_modified: descriptor.last_modified,
    };

    let spec = match resolve_layout(&refreshed) {
        Ok(spec) => spec,
        Err(e) => {
            return Verdict::Unreadable {
                cause: e.to_string(),
                kind: UnreadableKind::Layout,
            };
        }
    };

    // Content phase: a stream that dies partway is retried whole, since the
    // digest needs the bytes from the beginning.
    let mut attempt = 0u32;
    let computed = loop {
        attempt += 1;
        let result = match ctx.store.get_object(&ctx.bucket, &descriptor.key).await {
            Ok(body) => compute_digest(body, &spec, refreshed.size_bytes)
                .await
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(digest) => break digest,
            Err(err) => {
                let (retriable, kind) = classify_content_error(&err);
                if retriable && attempt <= ctx.content_retry.max_retries {
                    let delay = calculate_backoff_delay(&ctx.content_retry, attempt);
                    ctx.tx.emit_debug(format!(
                        "content check of {} failed (attempt {attempt}), retrying: {err}",
                        descriptor.key
                    ));
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Verdict::Unreadable {
                    cause: err.to_string(),
                    kind,
                };
            }
        }
    };

    if computed == refreshed.stored_tag.as_str() {
        Verdict::Consistent
    } else {
        Verdict::Mismatch {
            expected: computed,
            actual: refreshed.stored_tag.as_str().to_string(),
        }
    }
}

/// Classify a content-phase failure: is a whole-object retry worthwhile,
/// and which unreadable kind does it map to.
fn classify_content_error(err: &Error) -> (bool, UnreadableKind) {
    match err {
        Error::Storage(storage_err) => (storage_err.is_retriable(), UnreadableKind::Transport),
        Error::Digest(DigestError::ReadFailed { .. } | DigestError::LengthMismatch { .. }) => {
            (true, UnreadableKind::Read)
        }
        Error::Digest(DigestError::UnknownLayout { .. }) => (false, UnreadableKind::Layout),
        _ => (false, UnreadableKind::Transport),
    }
}

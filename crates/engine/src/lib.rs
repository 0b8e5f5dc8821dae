#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Consistency-verification engine for tagsweep
//!
//! Enumerates a bucket, verifies every object's content against its stored
//! entity tag with a bounded pool of concurrent workers, and aggregates the
//! per-object verdicts into one [`SweepReport`]. Per-object failures become
//! verdicts; only enumeration failures abort a sweep.

mod check;
mod enumerate;
mod report;

pub use enumerate::ObjectEnumerator;
pub use report::ReportAggregator;

use crate::check::{check_object, CheckContext};
use std::sync::Arc;
use std::time::Instant;
use tagsweep_errors::{Error, Result};
use tagsweep_events::{Event, EventEmitter, EventSender};
use tagsweep_storage::{ObjectStore, RetryPolicy};
use tagsweep_types::{SweepReport, UnreadableKind, Verdict};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One-shot sweep over a bucket: the engine's sole entry point.
///
/// Stateless across runs; build a fresh runner for each sweep.
pub struct SweepRunner {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: Option<String>,
    concurrency: usize,
    content_retry: RetryPolicy,
    cancel: CancellationToken,
    tx: EventSender,
}

impl SweepRunner {
    /// Create a new runner builder.
    #[must_use]
    pub fn builder() -> SweepRunnerBuilder {
        SweepRunnerBuilder::new()
    }

    /// Run the sweep to completion (or cancellation).
    ///
    /// Every enumerated descriptor reaches exactly one terminal verdict
    /// before this returns. On cancellation the report is marked partial;
    /// in-flight checks finish and are included.
    ///
    /// # Errors
    ///
    /// Returns an error only if enumeration fails: without a complete
    /// listing no meaningful report can be produced.
    pub async fn run(&self) -> Result<SweepReport> {
        let started = Instant::now();
        let sweep_id = Uuid::new_v4();

        self.tx.emit(Event::SweepStarted {
            sweep_id,
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            concurrency: self.concurrency,
        });

        let mut enumerator = ObjectEnumerator::new(
            self.store.clone(),
            self.bucket.clone(),
            self.prefix.clone(),
            self.tx.clone(),
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let aggregator = Arc::new(ReportAggregator::new(self.tx.clone()));
        let ctx = CheckContext {
            store: self.store.clone(),
            bucket: self.bucket.clone(),
            content_retry: self.content_retry.clone(),
            tx: self.tx.clone(),
        };

        let mut tasks = Vec::new();
        let mut cancelled = false;

        loop {
            // Stop claiming new descriptors once cancellation is observed;
            // the select also interrupts a page fetch in progress.
            let next = tokio::select! {
                () = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = enumerator.next() => next?,
            };
            let Some(descriptor) = next else { break };

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| Error::internal("worker pool semaphore closed"))?;

            let ctx = ctx.clone();
            let aggregator = Arc::clone(&aggregator);
            let key = descriptor.key.clone();
            let task = tokio::spawn(async move {
                let _permit = permit;
                ctx.tx.emit(Event::CheckStarted {
                    key: descriptor.key.clone(),
                    size_bytes: descriptor.size_bytes,
                });

                let verdict = check_object(&ctx, &descriptor).await;
                ctx.tx.emit(Event::CheckCompleted {
                    key: descriptor.key.clone(),
                    verdict: verdict.clone(),
                });
                aggregator.record(descriptor.key, verdict);
            });
            tasks.push((key, task));
        }

        // Let every claimed descriptor reach its verdict. A panicked worker
        // still accounts for its object: the invariant is one terminal
        // verdict per enumerated descriptor, no silent drops.
        for (key, task) in tasks {
            if let Err(join_err) = task.await {
                self.tx
                    .emit_warning(format!("check worker for {key} terminated abnormally"));
                aggregator.record(
                    key,
                    Verdict::Unreadable {
                        cause: format!("check worker failed: {join_err}"),
                        kind: UnreadableKind::Transport,
                    },
                );
            }
        }

        if cancelled {
            self.tx.emit(Event::SweepCancelled {
                checks_completed: aggregator.recorded_count(),
            });
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let aggregator = Arc::try_unwrap(aggregator)
            .map_err(|_| Error::internal("report aggregator still shared after join"))?;
        let report = aggregator.finalize(self.bucket.clone(), cancelled, duration_ms);

        self.tx.emit(Event::SweepCompleted {
            sweep_id,
            total: report.total,
            mismatched: report.mismatched,
            unreadable: report.unreadable,
            partial: report.partial,
            duration_ms,
        });

        Ok(report)
    }

    /// Spot-check a single object without enumerating the bucket.
    ///
    /// Per-object failures are classified into the verdict exactly as they
    /// are during a sweep.
    pub async fn check_key(&self, key: &str) -> Verdict {
        let ctx = CheckContext {
            store: self.store.clone(),
            bucket: self.bucket.clone(),
            content_retry: self.content_retry.clone(),
            tx: self.tx.clone(),
        };

        let meta = match self.store.head_object(&self.bucket, key).await {
            Ok(meta) => meta,
            Err(e) => {
                return Verdict::Unreadable {
                    cause: format!("metadata retrieval failed: {e}"),
                    kind: UnreadableKind::Transport,
                };
            }
        };

        let descriptor = tagsweep_types::ObjectDescriptor {
            key: key.to_string(),
            size_bytes: meta.size_bytes,
            stored_tag: tagsweep_types::EntityTag::new(&meta.stored_tag),
            part_count: meta.part_count,
            last_modified: None,
        };

        check_object(&ctx, &descriptor).await
    }
}

/// Builder for [`SweepRunner`]
pub struct SweepRunnerBuilder {
    store: Option<Arc<dyn ObjectStore>>,
    bucket: Option<String>,
    prefix: Option<String>,
    concurrency: usize,
    content_retry: RetryPolicy,
    cancel: Option<CancellationToken>,
    tx: Option<EventSender>,
}

impl SweepRunnerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: None,
            bucket: None,
            prefix: None,
            concurrency: 4,
            content_retry: RetryPolicy::default(),
            cancel: None,
            tx: None,
        }
    }

    /// Set the storage-access capability
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the bucket to sweep
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Restrict the sweep to keys under a prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Bound the number of concurrent object checks
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the content-phase retry policy
    #[must_use]
    pub fn with_content_retry(mut self, policy: RetryPolicy) -> Self {
        self.content_retry = policy;
        self
    }

    /// Supply a cancellation token for cooperative shutdown
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Set the event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Build the runner
    ///
    /// # Errors
    ///
    /// Returns an error if any required component is missing.
    pub fn build(self) -> Result<SweepRunner> {
        let store = self
            .store
            .ok_or_else(|| Error::internal("SweepRunner requires an ObjectStore"))?;
        let bucket = self
            .bucket
            .ok_or_else(|| Error::internal("SweepRunner requires a bucket"))?;
        let tx = self
            .tx
            .ok_or_else(|| Error::internal("SweepRunner requires an EventSender"))?;

        Ok(SweepRunner {
            store,
            bucket,
            prefix: self.prefix,
            concurrency: self.concurrency,
            content_retry: self.content_retry,
            cancel: self.cancel.unwrap_or_default(),
            tx,
        })
    }
}

impl Default for SweepRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Lazy bucket enumeration
//!
//! Pages through the bucket listing with a continuation token and yields
//! descriptors one at a time, in listing order. The sequence is finite and
//! not restartable; a fresh enumerator re-lists from the start.

use std::collections::VecDeque;
use std::sync::Arc;
use tagsweep_errors::{Result, SweepError};
use tagsweep_events::{Event, EventEmitter, EventSender};
use tagsweep_storage::ObjectStore;
use tagsweep_types::{EntityTag, ObjectDescriptor};

pub struct ObjectEnumerator {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: Option<String>,
    tx: EventSender,
    buffer: VecDeque<ObjectDescriptor>,
    next_token: Option<String>,
    pages_listed: usize,
    exhausted: bool,
}

impl ObjectEnumerator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: String,
        prefix: Option<String>,
        tx: EventSender,
    ) -> Self {
        Self {
            store,
            bucket,
            prefix,
            tx,
            buffer: VecDeque::new(),
            next_token: None,
            pages_listed: 0,
            exhausted: false,
        }
    }

    /// Yield the next descriptor, fetching further pages as needed.
    ///
    /// Returns `Ok(None)` once the backend reports no continuation token
    /// and the final page is drained.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::EnumerationFailed`] if a page fetch fails
    /// after the store's retry budget. This is fatal to the sweep: with an
    /// incomplete listing the total object count would be unreliable.
    pub async fn next(&mut self) -> Result<Option<ObjectDescriptor>> {
        loop {
            if let Some(descriptor) = self.buffer.pop_front() {
                return Ok(Some(descriptor));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = self
                .store
                .list_page(
                    &self.bucket,
                    self.prefix.as_deref(),
                    self.next_token.as_deref(),
                )
                .await
                .map_err(|e| SweepError::EnumerationFailed {
                    bucket: self.bucket.clone(),
                    pages_listed: self.pages_listed,
                    message: e.to_string(),
                })?;

            self.tx.emit(Event::PageListed {
                page_index: self.pages_listed,
                entries: page.entries.len(),
            });
            self.pages_listed += 1;

            self.buffer.extend(page.entries.into_iter().map(|entry| {
                ObjectDescriptor {
                    key: entry.key,
                    size_bytes: entry.size_bytes,
                    stored_tag: EntityTag::new(&entry.stored_tag),
                    // Listings never expose part counts; HEAD fills this in
                    part_count: None,
                    last_modified: entry.last_modified,
                }
            }));

            match page.next_token {
                Some(token) => self.next_token = Some(token),
                None => self.exhausted = true,
            }
        }
    }
}

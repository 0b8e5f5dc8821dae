//! End-to-end engine tests against a scripted in-memory object store

use async_trait::async_trait;
use digest_helpers::{composite_tag, md5_hex};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tagsweep_engine::{ObjectEnumerator, SweepRunner};
use tagsweep_errors::{Result, StorageError};
use tagsweep_events::Event;
use tagsweep_storage::{ObjectBody, ObjectMeta, ObjectPage, ObjectStore, RawObjectEntry, RetryPolicy};
use tagsweep_types::{Verdict, VerdictKind};
use tokio_util::sync::CancellationToken;

mod digest_helpers {
    use md5::{Digest, Md5};

    pub fn md5_hex(data: &[u8]) -> String {
        hex::encode(Md5::digest(data))
    }

    /// Composite multipart tag: MD5 over concatenated raw part digests.
    pub fn composite_tag(parts: &[&[u8]]) -> String {
        let mut concat = Vec::new();
        for part in parts {
            concat.extend_from_slice(&Md5::digest(part));
        }
        format!("{}-{}", hex::encode(Md5::digest(&concat)), parts.len())
    }
}

#[derive(Clone)]
struct MockObject {
    content: Vec<u8>,
    stored_tag: String,
    part_count: Option<u32>,
    /// Fail this many GET calls before succeeding (`u32::MAX` = always fail)
    get_failures: Arc<AtomicU32>,
    fail_retriable: bool,
}

impl MockObject {
    fn new(content: &[u8], stored_tag: &str) -> Self {
        Self {
            content: content.to_vec(),
            stored_tag: stored_tag.to_string(),
            part_count: None,
            get_failures: Arc::new(AtomicU32::new(0)),
            fail_retriable: false,
        }
    }

    fn with_parts(mut self, parts: u32) -> Self {
        self.part_count = Some(parts);
        self
    }

    fn failing_gets(mut self, failures: u32, retriable: bool) -> Self {
        self.get_failures = Arc::new(AtomicU32::new(failures));
        self.fail_retriable = retriable;
        self
    }
}

/// Scripted store: fixed listing pages over a key->object map.
struct MockObjectStore {
    pages: Vec<Vec<String>>,
    objects: HashMap<String, MockObject>,
    /// Fail listing at this page index
    fail_page: Option<usize>,
    /// Never return the page at this index (pends forever, until cancelled)
    hang_page: Option<usize>,
}

impl MockObjectStore {
    fn new(pages: Vec<Vec<String>>, objects: HashMap<String, MockObject>) -> Self {
        Self {
            pages,
            objects,
            fail_page: None,
            hang_page: None,
        }
    }

    fn single_page(objects: HashMap<String, MockObject>) -> Self {
        let mut keys: Vec<String> = objects.keys().cloned().collect();
        keys.sort();
        Self::new(vec![keys], objects)
    }

    fn entry_for(&self, key: &str) -> RawObjectEntry {
        let object = &self.objects[key];
        RawObjectEntry {
            key: key.to_string(),
            size_bytes: object.content.len() as u64,
            stored_tag: format!("\"{}\"", object.stored_tag),
            last_modified: None,
        }
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn list_page(
        &self,
        bucket: &str,
        _prefix: Option<&str>,
        token: Option<&str>,
    ) -> Result<ObjectPage> {
        let index: usize = token.map_or(0, |t| t.parse().unwrap());

        if self.fail_page == Some(index) {
            return Err(StorageError::ConnectionFailed(format!(
                "listing {bucket} page {index} failed"
            ))
            .into());
        }
        if self.hang_page == Some(index) {
            std::future::pending::<()>().await;
        }

        let entries = self.pages[index]
            .iter()
            .map(|key| self.entry_for(key))
            .collect();
        let next_token = if index + 1 < self.pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            next_token,
        })
    }

    async fn head_object(&self, _bucket: &str, key: &str) -> Result<ObjectMeta> {
        let object = self
            .objects
            .get(key)
            .ok_or_else(|| StorageError::NoSuchKey {
                key: key.to_string(),
            })?;
        Ok(ObjectMeta {
            stored_tag: format!("\"{}\"", object.stored_tag),
            size_bytes: object.content.len() as u64,
            part_count: object.part_count,
        })
    }

    async fn get_object(&self, _bucket: &str, key: &str) -> Result<ObjectBody> {
        let object = self
            .objects
            .get(key)
            .ok_or_else(|| StorageError::NoSuchKey {
                key: key.to_string(),
            })?;

        let remaining = object.get_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                object.get_failures.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(if object.fail_retriable {
                StorageError::ConnectionFailed("connection reset".to_string()).into()
            } else {
                StorageError::AccessDenied {
                    message: format!("GET {key} forbidden"),
                }
                .into()
            });
        }

        Ok(Box::new(Cursor::new(object.content.clone())))
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_delay: std::time::Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

fn runner(store: Arc<MockObjectStore>) -> (SweepRunner, tagsweep_events::EventReceiver) {
    let (tx, rx) = tagsweep_events::channel();
    let runner = SweepRunner::builder()
        .with_store(store)
        .with_bucket("test-bucket")
        .with_concurrency(3)
        .with_content_retry(fast_retry())
        .with_event_sender(tx)
        .build()
        .unwrap();
    (runner, rx)
}

#[tokio::test]
async fn three_object_scenario() {
    let hello_tag = md5_hex(b"hello");
    let big_tag = composite_tag(&[b"01234", b"56789"]);

    let mut objects = HashMap::new();
    objects.insert("a.txt".to_string(), MockObject::new(b"hello", &hello_tag));
    objects.insert(
        "b.bin".to_string(),
        MockObject::new(b"corrupted-bytes", "deadbeef"),
    );
    objects.insert(
        "c.big".to_string(),
        MockObject::new(b"0123456789", &big_tag).with_parts(2),
    );

    let store = Arc::new(MockObjectStore::single_page(objects));
    let (runner, _rx) = runner(store);
    let report = runner.run().await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.consistent, 2);
    assert_eq!(report.mismatched, 1);
    assert_eq!(report.unreadable, 0);
    assert!(!report.partial);

    let (key, verdict) = &report.mismatches[0];
    assert_eq!(key, "b.bin");
    match verdict {
        Verdict::Mismatch { expected, actual } => {
            assert_eq!(expected, &md5_hex(b"corrupted-bytes"));
            assert_eq!(actual, "deadbeef");
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn enumeration_yields_all_pages_in_order() {
    let keys: Vec<String> = (0..5).map(|i| format!("obj-{i}")).collect();
    let objects: HashMap<String, MockObject> = keys
        .iter()
        .map(|k| (k.clone(), MockObject::new(b"x", &md5_hex(b"x"))))
        .collect();

    // Page sizes 2 + 0 + 3: the empty middle page must not end enumeration
    let pages = vec![
        keys[0..2].to_vec(),
        vec![],
        keys[2..5].to_vec(),
    ];
    let store = Arc::new(MockObjectStore::new(pages, objects));

    let (tx, _rx) = tagsweep_events::channel();
    let mut enumerator =
        ObjectEnumerator::new(store, "test-bucket".to_string(), None, tx);

    let mut seen = Vec::new();
    while let Some(descriptor) = enumerator.next().await.unwrap() {
        seen.push(descriptor.key);
    }
    assert_eq!(seen, keys);
}

#[tokio::test]
async fn unreadable_object_does_not_abort_sweep() {
    let mut objects = HashMap::new();
    objects.insert(
        "good.txt".to_string(),
        MockObject::new(b"hello", &md5_hex(b"hello")),
    );
    objects.insert(
        "bad.txt".to_string(),
        MockObject::new(b"hello", &md5_hex(b"hello")).failing_gets(u32::MAX, false),
    );

    let store = Arc::new(MockObjectStore::single_page(objects));
    let (runner, _rx) = runner(store);
    let report = runner.run().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.consistent, 1);
    assert_eq!(report.unreadable, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].0, "bad.txt");
    assert!(matches!(
        report.errors[0].1,
        Verdict::Unreadable { .. }
    ));
}

#[tokio::test]
async fn transient_get_failure_recovers_via_retry() {
    let mut objects = HashMap::new();
    objects.insert(
        "flaky.txt".to_string(),
        MockObject::new(b"hello", &md5_hex(b"hello")).failing_gets(1, true),
    );

    let store = Arc::new(MockObjectStore::single_page(objects));
    let (runner, _rx) = runner(store);
    let report = runner.run().await.unwrap();

    assert_eq!(report.consistent, 1);
    assert_eq!(report.unreadable, 0);
}

#[tokio::test]
async fn enumeration_failure_aborts_without_report() {
    let keys: Vec<String> = (0..4).map(|i| format!("obj-{i}")).collect();
    let objects: HashMap<String, MockObject> = keys
        .iter()
        .map(|k| (k.clone(), MockObject::new(b"x", &md5_hex(b"x"))))
        .collect();

    let mut store = MockObjectStore::new(vec![keys[0..2].to_vec(), keys[2..4].to_vec()], objects);
    store.fail_page = Some(1);

    let (runner, _rx) = runner(Arc::new(store));
    let result = runner.run().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn directory_placeholders_are_skipped_but_empty_objects_are_not() {
    let mut objects = HashMap::new();
    objects.insert("photos/".to_string(), MockObject::new(b"", &md5_hex(b"")));
    objects.insert("empty.txt".to_string(), MockObject::new(b"", &md5_hex(b"")));

    let store = Arc::new(MockObjectStore::single_page(objects));
    let (runner, _rx) = runner(store);
    let report = runner.run().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.skipped, 1);
    // The zero-length regular object is verified, not skipped
    assert_eq!(report.consistent, 1);
    assert_eq!(report.count(VerdictKind::Skipped), 1);
}

#[tokio::test]
async fn cancellation_yields_partial_report_with_completed_checks_only() {
    let keys = vec!["a".to_string(), "b".to_string()];
    let objects: HashMap<String, MockObject> = keys
        .iter()
        .map(|k| (k.clone(), MockObject::new(b"x", &md5_hex(b"x"))))
        .collect();

    // Second page never arrives; the sweep can only progress by cancelling
    let mut store = MockObjectStore::new(vec![keys.clone(), vec!["never".to_string()]], objects);
    store.hang_page = Some(1);

    let (tx, mut rx) = tagsweep_events::channel();
    let cancel = CancellationToken::new();
    let runner = SweepRunner::builder()
        .with_store(Arc::new(store))
        .with_bucket("test-bucket")
        .with_concurrency(2)
        .with_content_retry(fast_retry())
        .with_cancellation(cancel.clone())
        .with_event_sender(tx)
        .build()
        .unwrap();

    let handle = tokio::spawn(async move { runner.run().await });

    // Wait until both first-page checks completed, then cancel
    let mut completed = 0;
    while completed < 2 {
        match rx.recv().await {
            Some(Event::CheckCompleted { .. }) => completed += 1,
            Some(_) => {}
            None => panic!("event channel closed early"),
        }
    }
    cancel.cancel();

    let report = handle.await.unwrap().unwrap();
    assert!(report.partial);
    assert_eq!(report.total, 2);
    assert_eq!(report.consistent, 2);
}

#[tokio::test]
async fn total_equals_sum_of_verdict_kinds() {
    let mut objects = HashMap::new();
    objects.insert(
        "ok.txt".to_string(),
        MockObject::new(b"fine", &md5_hex(b"fine")),
    );
    objects.insert(
        "drifted.bin".to_string(),
        MockObject::new(b"drifted", "0000"),
    );
    objects.insert(
        "locked.bin".to_string(),
        MockObject::new(b"locked", &md5_hex(b"locked")).failing_gets(u32::MAX, false),
    );
    objects.insert("dir/".to_string(), MockObject::new(b"", &md5_hex(b"")));

    let store = Arc::new(MockObjectStore::single_page(objects));
    let (runner, _rx) = runner(store);
    let report = runner.run().await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(
        report.consistent + report.mismatched + report.unreadable + report.skipped,
        report.total
    );
}

//! Verdict aggregation
//!
//! The aggregator is the only shared mutable state in the engine. Workers
//! record verdicts as they complete; the runner finalizes once enumeration
//! and every in-flight check are done.

use std::collections::HashMap;
use std::sync::Mutex;
use tagsweep_events::{EventEmitter, EventSender};
use tagsweep_types::{SweepReport, Verdict, VerdictKind};

#[derive(Default)]
struct ReportState {
    recorded: HashMap<String, VerdictKind>,
    consistent: u64,
    mismatched: u64,
    unreadable: u64,
    skipped: u64,
    mismatches: Vec<(String, Verdict)>,
    errors: Vec<(String, Verdict)>,
}

pub struct ReportAggregator {
    state: Mutex<ReportState>,
    tx: EventSender,
}

impl ReportAggregator {
    #[must_use]
    pub fn new(tx: EventSender) -> Self {
        Self {
            state: Mutex::new(ReportState::default()),
            tx,
        }
    }

    /// Record one terminal verdict.
    ///
    /// Keyed by object key, exactly once: a duplicate for an already
    /// recorded key is dropped (with a warning event) so concurrent
    /// retries can never double-count an object.
    pub fn record(&self, key: String, verdict: Verdict) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if state.recorded.contains_key(&key) {
            drop(state);
            self.tx
                .emit_warning(format!("duplicate verdict for {key} dropped"));
            return;
        }

        let kind = verdict.kind();
        state.recorded.insert(key.clone(), kind);
        match kind {
            VerdictKind::Consistent => state.consistent += 1,
            VerdictKind::Mismatch => {
                state.mismatched += 1;
                state.mismatches.push((key, verdict));
            }
            VerdictKind::Unreadable => {
                state.unreadable += 1;
                state.errors.push((key, verdict));
            }
            VerdictKind::Skipped => state.skipped += 1,
        }
    }

    /// Number of verdicts recorded so far.
    #[must_use]
    pub fn recorded_count(&self) -> u64 {
        let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.recorded.len() as u64
    }

    /// Produce the immutable report snapshot.
    #[must_use]
    pub fn finalize(self, bucket: String, partial: bool, duration_ms: u64) -> SweepReport {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        SweepReport {
            bucket,
            total: state.recorded.len() as u64,
            consistent: state.consistent,
            mismatched: state.mismatched,
            unreadable: state.unreadable,
            skipped: state.skipped,
            mismatches: state.mismatches,
            errors: state.errors,
            partial,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagsweep_events::Event;

    #[tokio::test]
    async fn test_exactly_once_per_key() {
        let (tx, mut rx) = tagsweep_events::channel();
        let aggregator = ReportAggregator::new(tx);

        aggregator.record("a".into(), Verdict::Consistent);
        aggregator.record(
            "a".into(),
            Verdict::Mismatch {
                expected: "x".into(),
                actual: "y".into(),
            },
        );

        let report = aggregator.finalize("bucket".into(), false, 0);
        assert_eq!(report.total, 1);
        assert_eq!(report.consistent, 1);
        assert_eq!(report.mismatched, 0);

        match rx.recv().await {
            Some(Event::Warning { message }) => assert!(message.contains("duplicate")),
            other => panic!("expected duplicate warning, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_counts_sum_to_total() {
        let (tx, _rx) = tagsweep_events::channel();
        let aggregator = ReportAggregator::new(tx);

        aggregator.record("a".into(), Verdict::Consistent);
        aggregator.record(
            "b".into(),
            Verdict::Mismatch {
                expected: "x".into(),
                actual: "y".into(),
            },
        );
        aggregator.record(
            "c".into(),
            Verdict::Unreadable {
                cause: "boom".into(),
                kind: tagsweep_types::UnreadableKind::Transport,
            },
        );
        aggregator.record(
            "d/".into(),
            Verdict::Skipped {
                reason: "placeholder".into(),
            },
        );

        let report = aggregator.finalize("bucket".into(), false, 5);
        assert_eq!(report.total, 4);
        assert_eq!(
            report.consistent + report.mismatched + report.unreadable + report.skipped,
            report.total
        );
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.errors.len(), 1);
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in tagsweep
//!
//! All engine output goes through events; no direct logging or printing is
//! allowed outside the CLI. The engine holds a sender, the CLI drains the
//! receiver and decides how each event is rendered.

use serde::Serialize;
use tagsweep_types::Verdict;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Events emitted during a sweep.
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    /// A sweep began
    SweepStarted {
        sweep_id: Uuid,
        bucket: String,
        prefix: Option<String>,
        concurrency: usize,
    },

    /// One listing page was consumed
    PageListed { page_index: usize, entries: usize },

    /// A worker claimed a descriptor
    CheckStarted { key: String, size_bytes: u64 },

    /// A descriptor reached its terminal verdict
    CheckCompleted { key: String, verdict: Verdict },

    /// The sweep finished (completely or after cancellation)
    SweepCompleted {
        sweep_id: Uuid,
        total: u64,
        mismatched: u64,
        unreadable: u64,
        partial: bool,
        duration_ms: u64,
    },

    /// Cancellation observed; no further descriptors will be claimed
    SweepCancelled { checks_completed: u64 },

    /// Diagnostic message
    DebugLog { message: String },

    /// Non-fatal condition worth surfacing
    Warning { message: String },
}

/// Type alias for event sender
pub type EventSender = UnboundedSender<Event>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<Event>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout tagsweep
///
/// Provides a single, consistent API for emitting events regardless of
/// whether you have a raw `EventSender` or a struct that contains one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: Event) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if the receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(Event::DebugLog {
            message: message.into(),
        });
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(Event::Warning {
            message: message.into(),
        });
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (tx, mut rx) = channel();
        tx.emit_debug("first");
        tx.emit_warning("second");
        drop(tx);

        match rx.recv().await {
            Some(Event::DebugLog { message }) => assert_eq!(message, "first"),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await {
            Some(Event::Warning { message }) => assert_eq!(message, "second"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_emit_after_receiver_dropped_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        // Must not panic or error
        tx.emit_debug("into the void");
    }
}

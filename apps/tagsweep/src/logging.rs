//! Tracing setup and event mirroring
//!
//! Engine events carry all sweep diagnostics; this module initializes the
//! tracing subscriber and mirrors events into structured log records so
//! observability tooling sees the same stream the terminal does.

use tagsweep_events::Event;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects debug level for
/// tagsweep crates and the default stays at warn to keep SDK noise down.
pub fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "warn,tagsweep=debug,tagsweep_engine=debug,tagsweep_storage=debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Mirror an engine event into the tracing infrastructure with structured
/// fields.
pub fn log_event_with_tracing(event: &Event) {
    match event {
        Event::SweepStarted {
            sweep_id,
            bucket,
            prefix,
            concurrency,
        } => {
            info!(
                sweep_id = %sweep_id,
                bucket = %bucket,
                prefix = ?prefix,
                concurrency,
                "Sweep started"
            );
        }
        Event::PageListed {
            page_index,
            entries,
        } => {
            debug!(page_index, entries, "Listing page consumed");
        }
        Event::CheckStarted { key, size_bytes } => {
            debug!(key = %key, size_bytes, "Object check started");
        }
        Event::CheckCompleted { key, verdict } => {
            debug!(key = %key, verdict = ?verdict, "Object check completed");
        }
        Event::SweepCompleted {
            sweep_id,
            total,
            mismatched,
            unreadable,
            partial,
            duration_ms,
        } => {
            info!(
                sweep_id = %sweep_id,
                total,
                mismatched,
                unreadable,
                partial,
                duration_ms,
                "Sweep completed"
            );
        }
        Event::SweepCancelled { checks_completed } => {
            warn!(checks_completed, "Sweep cancelled");
        }
        Event::DebugLog { message } => {
            debug!(message = %message, "Debug log");
        }
        Event::Warning { message } => {
            warn!(message = %message, "Warning");
        }
    }
}

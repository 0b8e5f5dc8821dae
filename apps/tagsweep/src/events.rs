//! Event handling and progress display

use console::style;
use tagsweep_events::Event;
use tagsweep_types::Verdict;

/// Event handler for terminal progress output
pub struct EventHandler {
    debug: bool,
    /// Suppress progress lines entirely (JSON mode)
    quiet: bool,
    checked: u64,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(debug: bool, quiet: bool) -> Self {
        Self {
            debug,
            quiet,
            checked: 0,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: &Event) {
        crate::logging::log_event_with_tracing(event);

        if self.quiet {
            return;
        }

        match event {
            Event::SweepStarted {
                bucket,
                prefix,
                concurrency,
                ..
            } => {
                let scope = prefix
                    .as_deref()
                    .map(|p| format!("{bucket}/{p}"))
                    .unwrap_or_else(|| bucket.clone());
                println!(
                    "Sweeping {} ({} concurrent checks)",
                    style(scope).bold(),
                    concurrency
                );
            }
            Event::CheckCompleted { key, verdict } => {
                self.checked += 1;
                match verdict {
                    Verdict::Mismatch { expected, actual } => {
                        println!(
                            "{} {key}: stored tag {actual}, content digests to {expected}",
                            style("MISMATCH").red().bold()
                        );
                    }
                    Verdict::Unreadable { cause, .. } => {
                        println!("{} {key}: {cause}", style("UNREADABLE").yellow().bold());
                    }
                    Verdict::Consistent => {
                        if self.debug {
                            println!("{} {key}", style("ok").green());
                        }
                    }
                    Verdict::Skipped { reason } => {
                        if self.debug {
                            println!("{} {key}: {reason}", style("skipped").dim());
                        }
                    }
                }
            }
            Event::SweepCancelled { checks_completed } => {
                println!(
                    "{} after {checks_completed} checks; report will be partial",
                    style("Cancelled").yellow().bold()
                );
            }
            Event::Warning { message } => {
                println!("{} {message}", style("warning:").yellow());
            }
            Event::DebugLog { message } => {
                if self.debug {
                    println!("{} {message}", style("debug:").dim());
                }
            }
            Event::PageListed { .. } | Event::CheckStarted { .. } | Event::SweepCompleted { .. } => {}
        }
    }
}

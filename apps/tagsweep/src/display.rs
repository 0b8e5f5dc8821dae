//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::style;
use std::io;
use tagsweep_types::{SweepReport, Verdict};

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render the final sweep report
    pub fn render_report(&self, report: &SweepReport) -> io::Result<()> {
        if self.json_output {
            println!(
                "{}",
                serde_json::to_string_pretty(report).map_err(io::Error::other)?
            );
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Bucket").add_attribute(Attribute::Bold),
            Cell::new("Objects").add_attribute(Attribute::Bold),
            Cell::new("Consistent").add_attribute(Attribute::Bold),
            Cell::new("Mismatched").add_attribute(Attribute::Bold),
            Cell::new("Unreadable").add_attribute(Attribute::Bold),
            Cell::new("Skipped").add_attribute(Attribute::Bold),
            Cell::new("Duration").add_attribute(Attribute::Bold),
        ]);

        let mismatch_cell = if report.mismatched > 0 {
            Cell::new(report.mismatched).fg(Color::Red)
        } else {
            Cell::new(report.mismatched)
        };
        let unreadable_cell = if report.unreadable > 0 {
            Cell::new(report.unreadable).fg(Color::Yellow)
        } else {
            Cell::new(report.unreadable)
        };

        table.add_row(vec![
            Cell::new(&report.bucket),
            Cell::new(report.total),
            Cell::new(report.consistent).fg(Color::Green),
            mismatch_cell,
            unreadable_cell,
            Cell::new(report.skipped),
            Cell::new(format_duration(report.duration_ms)),
        ]);

        println!("{table}");

        if report.partial {
            println!(
                "{}",
                style("Sweep was cancelled; counts cover only completed checks.").yellow()
            );
        }

        if !report.mismatches.is_empty() {
            println!("\n{}", style("Mismatched objects:").red().bold());
            for (key, verdict) in &report.mismatches {
                if let Verdict::Mismatch { expected, actual } = verdict {
                    println!("  {key}\n    stored:   {actual}\n    computed: {expected}");
                }
            }
        }

        if !report.errors.is_empty() {
            println!("\n{}", style("Unreadable objects:").yellow().bold());
            for (key, verdict) in &report.errors {
                if let Verdict::Unreadable { cause, .. } = verdict {
                    println!("  {key}: {cause}");
                }
            }
        }

        if report.is_clean() && !report.partial {
            println!("{}", style("All objects verified clean.").green());
        }

        Ok(())
    }

    /// Render a single-object verdict
    pub fn render_verdict(&self, key: &str, verdict: &Verdict) -> io::Result<()> {
        if self.json_output {
            let value = serde_json::json!({ "key": key, "result": verdict });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).map_err(io::Error::other)?
            );
            return Ok(());
        }

        match verdict {
            Verdict::Consistent => {
                println!("{} {key}", style("CONSISTENT").green().bold());
            }
            Verdict::Mismatch { expected, actual } => {
                println!(
                    "{} {key}\n  stored:   {actual}\n  computed: {expected}",
                    style("MISMATCH").red().bold()
                );
            }
            Verdict::Unreadable { cause, .. } => {
                println!("{} {key}: {cause}", style("UNREADABLE").yellow().bold());
            }
            Verdict::Skipped { reason } => {
                println!("{} {key}: {reason}", style("SKIPPED").dim());
            }
        }

        Ok(())
    }
}

fn format_duration(ms: u64) -> String {
    if ms >= 60_000 {
        format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1000)
    } else if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}

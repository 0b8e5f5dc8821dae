//! Sweep report

use crate::verdict::{Verdict, VerdictKind};
use serde::{Deserialize, Serialize};

/// Aggregate outcome of one complete pass over a bucket.
///
/// `mismatches` and `errors` are ordered by check completion time, not
/// listing order. Invariant: `total` equals the sum of the per-kind counts,
/// with every enumerated object counted exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Bucket that was swept
    pub bucket: String,
    /// Objects enumerated
    pub total: u64,
    /// Objects whose digest matched the stored tag
    pub consistent: u64,
    /// Objects whose digest differed from the stored tag
    pub mismatched: u64,
    /// Objects that could not be read or resolved
    pub unreadable: u64,
    /// Objects excluded by policy
    pub skipped: u64,
    /// Mismatch findings in completion order
    pub mismatches: Vec<(String, Verdict)>,
    /// Unreadable findings in completion order
    pub errors: Vec<(String, Verdict)>,
    /// Set when the sweep was cancelled before enumerating every object
    pub partial: bool,
    /// Wall-clock sweep duration in milliseconds
    pub duration_ms: u64,
}

impl SweepReport {
    /// Count for one verdict kind.
    #[must_use]
    pub fn count(&self, kind: VerdictKind) -> u64 {
        match kind {
            VerdictKind::Consistent => self.consistent,
            VerdictKind::Mismatch => self.mismatched,
            VerdictKind::Unreadable => self.unreadable,
            VerdictKind::Skipped => self.skipped,
        }
    }

    /// Whether every checked object verified clean.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatched == 0 && self.unreadable == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_accounting() {
        let report = SweepReport {
            bucket: "b".into(),
            total: 4,
            consistent: 2,
            mismatched: 1,
            unreadable: 1,
            skipped: 0,
            mismatches: vec![],
            errors: vec![],
            partial: false,
            duration_ms: 10,
        };
        let sum: u64 = [
            VerdictKind::Consistent,
            VerdictKind::Mismatch,
            VerdictKind::Unreadable,
            VerdictKind::Skipped,
        ]
        .iter()
        .map(|k| report.count(*k))
        .sum();
        assert_eq!(sum, report.total);
        assert!(!report.is_clean());
    }
}

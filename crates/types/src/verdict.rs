//! Per-object verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an object could not be read and verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnreadableKind {
    /// Metadata or content retrieval failed after the retry budget
    Transport,
    /// The content stream ended short or errored partway through
    Read,
    /// The multipart layout could not be reconstructed
    Layout,
}

/// Terminal classification of one object check.
///
/// Exactly one verdict is produced per enumerated descriptor; a failed
/// check becomes `Unreadable` rather than an error, so one bad object
/// never unwinds the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Computed digest equals the stored tag
    Consistent,
    /// Computed digest differs from the stored tag: the finding this
    /// tool exists to surface
    Mismatch { expected: String, actual: String },
    /// The object could not be retrieved or its digest could not be derived
    Unreadable { cause: String, kind: UnreadableKind },
    /// Excluded by policy (directory placeholders only)
    Skipped { reason: String },
}

impl Verdict {
    #[must_use]
    pub fn kind(&self) -> VerdictKind {
        match self {
            Self::Consistent => VerdictKind::Consistent,
            Self::Mismatch { .. } => VerdictKind::Mismatch,
            Self::Unreadable { .. } => VerdictKind::Unreadable,
            Self::Skipped { .. } => VerdictKind::Skipped,
        }
    }
}

/// Verdict discriminant, used for report accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Consistent,
    Mismatch,
    Unreadable,
    Skipped,
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Consistent => "consistent",
            Self::Mismatch => "mismatch",
            Self::Unreadable => "unreadable",
            Self::Skipped => "skipped",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_kind_mapping() {
        assert_eq!(Verdict::Consistent.kind(), VerdictKind::Consistent);
        assert_eq!(
            Verdict::Mismatch {
                expected: "aa".into(),
                actual: "bb".into()
            }
            .kind(),
            VerdictKind::Mismatch
        );
        assert_eq!(
            Verdict::Skipped {
                reason: "placeholder".into()
            }
            .kind(),
            VerdictKind::Skipped
        );
    }

    #[test]
    fn test_verdict_serializes_tagged() {
        let v = Verdict::Mismatch {
            expected: "aa".into(),
            actual: "bb".into(),
        };
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"verdict\":\"mismatch\""));
    }
}

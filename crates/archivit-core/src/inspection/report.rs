//! Verification report types.

use std::fmt;
use std::time::Duration;

/// Overall verification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Every entry decoded and matched its integrity record.
    Pass,
    /// Every entry decoded, but some carry no integrity record.
    Warning,
    /// At least one issue was found.
    Fail,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Warning => write!(f, "WARNING"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// What kind of problem an entry has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Stored bytes do not match the integrity record.
    IntegrityMismatch,
    /// Decoded content length differs from the declared size.
    SizeMismatch,
    /// The stored path would escape the extraction root.
    UnsafePath,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntegrityMismatch => write!(f, "integrity"),
            Self::SizeMismatch => write!(f, "size"),
            Self::UnsafePath => write!(f, "path"),
        }
    }
}

/// One problem found in an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationIssue {
    /// Stored path of the entry.
    pub path: String,
    /// Problem kind.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
}

/// Result of checking every entry of an archive.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    /// Overall status.
    pub status: VerificationStatus,
    /// Number of entries read.
    pub total_entries: usize,
    /// Entries checked against an integrity record.
    pub entries_verified: usize,
    /// Entries without an integrity record.
    pub entries_unchecked: usize,
    /// Sum of original sizes.
    pub total_size: u64,
    /// Problems found, in archive order.
    pub issues: Vec<VerificationIssue>,
    /// Duration of the check.
    pub duration: Duration,
}

impl VerificationReport {
    /// Creates an empty, passing report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: VerificationStatus::Pass,
            total_entries: 0,
            entries_verified: 0,
            entries_unchecked: 0,
            total_size: 0,
            issues: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Returns `true` if no issue was found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub(crate) fn add_issue(&mut self, path: &str, kind: IssueKind, message: String) {
        self.issues.push(VerificationIssue {
            path: path.to_string(),
            kind,
            message,
        });
    }

    pub(crate) fn finish(&mut self, duration: Duration) {
        self.duration = duration;
        self.status = if !self.issues.is_empty() {
            VerificationStatus::Fail
        } else if self.entries_unchecked > 0 {
            VerificationStatus::Warning
        } else {
            VerificationStatus::Pass
        };
    }
}

impl Default for VerificationReport {
    fn default() -> Self {
        Self::new()
    }
}

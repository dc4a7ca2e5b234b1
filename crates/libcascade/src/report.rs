use std::{fmt, fs, path::Path};

use tracing::warn;

use crate::{
    error::{CascadeError, Result},
    graph::BranchName,
};

/// Default location of the failure report, relative to the repository root.
pub const DEFAULT_REPORT_FILE: &str = "merge_report.txt";

/// First line of every failure report.
const REPORT_HEADER: &str = "The following merge conflicts or errors occurred:";

/// Why a parent → child edge failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The parent could not be merged into the child cleanly.
    MergeConflict,
    /// The merged child could not be published to the remote.
    PushFailed,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MergeConflict => write!(f, "merge conflict"),
            Self::PushFailed => write!(f, "push failed"),
        }
    }
}

/// A single failed edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Branch that was being merged.
    pub parent: BranchName,
    /// Branch that was being merged into.
    pub child: BranchName,
    /// What went wrong.
    pub reason: FailureReason,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            FailureReason::MergeConflict => write!(
                f,
                "Merge conflict merging {} into {}.",
                self.parent, self.child
            ),
            FailureReason::PushFailed => write!(
                f,
                "Failed to push {} after merging {}.",
                self.child, self.parent
            ),
        }
    }
}

/// Accumulates edge failures over a run and turns them into the run's verdict.
#[derive(Debug, Default)]
pub struct Reporter {
    /// Failures in the order they were recorded.
    failures: Vec<Failure>,
}

impl Reporter {
    /// Create a reporter with no failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the `parent` → `child` edge failed for `reason`.
    pub fn record(&mut self, parent: &str, child: &str, reason: FailureReason) {
        warn!(%parent, %child, %reason, "edge failed");
        self.failures.push(Failure {
            parent: parent.to_string(),
            child: child.to_string(),
            reason,
        });
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// True when nothing has failed.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Render the failure report: a header, a blank line, then one bullet per failure.
    pub fn render(&self) -> String {
        let mut report = format!("{REPORT_HEADER}\n\n");
        for failure in &self.failures {
            report.push_str(&format!("- {failure}\n"));
        }
        report
    }

    /// Conclude the run.
    ///
    /// With no failures this succeeds and writes nothing. Otherwise the report
    /// is written to `path` and [`CascadeError::EdgesFailed`] is returned so the
    /// process exits non-zero.
    pub fn finalize(self, path: &Path) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }

        fs::write(path, self.render())?;
        Err(CascadeError::EdgesFailed {
            count: self.failures.len(),
            report: path.to_path_buf(),
        })
    }
}

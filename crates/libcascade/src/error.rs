use std::{io, path::PathBuf, result::Result as StdResult};
use thiserror::Error;

/// Custom Result type for cascade operations.
pub type Result<T> = StdResult<T, CascadeError>;

/// Cascade-specific error types
#[derive(Error, Debug)]
pub enum CascadeError {
    /// The branch to start the cascade from could not be determined.
    #[error("Could not determine current branch")]
    BranchUnresolved,

    /// One or more parent/child edges failed to merge or push.
    #[error("{count} cascade merge(s) failed; see {}", report.display())]
    EdgesFailed {
        /// Number of recorded failures.
        count: usize,
        /// Path of the failure report that was written.
        report: PathBuf,
    },

    /// The branch configuration file does not exist; there is nothing to do.
    #[error("Config file {} not found", path.display())]
    ConfigMissing {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The branch configuration could not be read or has the wrong shape.
    #[error("Invalid branch configuration {}: {message}", path.display())]
    Config {
        /// Path of the offending configuration file.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// Another cascade run holds the repository lock.
    #[error("Another cascade run holds the repository lock: {}", path.display())]
    Locked {
        /// Path of the lock file.
        path: PathBuf,
    },

    /// An underlying I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl CascadeError {
    /// Return the recommended process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigMissing { .. } => 0,
            Self::Config { .. } => 2,
            Self::Locked { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_failed_names_report() {
        let err = CascadeError::EdgesFailed {
            count: 2,
            report: PathBuf::from("merge_report.txt"),
        };
        assert_eq!(
            err.to_string(),
            "2 cascade merge(s) failed; see merge_report.txt"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(CascadeError::BranchUnresolved.exit_code(), 1);
        let locked = CascadeError::Locked {
            path: PathBuf::from(".git/cascade.lock"),
        };
        assert_eq!(locked.exit_code(), 2);
        let invalid = CascadeError::Config {
            path: PathBuf::from("branch-config.json"),
            message: "invalid branch name \"-f\"".to_string(),
        };
        assert_eq!(invalid.exit_code(), 2);
        let missing = CascadeError::ConfigMissing {
            path: PathBuf::from("branch-config.json"),
        };
        assert_eq!(missing.exit_code(), 0);
    }
}

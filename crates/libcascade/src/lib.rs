#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Core library for cascading merges through a graph of git branches.
//!
//! Given a parent → children mapping of branches, a cascade merges the
//! starting branch into each of its children, pushes them, and continues
//! breadth-first from every child that succeeded. Failed edges are collected
//! into a report instead of stopping the run. The CLI binary in
//! `crates/cascade` builds on top of this library.

/// Breadth-first traversal that merges parents into children.
mod cascade;
/// Error and result types.
mod error;
/// Git command execution and the repository operations built on it.
mod git;
/// Branch graph model and configuration loading.
mod graph;
/// Advisory lock serialising runs on one working copy.
mod lock;
/// Output channel abstractions and implementations.
mod output;
/// Failure accumulation and the failure report.
mod report;
/// End-to-end wiring of a single cascade invocation.
mod run;

pub use cascade::{Cascade, CascadeSummary, Edge, MergeOutcome, resolve_start_branch};
pub use error::{CascadeError, Result};
pub use git::{CommandOutput, Executor, GitExecutor, Identity, Repository, find_root, git_dir};
pub use graph::{BranchGraph, BranchName, ConfigFormat, DEFAULT_CONFIG_FILE, load};
pub use lock::{LOCK_FILE_NAME, RepoLock};
pub use output::{Output, OutputError, Quiet, Terminal};
pub use report::{DEFAULT_REPORT_FILE, Failure, FailureReason, Reporter};
pub use run::{DEFAULT_REMOTE, RunOptions, run};

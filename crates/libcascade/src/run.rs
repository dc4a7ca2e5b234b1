use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    cascade::{Cascade, CascadeSummary, resolve_start_branch},
    git::{self, GitExecutor, Identity, Repository},
    graph::{self, DEFAULT_CONFIG_FILE},
    lock::RepoLock,
    output::Output,
    report::{DEFAULT_REPORT_FILE, Reporter},
};

/// Default remote branches are fetched from and pushed to.
pub const DEFAULT_REMOTE: &str = "origin";

/// Everything a single cascade invocation needs to know.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Working copy to operate on.
    pub repo_dir: PathBuf,
    /// Branch configuration file.
    pub config_path: PathBuf,
    /// Where the failure report is written.
    pub report_path: PathBuf,
    /// Remote to synchronise with.
    pub remote: String,
    /// Branch to start from, overriding detection.
    pub start_branch: Option<String>,
    /// Ref supplied by the CI environment, e.g. `refs/heads/main`.
    pub github_ref: Option<String>,
    /// Committer identity to configure before merging.
    pub identity: Option<Identity>,
}

impl RunOptions {
    /// Options with default file names inside `repo_dir`.
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        let repo_dir = repo_dir.into();
        Self {
            config_path: repo_dir.join(DEFAULT_CONFIG_FILE),
            report_path: repo_dir.join(DEFAULT_REPORT_FILE),
            repo_dir,
            remote: DEFAULT_REMOTE.to_string(),
            start_branch: None,
            github_ref: None,
            identity: None,
        }
    }
}

/// Run one cascade from start to finish.
///
/// Returns the traversal summary when every attempted edge succeeded. Errors
/// carry a [`crate::CascadeError`] where the outcome has a defined exit code:
/// a missing configuration, an unresolved start branch, a held lock, or
/// failed edges (after the report has been written).
pub fn run(options: &RunOptions, output: &dyn Output) -> Result<CascadeSummary> {
    let graph = graph::load(&options.config_path)?;

    let mut repo = Repository::new(GitExecutor::new(&options.repo_dir), &options.remote);
    let start = resolve_start_branch(
        options.start_branch.as_deref(),
        options.github_ref.as_deref(),
        &mut repo,
    )?;
    output.message(&format!("Current branch: {start}"))?;

    let git_dir = git::git_dir(&options.repo_dir).with_context(|| {
        format!(
            "Failed to locate git directory for {}",
            options.repo_dir.display()
        )
    })?;
    let _lock = RepoLock::acquire(&git_dir)?;

    if let Some(identity) = &options.identity {
        let result = repo.set_identity(identity);
        if !result.success {
            output.warn(&format!(
                "Could not configure git identity: {}",
                result.output
            ))?;
        }
    }

    let mut reporter = Reporter::new();
    let summary = Cascade::new(&graph, &mut repo, output).run(&start, &mut reporter);
    info!(
        visited = summary.visited.len(),
        merged = summary.merged.len(),
        skipped = summary.unavailable.len(),
        failed = reporter.failures().len(),
        "cascade finished"
    );

    render_summary(output, &summary, &reporter)?;
    reporter.finalize(&options.report_path)?;
    Ok(summary)
}

/// Print what the traversal did, followed by any failures.
fn render_summary(
    output: &dyn Output,
    summary: &CascadeSummary,
    reporter: &Reporter,
) -> Result<()> {
    if !summary.unavailable.is_empty() {
        let section = output.section("Skipped (branch unavailable):");
        for edge in &summary.unavailable {
            section.warn(&format!("{} -> {}", edge.parent, edge.child))?;
        }
    }

    if reporter.is_empty() {
        output.success(&format!(
            "Cascade complete: {} merge(s) pushed.",
            summary.merged.len()
        ))?;
        return Ok(());
    }

    let section = output.section("=== Merge Errors Summary ===");
    for failure in reporter.failures() {
        section.fail(&failure.to_string())?;
    }
    Ok(())
}

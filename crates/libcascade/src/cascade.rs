//! Breadth-first propagation of merges through a [`BranchGraph`].
//!
//! Starting from one branch, every parent → child edge is attempted in
//! breadth-first order: the child is synchronised with the remote, the parent
//! is merged into it, and the result is pushed. A child that was merged and
//! pushed becomes a parent for the next round. Failures only skip the
//! affected edge; they are handed to the [`Reporter`] and the walk goes on.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::{
    error::{CascadeError, Result},
    git::{Executor, Repository},
    graph::{BranchGraph, BranchName},
    output::{self, Output},
    report::{FailureReason, Reporter},
};

/// Ref prefix identifying a branch in `GITHUB_REF`.
const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Result of attempting a single parent → child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The parent was merged into the child and the child was pushed.
    MergedAndPushed,
    /// The merge did not apply cleanly and was aborted.
    MergeConflict,
    /// The child could not be checked out or updated from the remote.
    ChildUnavailable,
    /// The merge succeeded locally but the push was rejected.
    PushFailed,
}

/// A parent → child relationship that was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Branch merged from.
    pub parent: BranchName,
    /// Branch merged into.
    pub child: BranchName,
}

impl Edge {
    /// Build an edge from borrowed names.
    fn new(parent: &str, child: &str) -> Self {
        Self {
            parent: parent.to_string(),
            child: child.to_string(),
        }
    }
}

/// What a completed traversal did. Failures live in the [`Reporter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    /// Branches expanded as parents, in the order they were dequeued.
    pub visited: Vec<BranchName>,
    /// Edges merged and pushed.
    pub merged: Vec<Edge>,
    /// Edges skipped because the child could not be checked out or updated.
    pub unavailable: Vec<Edge>,
}

/// Walks a branch graph breadth-first, merging each parent into its children.
pub struct Cascade<'a, E> {
    /// Relationships to follow.
    graph: &'a BranchGraph,
    /// Working copy all merges happen in.
    repo: &'a mut Repository<E>,
    /// Progress stream.
    output: &'a dyn Output,
}

impl<'a, E: Executor> Cascade<'a, E> {
    /// Create a cascade over `graph` operating on `repo`.
    pub fn new(
        graph: &'a BranchGraph,
        repo: &'a mut Repository<E>,
        output: &'a dyn Output,
    ) -> Self {
        Self {
            graph,
            repo,
            output,
        }
    }

    /// Propagate `start` through the graph, recording failed edges in `reporter`.
    ///
    /// Each branch is expanded at most once per run, which keeps cyclic and
    /// diamond-shaped graphs from looping or repeating work. Children are
    /// handled strictly in their declared order.
    pub fn run(&mut self, start: &str, reporter: &mut Reporter) -> CascadeSummary {
        let graph = self.graph;
        let mut queue: VecDeque<BranchName> = VecDeque::from([start.to_string()]);
        let mut visited: HashSet<BranchName> = HashSet::new();
        let mut summary = CascadeSummary::default();

        while let Some(parent) = queue.pop_front() {
            if !visited.insert(parent.clone()) {
                debug!(branch = %parent, "already visited");
                continue;
            }
            summary.visited.push(parent.clone());

            let children = graph.children(&parent);
            if children.is_empty() {
                continue;
            }

            let section = self.output.section(&format!(
                "Processing children of {parent}: {}",
                children.join(", ")
            ));

            for child in children {
                let edge = Edge::new(&parent, child);
                match self.propagate(&parent, child, section.as_ref()) {
                    MergeOutcome::MergedAndPushed => {
                        queue.push_back(child.clone());
                        summary.merged.push(edge);
                    }
                    MergeOutcome::ChildUnavailable => summary.unavailable.push(edge),
                    MergeOutcome::MergeConflict => {
                        reporter.record(&parent, child, FailureReason::MergeConflict);
                    }
                    MergeOutcome::PushFailed => {
                        reporter.record(&parent, child, FailureReason::PushFailed);
                    }
                }
            }
        }

        summary
    }

    /// Merge `parent` into `child` and publish the result.
    ///
    /// `parent` must already be up to date locally: it is either the starting
    /// branch or a child merged and pushed earlier in this run.
    pub fn propagate(&mut self, parent: &str, child: &str, out: &dyn Output) -> MergeOutcome {
        emit(out.message(&format!("Attempting to merge {parent} into {child}...")));

        let remote = self.repo.remote().to_string();
        if !self.repo.fetch(child).success {
            warn!(branch = %child, %remote, "fetch failed");
        }

        if let Err(outcome) = self.checkout_child(parent, child, &remote, out) {
            return outcome;
        }

        if !self.repo.merge(parent).success {
            emit(out.fail(&format!(
                "Merge conflict or error merging {parent} into {child}. \
                 Aborting merge and skipping this path."
            )));
            self.abort_merge(out);
            return MergeOutcome::MergeConflict;
        }

        if !self.repo.push(child).success {
            emit(out.fail(&format!(
                "Failed to push {child}. Skipping cascade for this path."
            )));
            return MergeOutcome::PushFailed;
        }

        emit(out.success(&format!(
            "Successfully merged {parent} into {child} and pushed."
        )));
        MergeOutcome::MergedAndPushed
    }

    /// Make `child` the current branch, synchronised with the remote.
    ///
    /// A pull that stops on a conflict is aborted and reported as a merge
    /// conflict on the edge; every other failure leaves the child unavailable.
    fn checkout_child(
        &mut self,
        parent: &str,
        child: &str,
        remote: &str,
        out: &dyn Output,
    ) -> std::result::Result<(), MergeOutcome> {
        if !self.repo.branch_exists_locally(child).success {
            if !self.repo.checkout_tracking_remote(child).success {
                emit(out.warn(&format!(
                    "Branch {child} does not exist on {remote}. Skipping."
                )));
                return Err(MergeOutcome::ChildUnavailable);
            }
            return Ok(());
        }

        if !self.repo.checkout(child).success {
            emit(out.warn(&format!("Could not check out {child}. Skipping.")));
            return Err(MergeOutcome::ChildUnavailable);
        }

        if !self.repo.pull(child).success {
            // Only a conflicting pull leaves a merge to abort.
            if self.repo.abort_merge().success {
                emit(out.fail(&format!(
                    "Merge conflict updating {child} from {remote}. \
                     Aborting merge and skipping {parent} -> {child}."
                )));
                return Err(MergeOutcome::MergeConflict);
            }
            debug!(branch = %child, "no merge to abort after failed pull");
            emit(out.warn(&format!(
                "Could not update {child} from {remote}. Skipping."
            )));
            return Err(MergeOutcome::ChildUnavailable);
        }
        Ok(())
    }

    /// Roll back an in-progress merge so the next checkout starts clean.
    fn abort_merge(&mut self, out: &dyn Output) {
        let result = self.repo.abort_merge();
        if !result.success {
            warn!(output = %result.output, "merge abort failed");
            emit(out.warn("Could not abort merge; working copy may be dirty."));
        }
    }
}

/// Write a progress line, logging rather than failing when the output is gone.
fn emit(result: output::Result<()>) {
    if let Err(err) = result {
        warn!(error = %err, "failed to write progress output");
    }
}

/// Determine the branch a cascade starts from.
///
/// An explicit name wins, then a `refs/heads/<name>` ref from the CI
/// environment, then the branch checked out in `repo`. A detached HEAD counts
/// as unresolved.
pub fn resolve_start_branch<E: Executor>(
    explicit: Option<&str>,
    github_ref: Option<&str>,
    repo: &mut Repository<E>,
) -> Result<BranchName> {
    if let Some(name) = explicit.map(str::trim).filter(|name| !name.is_empty()) {
        return Ok(name.to_string());
    }

    if let Some(name) = github_ref
        .and_then(|r| r.strip_prefix(BRANCH_REF_PREFIX))
        .filter(|name| !name.is_empty())
    {
        return Ok(name.to_string());
    }

    repo.current_branch().ok_or(CascadeError::BranchUnresolved)
}

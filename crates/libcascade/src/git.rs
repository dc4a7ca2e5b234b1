use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info, warn};

/// Outcome of a single git invocation: whether it succeeded and what it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// True iff the command exited with a success status.
    pub success: bool,
    /// Captured stdout followed by stderr, trimmed.
    pub output: String,
}

impl CommandOutput {
    /// A successful result carrying `output`.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    /// A failed result carrying `output`.
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Runs git commands against a single working copy.
///
/// An executor owns the working copy: the checked-out branch, the index and
/// the remote-tracking refs only change through calls to [`Executor::run`].
/// Failures are returned as data and never raised.
pub trait Executor {
    /// Run `git <args>` to completion.
    fn run(&mut self, args: &[&str]) -> CommandOutput;
}

/// Executor that spawns the `git` binary inside a repository directory.
#[derive(Debug, Clone)]
pub struct GitExecutor {
    /// Working copy the commands run in.
    repo_path: PathBuf,
}

impl GitExecutor {
    /// Create an executor operating on the repository at `repo_path`.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }
}

impl Executor for GitExecutor {
    fn run(&mut self, args: &[&str]) -> CommandOutput {
        let command = format!("git {}", args.join(" "));
        info!(%command, "running");

        let result = Command::new("git")
            .current_dir(&self.repo_path)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_MERGE_AUTOEDIT", "no")
            .stdin(Stdio::null())
            .output();

        match result {
            Ok(out) => {
                let captured = combined_output(&out);
                if out.status.success() {
                    debug!(%command, output = %captured, "succeeded");
                    CommandOutput::ok(captured)
                } else {
                    warn!(%command, status = %out.status, output = %captured, "failed");
                    CommandOutput::failed(captured)
                }
            }
            Err(err) => {
                warn!(%command, error = %err, "could not execute");
                CommandOutput::failed(format!("Failed to execute {command}: {err}"))
            }
        }
    }
}

/// Join stdout and stderr of a finished process into one trimmed string.
fn combined_output(out: &Output) -> String {
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    match (stdout.trim(), stderr.trim()) {
        ("", err) => err.to_string(),
        (std, "") => std.to_string(),
        (std, err) => format!("{std}\n{err}"),
    }
}

/// Name and email recorded on merge commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Committer name.
    pub name: String,
    /// Committer email.
    pub email: String,
}

impl Identity {
    /// Identity used by GitHub Actions bot commits.
    pub fn github_actions() -> Self {
        Self {
            name: "github-actions[bot]".to_string(),
            email: "github-actions[bot]@users.noreply.github.com".to_string(),
        }
    }
}

/// The version-control operations a cascade needs, expressed as executor calls.
pub struct Repository<E> {
    /// Executor owning the working copy.
    executor: E,
    /// Remote that branches are fetched from and pushed to.
    remote: String,
}

impl<E: Executor> Repository<E> {
    /// Wrap `executor`, synchronising branches with `remote`.
    pub fn new(executor: E, remote: impl Into<String>) -> Self {
        Self {
            executor,
            remote: remote.into(),
        }
    }

    /// Name of the remote this repository synchronises with.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Release the underlying executor.
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Update remote knowledge of `branch`.
    pub fn fetch(&mut self, branch: &str) -> CommandOutput {
        let remote = self.remote.clone();
        self.executor.run(&["fetch", &remote, branch])
    }

    /// Succeeds iff a local branch named `branch` exists.
    pub fn branch_exists_locally(&mut self, branch: &str) -> CommandOutput {
        let refname = format!("refs/heads/{branch}");
        self.executor
            .run(&["show-ref", "--verify", "--quiet", &refname])
    }

    /// Make the existing local `branch` current.
    pub fn checkout(&mut self, branch: &str) -> CommandOutput {
        self.executor.run(&["checkout", branch])
    }

    /// Create a local `branch` tracking its remote counterpart and make it current.
    pub fn checkout_tracking_remote(&mut self, branch: &str) -> CommandOutput {
        let upstream = format!("{}/{branch}", self.remote);
        self.executor.run(&["checkout", "-b", branch, &upstream])
    }

    /// Bring the current branch up to date with the remote `branch`.
    pub fn pull(&mut self, branch: &str) -> CommandOutput {
        let remote = self.remote.clone();
        self.executor
            .run(&["pull", "--no-rebase", "--no-edit", &remote, branch])
    }

    /// Merge `source` into the current branch.
    pub fn merge(&mut self, source: &str) -> CommandOutput {
        self.executor.run(&["merge", "--no-edit", source])
    }

    /// Abandon an in-progress merge, restoring the pre-merge state.
    pub fn abort_merge(&mut self) -> CommandOutput {
        self.executor.run(&["merge", "--abort"])
    }

    /// Publish the local `branch` to the remote.
    pub fn push(&mut self, branch: &str) -> CommandOutput {
        let remote = self.remote.clone();
        self.executor.run(&["push", &remote, branch])
    }

    /// Name of the checked-out branch, or `None` when detached or unknown.
    pub fn current_branch(&mut self) -> Option<String> {
        let result = self.executor.run(&["rev-parse", "--abbrev-ref", "HEAD"]);
        if !result.success {
            return None;
        }
        let name = result.output.lines().next().unwrap_or_default().trim();
        if name.is_empty() || name == "HEAD" {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// Record `identity` in the repository-local git config.
    pub fn set_identity(&mut self, identity: &Identity) -> CommandOutput {
        let name = self.executor.run(&["config", "user.name", &identity.name]);
        if !name.success {
            return name;
        }
        self.executor
            .run(&["config", "user.email", &identity.email])
    }
}

/// Run a git command with the given arguments in the specified directory.
/// Returns the output if successful, otherwise returns an error with the full command details.
fn run_git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute git command: git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let command = format!("git {}", args.join(" "));
        anyhow::bail!("Git command failed: {}\nError: {}", command, stderr.trim());
    }

    Ok(output)
}

/// Walk up from `start_dir` to find the nearest repository root containing a `.git` entry.
pub fn find_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Absolute path of the git directory for the repository at `repo_path`.
pub fn git_dir(repo_path: &Path) -> Result<PathBuf> {
    let output = run_git(repo_path, &["rev-parse", "--absolute-git-dir"])?;
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    anyhow::ensure!(!path.is_empty(), "git did not report a git directory");
    Ok(PathBuf::from(path))
}

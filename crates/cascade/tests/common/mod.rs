#![allow(dead_code)]

use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Return the path to the compiled `cascade` binary for integration-style tests.
pub fn cascade_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cascade"))
}

/// Run a git command inside `repo_path`, ensuring it succeeds.
pub fn git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    ensure!(
        output.status.success(),
        "git command failed: git {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(output)
}

/// Run a git command and return its trimmed stdout.
pub fn git_stdout(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = git(repo_path, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Configure a commit identity for tests.
fn configure_user(repo_path: &Path) -> Result<()> {
    git(repo_path, &["config", "user.email", "test@example.com"])?;
    git(repo_path, &["config", "user.name", "Test User"])?;
    Ok(())
}

/// Write `contents` to `file` in `repo_path` and commit it on the current branch.
pub fn commit_file(repo_path: &Path, file: &str, contents: &str, message: &str) -> Result<()> {
    fs::write(repo_path.join(file), contents)?;
    git(repo_path, &["add", file])?;
    git(repo_path, &["commit", "-m", message])?;
    Ok(())
}

/// A bare remote, a seeding clone for preparing remote state, and a working clone.
pub struct TestEnv {
    /// Keeps the directories alive.
    _temp_dir: TempDir,
    /// Bare repository acting as `origin`.
    pub remote: PathBuf,
    /// Clone used to push setup commits to the remote.
    pub seed: PathBuf,
    /// Clone the cascade runs in.
    pub work: PathBuf,
}

impl TestEnv {
    /// Create a remote whose `main` holds a README, plus each of `branches` cut from it.
    pub fn new(branches: &[&str]) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let remote = temp_dir.path().join("origin.git");
        let seed = temp_dir.path().join("seed");
        let work = temp_dir.path().join("work");

        git(
            temp_dir.path(),
            &["init", "--bare", "-b", "main", remote.to_str().unwrap()],
        )?;

        fs::create_dir_all(&seed)?;
        git(&seed, &["init", "-b", "main"])?;
        configure_user(&seed)?;
        git(&seed, &["remote", "add", "origin", remote.to_str().unwrap()])?;
        commit_file(&seed, "README.md", "# Test Project\n", "Initial commit")?;
        git(&seed, &["push", "origin", "main"])?;
        for branch in branches {
            git(&seed, &["push", "origin", &format!("main:{branch}")])?;
        }

        git(
            temp_dir.path(),
            &["clone", remote.to_str().unwrap(), work.to_str().unwrap()],
        )?;
        configure_user(&work)?;

        Ok(Self {
            _temp_dir: temp_dir,
            remote,
            seed,
            work,
        })
    }

    /// Commit a file on `branch` in the seed clone and push it to the remote.
    pub fn push_commit(&self, branch: &str, file: &str, contents: &str) -> Result<()> {
        git(&self.seed, &["fetch", "origin"])?;
        git(
            &self.seed,
            &["checkout", "-B", branch, &format!("origin/{branch}")],
        )?;
        commit_file(&self.seed, file, contents, &format!("Update {file} on {branch}"))?;
        git(&self.seed, &["push", "origin", branch])?;
        Ok(())
    }

    /// Write the JSON branch configuration into the working clone.
    pub fn write_config(&self, json: &str) -> Result<()> {
        fs::write(self.work.join("branch-config.json"), json)?;
        Ok(())
    }

    /// Whether `file` exists on `branch` in the remote.
    pub fn remote_has_file(&self, branch: &str, file: &str) -> bool {
        git(&self.remote, &["cat-file", "-e", &format!("{branch}:{file}")]).is_ok()
    }

    /// Path of the failure report in the working clone.
    pub fn report_path(&self) -> PathBuf {
        self.work.join("merge_report.txt")
    }

    /// Prepare a `cascade` command in the working clone with CI variables cleared.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(cascade_binary());
        cmd.current_dir(&self.work);
        cmd.env_remove("GITHUB_REF");
        cmd.env_remove("GITHUB_ACTIONS");
        cmd.arg("--no-color");
        cmd
    }

    /// Run `cascade` with the provided arguments, returning the command output.
    pub fn run(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = self.command();
        cmd.args(args);
        cmd.output()
            .with_context(|| format!("failed to run cascade {}", args.join(" ")))
    }
}

/// Render a process output for assertion messages.
pub fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

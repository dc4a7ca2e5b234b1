#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Command-line interface that cascades merges through a branch graph via the libcascade crate.

/// Command-line argument definitions.
mod args;

use std::{
    env,
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use libcascade::{CascadeError, Identity, Output, Quiet, RunOptions, Terminal};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Cli;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "cascade=info,libcascade=info";

/// Install the stderr tracing subscriber.
fn init_tracing(color: bool) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(color)
                .with_target(false),
        )
        .init();
}

/// Resolve `path` against `base` unless it is already absolute.
fn resolve_in(base: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Pick the committer identity: explicit flags, else the Actions bot inside GitHub Actions.
fn identity(cli: &Cli) -> Option<Identity> {
    if let (Some(name), Some(email)) = (&cli.author_name, &cli.author_email) {
        return Some(Identity {
            name: name.clone(),
            email: email.clone(),
        });
    }
    if env::var("GITHUB_ACTIONS").is_ok_and(|value| value == "true") {
        return Some(Identity::github_actions());
    }
    None
}

/// Translate parsed arguments and the environment into run options.
fn run_options(cli: &Cli) -> Result<RunOptions> {
    let repo_dir = match &cli.repo_dir {
        Some(dir) => PathBuf::from(dir),
        None => {
            let cwd = env::current_dir()?;
            libcascade::find_root(&cwd).unwrap_or(cwd)
        }
    };

    let mut options = RunOptions::new(&repo_dir);
    if let Some(config) = &cli.config {
        options.config_path = resolve_in(&repo_dir, config);
    }
    if let Some(report) = &cli.report {
        options.report_path = resolve_in(&repo_dir, report);
    }
    options.remote = cli.remote.clone();
    options.start_branch = cli.branch.clone();
    options.github_ref = env::var("GITHUB_REF").ok();
    options.identity = identity(cli);
    Ok(options)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine color output preference early for error handling
    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        // Auto-detect based on terminal
        io::stdout().is_terminal()
    };
    init_tracing(color && io::stderr().is_terminal());

    let output: Arc<dyn Output> = if cli.quiet {
        Arc::new(Quiet)
    } else {
        Arc::new(Terminal::new(color))
    };

    if let Err(e) = run(&cli, output.as_ref()) {
        // Reset any existing colors only if color was enabled and stdout is a TTY
        if color && io::stdout().is_terminal() {
            print!("\x1b[0m");
            if let Err(flush_err) = io::stdout().flush() {
                eprintln!("Failed to flush stdout while resetting colors: {flush_err}");
            }
        }

        let exit_code = match e.downcast_ref::<CascadeError>() {
            Some(err @ CascadeError::ConfigMissing { .. }) => {
                if let Err(display_err) = output.message(&format!("{err}. Nothing to do.")) {
                    eprintln!("Failed to report status via output handler: {display_err:#}");
                }
                err.exit_code()
            }
            Some(err) => {
                if let Err(display_err) = output.fail(&format!("{e:#}")) {
                    eprintln!("Failed to report error via output handler: {display_err:#}");
                }
                err.exit_code()
            }
            None => {
                if let Err(display_err) = output.fail(&format!("{e:#}")) {
                    eprintln!("Failed to report error via output handler: {display_err:#}");
                }
                1
            }
        };

        if let Err(finish_err) = output.finish() {
            eprintln!("Failed to flush output handler: {finish_err:#}");
        }
        process::exit(exit_code);
    }
    Ok(())
}

/// Execute one cascade using the provided output implementation.
fn run(cli: &Cli, output: &dyn Output) -> Result<()> {
    let options = run_options(cli)?;
    tracing::debug!(?options, "starting cascade");
    libcascade::run(&options, output)?;
    output.finish()?;
    Ok(())
}

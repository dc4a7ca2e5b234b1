use clap::{ArgGroup, Parser};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("color_mode")
        .args(["color", "no_color"])
))]
/// Top-level CLI options for cascade.
pub struct Cli {
    /// Branch configuration file (relative paths resolve against the repository)
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Override the repository directory (defaults to current git project)
    #[arg(long, value_name = "DIR")]
    pub repo_dir: Option<String>,

    /// Branch to cascade from (defaults to GITHUB_REF, then the checked-out branch)
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Remote to fetch from and push to
    #[arg(long, value_name = "NAME", default_value = libcascade::DEFAULT_REMOTE)]
    pub remote: String,

    /// Where to write the failure report (relative paths resolve against the repository)
    #[arg(long, value_name = "FILE")]
    pub report: Option<String>,

    /// Committer name for merge commits
    #[arg(long, value_name = "NAME", requires = "author_email")]
    pub author_name: Option<String>,

    /// Committer email for merge commits
    #[arg(long, value_name = "EMAIL", requires = "author_name")]
    pub author_email: Option<String>,

    /// Enable colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Suppress all output
    #[arg(long)]
    pub quiet: bool,
}

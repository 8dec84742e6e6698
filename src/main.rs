mod config;
mod github;
mod pr;
mod report;

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Need to specify --owner and --name, or --repository, \
and at least one --branch. Usage: pr-reporter -r owner/name -b main [-b develop]";

/// PR Reporter — CLI tool that collects the pull requests merged into one or
/// more branches of a GitHub repository, with their commits and comments,
/// into an xlsx workbook with one sheet per branch.
#[derive(Parser, Debug)]
#[command(name = "pr-reporter", version, about)]
struct Cli {
    /// Owner of the repository (used with --name)
    #[arg(short, long)]
    owner: Option<String>,

    /// Name of the repository (used with --owner)
    #[arg(short, long)]
    name: Option<String>,

    /// Repository as owner/name
    #[arg(short, long, conflicts_with_all = ["owner", "name"])]
    repository: Option<String>,

    /// Branch to report on; repeat for several branches
    #[arg(short = 'b', long = "branch", visible_alias = "branch-name")]
    branches: Vec<String>,

    /// Credential file with `login` and `oauth_token`
    /// (defaults to config/github.toml)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Workbook path (defaults to pull_request_report_for_{owner}_{name}.xlsx)
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    /// Repository named on the command line, either combined or as parts.
    fn repository(&self) -> Result<github::Repository, Box<dyn std::error::Error>> {
        match (&self.repository, &self.owner, &self.name) {
            (Some(combined), _, _) => Ok(github::parse_repository(combined)?),
            (None, Some(owner), Some(name)) => github::repository_from_parts(owner, name)
                .ok_or_else(|| format!("Invalid repository: {owner}/{name}").into()),
            _ => Err(USAGE.into()),
        }
    }

    fn validate(&self) -> Result<github::Repository, Box<dyn std::error::Error>> {
        let repository = self.repository()?;
        if self.branches.iter().all(|b| b.trim().is_empty()) {
            return Err(USAGE.into());
        }
        Ok(repository)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let repository = cli.validate()?;

    let _main_span = info_span!("pr_report", repository = %repository).entered();

    info!("loading configuration");
    let config = config::Config::load(cli.credentials.as_deref())?;
    let credentials = config.resolve_credentials()?;
    debug!(
        login = credentials.login.as_deref().unwrap_or("<token only>"),
        api_url = config.api_url(),
        "resolved credentials"
    );
    let client = github::GitHubClient::new(&config, &credentials)?;

    let mut reporter = report::Reporter::new(Arc::new(client), repository);
    for branch in cli.branches.iter().filter(|b| !b.trim().is_empty()) {
        reporter.scan(branch.trim()).await?;
    }
    info!(branches = ?reporter.branches(), "scan complete");

    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(reporter.default_file_name()));
    let mut book = report::ReportBook::new(&path);
    let summaries = reporter.export(&mut book, Utc::now()).await?;
    book.close()?;

    report::print_summary(&path, &summaries);
    info!(path = %path.display(), "done");

    Ok(())
}

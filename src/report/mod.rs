pub mod book;
pub mod types;

pub use book::ReportBook;
pub use types::{Cell, RowStyle};

use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::github::{GitHubApi, GitHubError, PullState, Repository};
use crate::pr::{by_creation, Comment, PullRequest};

pub const NOT_MERGED: &str = "Not yet merged";
pub const NOT_CLOSED: &str = "Not closed or merged";
pub const NO_COMMENTS: &str = "No Comments on Pull Request";

const COMMENT_HEADER: [&str; 5] = ["Date", "Commenter", "File", "Line", "Comment"];
const COMMIT_HEADER: [&str; 4] = ["SHA", "Created by", "Created on", "Message"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Row written before any worksheet was added")]
    NoWorksheet,

    #[error("Row has too many columns ({0})")]
    TooWide(usize),
}

/// Destination for report rows.
pub trait ReportSink {
    /// Start a new worksheet for `branch`; later rows go there.
    fn add_worksheet(&mut self, branch: &str) -> Result<(), ReportError>;

    fn write(&mut self, style: RowStyle, cells: &[Cell]) -> Result<(), ReportError>;

    /// Leave one row blank.
    fn add_space(&mut self);

    fn write_title_row(&mut self, cells: &[Cell]) -> Result<(), ReportError> {
        self.write(RowStyle::Title, cells)
    }

    fn write_header_row(&mut self, cells: &[Cell]) -> Result<(), ReportError> {
        self.write(RowStyle::Header, cells)
    }

    fn write_row(&mut self, cells: &[Cell]) -> Result<(), ReportError> {
        self.write(RowStyle::Plain, cells)
    }
}

/// Pull requests written for one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSummary {
    pub branch: String,
    pub pull_requests: usize,
}

/// Collects pull requests for a repository and writes them out per branch.
pub struct Reporter {
    api: Arc<dyn GitHubApi>,
    repository: Repository,
    branches: Vec<String>,
    pulls: Option<Vec<PullRequest>>,
}

impl Reporter {
    pub fn new(api: Arc<dyn GitHubApi>, repository: Repository) -> Self {
        Reporter {
            api,
            repository,
            branches: Vec::new(),
            pulls: None,
        }
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    /// `pull_request_report_for_{owner}_{name}.xlsx`
    pub fn default_file_name(&self) -> String {
        format!("pull_request_report_for_{}.xlsx", self.repository.file_stem())
    }

    /// Add `branch` to the report. The first scan loads every open and closed
    /// pull request in the repository; later scans reuse that listing.
    #[instrument(skip(self))]
    pub async fn scan(&mut self, branch: &str) -> Result<(), ReportError> {
        if !self.branches.iter().any(|b| b == branch) {
            self.branches.push(branch.to_string());
        }
        if self.pulls.is_some() {
            debug!("reusing pull request listing");
            return Ok(());
        }

        let full_name = self.repository.full_name();
        let mut pulls = Vec::new();
        for state in [PullState::Open, PullState::Closed] {
            info!(repository = %full_name, state = state.as_str(), "loading pull requests");
            let listing = self.api.list_pull_requests(&full_name, state).await?;
            pulls.extend(
                listing
                    .into_iter()
                    .map(|summary| PullRequest::new(self.api.clone(), &full_name, summary)),
            );
        }
        info!(count = pulls.len(), "loaded pull requests");
        self.pulls = Some(pulls);
        Ok(())
    }

    /// Write one worksheet per scanned branch.
    pub async fn export(
        &self,
        sink: &mut dyn ReportSink,
        generated_at: DateTime<Utc>,
    ) -> Result<Vec<BranchSummary>, ReportError> {
        info!(repository = %self.repository, "reporting");
        let all_pulls = self.pulls.as_deref().unwrap_or_default();
        let mut summaries = Vec::with_capacity(self.branches.len());

        for branch in &self.branches {
            info!(branch = %branch, "reporting on pull requests");
            sink.add_worksheet(branch)?;
            title(sink, "Repository", self.repository.full_name())?;
            title(sink, "Branch", branch.as_str())?;
            title(sink, "Report generated", generated_at)?;
            sink.add_space();
            sink.write_title_row(&[Cell::from(format!("Pull Requests into {branch}"))])?;

            let branch_pulls =
                by_creation(all_pulls.iter().filter(|p| p.branch() == branch.as_str()));
            for pull in &branch_pulls {
                write_pull_request(sink, pull).await?;
            }
            summaries.push(BranchSummary {
                branch: branch.clone(),
                pull_requests: branch_pulls.len(),
            });
        }
        Ok(summaries)
    }
}

/// Title row of a label and one value.
fn title(
    sink: &mut dyn ReportSink,
    label: &str,
    value: impl Into<Cell>,
) -> Result<(), ReportError> {
    sink.write_title_row(&[Cell::from(label), value.into()])
}

async fn write_pull_request(
    sink: &mut dyn ReportSink,
    pull: &PullRequest,
) -> Result<(), ReportError> {
    info!(number = pull.number(), title = %pull.title(), "adding pull request");

    let merged_by = if pull.is_merged().await? {
        Cell::from(pull.merged_by().await?)
    } else {
        Cell::from(NOT_MERGED)
    };
    let end_date = pull.end_date().map_or(Cell::from(NOT_CLOSED), Cell::from);

    title(sink, "Pull request name", pull.title())?;
    title(sink, "Pull request body", pull.body())?;
    title(sink, "Pull request number", pull.number())?;
    title(sink, "Raised by", pull.created_by())?;
    title(sink, "Date Raised", pull.created_at())?;
    title(sink, "State", pull.state())?;
    title(sink, "Merged by", merged_by)?;
    title(sink, "Date Merged/Closed", end_date)?;
    title(sink, "Number of files changed", pull.changed_files().await?)?;
    title(sink, "Number of additions", pull.additions().await?)?;
    title(sink, "Number of deletions", pull.deletions().await?)?;
    title(sink, "Number of commits", pull.number_of_commits().await?)?;
    title(sink, "Contributors", pull.contributors().await?.join(", "))?;

    let comments = pull.comments().await?;
    if comments.is_empty() {
        title(sink, "Comments on Pull Request", NO_COMMENTS)?;
    } else {
        sink.write_title_row(&[Cell::from("Comments on Pull Request")])?;
        write_comments(sink, comments)?;
    }

    sink.add_space();
    sink.write_title_row(&[Cell::from("Commits in the Pull Request")])?;
    for commit in by_creation(pull.commits().await?) {
        sink.write_header_row(&COMMIT_HEADER.map(Cell::from))?;
        sink.write_row(&[
            Cell::from(commit.sha()),
            Cell::from(commit.committer()),
            Cell::from(commit.created_at()),
            Cell::from(commit.message()),
        ])?;
        let commit_comments = commit.comments().await?;
        if !commit_comments.is_empty() {
            sink.write_title_row(&[Cell::from("Comments on commit")])?;
            write_comments(sink, commit_comments)?;
        }
    }
    sink.add_space();
    Ok(())
}

fn write_comments(sink: &mut dyn ReportSink, comments: &[Comment]) -> Result<(), ReportError> {
    sink.write_header_row(&COMMENT_HEADER.map(Cell::from))?;
    for comment in by_creation(comments) {
        debug!(comment = comment.id(), "adding comment");
        sink.write_row(&comment.as_row())?;
    }
    Ok(())
}

/// Print where the report went and how many pull requests each sheet holds.
pub fn print_summary(path: &Path, summaries: &[BranchSummary]) {
    println!();
    println!("{} {}", "Report written:".green().bold(), path.display());
    for summary in summaries {
        let count = summary.pull_requests.to_string();
        let count = if summary.pull_requests == 0 {
            count.yellow()
        } else {
            count.bold()
        };
        println!("  • {}: {} pull requests", summary.branch, count);
    }
    println!();
}

pub mod comment;
pub mod commit;

pub use comment::Comment;
pub use commit::Commit;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::github::{GitHubApi, GitHubError, PullDetail, PullSummary};

/// Anything ordered by when it was created.
pub trait Created {
    fn created_at(&self) -> DateTime<Utc>;
}

/// References to `items`, oldest first. Ties keep their input order.
pub fn by_creation<'a, T: Created>(items: impl IntoIterator<Item = &'a T>) -> Vec<&'a T> {
    let mut sorted: Vec<&T> = items.into_iter().collect();
    sorted.sort_by_key(|item| item.created_at());
    sorted
}

/// A pull request built from the listing payload.
///
/// Fields that only the single-item endpoint returns are fetched on first use
/// and kept for the life of the value, as are the commit and comment lists.
pub struct PullRequest {
    api: Arc<dyn GitHubApi>,
    repository: String,
    summary: PullSummary,
    detail: OnceCell<PullDetail>,
    commits: OnceCell<Vec<Commit>>,
    comments: OnceCell<Vec<Comment>>,
}

impl PullRequest {
    pub fn new(api: Arc<dyn GitHubApi>, repository: &str, summary: PullSummary) -> Self {
        PullRequest {
            api,
            repository: repository.to_string(),
            summary,
            detail: OnceCell::new(),
            commits: OnceCell::new(),
            comments: OnceCell::new(),
        }
    }

    pub fn number(&self) -> u64 {
        self.summary.number
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }

    pub fn body(&self) -> &str {
        self.summary.body.as_deref().unwrap_or_default()
    }

    pub fn created_by(&self) -> Option<&str> {
        self.summary.user.as_ref().map(|u| u.login.as_str())
    }

    pub fn state(&self) -> &str {
        &self.summary.state
    }

    /// Branch the pull request merges into.
    pub fn branch(&self) -> &str {
        &self.summary.base.ref_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.summary.created_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.summary.closed_at
    }

    pub fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.summary.merged_at
    }

    /// Merge time, or close time for a pull request closed without merging.
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.merged_at().or_else(|| self.closed_at())
    }

    async fn detail(&self) -> Result<&PullDetail, GitHubError> {
        self.detail
            .get_or_try_init(|| async {
                debug!(number = self.number(), "fetching full pull request");
                self.api.pull_request(&self.repository, self.number()).await
            })
            .await
    }

    pub async fn number_of_commits(&self) -> Result<u64, GitHubError> {
        Ok(self.detail().await?.commits)
    }

    pub async fn number_of_comments(&self) -> Result<u64, GitHubError> {
        Ok(self.detail().await?.review_comments)
    }

    pub async fn additions(&self) -> Result<u64, GitHubError> {
        Ok(self.detail().await?.additions)
    }

    pub async fn deletions(&self) -> Result<u64, GitHubError> {
        Ok(self.detail().await?.deletions)
    }

    pub async fn changed_files(&self) -> Result<u64, GitHubError> {
        Ok(self.detail().await?.changed_files)
    }

    pub async fn is_merged(&self) -> Result<bool, GitHubError> {
        Ok(self.detail().await?.merged)
    }

    /// Login of whoever merged the pull request. `None` while unmerged, and
    /// for merges GitHub reports without an actor.
    pub async fn merged_by(&self) -> Result<Option<&str>, GitHubError> {
        let detail = self.detail().await?;
        if !detail.merged {
            return Ok(None);
        }
        Ok(detail.merged_by.as_ref().map(|u| u.login.as_str()))
    }

    pub async fn commits(&self) -> Result<&[Commit], GitHubError> {
        let commits = self.commits.get_or_try_init(|| self.load_commits()).await?;
        Ok(commits)
    }

    async fn load_commits(&self) -> Result<Vec<Commit>, GitHubError> {
        if self.number_of_commits().await? == 0 {
            return Ok(Vec::new());
        }
        debug!(number = self.number(), "fetching pull request commits");
        let raw = self
            .api
            .pull_request_commits(&self.repository, self.number())
            .await?;
        Ok(raw
            .into_iter()
            .map(|c| Commit::new(self.api.clone(), &self.repository, c))
            .collect())
    }

    /// Review comments on the diff.
    pub async fn comments(&self) -> Result<&[Comment], GitHubError> {
        let comments = self.comments.get_or_try_init(|| self.load_comments()).await?;
        Ok(comments)
    }

    async fn load_comments(&self) -> Result<Vec<Comment>, GitHubError> {
        if self.number_of_comments().await? == 0 {
            return Ok(Vec::new());
        }
        debug!(number = self.number(), "fetching pull request comments");
        let raw = self
            .api
            .pull_request_comments(&self.repository, self.number())
            .await?;
        Ok(raw.into_iter().map(Comment::new).collect())
    }

    /// Everyone who committed to or commented on the pull request, in the
    /// order first seen.
    pub async fn contributors(&self) -> Result<Vec<String>, GitHubError> {
        let mut contributors: Vec<String> = Vec::new();
        let mut add = |name: &str| {
            if !contributors.iter().any(|c| c == name) {
                contributors.push(name.to_string());
            }
        };

        for commit in self.commits().await? {
            add(commit.committer());
            for comment in commit.comments().await? {
                if let Some(author) = comment.author() {
                    add(author);
                }
            }
        }
        for comment in self.comments().await? {
            if let Some(author) = comment.author() {
                add(author);
            }
        }
        Ok(contributors)
    }
}

impl Created for PullRequest {
    fn created_at(&self) -> DateTime<Utc> {
        self.summary.created_at
    }
}

pub mod client;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use client::GitHubClient;
pub use types::{PullDetail, PullState, PullSummary, RawComment, RawCommit, Repository};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid repository: {0} (expected owner/name)")]
    InvalidRepository(String),

    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),
}

/// The GitHub calls a report run makes.
///
/// `repo` is always the `owner/name` form. List calls return every page.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn list_pull_requests(
        &self,
        repo: &str,
        state: PullState,
    ) -> Result<Vec<PullSummary>, GitHubError>;

    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullDetail, GitHubError>;

    async fn pull_request_commits(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<Vec<RawCommit>, GitHubError>;

    async fn pull_request_comments(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<Vec<RawComment>, GitHubError>;

    async fn commit_comments(&self, repo: &str, sha: &str) -> Result<Vec<RawComment>, GitHubError>;
}

/// Parse a combined `owner/name` string.
pub fn parse_repository(value: &str) -> Result<Repository, GitHubError> {
    let mut parts = value.trim().split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => repository_from_parts(owner, name)
            .ok_or_else(|| GitHubError::InvalidRepository(value.to_string())),
        _ => Err(GitHubError::InvalidRepository(value.to_string())),
    }
}

/// Build a repository from separate owner and name values.
pub fn repository_from_parts(owner: &str, name: &str) -> Option<Repository> {
    let owner = owner.trim();
    let name = name.trim();
    if owner.is_empty() || name.is_empty() || owner.contains('/') || name.contains('/') {
        return None;
    }
    Some(Repository {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

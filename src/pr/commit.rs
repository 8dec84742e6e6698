use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{Comment, Created};
use crate::github::{GitHubApi, GitHubError, RawCommit};

/// A commit belonging to a pull request.
pub struct Commit {
    api: Arc<dyn GitHubApi>,
    repository: String,
    raw: RawCommit,
    comments: OnceCell<Vec<Comment>>,
}

impl Commit {
    pub fn new(api: Arc<dyn GitHubApi>, repository: &str, raw: RawCommit) -> Self {
        Commit {
            api,
            repository: repository.to_string(),
            raw,
            comments: OnceCell::new(),
        }
    }

    pub fn sha(&self) -> &str {
        &self.raw.sha
    }

    pub fn message(&self) -> &str {
        &self.raw.commit.message
    }

    /// Linked GitHub login, or the git committer name for unlinked commits.
    pub fn committer(&self) -> &str {
        self.raw
            .committer
            .as_ref()
            .map_or(self.raw.commit.committer.name.as_str(), |u| u.login.as_str())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.raw.commit.committer.date
    }

    pub fn comment_count(&self) -> u64 {
        self.raw.commit.comment_count
    }

    /// Comments on this commit, fetched on first call.
    pub async fn comments(&self) -> Result<&[Comment], GitHubError> {
        let comments = self.comments.get_or_try_init(|| self.load_comments()).await?;
        Ok(comments)
    }

    async fn load_comments(&self) -> Result<Vec<Comment>, GitHubError> {
        if self.comment_count() == 0 {
            return Ok(Vec::new());
        }
        debug!(sha = %self.sha(), "fetching commit comments");
        let raw = self.api.commit_comments(&self.repository, self.sha()).await?;
        Ok(raw.into_iter().map(Comment::new).collect())
    }
}

impl Created for Commit {
    fn created_at(&self) -> DateTime<Utc> {
        self.raw.commit.committer.date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::{self, FakeGitHub};

    #[test]
    fn test_committer_prefers_login() {
        let api: Arc<dyn GitHubApi> = Arc::new(FakeGitHub::default());
        let linked = Commit::new(
            api.clone(),
            "org/repo",
            fake::commit("a", Some("carol"), fake::at(1, 0), 0),
        );
        let unlinked = Commit::new(api, "org/repo", fake::commit("b", None, fake::at(1, 0), 0));
        assert_eq!(linked.committer(), "carol");
        assert_eq!(unlinked.committer(), "Git Name");
        assert_eq!(linked.message(), "commit a");
    }

    #[tokio::test]
    async fn test_zero_comment_count_skips_fetch() {
        let github = Arc::new(FakeGitHub::default());
        let commit = Commit::new(
            github.clone(),
            "org/repo",
            fake::commit("a", None, fake::at(1, 0), 0),
        );

        assert!(commit.comments().await.unwrap().is_empty());
        assert_eq!(FakeGitHub::calls(&github.commit_comment_calls), 0);
    }

    #[tokio::test]
    async fn test_comments_fetched_once() {
        let mut github = FakeGitHub::default();
        github.commit_comments.insert(
            "a".to_string(),
            vec![fake::comment(1, "bob", fake::at(2, 0))],
        );
        let github = Arc::new(github);
        let commit = Commit::new(
            github.clone(),
            "org/repo",
            fake::commit("a", None, fake::at(1, 0), 1),
        );

        assert_eq!(commit.comments().await.unwrap().len(), 1);
        assert_eq!(commit.comments().await.unwrap().len(), 1);
        assert_eq!(FakeGitHub::calls(&github.commit_comment_calls), 1);
    }
}

//! In-memory `GitHubApi` with per-endpoint call counters.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{CommitData, GitActor, PullRef, User};
use super::{GitHubApi, GitHubError, PullDetail, PullState, PullSummary, RawComment, RawCommit};

#[derive(Default)]
pub struct FakeGitHub {
    pub open: Vec<PullSummary>,
    pub closed: Vec<PullSummary>,
    pub details: HashMap<u64, PullDetail>,
    pub commits: HashMap<u64, Vec<RawCommit>>,
    pub comments: HashMap<u64, Vec<RawComment>>,
    pub commit_comments: HashMap<String, Vec<RawComment>>,

    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub commit_calls: AtomicUsize,
    pub comment_calls: AtomicUsize,
    pub commit_comment_calls: AtomicUsize,
}

impl FakeGitHub {
    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn list_pull_requests(
        &self,
        _repo: &str,
        state: PullState,
    ) -> Result<Vec<PullSummary>, GitHubError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match state {
            PullState::Open => self.open.clone(),
            PullState::Closed => self.closed.clone(),
        })
    }

    async fn pull_request(&self, _repo: &str, number: u64) -> Result<PullDetail, GitHubError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.details.get(&number).cloned().unwrap_or_default())
    }

    async fn pull_request_commits(
        &self,
        _repo: &str,
        number: u64,
    ) -> Result<Vec<RawCommit>, GitHubError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.commits.get(&number).cloned().unwrap_or_default())
    }

    async fn pull_request_comments(
        &self,
        _repo: &str,
        number: u64,
    ) -> Result<Vec<RawComment>, GitHubError> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.comments.get(&number).cloned().unwrap_or_default())
    }

    async fn commit_comments(
        &self,
        _repo: &str,
        sha: &str,
    ) -> Result<Vec<RawComment>, GitHubError> {
        self.commit_comment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.commit_comments.get(sha).cloned().unwrap_or_default())
    }
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub fn user(login: &str) -> Option<User> {
    Some(User {
        login: login.to_string(),
    })
}

pub fn summary(number: u64, branch: &str, created_at: DateTime<Utc>) -> PullSummary {
    PullSummary {
        number,
        title: format!("PR {number}"),
        body: Some(format!("Body of {number}")),
        state: "open".to_string(),
        user: user("alice"),
        created_at,
        closed_at: None,
        merged_at: None,
        base: PullRef {
            ref_name: branch.to_string(),
        },
    }
}

pub fn commit(
    sha: &str,
    committer: Option<&str>,
    date: DateTime<Utc>,
    comment_count: u64,
) -> RawCommit {
    RawCommit {
        sha: sha.to_string(),
        commit: CommitData {
            message: format!("commit {sha}"),
            committer: GitActor {
                name: "Git Name".to_string(),
                date,
            },
            comment_count,
        },
        committer: committer.and_then(user),
    }
}

pub fn comment(id: u64, author: &str, created_at: DateTime<Utc>) -> RawComment {
    RawComment {
        id,
        user: user(author),
        body: format!("comment {id}"),
        path: Some("src/lib.rs".to_string()),
        position: Some(id),
        created_at,
    }
}

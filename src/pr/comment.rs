use chrono::{DateTime, Utc};

use super::Created;
use crate::github::RawComment;
use crate::report::Cell;

/// A review comment on a pull request or a comment on a commit.
#[derive(Debug, Clone)]
pub struct Comment {
    raw: RawComment,
}

impl Comment {
    pub fn new(raw: RawComment) -> Self {
        Comment { raw }
    }

    pub fn id(&self) -> u64 {
        self.raw.id
    }

    pub fn author(&self) -> Option<&str> {
        self.raw.user.as_ref().map(|u| u.login.as_str())
    }

    pub fn body(&self) -> &str {
        &self.raw.body
    }

    pub fn path(&self) -> Option<&str> {
        self.raw.path.as_deref()
    }

    /// Line position within the diff of `path`.
    pub fn position(&self) -> Option<u64> {
        self.raw.position
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.raw.created_at
    }

    /// Cells for the `Date | Commenter | File | Line | Comment` table.
    pub fn as_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.created_at()),
            Cell::from(self.author()),
            Cell::from(self.path()),
            Cell::from(self.position()),
            Cell::from(self.body()),
        ]
    }
}

impl Created for Comment {
    fn created_at(&self) -> DateTime<Utc> {
        self.raw.created_at
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Closed => write!(f, "closed"),
        }
    }
}

/// Login GitHub shows in place of a deleted account.
pub const GHOST_LOGIN: &str = "ghost";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

fn login_of(user: &Option<User>) -> Option<&str> {
    user.as_ref().map(|u| u.login.as_str()).filter(|l| !l.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub state: PrState,
    #[serde(default)]
    pub title: String,
    /// `null` for deleted accounts.
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn author_login(&self) -> Option<&str> {
        login_of(&self.user)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub user: Option<User>,
    #[serde(default)]
    pub state: String,
    /// Absent while the review is pending.
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn reviewer_login(&self) -> Option<&str> {
        login_of(&self.user)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
}

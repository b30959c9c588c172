use async_trait::async_trait;

use crate::error::Result;
use crate::github::rate_limiter::RateLimitSnapshot;
use crate::models::{IssueComment, PullRequest, RepoRef, Review};

/// Source of pull request activity for the pipeline.
#[async_trait]
pub trait PullRequestService: Send + Sync {
    /// Every pull request reachable within the configured page cap,
    /// newest first.
    async fn fetch_all_pull_requests(&self, repo: &RepoRef) -> Result<Vec<PullRequest>>;

    async fn fetch_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<Review>>;

    async fn fetch_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<IssueComment>>;

    /// Rate limit state reported by the most recent response, if any.
    async fn rate_limit(&self) -> Option<RateLimitSnapshot> {
        None
    }
}

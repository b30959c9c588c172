pub mod client;
pub mod rate_limiter;
pub mod paginator;
pub mod service;

pub use client::GitHubClient;
pub use rate_limiter::{RateLimitSnapshot, RateLimiter};
pub use paginator::{PageSource, Paginator};
pub use service::PullRequestService;

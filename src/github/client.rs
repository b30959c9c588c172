use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;

use crate::config::GitHubConfig;
use crate::error::{Error, Result};
use crate::github::paginator::{PageSource, Paginator};
use crate::github::rate_limiter::{RateLimitSnapshot, RateLimiter};
use crate::github::service::PullRequestService;
use crate::models::{IssueComment, PullRequest, RepoRef, Review};
use crate::pacing::Pacing;

const USER_AGENT: &str = concat!("prvelocity/", env!("CARGO_PKG_VERSION"));

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimiter,
    paginator: Paginator,
    base_url: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        Self::with_pacing(config, Pacing::fixed(config.page_delay))
    }

    pub fn with_pacing(config: &GitHubConfig, pacing: Pacing) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = &config.token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            paginator: Paginator::new(config.per_page, config.max_pages, pacing),
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        self.rate_limiter.update_from_headers(response.headers()).await;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi {
                status: status.as_u16(),
                message: format!(
                    "{} {}",
                    status.canonical_reason().unwrap_or("Unknown"),
                    body.trim()
                ),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(format!("{}: {}", url, e)))
    }

    fn pulls_url(&self, repo: &RepoRef, page: u32, per_page: u32) -> String {
        format!(
            "{}/repos/{}/{}/pulls?state=all&page={}&per_page={}&sort=created&direction=desc",
            self.base_url, repo.owner, repo.name, page, per_page
        )
    }

    fn reviews_url(&self, repo: &RepoRef, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}/reviews",
            self.base_url, repo.owner, repo.name, number
        )
    }

    fn comments_url(&self, repo: &RepoRef, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_url, repo.owner, repo.name, number
        )
    }
}

struct PullRequestPages<'a> {
    github: &'a GitHubClient,
    repo: &'a RepoRef,
}

#[async_trait]
impl<'a> PageSource<PullRequest> for PullRequestPages<'a> {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<PullRequest>> {
        let url = self.github.pulls_url(self.repo, page, per_page);
        self.github.get_json(&url).await
    }
}

#[async_trait]
impl PullRequestService for GitHubClient {
    async fn fetch_all_pull_requests(&self, repo: &RepoRef) -> Result<Vec<PullRequest>> {
        tracing::info!("Fetching pull requests for: {}", repo);
        let pages = PullRequestPages { github: self, repo };
        self.paginator.fetch_all(&pages).await
    }

    async fn fetch_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<Review>> {
        self.get_json(&self.reviews_url(repo, number)).await
    }

    async fn fetch_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<IssueComment>> {
        self.get_json(&self.comments_url(repo, number)).await
    }

    async fn rate_limit(&self) -> Option<RateLimitSnapshot> {
        self.rate_limiter.snapshot().await
    }
}

use chrono::{DateTime, Utc};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::RepoRef;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub github: GitHubConfig,
    pub backend: BackendConfig,
    pub repositories: Vec<RepoRef>,
    pub request_delay: Duration,
    pub repository_delay: Duration,
    pub failure_policy: RepositoryFailurePolicy,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub max_pages: u32,
    pub per_page: u32,
    pub page_delay: Duration,
    pub timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            max_pages: 3,
            per_page: 5,
            page_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Deployment topology of the VictoriaMetrics backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEndpoint {
    SingleNode { url: String },
    Cluster { vmagent_url: String, vmselect_url: String },
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub endpoint: BackendEndpoint,
    /// Lookback window of the last-execution query, e.g. `30d`.
    pub last_exec_search_range: String,
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: BackendEndpoint::SingleNode {
                url: "http://localhost:8428".to_string(),
            },
            last_exec_search_range: "30d".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// What the pipeline does when a repository's pull request listing fails
/// or comes back empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepositoryFailurePolicy {
    /// Stop the whole run with the error.
    #[default]
    Abort,
    /// Log and continue with the next repository.
    Skip,
}

impl FromStr for RepositoryFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(RepositoryFailurePolicy::Abort),
            "skip" => Ok(RepositoryFailurePolicy::Skip),
            other => Err(Error::Config(format!(
                "Unknown repository failure policy '{}', expected abort or skip",
                other
            ))),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so that
    /// callers are not tied to the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str, default: u64| -> Result<u64> {
            match var(key) {
                Some(v) => v.trim().parse().map_err(|_| {
                    Error::Config(format!("{} must be a non-negative integer, got '{}'", key, v))
                }),
                None => Ok(default),
            }
        };
        let count = |key: &str, default: u32| -> Result<u32> {
            let value = number(key, u64::from(default))?;
            u32::try_from(value)
                .map_err(|_| Error::Config(format!("{} is out of range, got {}", key, value)))
        };

        let token = var("GITHUB_TOKEN");
        if token.is_none() {
            tracing::warn!("GITHUB_TOKEN not set, working with the anonymous rate limit");
        }

        let github = GitHubConfig {
            token,
            api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            max_pages: count("MAX_PAGES", 3)?,
            per_page: count("PER_PAGE", 5)?,
            page_delay: Duration::from_millis(number("DELAY_MS", 500)?),
            timeout: Duration::from_secs(number("HTTP_TIMEOUT_SECS", 30)?),
        };

        if github.per_page == 0 || github.max_pages == 0 {
            return Err(Error::Config(
                "PER_PAGE and MAX_PAGES must be greater than zero".to_string(),
            ));
        }

        let repositories = var("GITHUB_REPOSITORIES")
            .unwrap_or_else(|| "stmcginnis/gofish".to_string())
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(RepoRef::from_str)
            .collect::<Result<Vec<_>>>()?;

        let endpoint = match (var("VM_AGENT_URL"), var("VM_SELECT_URL")) {
            (Some(vmagent_url), Some(vmselect_url)) => BackendEndpoint::Cluster {
                vmagent_url,
                vmselect_url,
            },
            (None, None) => BackendEndpoint::SingleNode {
                url: var("VM_URL").unwrap_or_else(|| "http://localhost:8428".to_string()),
            },
            _ => {
                return Err(Error::Config(
                    "VM_AGENT_URL and VM_SELECT_URL must be set together".to_string(),
                ))
            }
        };

        let backend = BackendConfig {
            endpoint,
            last_exec_search_range: var("LAST_EXEC_SEARCH_RANGE")
                .unwrap_or_else(|| "30d".to_string()),
            timeout: github.timeout,
        };

        let failure_policy = match var("ON_REPOSITORY_FAILURE") {
            Some(v) => v.parse()?,
            None => RepositoryFailurePolicy::default(),
        };

        Ok(Self {
            request_delay: github.page_delay,
            repository_delay: Duration::from_millis(number("REPO_DELAY_MS", 1000)?),
            github,
            backend,
            repositories,
            failure_policy,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub repositories: Vec<RepoRef>,
    pub request_delay: Duration,
    pub repository_delay: Duration,
    pub failure_policy: RepositoryFailurePolicy,
    /// Pull requests last updated before this instant are not scraped.
    pub scrape_threshold: Option<DateTime<Utc>>,
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            repositories: config.repositories.clone(),
            request_delay: config.request_delay,
            repository_delay: config.repository_delay,
            failure_policy: config.failure_policy,
            scrape_threshold: None,
        }
    }
}

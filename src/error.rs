use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error ({status}): {message}")]
    GitHubApi { status: u16, message: String },

    #[error("Unexpected HTTP response status code: {0}")]
    UnexpectedStatus(u16),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to convert last exec timestamp: {0}")]
    TimestampConversion(String),

    #[error("Data anomaly: {0}")]
    DataAnomaly(String),

    #[error("No pull requests found for {0}")]
    NoPullRequests(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors raised while fetching a single repository from GitHub.
    /// Export, configuration and IO problems are never repository-local.
    pub fn is_repository_scoped(&self) -> bool {
        matches!(
            self,
            Error::GitHubApi { .. }
                | Error::Network(_)
                | Error::Decode(_)
                | Error::NoPullRequests(_)
        )
    }
}

pub mod config;
pub mod error;
pub mod models;
pub mod pacing;
pub mod github;
pub mod vmdb;
pub mod analysis;
pub mod storage;
pub mod report;

#[cfg(test)]
mod test_support;

pub use config::{Config, PipelineConfig, RepositoryFailurePolicy};
pub use error::{Error, Result};
pub use pacing::Pacing;
pub use github::{GitHubClient, PullRequestService};
pub use vmdb::{MetricsBackend, VmExporter};
pub use analysis::AnalysisPipeline;
pub use storage::JsonStore;

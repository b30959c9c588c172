use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::aggregate::aggregate;
use crate::analysis::metrics::compute_metric;
use crate::config::{PipelineConfig, RepositoryFailurePolicy};
use crate::error::{Error, Result};
use crate::github::PullRequestService;
use crate::models::{PrMetric, PullRequest, RepoRef, RepositoryResult};
use crate::pacing::Pacing;
use crate::vmdb::{MetricsBackend, SampleBatch};

pub const MERGE_RATE_METRIC: &str = "MergeRate";
pub const MEDIAN_LIFETIME_METRIC: &str = "MedianLifeTime";
pub const AVERAGE_TIME_TO_FIRST_REVIEW_METRIC: &str = "AverageTimeToFirstReview";
pub const PREDICTED_TIME_TO_MERGE_METRIC: &str = "PredictedTimeToMerge";

/// Drives fetch, aggregation and export for each configured repository in
/// turn. Results are keyed by `owner/name`.
pub struct AnalysisPipeline {
    github: Arc<dyn PullRequestService>,
    backend: Option<Arc<dyn MetricsBackend>>,
    config: PipelineConfig,
    request_pacing: Pacing,
    repository_pacing: Pacing,
}

impl AnalysisPipeline {
    pub fn new(github: impl PullRequestService + 'static, config: PipelineConfig) -> Self {
        Self {
            github: Arc::new(github),
            backend: None,
            request_pacing: Pacing::fixed(config.request_delay),
            repository_pacing: Pacing::fixed(config.repository_delay),
            config,
        }
    }

    pub fn with_backend(mut self, backend: impl MetricsBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    pub fn with_pacing(mut self, request_pacing: Pacing, repository_pacing: Pacing) -> Self {
        self.request_pacing = request_pacing;
        self.repository_pacing = repository_pacing;
        self
    }

    pub async fn run(&self) -> Result<BTreeMap<String, RepositoryResult>> {
        let mut results = BTreeMap::new();

        for (index, repo) in self.config.repositories.iter().enumerate() {
            if index > 0 {
                self.repository_pacing.wait(index as u32).await;
            }

            tracing::info!("=== Analyzing {} ===", repo);
            match self.analyze_repository(repo).await {
                Ok(result) => {
                    // Export failures abort under every policy.
                    self.export_repository(&result).await?;
                    results.insert(repo.full_name(), result);
                }
                Err(e)
                    if self.config.failure_policy == RepositoryFailurePolicy::Skip
                        && e.is_repository_scoped() =>
                {
                    tracing::warn!("Skipping {}: {}", repo, e);
                }
                Err(e) => {
                    tracing::error!("Aborting run at {}: {}", repo, e);
                    return Err(e);
                }
            }
        }

        if let Some(backend) = &self.backend {
            if !results.is_empty() {
                let mut batch = SampleBatch::new();
                batch.record_exec_timestamp(Utc::now());
                backend.push_metrics(&batch).await?;
                tracing::info!("Execution timestamp recorded");
            }
        }

        Ok(results)
    }

    /// Fetches and aggregates one repository without exporting it.
    pub async fn analyze_repository(&self, repo: &RepoRef) -> Result<RepositoryResult> {
        let prs = self.github.fetch_all_pull_requests(repo).await?;
        tracing::info!("Found {} pull requests", prs.len());

        if prs.is_empty() {
            return Err(Error::NoPullRequests(repo.full_name()));
        }

        let prs: Vec<PullRequest> = match self.config.scrape_threshold {
            Some(threshold) => {
                let recent: Vec<_> = prs.into_iter().filter(|pr| pr.updated_at >= threshold).collect();
                tracing::info!("{} pull requests updated since {}", recent.len(), threshold);
                recent
            }
            None => prs,
        };

        let metrics = self.collect_metrics(repo, &prs).await;
        if let Some(limit) = self.github.rate_limit().await {
            tracing::info!(
                remaining = limit.remaining,
                consumed = ?limit.consumed(),
                "GitHub API budget after {}",
                repo
            );
        }
        let analysis = aggregate(metrics.clone());
        Ok(RepositoryResult {
            repository: repo.clone(),
            metrics,
            analysis,
        })
    }

    /// Pushes the samples of one analyzed repository, if a backend is set.
    pub async fn export_repository(&self, result: &RepositoryResult) -> Result<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };

        let repo = &result.repository;
        let batch = build_samples(result, Utc::now());
        if batch.is_empty() {
            tracing::info!("No defined metrics for {}, nothing to push", repo);
        } else {
            backend.push_metrics(&batch).await?;
            tracing::info!("Pushed {} samples for {}", batch.len(), repo);
        }
        Ok(())
    }

    async fn collect_metrics(&self, repo: &RepoRef, prs: &[PullRequest]) -> Vec<PrMetric> {
        let pb = ProgressBar::new(prs.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} PRs")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let now = Utc::now();
        let mut metrics = Vec::with_capacity(prs.len());

        for (index, pr) in prs.iter().enumerate() {
            if index > 0 {
                self.request_pacing.wait(index as u32).await;
            }

            tracing::debug!("Processing PR #{} ({}/{})", pr.number, index + 1, prs.len());
            match self.collect_pr_metric(repo, pr, now).await {
                Ok(metric) => metrics.push(metric),
                Err(e) => tracing::warn!("Skipping PR #{} of {}: {}", pr.number, repo, e),
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        metrics
    }

    async fn collect_pr_metric(
        &self,
        repo: &RepoRef,
        pr: &PullRequest,
        now: DateTime<Utc>,
    ) -> Result<PrMetric> {
        let reviews = self.github.fetch_reviews(repo, pr.number).await?;
        let comments = self.github.fetch_comments(repo, pr.number).await?;
        compute_metric(repo, pr, &reviews, &comments, now)
    }
}

/// Samples exported per repository. Durations are whole seconds; undefined
/// figures are left out.
pub fn build_samples(result: &RepositoryResult, at: DateTime<Utc>) -> SampleBatch {
    let repo = result.repository.full_name();
    let analysis = &result.analysis;
    let mut batch = SampleBatch::new();

    if let Some(rate) = analysis.merge_rate {
        batch.add_pr_metric(MERGE_RATE_METRIC, &repo, rate, at);
    }

    let durations = [
        (MEDIAN_LIFETIME_METRIC, analysis.median_lifetime),
        (
            AVERAGE_TIME_TO_FIRST_REVIEW_METRIC,
            analysis.average_time_to_first_review,
        ),
        (PREDICTED_TIME_TO_MERGE_METRIC, analysis.predicted_time_to_merge),
    ];
    for (name, value) in durations {
        if let Some(duration) = value {
            batch.add_pr_metric(name, &repo, duration.num_seconds() as f64, at);
        }
    }

    batch
}

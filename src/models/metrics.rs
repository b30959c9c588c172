use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::pull_request::PrState;
use super::repository::RepoRef;

/// Velocity figures derived from a single pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrMetric {
    pub repository: String,
    pub pr_number: u64,
    pub author: String,
    pub state: PrState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub first_review_at: Option<DateTime<Utc>>,
    #[serde(with = "duration_secs")]
    pub total_lifetime: Duration,
    /// Zero when the pull request has no submitted review.
    #[serde(with = "duration_secs")]
    pub time_to_first_review: Duration,
    pub reviewers: BTreeSet<String>,
    pub comments_count: usize,
    pub is_merged: bool,
}

impl PrMetric {
    pub fn has_review(&self) -> bool {
        self.first_review_at.is_some()
    }

    /// Open pull requests carry a lifetime measured up to aggregation time.
    pub fn is_provisional(&self) -> bool {
        self.state == PrState::Open
    }
}

/// Repository-level statistics. Figures that cannot be computed from the
/// input are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_prs: usize,
    pub merged_prs: usize,
    pub closed_without_merge: usize,
    pub merge_rate: Option<f64>,
    #[serde(with = "option_duration_secs")]
    pub average_lifetime: Option<Duration>,
    #[serde(with = "option_duration_secs")]
    pub median_lifetime: Option<Duration>,
    #[serde(with = "option_duration_secs")]
    pub average_time_to_first_review: Option<Duration>,
    #[serde(with = "option_duration_secs")]
    pub median_time_to_first_review: Option<Duration>,
    #[serde(with = "option_duration_secs")]
    pub predicted_time_to_merge: Option<Duration>,
    pub pr_metrics: Vec<PrMetric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryResult {
    pub repository: RepoRef,
    pub metrics: Vec<PrMetric>,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoPerformance {
    pub repository: String,
    pub merge_rate: f64,
    #[serde(with = "option_duration_secs")]
    pub average_lifetime: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_repositories: usize,
    pub total_prs: usize,
    pub total_merged_prs: usize,
    pub overall_merge_rate: Option<f64>,
    pub best_performing: Vec<RepoPerformance>,
    /// Worst first.
    pub worst_performing: Vec<RepoPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeAnalysis {
    pub summary: SummaryStats,
    /// Every repository ordered by merge rate, best first.
    pub ranking: Vec<RepoPerformance>,
}

/// Durations are persisted as whole seconds.
pub mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        i64::deserialize(deserializer).map(Duration::seconds)
    }
}

pub mod option_duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.num_seconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(deserializer)?.map(Duration::seconds))
    }
}

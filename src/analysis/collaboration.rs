use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{AnalysisResult, PrMetric};

/// Pairs with fewer interactions are not reported.
const MIN_PAIR_INTERACTIONS: usize = 2;
const SLOW_RESPONSE_DAYS: i64 = 7;
const LOW_MERGE_RATE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStats {
    pub author: String,
    pub pr_count: usize,
    pub merged_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerStats {
    pub reviewer: String,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorReviewerPair {
    pub author: String,
    pub reviewer: String,
    pub interactions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationStats {
    pub authors: Vec<AuthorStats>,
    pub reviewers: Vec<ReviewerStats>,
    pub pairs: Vec<AuthorReviewerPair>,
}

/// Who opens pull requests, who reviews them, and which author/reviewer
/// pairs work together repeatedly. Lists are ordered by count, then name.
pub fn collaboration_stats(metrics: &[PrMetric]) -> CollaborationStats {
    let mut authors: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut reviewers: HashMap<&str, usize> = HashMap::new();
    let mut pairs: HashMap<(&str, &str), usize> = HashMap::new();

    for metric in metrics {
        let entry = authors.entry(metric.author.as_str()).or_default();
        entry.0 += 1;
        if metric.is_merged {
            entry.1 += 1;
        }

        for reviewer in &metric.reviewers {
            *reviewers.entry(reviewer.as_str()).or_default() += 1;
            *pairs
                .entry((metric.author.as_str(), reviewer.as_str()))
                .or_default() += 1;
        }
    }

    let mut authors: Vec<AuthorStats> = authors
        .into_iter()
        .map(|(author, (pr_count, merged_count))| AuthorStats {
            author: author.to_string(),
            pr_count,
            merged_count,
        })
        .collect();
    authors.sort_by(|a, b| b.pr_count.cmp(&a.pr_count).then_with(|| a.author.cmp(&b.author)));

    let mut reviewers: Vec<ReviewerStats> = reviewers
        .into_iter()
        .map(|(reviewer, review_count)| ReviewerStats {
            reviewer: reviewer.to_string(),
            review_count,
        })
        .collect();
    reviewers.sort_by(|a, b| {
        b.review_count
            .cmp(&a.review_count)
            .then_with(|| a.reviewer.cmp(&b.reviewer))
    });

    let mut pairs: Vec<AuthorReviewerPair> = pairs
        .into_iter()
        .filter(|(_, count)| *count >= MIN_PAIR_INTERACTIONS)
        .map(|((author, reviewer), interactions)| AuthorReviewerPair {
            author: author.to_string(),
            reviewer: reviewer.to_string(),
            interactions,
        })
        .collect();
    pairs.sort_by(|a, b| {
        b.interactions
            .cmp(&a.interactions)
            .then_with(|| a.author.cmp(&b.author))
            .then_with(|| a.reviewer.cmp(&b.reviewer))
    });

    CollaborationStats {
        authors,
        reviewers,
        pairs,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    LowMergeRate(f64),
    GoodMergeRate(f64),
    SlowFirstResponse(chrono::Duration),
    GoodResponseTime,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::LowMergeRate(rate) => write!(
                f,
                "Low merge rate ({:.1}%), there may be problems with code quality or planning",
                rate
            ),
            Recommendation::GoodMergeRate(rate) => write!(f, "Good merge rate ({:.1}%)", rate),
            Recommendation::SlowFirstResponse(d) => write!(
                f,
                "Long time to first response ({}h), possibly a lack of reviewers",
                d.num_hours()
            ),
            Recommendation::GoodResponseTime => write!(f, "Good team response time"),
        }
    }
}

impl Recommendation {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Recommendation::LowMergeRate(_) | Recommendation::SlowFirstResponse(_)
        )
    }
}

pub fn recommendations(analysis: &AnalysisResult) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if let Some(rate) = analysis.merge_rate {
        out.push(if rate < LOW_MERGE_RATE {
            Recommendation::LowMergeRate(rate)
        } else {
            Recommendation::GoodMergeRate(rate)
        });
    }

    if let Some(avg) = analysis.average_time_to_first_review {
        out.push(if avg > chrono::Duration::days(SLOW_RESPONSE_DAYS) {
            Recommendation::SlowFirstResponse(avg)
        } else {
            Recommendation::GoodResponseTime
        });
    }

    out
}

use chrono::Duration;

use crate::models::{AnalysisResult, PrMetric, PrState};

/// Weight of the merged-lifetime median in the merge-time prediction.
const MERGE_TIME_WEIGHT: f64 = 0.7;
/// Weight of the first-review median in the merge-time prediction.
const REVIEW_TIME_WEIGHT: f64 = 0.3;
/// Without review data, first-review time is estimated as 1/5 of the
/// merge time.
const REVIEW_FALLBACK_DIVISOR: i32 = 5;

/// Reduces per-PR metrics to repository statistics.
pub fn aggregate(metrics: Vec<PrMetric>) -> AnalysisResult {
    let total_prs = metrics.len();
    let merged_prs = metrics.iter().filter(|m| m.is_merged).count();
    let closed_without_merge = metrics
        .iter()
        .filter(|m| m.state == PrState::Closed && !m.is_merged)
        .count();

    let lifetimes: Vec<Duration> = metrics.iter().map(|m| m.total_lifetime).collect();
    let review_times: Vec<Duration> = metrics
        .iter()
        .filter(|m| m.has_review())
        .map(|m| m.time_to_first_review)
        .collect();
    let merged_lifetimes: Vec<Duration> = metrics
        .iter()
        .filter(|m| m.is_merged)
        .map(|m| m.total_lifetime)
        .collect();

    let merge_rate = (total_prs > 0).then(|| merged_prs as f64 / total_prs as f64 * 100.0);

    AnalysisResult {
        total_prs,
        merged_prs,
        closed_without_merge,
        merge_rate,
        average_lifetime: mean(&lifetimes),
        median_lifetime: median(&lifetimes),
        average_time_to_first_review: mean(&review_times),
        median_time_to_first_review: median(&review_times),
        predicted_time_to_merge: predict_time_to_merge(&merged_lifetimes, &review_times),
        pr_metrics: metrics,
    }
}

/// `0.7 * M + 0.3 * R`, where `M` is the median lifetime of merged pull
/// requests and `R` the median time to first review (or `M / 5` when no
/// pull request was reviewed). `None` without merged pull requests.
pub fn predict_time_to_merge(
    merged_lifetimes: &[Duration],
    review_times: &[Duration],
) -> Option<Duration> {
    let merge_time = median(merged_lifetimes)?;
    let review_time =
        median(review_times).unwrap_or_else(|| merge_time / REVIEW_FALLBACK_DIVISOR);

    let predicted = as_nanos(merge_time) * MERGE_TIME_WEIGHT + as_nanos(review_time) * REVIEW_TIME_WEIGHT;
    Some(Duration::nanoseconds(predicted.round() as i64))
}

pub fn mean(durations: &[Duration]) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }
    let total = durations
        .iter()
        .fold(Duration::zero(), |acc, d| acc + *d);
    Some(total / durations.len() as i32)
}

/// Median by full sort: the middle element for odd counts, the mean of the
/// two middle elements for even counts.
pub fn median(durations: &[Duration]) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }

    let mut sorted = durations.to_vec();
    sorted.sort();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2)
    } else {
        Some(sorted[mid])
    }
}

fn as_nanos(duration: Duration) -> f64 {
    duration
        .num_nanoseconds()
        .map(|n| n as f64)
        .unwrap_or_else(|| duration.num_milliseconds() as f64 * 1_000_000.0)
}

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{ComparativeAnalysis, RepoPerformance, RepositoryResult, SummaryStats};

const PODIUM_SIZE: usize = 3;

/// Ranks repositories by merge rate and totals their pull requests.
pub fn compare_repositories(results: &BTreeMap<String, RepositoryResult>) -> ComparativeAnalysis {
    let total_prs: usize = results.values().map(|r| r.analysis.total_prs).sum();
    let total_merged_prs: usize = results.values().map(|r| r.analysis.merged_prs).sum();

    let mut ranking: Vec<RepoPerformance> = results
        .iter()
        .map(|(name, result)| RepoPerformance {
            repository: name.clone(),
            merge_rate: result.analysis.merge_rate.unwrap_or(0.0),
            average_lifetime: result.analysis.average_lifetime,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.merge_rate
            .partial_cmp(&a.merge_rate)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.repository.cmp(&b.repository))
    });

    let podium = PODIUM_SIZE.min(ranking.len());
    let best_performing = ranking[..podium].to_vec();
    let worst_performing = ranking[ranking.len() - podium..]
        .iter()
        .rev()
        .cloned()
        .collect();

    ComparativeAnalysis {
        summary: SummaryStats {
            total_repositories: results.len(),
            total_prs,
            total_merged_prs,
            overall_merge_rate: (total_prs > 0)
                .then(|| total_merged_prs as f64 / total_prs as f64 * 100.0),
            best_performing,
            worst_performing,
        },
        ranking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, RepoRef};

    fn result(name: &str, total: usize, merged: usize) -> (String, RepositoryResult) {
        let repository: RepoRef = name.parse().unwrap();
        let analysis = AnalysisResult {
            total_prs: total,
            merged_prs: merged,
            merge_rate: (total > 0).then(|| merged as f64 / total as f64 * 100.0),
            ..Default::default()
        };
        (
            name.to_string(),
            RepositoryResult {
                repository,
                metrics: Vec::new(),
                analysis,
            },
        )
    }

    fn names(performances: &[RepoPerformance]) -> Vec<&str> {
        performances.iter().map(|p| p.repository.as_str()).collect()
    }

    #[test]
    fn test_totals_and_ranking() {
        let results: BTreeMap<_, _> = [
            result("o/a", 10, 5),
            result("o/b", 10, 9),
            result("o/c", 20, 2),
            result("o/d", 4, 3),
            result("o/e", 6, 6),
        ]
        .into_iter()
        .collect();

        let comparative = compare_repositories(&results);
        let summary = &comparative.summary;

        assert_eq!(summary.total_repositories, 5);
        assert_eq!(summary.total_prs, 50);
        assert_eq!(summary.total_merged_prs, 25);
        assert_eq!(summary.overall_merge_rate, Some(50.0));
        assert_eq!(names(&comparative.ranking), vec!["o/e", "o/b", "o/d", "o/a", "o/c"]);
        assert_eq!(names(&summary.best_performing), vec!["o/e", "o/b", "o/d"]);
        assert_eq!(names(&summary.worst_performing), vec!["o/c", "o/a", "o/d"]);
    }

    #[test]
    fn test_fewer_than_three_repositories() {
        let results: BTreeMap<_, _> = [result("o/a", 2, 1), result("o/b", 2, 2)]
            .into_iter()
            .collect();

        let summary = compare_repositories(&results).summary;
        assert_eq!(names(&summary.best_performing), vec!["o/b", "o/a"]);
        assert_eq!(names(&summary.worst_performing), vec!["o/a", "o/b"]);
    }

    #[test]
    fn test_no_repositories() {
        let summary = compare_repositories(&BTreeMap::new()).summary;
        assert_eq!(summary.total_repositories, 0);
        assert_eq!(summary.overall_merge_rate, None);
        assert!(summary.best_performing.is_empty());
        assert!(summary.worst_performing.is_empty());
    }
}

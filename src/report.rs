use chrono::Duration;
use std::collections::BTreeMap;

use crate::analysis::{collaboration_stats, compare_repositories, recommendations};
use crate::error::{Error, Result};
use crate::models::{AnalysisResult, ComparativeAnalysis, RepositoryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Markdown,
    Json,
}

pub fn render(results: &BTreeMap<String, RepositoryResult>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let comparative = compare_repositories(results);
            let report = serde_json::json!({
                "repositories": results,
                "comparative": comparative,
            });
            serde_json::to_string_pretty(&report).map_err(Error::from)
        }
        OutputFormat::Markdown => Ok(format_markdown(results)),
        OutputFormat::Text => Ok(format_text(results)),
    }
}

/// `3d 4h`, `5h 12m`, `42m`, or `n/a` for undefined values.
pub fn format_duration(duration: Option<Duration>) -> String {
    let Some(d) = duration else {
        return "n/a".to_string();
    };
    let days = d.num_days();
    let hours = d.num_hours() % 24;
    let minutes = d.num_minutes() % 60;
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if d.num_hours() > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", d.num_minutes())
    }
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r))
        .unwrap_or_else(|| "n/a".to_string())
}

fn format_text(results: &BTreeMap<String, RepositoryResult>) -> String {
    let mut output = String::new();

    for (name, result) in results {
        let analysis = &result.analysis;
        output.push_str(&format!("\n=== Results for {} ===\n\n", name));
        write_analysis_text(&mut output, analysis);

        let stats = collaboration_stats(&result.metrics);
        if !stats.authors.is_empty() {
            output.push_str("\nAuthors:\n");
            for author in &stats.authors {
                output.push_str(&format!(
                    "  {}: {} PR ({} merged)\n",
                    author.author, author.pr_count, author.merged_count
                ));
            }
        }
        if !stats.reviewers.is_empty() {
            output.push_str("\nReviewers:\n");
            for reviewer in &stats.reviewers {
                output.push_str(&format!("  {}: {} reviews\n", reviewer.reviewer, reviewer.review_count));
            }
        }
        output.push_str("\nAuthor/reviewer pairs:\n");
        if stats.pairs.is_empty() {
            output.push_str("  No pairs with 2+ interactions found\n");
        }
        for pair in &stats.pairs {
            output.push_str(&format!(
                "  {} <-> {}: {} collaborations\n",
                pair.author, pair.reviewer, pair.interactions
            ));
        }

        output.push_str("\nRecommendations:\n");
        for rec in recommendations(analysis) {
            let marker = if rec.is_warning() { "!" } else { "+" };
            output.push_str(&format!("  {} {}\n", marker, rec));
        }
    }

    if results.len() > 1 {
        write_comparative_text(&mut output, &compare_repositories(results));
    }

    output
}

fn write_analysis_text(output: &mut String, analysis: &AnalysisResult) {
    output.push_str(&format!("Total PRs: {}\n", analysis.total_prs));
    output.push_str(&format!(
        "Merged: {} ({})\n",
        analysis.merged_prs,
        format_rate(analysis.merge_rate)
    ));
    output.push_str(&format!("Closed without merge: {}\n", analysis.closed_without_merge));
    output.push_str(&format!("Average lifetime: {}\n", format_duration(analysis.average_lifetime)));
    output.push_str(&format!("Median lifetime: {}\n", format_duration(analysis.median_lifetime)));
    output.push_str(&format!(
        "Average time to first review: {}\n",
        format_duration(analysis.average_time_to_first_review)
    ));
    output.push_str(&format!(
        "Median time to first review: {}\n",
        format_duration(analysis.median_time_to_first_review)
    ));
    output.push_str(&format!(
        "Predicted time to merge: {}\n",
        format_duration(analysis.predicted_time_to_merge)
    ));
}

fn write_comparative_text(output: &mut String, comparative: &ComparativeAnalysis) {
    let summary = &comparative.summary;
    output.push_str(&format!("\n{}\n", "=".repeat(60)));
    output.push_str("COMPARATIVE ANALYSIS\n");
    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("Repositories: {}\n", summary.total_repositories));
    output.push_str(&format!("Total PRs: {}\n", summary.total_prs));
    output.push_str(&format!("Total merged: {}\n", summary.total_merged_prs));
    output.push_str(&format!("Overall merge rate: {}\n", format_rate(summary.overall_merge_rate)));

    output.push_str("\nBest performing:\n");
    for (i, repo) in summary.best_performing.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {} - {:.1}% merged, average lifetime {}\n",
            i + 1,
            repo.repository,
            repo.merge_rate,
            format_duration(repo.average_lifetime)
        ));
    }
    output.push_str("\nWorst performing:\n");
    for (i, repo) in summary.worst_performing.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {} - {:.1}% merged\n",
            i + 1,
            repo.repository,
            repo.merge_rate
        ));
    }
}

fn format_markdown(results: &BTreeMap<String, RepositoryResult>) -> String {
    let mut output = String::new();

    output.push_str("# Pull Request Velocity\n\n");
    output.push_str("| Repository | PRs | Merged | Merge rate | Median lifetime | Avg first review | Predicted merge |\n");
    output.push_str("|------------|-----|--------|------------|-----------------|------------------|-----------------|\n");

    for (name, result) in results {
        let a = &result.analysis;
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            name,
            a.total_prs,
            a.merged_prs,
            format_rate(a.merge_rate),
            format_duration(a.median_lifetime),
            format_duration(a.average_time_to_first_review),
            format_duration(a.predicted_time_to_merge)
        ));
    }

    for (name, result) in results {
        let recs = recommendations(&result.analysis);
        if recs.is_empty() {
            continue;
        }
        output.push_str(&format!("\n## {}\n\n", name));
        for rec in recs {
            output.push_str(&format!("- {}\n", rec));
        }
    }

    if results.len() > 1 {
        let summary = compare_repositories(results).summary;
        output.push_str("\n## Comparison\n\n");
        output.push_str(&format!(
            "**{}** PRs across **{}** repositories, overall merge rate **{}**.\n\n",
            summary.total_prs,
            summary.total_repositories,
            format_rate(summary.overall_merge_rate)
        ));
        for repo in &summary.best_performing {
            output.push_str(&format!("- {} ({:.1}%)\n", repo.repository, repo.merge_rate));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::RepoRef;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(None), "n/a");
        assert_eq!(format_duration(Some(Duration::minutes(42))), "42m");
        assert_eq!(format_duration(Some(Duration::minutes(5 * 60 + 12))), "5h 12m");
        assert_eq!(format_duration(Some(Duration::hours(76))), "3d 4h");
    }

    #[test]
    fn test_render_all_formats() {
        let mut results = BTreeMap::new();
        results.insert(
            "o/a".to_string(),
            RepositoryResult {
                repository: RepoRef::new("o", "a"),
                metrics: Vec::new(),
                analysis: aggregate(Vec::new()),
            },
        );

        let text = render(&results, OutputFormat::Text).unwrap();
        assert!(text.contains("=== Results for o/a ==="));
        assert!(text.contains("Merged: 0 (n/a)"));

        let markdown = render(&results, OutputFormat::Markdown).unwrap();
        assert!(markdown.contains("| o/a | 0 | 0 | n/a |"));

        let json: serde_json::Value =
            serde_json::from_str(&render(&results, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["comparative"]["summary"]["total_repositories"], 1);
        assert_eq!(json["repositories"]["o/a"]["repository"]["owner"], "o");
    }

    #[test]
    fn test_multiple_repositories_render_comparison() {
        let mut results = BTreeMap::new();
        for name in ["a", "b"] {
            results.insert(
                format!("o/{}", name),
                RepositoryResult {
                    repository: RepoRef::new("o", name),
                    metrics: Vec::new(),
                    analysis: aggregate(Vec::new()),
                },
            );
        }

        let text = render(&results, OutputFormat::Text).unwrap();
        assert!(text.contains("COMPARATIVE ANALYSIS\n"));
        assert!(text.contains("Repositories: 2\n"));
        assert!(text.contains("Overall merge rate: n/a\n"));
        assert!(text.contains("  No pairs with 2+ interactions found\n"));

        let markdown = render(&results, OutputFormat::Markdown).unwrap();
        assert!(markdown.contains("## Comparison"));
        assert!(markdown.contains("**0** PRs across **2** repositories"));
    }
}

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::{IssueComment, PrMetric, PullRequest, RepoRef, Review, GHOST_LOGIN};

/// Reduces one pull request and its activity to a [`PrMetric`].
///
/// `now` is the instant open pull requests are measured against. A first
/// review dated before the pull request was opened is reported as
/// [`Error::DataAnomaly`].
pub fn compute_metric(
    repository: &RepoRef,
    pr: &PullRequest,
    reviews: &[Review],
    comments: &[IssueComment],
    now: DateTime<Utc>,
) -> Result<PrMetric> {
    let first_review_at = first_review_time(reviews);

    let time_to_first_review = match first_review_at {
        Some(submitted) => {
            let elapsed = submitted - pr.created_at;
            if elapsed < chrono::Duration::zero() {
                return Err(Error::DataAnomaly(format!(
                    "first review of {}#{} at {} precedes creation at {}",
                    repository, pr.number, submitted, pr.created_at
                )));
            }
            elapsed
        }
        None => chrono::Duration::zero(),
    };

    let total_lifetime = match (pr.merged_at, pr.closed_at) {
        (Some(merged), _) => merged - pr.created_at,
        (None, Some(closed)) => closed - pr.created_at,
        (None, None) => now - pr.created_at,
    };

    Ok(PrMetric {
        repository: repository.full_name(),
        pr_number: pr.number,
        author: pr.author_login().unwrap_or(GHOST_LOGIN).to_string(),
        state: pr.state,
        created_at: pr.created_at,
        closed_at: pr.closed_at,
        merged_at: pr.merged_at,
        first_review_at,
        total_lifetime,
        time_to_first_review,
        reviewers: reviewers(reviews, pr.author_login()),
        comments_count: comments.len(),
        is_merged: pr.is_merged(),
    })
}

/// Earliest submission among submitted reviews, including reviews by
/// deleted accounts.
fn first_review_time(reviews: &[Review]) -> Option<DateTime<Utc>> {
    reviews.iter().filter_map(|r| r.submitted_at).min()
}

fn reviewers(reviews: &[Review], author: Option<&str>) -> BTreeSet<String> {
    reviews
        .iter()
        .filter(|r| r.submitted_at.is_some())
        .filter_map(Review::reviewer_login)
        .filter(|login| Some(*login) != author)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{PrState, User};
    use chrono::{Duration, TimeZone};

    pub(crate) fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    pub(crate) fn pr(number: u64, author: &str) -> PullRequest {
        PullRequest {
            number,
            state: PrState::Open,
            title: format!("PR {}", number),
            user: Some(User {
                login: author.to_string(),
            }),
            created_at: at(0),
            updated_at: at(0),
            closed_at: None,
            merged_at: None,
        }
    }

    pub(crate) fn review(login: &str, submitted: Option<i64>) -> Review {
        Review {
            user: Some(User {
                login: login.to_string(),
            }),
            state: "APPROVED".to_string(),
            submitted_at: submitted.map(at),
        }
    }

    fn comment(login: &str) -> IssueComment {
        IssueComment {
            user: Some(User {
                login: login.to_string(),
            }),
            created_at: at(1),
        }
    }

    fn repo() -> RepoRef {
        RepoRef::new("stmcginnis", "gofish")
    }

    #[test]
    fn test_merged_pr() {
        let mut merged = pr(1, "alice");
        merged.state = PrState::Closed;
        merged.closed_at = Some(at(10));
        merged.merged_at = Some(at(10));

        let reviews = vec![
            review("bob", Some(5)),
            review("carol", Some(2)),
            review("bob", Some(8)),
        ];
        let comments = vec![comment("bob"), comment("alice")];

        let metric = compute_metric(&repo(), &merged, &reviews, &comments, at(100)).unwrap();

        assert_eq!(metric.repository, "stmcginnis/gofish");
        assert!(metric.is_merged);
        assert_eq!(metric.total_lifetime, Duration::hours(10));
        assert_eq!(metric.first_review_at, Some(at(2)));
        assert_eq!(metric.time_to_first_review, Duration::hours(2));
        assert_eq!(
            metric.reviewers.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["bob", "carol"]
        );
        assert_eq!(metric.comments_count, 2);
        assert!(!metric.is_provisional());
    }

    #[test]
    fn test_pr_without_reviews() {
        let metric = compute_metric(&repo(), &pr(2, "alice"), &[], &[], at(5)).unwrap();

        assert_eq!(metric.time_to_first_review, Duration::zero());
        assert!(metric.first_review_at.is_none());
        assert!(!metric.has_review());
        assert!(metric.reviewers.is_empty());
    }

    #[test]
    fn test_pending_reviews_are_ignored() {
        let reviews = vec![review("bob", None), review("carol", Some(4))];
        let metric = compute_metric(&repo(), &pr(3, "alice"), &reviews, &[], at(5)).unwrap();

        assert_eq!(metric.time_to_first_review, Duration::hours(4));
        assert!(!metric.reviewers.contains("bob"));
        assert!(metric.reviewers.contains("carol"));
    }

    #[test]
    fn test_author_is_not_a_reviewer() {
        let reviews = vec![review("alice", Some(1)), review("bob", Some(3))];
        let metric = compute_metric(&repo(), &pr(4, "alice"), &reviews, &[], at(5)).unwrap();

        assert_eq!(metric.reviewers.len(), 1);
        assert!(metric.reviewers.contains("bob"));
        // The author's own review still counts as the first response.
        assert_eq!(metric.time_to_first_review, Duration::hours(1));
    }

    #[test]
    fn test_deleted_reviewer_counts_toward_first_review() {
        let mut ghost = review("unused", Some(2));
        ghost.user = None;
        let reviews = vec![ghost, review("bob", Some(6))];

        let metric = compute_metric(&repo(), &pr(8, "alice"), &reviews, &[], at(10)).unwrap();

        assert_eq!(metric.time_to_first_review, Duration::hours(2));
        assert_eq!(
            metric.reviewers.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["bob"]
        );
    }

    #[test]
    fn test_deleted_author_is_reported_as_ghost() {
        let mut orphan = pr(9, "unused");
        orphan.user = None;
        let reviews = vec![review("bob", Some(1))];

        let metric = compute_metric(&repo(), &orphan, &reviews, &[], at(10)).unwrap();

        assert_eq!(metric.author, GHOST_LOGIN);
        assert!(metric.reviewers.contains("bob"));
    }

    #[test]
    fn test_closed_without_merge_lifetime() {
        let mut closed = pr(5, "alice");
        closed.state = PrState::Closed;
        closed.closed_at = Some(at(7));

        let metric = compute_metric(&repo(), &closed, &[], &[], at(100)).unwrap();
        assert_eq!(metric.total_lifetime, Duration::hours(7));
        assert!(!metric.is_merged);
    }

    #[test]
    fn test_open_pr_lifetime_is_provisional() {
        let metric = compute_metric(&repo(), &pr(6, "alice"), &[], &[], at(30)).unwrap();
        assert_eq!(metric.total_lifetime, Duration::hours(30));
        assert!(metric.is_provisional());
    }

    #[test]
    fn test_review_before_creation_is_an_anomaly() {
        let mut late = pr(7, "alice");
        late.created_at = at(10);
        let reviews = vec![review("bob", Some(3))];

        let err = compute_metric(&repo(), &late, &reviews, &[], at(20)).unwrap_err();
        assert!(matches!(err, Error::DataAnomaly(_)));
    }
}

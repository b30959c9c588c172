use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use tokio::sync::Mutex;

/// Rate limit state reported by the last GitHub response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub limit: Option<u32>,
    pub remaining: u32,
    pub used: Option<u32>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitSnapshot {
    /// Reads the `x-ratelimit-*` headers. Returns `None` when the response
    /// carries no rate limit information.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        }

        let remaining = header::<u32>(headers, "x-ratelimit-remaining")?;
        let reset_at = header::<i64>(headers, "x-ratelimit-reset")
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        Some(Self {
            limit: header(headers, "x-ratelimit-limit"),
            remaining,
            used: header(headers, "x-ratelimit-used"),
            reset_at,
        })
    }

    /// Requests consumed in the current window.
    pub fn consumed(&self) -> Option<u32> {
        self.used
            .or_else(|| self.limit.map(|limit| limit.saturating_sub(self.remaining)))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Observes rate limit headers. It never delays requests itself; pacing is
/// left to the configured [`crate::pacing::Pacing`].
pub struct RateLimiter {
    state: Mutex<Option<RateLimitSnapshot>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    pub async fn update_from_headers(&self, headers: &HeaderMap) {
        let Some(snapshot) = RateLimitSnapshot::from_headers(headers) else {
            return;
        };

        tracing::debug!(
            remaining = snapshot.remaining,
            limit = ?snapshot.limit,
            consumed = ?snapshot.consumed(),
            reset_at = ?snapshot.reset_at,
            "GitHub rate limit"
        );
        if snapshot.is_exhausted() {
            tracing::warn!(
                "GitHub rate limit exhausted, resets at {}",
                snapshot
                    .reset_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string())
            );
        }

        *self.state.lock().await = Some(snapshot);
    }

    pub async fn snapshot(&self) -> Option<RateLimitSnapshot> {
        *self.state.lock().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

type DelayFn = dyn Fn(u32) -> Duration + Send + Sync;

/// Delay strategy applied between consecutive requests.
///
/// The strategy maps the number of requests already made in the current
/// sequence to the time to wait before the next one. Waiting is an
/// unconditional sleep on the calling task.
#[derive(Clone)]
pub struct Pacing {
    strategy: Arc<DelayFn>,
}

impl Pacing {
    pub fn fixed(delay: Duration) -> Self {
        Self::from_fn(move |_| delay)
    }

    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn from_fn<F>(strategy: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            strategy: Arc::new(strategy),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        (self.strategy)(attempt)
    }

    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            tracing::trace!("Pacing: sleeping {:?} after attempt {}", delay, attempt);
            sleep(delay).await;
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pacing")
            .field("first_delay", &self.delay_for(1))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_ignores_attempt() {
        let pacing = Pacing::fixed(Duration::from_millis(500));
        assert_eq!(pacing.delay_for(1), Duration::from_millis(500));
        assert_eq!(pacing.delay_for(40), Duration::from_millis(500));
    }

    #[test]
    fn test_custom_strategy() {
        let pacing = Pacing::from_fn(|attempt| Duration::from_millis(100 * attempt as u64));
        assert_eq!(pacing.delay_for(3), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_none_does_not_sleep() {
        let start = std::time::Instant::now();
        Pacing::none().wait(1).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}

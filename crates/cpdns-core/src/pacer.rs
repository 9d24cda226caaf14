//! Minimum spacing between outbound requests
//!
//! The panel tolerates only a slow, human-like request rate, so every
//! outbound call (IP discovery, each DNS query, each panel request) goes
//! through one shared [`Pacer`]. The spacing is enforced on every request,
//! not only after errors.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default minimum delay between two outbound requests
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Shared request pacer
///
/// Cloning is cheap and every clone shares the same "last request" instant.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_delay: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl Pacer {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Pacer that never waits (for tests and library callers that pace themselves)
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until the minimum delay since the previous request has elapsed,
    /// then mark a new request as started
    ///
    /// The lock is held while sleeping so two callers can never be released
    /// inside the same window.
    pub async fn wait(&self, label: &str) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_delay;
            if ready_at > Instant::now() {
                tracing::trace!("Pacing request '{}' until {:?}", label, ready_at);
                tokio::time::sleep_until(ready_at).await;
            }
        }

        tracing::debug!("Request: {}", label);
        *last = Some(Instant::now());
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_not_delayed() {
        let pacer = Pacer::default();
        let start = Instant::now();
        pacer.wait("first").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_requests_are_spaced() {
        let pacer = Pacer::default();
        let start = Instant::now();

        pacer.wait("a").await;
        pacer.wait("b").await;
        pacer.wait("c").await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_state() {
        let pacer = Pacer::new(Duration::from_millis(700));
        let other = pacer.clone();
        let start = Instant::now();

        pacer.wait("a").await;
        other.wait("b").await;

        assert!(start.elapsed() >= Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_idle_period() {
        let pacer = Pacer::default();
        pacer.wait("a").await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let start = Instant::now();
        pacer.wait("b").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

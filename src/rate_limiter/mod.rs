use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Fixed-interval gate between consecutive upstream requests.
///
/// The first request passes immediately. Every later request waits until at
/// least `delay` has elapsed since the previous one was let through, so time
/// spent parsing a response counts towards the interval.
pub struct RateLimiter {
    delay: Duration,
    last_request: Option<Instant>,
    request_count: usize,
}

impl RateLimiter {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            last_request: None,
            request_count: 0,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(deadline) = self.next_allowed() {
            sleep_until(deadline).await;
        }
        self.record();
    }

    pub fn set_delay(&mut self, delay_ms: u64) {
        self.delay = Duration::from_millis(delay_ms);
    }

    pub fn request_count(&self) -> usize {
        self.request_count
    }

    fn next_allowed(&self) -> Option<Instant> {
        self.last_request.map(|last| last + self.delay)
    }

    fn record(&mut self) {
        self.last_request = Some(Instant::now());
        self.request_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_not_delayed() {
        let mut limiter = RateLimiter::new(300);
        let start = Instant::now();

        limiter.wait().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_requests_are_spaced() {
        let mut limiter = RateLimiter::new(300);
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(600));
    }
}

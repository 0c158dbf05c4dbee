//! Fixed-interval send throttle.
//!
//! Sends are sequential; the throttle only guarantees a minimum gap between
//! two consecutive `acquire` calls on the same instance.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct SendThrottle {
    interval: Duration,
    last_send: Option<Instant>,
}

impl SendThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_send: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the interval has passed since the previous acquire.
    /// The first acquire returns immediately.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_send {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                tracing::debug!("Throttling send for {}ms", wait.as_millis());
                tokio::time::sleep(wait).await;
            }
        }
        self.last_send = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let mut throttle = SendThrottle::new(Duration::from_secs(10));
        let start = std::time::Instant::now();
        throttle.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_spacing_between_acquires() {
        let mut throttle = SendThrottle::new(Duration::from_millis(40));
        let start = std::time::Instant::now();
        throttle.acquire().await;
        throttle.acquire().await;
        throttle.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_zero_interval_never_sleeps() {
        let mut throttle = SendThrottle::new(Duration::ZERO);
        let start = std::time::Instant::now();
        for _ in 0..100 {
            throttle.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}

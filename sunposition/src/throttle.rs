//! "Last value per interval" rate limiting for frame consumers.
//!
//! Sensors run far faster than a display refreshes. A renderer wraps its
//! frame receiver in [`ThrottleLast`] and gets at most one value per interval,
//! always the newest one seen in that window.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Throttled view of a broadcast receiver.
#[derive(Debug)]
pub struct ThrottleLast<T> {
    rx: broadcast::Receiver<T>,
    interval: Duration,
}

impl<T: Clone> ThrottleLast<T> {
    /// Throttle `rx` to one value per `interval`.
    pub fn new(rx: broadcast::Receiver<T>, interval: Duration) -> Self {
        Self { rx, interval }
    }

    /// The throttle interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next window and return its last value.
    ///
    /// The window opens when a value arrives and closes `interval` later.
    /// Returns `None` once the sender is gone and everything is drained.
    pub async fn next(&mut self) -> Option<T> {
        let mut latest = self.recv_first().await?;

        tokio::time::sleep(self.interval).await;

        loop {
            match self.rx.try_recv() {
                Ok(value) => latest = value,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Throttled receiver lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        Some(latest)
    }

    async fn recv_first(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Throttled receiver lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_collapses_to_last() {
        let (tx, rx) = broadcast::channel(16);
        let mut throttle = ThrottleLast::new(rx, Duration::from_millis(20));

        for i in 0..5 {
            tx.send(i).unwrap();
        }

        assert_eq!(throttle.next().await, Some(4));
    }

    #[tokio::test]
    async fn test_separate_windows_emit_separately() {
        let (tx, rx) = broadcast::channel(16);
        let mut throttle = ThrottleLast::new(rx, Duration::from_millis(10));

        tx.send(1).unwrap();
        assert_eq!(throttle.next().await, Some(1));

        tx.send(2).unwrap();
        tx.send(3).unwrap();
        assert_eq!(throttle.next().await, Some(3));
    }

    #[tokio::test]
    async fn test_lag_is_skipped() {
        let (tx, rx) = broadcast::channel(2);
        let mut throttle = ThrottleLast::new(rx, Duration::from_millis(5));

        for i in 0..10 {
            tx.send(i).unwrap();
        }

        assert_eq!(throttle.next().await, Some(9));
    }

    #[tokio::test]
    async fn test_closed_returns_none() {
        let (tx, rx) = broadcast::channel::<u32>(4);
        let mut throttle = ThrottleLast::new(rx, Duration::from_millis(5));

        tx.send(7).unwrap();
        drop(tx);

        assert_eq!(throttle.next().await, Some(7));
        assert_eq!(throttle.next().await, None);
    }
}

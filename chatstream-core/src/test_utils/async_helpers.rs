//! Async test helpers
//!
//! Utilities for testing event subscriptions: receiving with a timeout,
//! asserting silence, and collecting or draining what a channel holds.

use std::future::Future;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Duration};

/// Default timeout duration for tests (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Short timeout for tests that should fail fast (100ms)
pub const SHORT_TEST_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvTimeoutError {
    #[error("receive operation timed out")]
    Timeout,
    #[error("channel closed")]
    Closed,
    /// The subscriber fell behind and this many events were dropped
    #[error("subscriber lagged by {0} events")]
    Lagged(u64),
}

impl From<broadcast::error::RecvError> for RecvTimeoutError {
    fn from(e: broadcast::error::RecvError) -> Self {
        match e {
            broadcast::error::RecvError::Closed => RecvTimeoutError::Closed,
            broadcast::error::RecvError::Lagged(n) => RecvTimeoutError::Lagged(n),
        }
    }
}

/// Receive the next event from a hub subscription with a timeout
pub async fn recv_timeout<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    duration: Duration,
) -> Result<T, RecvTimeoutError> {
    Ok(timeout(duration, rx.recv()).await.map_err(|_| RecvTimeoutError::Timeout)??)
}

/// Receive from an unbounded mpsc channel with a timeout
pub async fn recv_unbounded_timeout<T>(
    rx: &mut mpsc::UnboundedReceiver<T>,
    duration: Duration,
) -> Result<T, RecvTimeoutError> {
    timeout(duration, rx.recv())
        .await
        .map_err(|_| RecvTimeoutError::Timeout)?
        .ok_or(RecvTimeoutError::Closed)
}

/// Helper to collect N events from a subscription with timeout
pub async fn collect_n<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    count: usize,
    per_event_timeout: Duration,
) -> Result<Vec<T>, RecvTimeoutError> {
    let mut results = Vec::with_capacity(count);
    for _ in 0..count {
        results.push(recv_timeout(rx, per_event_timeout).await?);
    }
    Ok(results)
}

/// Helper to drain all buffered events without blocking
pub fn try_drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut results = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => results.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    results
}

/// Assert nothing arrives on `rx` within `duration`
pub async fn assert_no_event<T: Clone + std::fmt::Debug>(
    rx: &mut broadcast::Receiver<T>,
    duration: Duration,
) {
    match recv_timeout(rx, duration).await {
        Ok(event) => panic!("Expected no event within {:?}, got {:?}", duration, event),
        Err(RecvTimeoutError::Lagged(n)) => panic!("Expected no event, subscriber lagged by {}", n),
        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Closed) => {}
    }
}

/// Helper to assert a future completes within duration
pub async fn assert_completes_within<F, T>(duration: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => panic!("Future did not complete within {:?}", duration),
    }
}

/// Let spawned tasks (pumps, notifier) run until they are idle
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recv_timeout_success() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send(42).unwrap();
        assert_eq!(recv_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await, Ok(42));
    }

    #[tokio::test]
    async fn test_recv_timeout_times_out() {
        let (_tx, mut rx) = broadcast::channel::<i32>(4);
        let result = recv_timeout(&mut rx, SHORT_TEST_TIMEOUT).await;
        assert_eq!(result, Err(RecvTimeoutError::Timeout));
    }

    #[tokio::test]
    async fn test_recv_timeout_closed() {
        let (tx, mut rx) = broadcast::channel::<i32>(4);
        drop(tx);
        let result = recv_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await;
        assert_eq!(result, Err(RecvTimeoutError::Closed));
    }

    #[tokio::test]
    async fn test_recv_timeout_reports_lag() {
        let (tx, mut rx) = broadcast::channel(1);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        assert_eq!(recv_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await, Err(RecvTimeoutError::Lagged(1)));
        assert_eq!(recv_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await, Ok(2));
    }

    #[tokio::test]
    async fn test_collect_n_and_drain() {
        let (tx, mut rx) = broadcast::channel(10);
        for i in 0..5 {
            tx.send(i).unwrap();
        }
        assert_eq!(collect_n(&mut rx, 3, DEFAULT_TEST_TIMEOUT).await.unwrap(), vec![0, 1, 2]);
        assert_eq!(try_drain(&mut rx), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_assert_no_event_passes_on_silence() {
        let (_tx, mut rx) = broadcast::channel::<i32>(4);
        assert_no_event(&mut rx, SHORT_TEST_TIMEOUT).await;
    }

    #[tokio::test]
    #[should_panic(expected = "Expected no event")]
    async fn test_assert_no_event_panics_on_event() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send(1).unwrap();
        assert_no_event(&mut rx, SHORT_TEST_TIMEOUT).await;
    }

    #[tokio::test]
    async fn test_recv_unbounded_timeout() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send("x").unwrap();
        assert_eq!(recv_unbounded_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await, Ok("x"));
        drop(tx);
        assert_eq!(
            recv_unbounded_timeout(&mut rx, DEFAULT_TEST_TIMEOUT).await,
            Err(RecvTimeoutError::Closed)
        );
    }
}

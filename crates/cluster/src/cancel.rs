//! Cancellation and deadline guard for cluster I/O

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::ClusterError;

/// Signal checked at every cluster I/O boundary.
///
/// Carries an optional external shutdown signal and an optional deadline.
/// Cloning is cheap and every clone observes the same signal.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    signal: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A guard that never cancels
    pub fn none() -> Self {
        Self::default()
    }

    /// Cancel once the sender publishes `true`
    pub fn from_signal(signal: watch::Receiver<bool>) -> Self {
        Self {
            signal: Some(signal),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.as_ref().is_some_and(|signal| *signal.borrow())
    }

    fn check(&self) -> Result<(), ClusterError> {
        if self.is_cancelled() {
            return Err(ClusterError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ClusterError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run one cluster read, aborting it on cancellation or deadline
    pub async fn guard<T, F>(&self, operation: F) -> Result<T, ClusterError>
    where
        F: Future<Output = Result<T, ClusterError>>,
    {
        self.check()?;

        let mut signal = self.signal.clone();
        let cancelled = async move {
            match signal.as_mut() {
                Some(signal) => loop {
                    if *signal.borrow_and_update() {
                        return;
                    }
                    if signal.changed().await.is_err() {
                        // Sender gone, nothing can cancel us any more
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = operation => result,
            _ = cancelled => Err(ClusterError::Cancelled),
            _ = expired => Err(ClusterError::DeadlineExceeded),
        }
    }
}

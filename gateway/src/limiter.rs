//! Bounds concurrent calls into the model daemon.
//!
//! A local daemon typically serves one generation at a time. Callers beyond
//! `max_concurrent` wait in a bounded queue; when the queue is full they are
//! rejected at once, and a waiter that exceeds the queue timeout gives up.

use localgate_core::ConcurrencyConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitError {
    #[error("too many queued requests ({0} waiting)")]
    QueueFull(usize),
    #[error("timed out after {0:?} waiting for the model daemon")]
    QueueTimeout(Duration),
    #[error("request limiter is closed")]
    Closed,
}

pub struct RequestLimiter {
    semaphore: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    max_concurrent: usize,
    max_queue: usize,
    queue_timeout: Duration,
}

/// Held while a daemon call is in flight; the slot frees on drop
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

/// Decrements the waiting count however the wait ends
struct WaitingGuard(Arc<AtomicUsize>);

impl Drop for WaitingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RequestLimiter {
    pub fn new(max_concurrent: usize, max_queue: usize, queue_timeout: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            waiting: Arc::new(AtomicUsize::new(0)),
            max_concurrent,
            max_queue,
            queue_timeout,
        }
    }

    pub fn from_config(config: &ConcurrencyConfig) -> Self {
        Self::new(config.max_concurrent, config.max_queue, config.queue_timeout())
    }

    /// Calls currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Calls currently waiting for a slot
    pub fn queued(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub async fn acquire(&self) -> Result<Permit, LimitError> {
        if let Ok(permit) = self.semaphore.clone().try_acquire_owned() {
            return Ok(Permit { _permit: permit });
        }

        let max_queue = self.max_queue;
        self.waiting
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max_queue).then_some(n + 1)
            })
            .map_err(LimitError::QueueFull)?;
        let _waiting = WaitingGuard(self.waiting.clone());

        tracing::debug!("Queued for model daemon ({} waiting)", self.queued());

        match tokio::time::timeout(self.queue_timeout, self.semaphore.clone().acquire_owned()).await
        {
            Ok(Ok(permit)) => Ok(Permit { _permit: permit }),
            Ok(Err(_)) => Err(LimitError::Closed),
            Err(_) => Err(LimitError::QueueTimeout(self.queue_timeout)),
        }
    }
}

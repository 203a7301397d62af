//! Counting-semaphore concurrency limiter with cancellable acquisition.

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Caps how many units of work may run at the same instant.
///
/// The capacity is fixed at construction. Clones share the same slots.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots (must be at least 1)
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
            return Err(Error::Config {
                message: format!(
                    "concurrency limit must be between 1 and {}, got {}",
                    Semaphore::MAX_PERMITS,
                    capacity
                ),
                key: None,
            });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait for a free slot.
    ///
    /// Returns `None` as soon as `cancel` fires, without taking a slot. A token
    /// that is already cancelled never acquires, even when slots are free.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Option<LimiterPermit> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                // The semaphore is never closed, so Err is unreachable in practice
                permit.ok().map(|permit| LimiterPermit { _permit: permit })
            }
        }
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// A held limiter slot, released when dropped.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl LimiterPermit {
    /// Give the slot back now instead of at end of scope
    pub fn release(self) {
        drop(self);
    }
}

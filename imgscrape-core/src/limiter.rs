use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// A held slot in a [`ConcurrencyLimiter`]. The slot is returned when the
/// permit is dropped, whichever way the guarded work exits.
pub type Permit = OwnedSemaphorePermit;

/// Fixed-capacity gate bounding how many units of a stage run at once.
///
/// Cloning is cheap and every clone shares the same pool. Waiters are served
/// in FIFO order.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits until fewer than `capacity` permits are held and takes one.
    ///
    /// Only fails if the underlying semaphore was closed, which this type
    /// never does.
    pub async fn acquire(&self) -> Result<Permit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}

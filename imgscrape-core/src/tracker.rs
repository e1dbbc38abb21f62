use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Counts the outstanding units of work of one stage.
///
/// [`CompletionTracker::track`] registers a unit and hands back a guard; the
/// unit counts as finished when the guard is dropped, including on early
/// return or panic.
#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    outstanding: AtomicUsize,
    idle: Notify,
}

/// Guard for one registered unit of work.
#[derive(Debug)]
pub struct TrackedUnit {
    inner: Arc<Inner>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self) -> TrackedUnit {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        TrackedUnit {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Resolves once no tracked unit is outstanding. Returns immediately if
    /// nothing was ever tracked.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before checking the count so a concurrent final drop
            // cannot slip between the check and the await.
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for TrackedUnit {
    fn drop(&mut self) {
        if self.inner.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

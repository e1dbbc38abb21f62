use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Filter that lets each distinct link through once.
///
/// The seen set lives inside this value and the value is moved into a single
/// task by [`spawn_dedup`], so no other task can reach it and no lock is
/// involved.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `link` and reports whether this was its first occurrence.
    pub fn admit(&mut self, link: &str) -> bool {
        if self.seen.contains(link) {
            return false;
        }
        self.seen.insert(link.to_string())
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Reads `input` until it is closed and drained, forwarding first
    /// occurrences to `output` in arrival order. `output` is dropped on
    /// return, which closes the downstream channel.
    ///
    /// Returns how many links were forwarded.
    pub async fn run(mut self, mut input: mpsc::Receiver<String>, output: mpsc::Sender<String>) -> usize {
        let mut forwarded = 0;
        let mut downstream_open = true;

        while let Some(link) = input.recv().await {
            if !self.admit(&link) {
                debug!("Skipping duplicate link {}", link);
                continue;
            }

            // Keep draining after the receiver goes away so crawl units
            // blocked on send can still finish.
            if downstream_open {
                if output.send(link).await.is_err() {
                    warn!("Download channel closed, discarding further unique links");
                    downstream_open = false;
                } else {
                    forwarded += 1;
                }
            }
        }

        debug!(
            "Link channel drained: {} unique of {} seen",
            forwarded,
            self.seen_count()
        );
        forwarded
    }
}

/// Starts the dedup stage as its own task.
pub fn spawn_dedup(input: mpsc::Receiver<String>, output: mpsc::Sender<String>) -> JoinHandle<usize> {
    tokio::spawn(Deduplicator::new().run(input, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_once() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.admit("a.png"));
        assert!(!dedup.admit("a.png"));
        assert!(dedup.admit("A.png"));
        assert_eq!(dedup.seen_count(), 2);
    }

    #[tokio::test]
    async fn test_closes_output_when_input_closes() {
        let (in_tx, in_rx) = mpsc::channel::<String>(1);
        let (out_tx, mut out_rx) = mpsc::channel::<String>(1);
        let handle = spawn_dedup(in_rx, out_tx);

        drop(in_tx);

        assert!(out_rx.recv().await.is_none());
        assert_eq!(handle.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drains_input_after_output_dropped() {
        let (in_tx, in_rx) = mpsc::channel::<String>(1);
        let (out_tx, out_rx) = mpsc::channel::<String>(1);
        drop(out_rx);
        let handle = spawn_dedup(in_rx, out_tx);

        for i in 0..10 {
            in_tx.send(format!("{}.png", i)).await.unwrap();
        }
        drop(in_tx);

        assert_eq!(handle.await.unwrap(), 0);
    }
}

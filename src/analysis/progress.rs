//! Progress Reporting
//!
//! Workers report on a bounded channel as each file starts and finishes.
//! `total` counts every analyzable file of the run; files settled without a
//! model call (cache hits, unreadable files) are counted as completed from
//! the first update. The completed count lives in an atomic counter; updates are sent under a
//! lock so the receiver always sees non-decreasing `completed` values even
//! though workers finish in any order. The channel closes when the analyzer
//! drops its sender at the end of the run.
//!
//! The observer must keep draining the receiver while the run is active:
//! a full channel blocks the workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};

use crate::constants::progress as progress_constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Started,
    Finished,
}

/// One progress tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub total: usize,
    pub completed: usize,
    pub current: String,
    pub event: ProgressEvent,
}

impl ProgressUpdate {
    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

pub type ProgressReceiver = mpsc::Receiver<ProgressUpdate>;

/// Sending half handed to the analyzer; `silent()` reports nowhere
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<ProgressUpdate>>,
}

impl ProgressReporter {
    /// Bounded reporter/receiver pair
    pub fn channel() -> (Self, ProgressReceiver) {
        Self::with_capacity(progress_constants::CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, ProgressReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    pub fn silent() -> Self {
        Self { tx: None }
    }

    /// Bind to a run of `total` units, `settled` of which are already done
    pub(crate) fn track(self, total: usize, settled: usize) -> Arc<ProgressTracker> {
        Arc::new(ProgressTracker {
            tx: self.tx,
            total,
            completed: AtomicUsize::new(settled.min(total)),
            send_lock: Mutex::new(()),
        })
    }
}

/// Per-run progress state shared by all workers
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    tx: Option<mpsc::Sender<ProgressUpdate>>,
    total: usize,
    completed: AtomicUsize,
    send_lock: Mutex<()>,
}

impl ProgressTracker {
    pub async fn started(&self, path: &str) {
        let Some(tx) = &self.tx else { return };
        let _guard = self.send_lock.lock().await;
        let update = ProgressUpdate {
            total: self.total,
            completed: self.completed.load(Ordering::SeqCst),
            current: path.to_string(),
            event: ProgressEvent::Started,
        };
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(update).await;
    }

    pub async fn finished(&self, path: &str) {
        let Some(tx) = &self.tx else {
            self.completed.fetch_add(1, Ordering::SeqCst);
            return;
        };
        let _guard = self.send_lock.lock().await;
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let update = ProgressUpdate {
            total: self.total,
            completed,
            current: path.to_string(),
            event: ProgressEvent::Finished,
        };
        let _ = tx.send(update).await;
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_updates_are_monotonic_and_channel_closes() {
        let (reporter, mut rx) = ProgressReporter::with_capacity(4);
        let tracker = reporter.track(20, 0);

        let mut handles = Vec::new();
        for i in 0..20 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                let path = format!("f{i}.rs");
                tracker.started(&path).await;
                tokio::task::yield_now().await;
                tracker.finished(&path).await;
            }));
        }

        let collector = tokio::spawn(async move {
            let mut updates = Vec::new();
            while let Some(update) = rx.recv().await {
                updates.push(update);
            }
            updates
        });

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(tracker.completed(), 20);
        drop(tracker);

        let updates = collector.await.unwrap();
        assert_eq!(updates.len(), 40);
        for pair in updates.windows(2) {
            assert!(pair[0].completed <= pair[1].completed);
        }
        let last = updates.last().unwrap();
        assert!(last.is_done());
        assert_eq!(
            updates
                .iter()
                .filter(|u| u.event == ProgressEvent::Finished)
                .count(),
            20
        );
    }

    #[tokio::test]
    async fn test_silent_reporter_still_counts() {
        let tracker = ProgressReporter::silent().track(2, 0);
        tracker.started("a").await;
        tracker.finished("a").await;
        tracker.finished("b").await;
        assert_eq!(tracker.completed(), 2);
    }

    #[tokio::test]
    async fn test_settled_units_are_credited_up_front() {
        let (reporter, mut rx) = ProgressReporter::with_capacity(4);
        let tracker = reporter.track(100, 95);
        tracker.started("a.rs").await;
        tracker.finished("a.rs").await;
        drop(tracker);

        let first = rx.recv().await.unwrap();
        assert_eq!((first.completed, first.total), (95, 100));
        let second = rx.recv().await.unwrap();
        assert_eq!((second.completed, second.total), (96, 100));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_block() {
        let (reporter, rx) = ProgressReporter::with_capacity(1);
        drop(rx);
        let tracker = reporter.track(3, 0);
        for path in ["a", "b", "c"] {
            tracker.finished(path).await;
        }
        assert_eq!(tracker.completed(), 3);
    }
}

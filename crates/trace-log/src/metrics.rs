use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct LogMetrics {
    inner: Arc<LogMetricsInner>,
}

#[derive(Default)]
struct LogMetricsInner {
    appended: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    dropped_after_close: AtomicU64,
    queue_depth: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogMetricsSnapshot {
    pub appended: u64,
    pub written: u64,
    pub failed: u64,
    pub dropped_after_close: u64,
    pub queue_depth: u64,
}

impl LogMetrics {
    pub fn record_append(&self) {
        self.inner.appended.fetch_add(1, Ordering::Relaxed);
        self.inner.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self) {
        self.inner.written.fetch_add(1, Ordering::Relaxed);
        self.dequeue();
    }

    pub fn record_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
        self.dequeue();
    }

    pub fn record_dropped_after_close(&self) {
        self.inner
            .dropped_after_close
            .fetch_add(1, Ordering::Relaxed);
    }

    fn dequeue(&self) {
        let _ = self
            .inner
            .queue_depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |depth| {
                Some(depth.saturating_sub(1))
            });
    }

    pub fn snapshot(&self) -> LogMetricsSnapshot {
        LogMetricsSnapshot {
            appended: self.inner.appended.load(Ordering::Relaxed),
            written: self.inner.written.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            dropped_after_close: self.inner.dropped_after_close.load(Ordering::Relaxed),
            queue_depth: self.inner.queue_depth.load(Ordering::Relaxed),
        }
    }
}

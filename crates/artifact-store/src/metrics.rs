use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ArtifactMetrics {
    inner: Arc<ArtifactMetricsInner>,
}

#[derive(Default)]
struct ArtifactMetricsInner {
    requested: AtomicU64,
    written: AtomicU64,
    deduplicated: AtomicU64,
    failed: AtomicU64,
    bytes_written: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArtifactMetricsSnapshot {
    pub requested: u64,
    pub written: u64,
    pub deduplicated: u64,
    pub failed: u64,
    pub bytes_written: u64,
}

impl ArtifactMetrics {
    pub fn record_requested(&self) {
        self.inner.requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self, bytes: usize) {
        self.inner.written.fetch_add(1, Ordering::Relaxed);
        self.inner
            .bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_deduplicated(&self) {
        self.inner.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ArtifactMetricsSnapshot {
        ArtifactMetricsSnapshot {
            requested: self.inner.requested.load(Ordering::Relaxed),
            written: self.inner.written.load(Ordering::Relaxed),
            deduplicated: self.inner.deduplicated.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            bytes_written: self.inner.bytes_written.load(Ordering::Relaxed),
        }
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{ArtifactErrKind, ArtifactResult};
use crate::fs::layout;
use crate::fs::writer::{write_if_absent, WriteOutcome};
use crate::hash::{is_sha1_hex, sha1_hex};
use crate::metrics::ArtifactMetrics;
use crate::policy::ArtifactCfg;

enum Command {
    Write { hash: String, bytes: Arc<[u8]> },
    Flush(oneshot::Sender<()>),
}

/// Content-addressed blob store handle owned by one session tracer.
///
/// Writes are queued and performed one at a time by a background task, so
/// they never wait on journal appends and never fan out file descriptors.
pub struct ArtifactStore {
    root: PathBuf,
    tx: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    metrics: ArtifactMetrics,
}

impl ArtifactStore {
    /// Starts the writer task. Must be called from within a tokio runtime.
    pub fn spawn(cfg: ArtifactCfg, metrics: ArtifactMetrics) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let root = cfg.root.clone();
        let worker = tokio::spawn(run(cfg, rx, metrics.clone()));
        Self {
            root,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            metrics,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blob_path(&self, hash: &str) -> PathBuf {
        layout::blob_path(&self.root, hash)
    }

    pub fn metrics(&self) -> ArtifactMetrics {
        self.metrics.clone()
    }

    /// Queues `bytes` under `hash`. Fire-and-forget: failures are logged and
    /// counted, never returned.
    pub fn write(&self, hash: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        let hash = hash.into();
        self.metrics.record_requested();
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            debug!(%hash, "artifact store closed; dropping blob");
            self.metrics.record_failed();
            return;
        };
        if tx
            .send(Command::Write {
                hash,
                bytes: bytes.into(),
            })
            .is_err()
        {
            self.metrics.record_failed();
        }
    }

    /// Hashes `bytes`, queues the write and returns the hash.
    pub fn write_bytes(&self, bytes: Vec<u8>) -> String {
        let hash = sha1_hex(&bytes);
        self.write(hash.clone(), bytes);
        hash
    }

    /// Resolves once every write queued before the call has been handled.
    pub async fn flush(&self) -> ArtifactResult<()> {
        let (reply, done) = oneshot::channel();
        {
            let guard = self.tx.lock();
            let tx = guard.as_ref().ok_or(ArtifactErrKind::Closed)?;
            tx.send(Command::Flush(reply))
                .map_err(|_| ArtifactErrKind::Closed)?;
        }
        done.await.map_err(|_| ArtifactErrKind::Closed.into())
    }

    /// Stops accepting writes and waits for every pending write. Idempotent.
    pub async fn close(&self) -> ArtifactResult<()> {
        drop(self.tx.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker
                .await
                .map_err(|err| ArtifactErrKind::Worker(err.to_string()))?;
        }
        Ok(())
    }
}

async fn run(cfg: ArtifactCfg, mut rx: mpsc::UnboundedReceiver<Command>, metrics: ArtifactMetrics) {
    let dir = layout::blob_dir(&cfg.root);
    if let Err(err) = fs::create_dir_all(&dir).await {
        warn!(dir = %dir.display(), ?err, "failed to create artifact directory");
    }
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Write { hash, bytes } => store_blob(&cfg, &hash, &bytes, &metrics).await,
            Command::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
}

async fn store_blob(cfg: &ArtifactCfg, hash: &str, bytes: &[u8], metrics: &ArtifactMetrics) {
    if !is_sha1_hex(hash) {
        warn!(%hash, "rejecting artifact with non-canonical hash");
        metrics.record_failed();
        return;
    }
    let path = layout::blob_path(&cfg.root, hash);
    match write_if_absent(&path, bytes, cfg.sync_data).await {
        Ok(WriteOutcome::Written) => metrics.record_written(bytes.len()),
        Ok(WriteOutcome::AlreadyPresent) => metrics.record_deduplicated(),
        Err(err) => {
            warn!(path = %path.display(), ?err, "artifact write failed");
            metrics.record_failed();
        }
    }
}

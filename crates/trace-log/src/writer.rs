use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tracerec_core_types::monotonic_time;

use crate::config::LogCfg;
use crate::errors::{LogErrorKind, LogResult};
use crate::metrics::LogMetrics;
use crate::model::{TraceEvent, TraceRecord};

enum Command {
    Append(TraceRecord),
    Flush(oneshot::Sender<()>),
}

/// Append-only journal for one session.
///
/// Every append is stamped when it is submitted and queued on a single
/// channel drained by one writer task, so lines land in submission order no
/// matter which task submitted them or how long each write takes.
pub struct TraceLogWriter {
    path: PathBuf,
    tx: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    metrics: LogMetrics,
}

impl TraceLogWriter {
    /// Starts the writer task. Must be called from within a tokio runtime.
    pub fn spawn(cfg: LogCfg, metrics: LogMetrics) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let path = cfg.path.clone();
        let state = LogWriterState::new(cfg, metrics.clone());
        let worker = tokio::spawn(state.run(rx));
        Self {
            path,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            metrics,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metrics(&self) -> LogMetrics {
        self.metrics.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }

    /// Queues `event` stamped with the current monotonic time. Never blocks
    /// and never fails; once the writer is closed the event is dropped.
    pub fn append(&self, event: TraceEvent) {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            self.metrics.record_dropped_after_close();
            debug!(kind = event.kind(), "trace log closed; dropping event");
            return;
        };
        let record = TraceRecord::new(event, monotonic_time());
        if tx.send(Command::Append(record)).is_ok() {
            self.metrics.record_append();
        } else {
            self.metrics.record_dropped_after_close();
        }
    }

    /// Resolves once every record appended before the call has been handled.
    pub async fn flush(&self) -> LogResult<()> {
        let (reply, done) = oneshot::channel();
        {
            let guard = self.tx.lock();
            let tx = guard.as_ref().ok_or(LogErrorKind::Closed)?;
            tx.send(Command::Flush(reply))
                .map_err(|_| LogErrorKind::Closed)?;
        }
        done.await.map_err(|_| LogErrorKind::Closed.into())
    }

    /// Stops accepting appends and waits for the queue to drain. Safe to call
    /// more than once.
    pub async fn close(&self) -> LogResult<()> {
        drop(self.tx.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker
                .await
                .map_err(|err| LogErrorKind::Worker(err.to_string()))?;
        }
        Ok(())
    }
}

struct LogWriterState {
    cfg: LogCfg,
    file: Option<File>,
    metrics: LogMetrics,
}

impl LogWriterState {
    fn new(cfg: LogCfg, metrics: LogMetrics) -> Self {
        Self {
            cfg,
            file: None,
            metrics,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        if let Err(err) = self.prepare_dir().await {
            warn!(path = %self.cfg.path.display(), ?err, "failed to create trace directory");
        }
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Append(record) => match self.write(&record).await {
                    Ok(()) => self.metrics.record_written(),
                    Err(err) => {
                        warn!(
                            path = %self.cfg.path.display(),
                            kind = record.event.kind(),
                            ?err,
                            "trace append failed"
                        );
                        self.metrics.record_failed();
                    }
                },
                Command::Flush(reply) => {
                    let _ = reply.send(());
                }
            }
        }
        if let Err(err) = self.finish().await {
            warn!(path = %self.cfg.path.display(), ?err, "trace log sync failed");
        }
    }

    async fn prepare_dir(&self) -> io::Result<()> {
        match self.cfg.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
            _ => Ok(()),
        }
    }

    async fn ensure_file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.cfg.path)
                .await?;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "trace file unavailable"))
    }

    async fn write(&mut self, record: &TraceRecord) -> LogResult<()> {
        let line = record.to_line()?;
        let result = async {
            let file = self.ensure_file().await?;
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;
        if result.is_err() {
            // Reopen on the next record.
            self.file = None;
        }
        Ok(result?)
    }

    async fn finish(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            if self.cfg.sync_on_close {
                file.sync_all().await?;
            }
        }
        Ok(())
    }
}

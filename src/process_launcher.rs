use std::collections::HashMap;
use std::ffi::OsStr;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{BridgeError, BridgeResult};

/// Asks a browser process to exit on its own, e.g. by sending a protocol
/// `close` command. Runs at most once.
pub type GracefulClose = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcessId(u64);

struct Tracked {
    name: String,
    child: Child,
    graceful: Option<GracefulClose>,
}

/// Registry of spawned browser processes.
#[derive(Clone)]
pub struct ProcessLauncher {
    processes: Arc<Mutex<HashMap<ProcessId, Tracked>>>,
    next_id: Arc<AtomicU64>,
    exit_wait: Duration,
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl ProcessLauncher {
    /// `exit_wait` bounds how long a process gets to exit after its graceful
    /// close before it is killed.
    pub fn new(exit_wait: Duration) -> Self {
        Self {
            processes: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            exit_wait,
        }
    }

    pub fn launch<I, S>(
        &self,
        name: &str,
        program: impl AsRef<OsStr>,
        args: I,
        graceful: Option<GracefulClose>,
    ) -> BridgeResult<ProcessId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| BridgeError::launch(name, err))?;
        info!(process = name, pid = ?child.id(), "browser process launched");
        Ok(self.track(name, child, graceful))
    }

    pub fn track(&self, name: &str, child: Child, graceful: Option<GracefulClose>) -> ProcessId {
        let id = ProcessId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.processes.lock().insert(
            id,
            Tracked {
                name: name.to_string(),
                child,
                graceful,
            },
        );
        id
    }

    /// Stops tracking a process the caller already shut down.
    pub fn release(&self, id: ProcessId) -> Option<Child> {
        self.processes.lock().remove(&id).map(|tracked| tracked.child)
    }

    pub fn len(&self) -> usize {
        self.processes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every tracked process concurrently: the graceful hook first,
    /// then a kill if the process is still running after `exit_wait`. The
    /// hook itself also gets at most `exit_wait`.
    pub async fn gracefully_close_all(&self) {
        let processes: Vec<Tracked> = self
            .processes
            .lock()
            .drain()
            .map(|(_, process)| process)
            .collect();
        if processes.is_empty() {
            return;
        }
        info!(count = processes.len(), "closing browser processes");
        let exit_wait = self.exit_wait;
        join_all(
            processes
                .into_iter()
                .map(|process| close_one(process, exit_wait)),
        )
        .await;
    }
}

async fn close_one(mut process: Tracked, exit_wait: Duration) {
    if let Some(graceful) = process.graceful.take() {
        if tokio::time::timeout(exit_wait, graceful()).await.is_err() {
            warn!(process = %process.name, "graceful close hook timed out");
        }
        match tokio::time::timeout(exit_wait, process.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(process = %process.name, %status, "browser process exited");
                return;
            }
            Ok(Err(err)) => {
                warn!(process = %process.name, ?err, "failed to wait for browser process")
            }
            Err(_) => warn!(process = %process.name, "browser process ignored graceful close"),
        }
    }
    if let Err(err) = process.child.kill().await {
        warn!(process = %process.name, ?err, "failed to kill browser process");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn processes_without_hook_are_killed() {
        let launcher = ProcessLauncher::new(Duration::from_millis(100));
        launcher.launch("sleeper", "sleep", ["30"], None).unwrap();
        assert_eq!(launcher.len(), 1);

        tokio::time::timeout(Duration::from_secs(5), launcher.gracefully_close_all())
            .await
            .unwrap();

        assert!(launcher.is_empty());
    }

    #[tokio::test]
    async fn graceful_hook_runs_before_kill() {
        let launcher = ProcessLauncher::new(Duration::from_millis(100));
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let hook: GracefulClose = Box::new(move || {
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
            })
        });
        launcher
            .launch("stubborn", "sleep", ["30"], Some(hook))
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), launcher.gracefully_close_all())
            .await
            .unwrap();

        assert!(called.load(Ordering::SeqCst));
        assert!(launcher.is_empty());
    }

    #[tokio::test]
    async fn hung_graceful_hook_does_not_block_shutdown() {
        let launcher = ProcessLauncher::new(Duration::from_millis(100));
        let hook: GracefulClose = Box::new(|| Box::pin(futures::future::pending()));
        launcher.launch("wedged", "sleep", ["30"], Some(hook)).unwrap();

        tokio::time::timeout(Duration::from_secs(5), launcher.gracefully_close_all())
            .await
            .unwrap();

        assert!(launcher.is_empty());
    }

    #[test]
    fn launch_failure_is_reported() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        let launcher = ProcessLauncher::default();
        let err = launcher
            .launch("missing", "/nonexistent/browser-binary", Vec::<&str>::new(), None)
            .unwrap_err();
        assert!(matches!(err, BridgeError::Launch { .. }));
    }
}

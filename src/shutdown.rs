use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use tracerec_tracer::TraceRegistry;

use crate::process_launcher::ProcessLauncher;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// Every browser closed and every trace was flushed in time.
    Graceful,
    /// The deadline fired first.
    GraceExpired,
}

/// Runs `graceful` against a hard deadline started at the same moment.
pub async fn race_deadline<F>(graceful: F, grace: Duration) -> ExitReason
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = graceful => ExitReason::Graceful,
        _ = sleep(grace) => ExitReason::GraceExpired,
    }
}

/// Orderly teardown once the control stream is gone: close every browser,
/// then dispose whatever tracers are left, all bounded by `grace`.
pub struct ShutdownCoordinator {
    launcher: ProcessLauncher,
    registry: Arc<TraceRegistry>,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(launcher: ProcessLauncher, registry: Arc<TraceRegistry>, grace: Duration) -> Self {
        Self {
            launcher,
            registry,
            grace,
        }
    }

    pub async fn run(&self) -> ExitReason {
        info!(
            grace_secs = self.grace.as_secs(),
            browsers = self.launcher.len(),
            tracers = self.registry.active_count(),
            "shutting down"
        );
        let reason = race_deadline(
            async {
                self.launcher.gracefully_close_all().await;
                self.registry.shutdown().await;
            },
            self.grace,
        )
        .await;
        match reason {
            ExitReason::Graceful => info!("shutdown complete"),
            ExitReason::GraceExpired => warn!(
                grace_secs = self.grace.as_secs(),
                "shutdown deadline reached; exiting anyway"
            ),
        }
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    use tracerec_tracer::{ContextListeners, NullSnapshotterFactory, TracerPolicyHandle};

    #[tokio::test(start_paused = true)]
    async fn deadline_wins_over_stuck_close() {
        let started = Instant::now();
        let reason = race_deadline(futures::future::pending(), Duration::from_secs(30)).await;
        assert_eq!(reason, ExitReason::GraceExpired);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_close_exits_before_deadline() {
        let started = Instant::now();
        let reason = race_deadline(sleep(Duration::from_secs(2)), Duration::from_secs(30)).await;
        assert_eq!(reason, ExitReason::Graceful);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn coordinator_tears_down_registry() {
        let host = ContextListeners::new();
        let registry = TraceRegistry::new(
            Arc::new(NullSnapshotterFactory),
            TracerPolicyHandle::default(),
        );
        registry.install(&host);
        let coordinator = ShutdownCoordinator::new(
            ProcessLauncher::default(),
            Arc::clone(&registry),
            Duration::from_secs(30),
        );

        assert_eq!(coordinator.run().await, ExitReason::Graceful);
        assert!(!registry.is_installed());
        assert!(host.is_empty());
    }
}

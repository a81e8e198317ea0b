use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use tracerec_tracer::{
    metrics as tracer_metrics, ContextListeners, NullSnapshotterFactory, SnapshotterFactory,
    TraceRegistry, TracerPolicyHandle,
};

use crate::config::Config;
use crate::process_launcher::ProcessLauncher;
use crate::router::{DispatchRouter, RejectingRouter};
use crate::shutdown::{ExitReason, ShutdownCoordinator};
use crate::transport;

#[derive(Args, Clone, Debug, Default)]
pub struct ServeArgs {
    /// Seconds allowed for closing browsers and flushing traces once the
    /// control stream closes (overrides config)
    #[arg(long = "shutdown-grace-secs", value_name = "SECS")]
    pub shutdown_grace_secs: Option<u64>,
}

/// Process-wide services of one `serve` run, wired once at startup.
pub struct ServeRuntime {
    pub contexts: Arc<ContextListeners>,
    pub registry: Arc<TraceRegistry>,
    pub launcher: ProcessLauncher,
    pub metrics: prometheus::Registry,
}

impl ServeRuntime {
    pub fn new(config: &Config, snapshotters: Arc<dyn SnapshotterFactory>) -> Self {
        let metrics = prometheus::Registry::new();
        tracer_metrics::register_metrics(&metrics);

        let contexts = Arc::new(ContextListeners::new());
        let registry = TraceRegistry::new(
            snapshotters,
            TracerPolicyHandle::new_with(config.tracer.clone()),
        );
        if !registry.install(contexts.as_ref()) {
            warn!("trace registry was already installed");
        }
        Self {
            contexts,
            registry,
            launcher: ProcessLauncher::default(),
            metrics,
        }
    }

    pub fn shutdown_coordinator(&self, grace: Duration) -> ShutdownCoordinator {
        ShutdownCoordinator::new(self.launcher.clone(), Arc::clone(&self.registry), grace)
    }
}

/// Serves the framed protocol on stdin/stdout until the peer hangs up, then
/// shuts down within the grace period.
pub async fn cmd_serve(args: ServeArgs, config: Config) -> Result<ExitReason> {
    let grace = args
        .shutdown_grace_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.shutdown_grace());
    let runtime = ServeRuntime::new(&config, Arc::new(NullSnapshotterFactory));
    let router: Arc<dyn DispatchRouter> = Arc::new(RejectingRouter);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        built = env!("BUILD_DATE"),
        "serving control stream on stdio"
    );

    if let Err(err) = transport::run(tokio::io::stdin(), tokio::io::stdout(), router).await {
        warn!(%err, "control stream ended with an error");
    }

    let reason = runtime.shutdown_coordinator(grace).run().await;
    let families = runtime.metrics.gather();
    info!(metric_families = families.len(), ?reason, "serve finished");
    Ok(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runtime_installs_registry_on_context_hub() {
        let runtime = ServeRuntime::new(&Config::default(), Arc::new(NullSnapshotterFactory));

        assert!(runtime.registry.is_installed());
        assert_eq!(runtime.contexts.len(), 1);

        let reason = runtime
            .shutdown_coordinator(Duration::from_secs(1))
            .run()
            .await;
        assert_eq!(reason, ExitReason::Graceful);
        assert!(runtime.contexts.is_empty());
    }
}

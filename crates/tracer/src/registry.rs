use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use tracerec_core_types::HandleId;
use tracerec_event_bus::Subscription;

use crate::context_tracer::{ContextTracer, TracerPaths};
use crate::metrics;
use crate::policy::TracerPolicyHandle;
use crate::ports::{ContextLifecycleSource, ContextListener, ContextRef, SnapshotterFactory};

/// Turns context lifecycle notifications into one [`ContextTracer`] per
/// context that asked for tracing.
///
/// Owned by the process bootstrap: created once, [`install`](Self::install)ed
/// on the engine's lifecycle source, and [`shutdown`](Self::shutdown) on exit.
pub struct TraceRegistry {
    tracers: DashMap<HandleId, Arc<ContextTracer>>,
    snapshotters: Arc<dyn SnapshotterFactory>,
    policy: TracerPolicyHandle,
    installation: Mutex<Option<Subscription>>,
}

impl TraceRegistry {
    pub fn new(snapshotters: Arc<dyn SnapshotterFactory>, policy: TracerPolicyHandle) -> Arc<Self> {
        Arc::new(Self {
            tracers: DashMap::new(),
            snapshotters,
            policy,
            installation: Mutex::new(None),
        })
    }

    /// Subscribes to `source`. Returns `false` without registering again if
    /// the registry is already installed.
    pub fn install(self: &Arc<Self>, source: &dyn ContextLifecycleSource) -> bool {
        let mut installation = self.installation.lock();
        if installation.is_some() {
            debug!("trace registry already installed");
            return false;
        }
        let listener: Arc<dyn ContextListener> = Arc::clone(self) as Arc<dyn ContextListener>;
        *installation = Some(source.add_context_listener(listener));
        true
    }

    pub fn is_installed(&self) -> bool {
        self.installation.lock().is_some()
    }

    pub fn tracer_for(&self, context: HandleId) -> Option<Arc<ContextTracer>> {
        self.tracers
            .get(&context)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn active_count(&self) -> usize {
        self.tracers.len()
    }

    pub async fn context_created(&self, context: &ContextRef) {
        let options = context.options();
        let policy = self.policy.snapshot();
        let Some(paths) = TracerPaths::resolve(&options, &policy) else {
            return;
        };
        let handle = context.handle();
        match self.tracers.entry(handle) {
            Entry::Occupied(_) => {
                warn!(context = %handle, "context already traced; ignoring duplicate notification");
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(ContextTracer::start(
                    Arc::clone(context),
                    paths,
                    policy,
                    self.snapshotters.as_ref(),
                ));
            }
        }
        metrics::set_active_tracers(self.tracers.len());
    }

    pub async fn context_destroyed(&self, context: &ContextRef) {
        let Some((handle, tracer)) = self.tracers.remove(&context.handle()) else {
            return;
        };
        metrics::set_active_tracers(self.tracers.len());
        if let Err(err) = tracer.dispose().await {
            metrics::record_dispose_failure();
            warn!(
                context = %handle,
                context_id = %tracer.context_id(),
                %err,
                "trace cleanup failed; context destruction continues"
            );
        }
    }

    /// Detaches from the lifecycle source and disposes every tracer still
    /// alive. Used on process exit.
    pub async fn shutdown(&self) {
        let installation = self.installation.lock().take();
        if let Some(subscription) = installation {
            subscription.unsubscribe();
        }
        let handles: Vec<HandleId> = self.tracers.iter().map(|entry| *entry.key()).collect();
        for handle in handles {
            let Some((_, tracer)) = self.tracers.remove(&handle) else {
                continue;
            };
            if let Err(err) = tracer.dispose().await {
                metrics::record_dispose_failure();
                warn!(context = %handle, %err, "trace cleanup failed during shutdown");
            }
        }
        metrics::set_active_tracers(0);
        info!("trace registry shut down");
    }
}

#[async_trait]
impl ContextListener for TraceRegistry {
    async fn on_context_created(&self, context: &ContextRef) {
        self.context_created(context).await;
    }

    async fn on_context_will_destroy(&self, _context: &ContextRef) {}

    async fn on_context_did_destroy(&self, context: &ContextRef) {
        self.context_destroyed(context).await;
    }
}

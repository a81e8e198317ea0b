use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use tracerec_artifact_store::{ArtifactCfg, ArtifactMetrics, ArtifactStore};
use tracerec_core_types::{ContextId, HandleId, PageId};
use tracerec_event_bus::SubscriptionSet;
use tracerec_trace_log::{
    ActionEvent, LogCfg, LogMetrics, ResourceEvent, TraceEvent, TraceLogWriter,
};

use crate::capture::{capture_and_store, capture_timeout};
use crate::errors::TracerResult;
use crate::metrics;
use crate::model::{
    ActionMetadata, ActionResult, Blob, ContextOptions, ResourceSnapshot, VideoStarted,
};
use crate::policy::TracerPolicyView;
use crate::ports::{
    ActionListener, ContextRef, PageRef, Snapshotter, SnapshotterDelegate, SnapshotterFactory,
};

/// Where one context's trace goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracerPaths {
    pub trace_file: PathBuf,
    pub resources_dir: PathBuf,
}

impl TracerPaths {
    /// `None` when the context did not ask for tracing.
    pub fn resolve(options: &ContextOptions, policy: &TracerPolicyView) -> Option<Self> {
        let trace_file = options.trace_path.clone()?;
        let resources_dir = options.trace_resources_path.clone().unwrap_or_else(|| {
            trace_file
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(&policy.resources_dir_name)
        });
        Some(Self {
            trace_file,
            resources_dir,
        })
    }
}

struct PageEntry {
    page_id: PageId,
    subscriptions: SubscriptionSet,
}

/// Records one browser context from creation to disposal.
pub struct ContextTracer {
    context_id: ContextId,
    context: ContextRef,
    context_timeout: Option<Duration>,
    policy: TracerPolicyView,
    log: TraceLogWriter,
    artifacts: ArtifactStore,
    pages: Mutex<HashMap<HandleId, PageEntry>>,
    subscriptions: Mutex<SubscriptionSet>,
    snapshotter: Mutex<Option<Arc<dyn Snapshotter>>>,
    disposed: AtomicBool,
}

impl ContextTracer {
    /// Starts recording `context`; the first journal record is always
    /// `context-created`. Must be called from within a tokio runtime.
    pub fn start(
        context: ContextRef,
        paths: TracerPaths,
        policy: TracerPolicyView,
        snapshotters: &dyn SnapshotterFactory,
    ) -> Arc<Self> {
        let options = context.options();
        let log = TraceLogWriter::spawn(
            LogCfg {
                path: paths.trace_file.clone(),
                sync_on_close: policy.sync_log_on_close,
            },
            LogMetrics::default(),
        );
        let artifacts = ArtifactStore::spawn(
            ArtifactCfg {
                root: paths.resources_dir.clone(),
                sync_data: policy.sync_artifacts,
            },
            ArtifactMetrics::default(),
        );
        let tracer = Arc::new(Self {
            context_id: ContextId::new(),
            context_timeout: options.default_timeout(),
            context,
            policy,
            log,
            artifacts,
            pages: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(SubscriptionSet::new()),
            snapshotter: Mutex::new(None),
            disposed: AtomicBool::new(false),
        });
        info!(
            context_id = %tracer.context_id,
            trace_file = %paths.trace_file.display(),
            resources = %paths.resources_dir.display(),
            "context tracing started"
        );

        tracer.append(TraceEvent::context_created(
            tracer.context_id.clone(),
            tracer.context.browser_name(),
            options.is_mobile,
            options.device_scale_factor.unwrap_or(1.0),
            options.viewport,
        ));

        let hook = Arc::new(TracerHook {
            tracer: Arc::downgrade(&tracer),
        });
        let snapshotter = snapshotters.create(&tracer.context, hook.clone());
        *tracer.snapshotter.lock() = Some(snapshotter);

        let weak = Arc::downgrade(&tracer);
        let on_page = tracer.context.on_page(Box::new(move |page| {
            if let Some(tracer) = weak.upgrade() {
                tracer.on_page(page);
            }
        }));
        let on_action = tracer.context.add_action_listener(hook);
        {
            let mut subscriptions = tracer.subscriptions.lock();
            subscriptions.push(on_page);
            subscriptions.push(on_action);
        }
        tracer
    }

    pub fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    pub fn trace_file(&self) -> &Path {
        self.log.path()
    }

    pub fn resources_dir(&self) -> &Path {
        self.artifacts.root()
    }

    pub fn log_metrics(&self) -> LogMetrics {
        self.log.metrics()
    }

    pub fn artifact_metrics(&self) -> ArtifactMetrics {
        self.artifacts.metrics()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn page_id(&self, page: &PageRef) -> Option<PageId> {
        self.pages
            .lock()
            .get(&page.handle())
            .map(|entry| entry.page_id.clone())
    }

    fn append(&self, event: TraceEvent) {
        self.log.append(event);
    }

    fn on_page(self: &Arc<Self>, page: &PageRef) {
        if self.is_disposed() {
            return;
        }
        let handle = page.handle();
        let page_id = PageId::new();
        self.pages.lock().insert(
            handle,
            PageEntry {
                page_id: page_id.clone(),
                subscriptions: SubscriptionSet::new(),
            },
        );
        self.append(TraceEvent::page_created(
            self.context_id.clone(),
            page_id.clone(),
        ));

        let mut subscriptions = SubscriptionSet::new();
        let weak = Arc::downgrade(self);
        let video_page = page_id.clone();
        subscriptions.push(page.on_video_started(Box::new(move |video| {
            if let Some(tracer) = weak.upgrade() {
                tracer.on_video_started(&video_page, video);
            }
        })));
        let weak = Arc::downgrade(self);
        subscriptions.push(page.once_close(Box::new(move || {
            if let Some(tracer) = weak.upgrade() {
                tracer.on_page_closed(handle);
            }
        })));

        let leftover = {
            let mut pages = self.pages.lock();
            match pages.get_mut(&handle) {
                Some(entry) if entry.page_id == page_id => {
                    entry.subscriptions = subscriptions;
                    None
                }
                _ => Some(subscriptions),
            }
        };
        // The page closed while its listeners were being attached.
        drop(leftover);
        debug!(context_id = %self.context_id, %page_id, "page traced");
    }

    fn on_video_started(&self, page_id: &PageId, video: &VideoStarted) {
        if self.is_disposed() {
            return;
        }
        let file_name = video
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.append(TraceEvent::page_video(
            self.context_id.clone(),
            page_id.clone(),
            file_name,
        ));
    }

    fn on_page_closed(&self, handle: HandleId) {
        let entry = self.pages.lock().remove(&handle);
        let Some(entry) = entry else {
            return;
        };
        if !self.is_disposed() {
            self.append(TraceEvent::page_destroyed(
                self.context_id.clone(),
                entry.page_id.clone(),
            ));
        }
    }

    fn on_blob(&self, blob: Blob) {
        self.artifacts.write(blob.sha1, blob.bytes);
    }

    fn on_resource(&self, resource: ResourceSnapshot) {
        self.append(TraceEvent::resource(ResourceEvent {
            context_id: self.context_id.clone(),
            page_id: resource.page_id,
            frame_id: resource.frame_id,
            url: resource.url,
            content_type: resource.content_type,
            response_headers: resource.response_headers,
            sha1: resource.sha1,
        }));
    }

    /// Builds and appends the `action` record for a completed command.
    pub async fn record_action(&self, result: &ActionResult, metadata: &ActionMetadata) {
        if self.is_disposed() {
            return;
        }
        let page_id = self.page_id(&metadata.page);
        let snapshotter = self.snapshotter.lock().clone();
        let snapshot = match snapshotter {
            Some(snapshotter) => {
                let timeout = capture_timeout(
                    metadata.page.default_timeout(),
                    self.context_timeout,
                    &self.policy,
                );
                let element = metadata.target.as_ref().and_then(|target| target.element());
                capture_and_store(snapshotter, &metadata.page, element, timeout, &self.artifacts)
                    .await
            }
            None => None,
        };
        self.append(TraceEvent::action(ActionEvent {
            context_id: self.context_id.clone(),
            page_id,
            action: metadata.action_type.clone(),
            selector: metadata
                .target
                .as_ref()
                .and_then(|target| target.selector())
                .map(str::to_string),
            value: metadata.value.clone(),
            snapshot,
            start_time: result.start_time,
            end_time: result.end_time,
            stack: metadata.stack.clone(),
            logs: result.logs.clone(),
            error: result.error.as_ref().map(|failure| failure.diagnostic()),
        }));
        metrics::record_action();
    }

    /// Stops recording and waits until every journal line and artifact
    /// requested so far has been handled. Later calls are no-ops.
    pub async fn dispose(&self) -> TracerResult<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        subscriptions.clear();
        let pages = std::mem::take(&mut *self.pages.lock());
        drop(pages);
        let snapshotter = self.snapshotter.lock().take();
        if let Some(snapshotter) = snapshotter {
            snapshotter.dispose();
        }

        self.append(TraceEvent::context_destroyed(self.context_id.clone()));
        let log = self.log.close().await;
        let artifacts = self.artifacts.close().await;
        info!(
            context_id = %self.context_id,
            written = self.log.metrics().snapshot().written,
            artifacts = self.artifacts.metrics().snapshot().written,
            "context tracing finished"
        );
        log?;
        artifacts?;
        Ok(())
    }
}

/// Weak adapter registered with the engine and the snapshotter, so neither
/// keeps the tracer alive.
struct TracerHook {
    tracer: Weak<ContextTracer>,
}

#[async_trait]
impl ActionListener for TracerHook {
    async fn on_after_action(&self, result: &ActionResult, metadata: &ActionMetadata) {
        let Some(tracer) = self.tracer.upgrade() else {
            return;
        };
        let recorded = AssertUnwindSafe(tracer.record_action(result, metadata))
            .catch_unwind()
            .await;
        if recorded.is_err() {
            warn!(
                context_id = %tracer.context_id,
                action = %metadata.action_type,
                "action recording panicked; command result unaffected"
            );
        }
    }
}

impl SnapshotterDelegate for TracerHook {
    fn on_blob(&self, blob: Blob) {
        if let Some(tracer) = self.tracer.upgrade() {
            tracer.on_blob(blob);
        }
    }

    fn on_resource(&self, resource: ResourceSnapshot) {
        if let Some(tracer) = self.tracer.upgrade() {
            tracer.on_resource(resource);
        }
    }

    fn page_id(&self, page: &PageRef) -> Option<PageId> {
        self.tracer.upgrade().and_then(|tracer| tracer.page_id(page))
    }
}

//! Interfaces the automation engine implements so contexts can be traced.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tracerec_core_types::{HandleId, PageId};
use tracerec_event_bus::Subscription;

use crate::errors::TracerError;
use crate::model::{
    ActionMetadata, ActionResult, Blob, ContextOptions, ElementHandle, PageSnapshot,
    ResourceSnapshot, VideoStarted,
};

pub type ContextRef = Arc<dyn BrowserContext>;
pub type PageRef = Arc<dyn Page>;

pub type PageCallback = Box<dyn Fn(&PageRef) + Send + Sync>;
pub type VideoCallback = Box<dyn Fn(&VideoStarted) + Send + Sync>;
pub type CloseCallback = Box<dyn Fn() + Send + Sync>;

/// A live browsing context.
pub trait BrowserContext: Send + Sync {
    fn handle(&self) -> HandleId;
    fn browser_name(&self) -> String;
    fn options(&self) -> ContextOptions;
    fn on_page(&self, callback: PageCallback) -> Subscription;
    fn add_action_listener(&self, listener: Arc<dyn ActionListener>) -> Subscription;
}

/// One tab of a context.
pub trait Page: Send + Sync {
    fn handle(&self) -> HandleId;
    /// Effective default command timeout; inherits the context's when unset.
    fn default_timeout(&self) -> Option<Duration>;
    fn on_video_started(&self, callback: VideoCallback) -> Subscription;
    /// Fires at most once, when the page closes.
    fn once_close(&self, callback: CloseCallback) -> Subscription;
}

#[async_trait]
pub trait ActionListener: Send + Sync {
    async fn on_after_action(&self, result: &ActionResult, metadata: &ActionMetadata);
}

#[async_trait]
pub trait ContextListener: Send + Sync {
    async fn on_context_created(&self, context: &ContextRef);
    async fn on_context_will_destroy(&self, context: &ContextRef);
    async fn on_context_did_destroy(&self, context: &ContextRef);
}

/// Source of context lifecycle notifications.
pub trait ContextLifecycleSource: Send + Sync {
    fn add_context_listener(&self, listener: Arc<dyn ContextListener>) -> Subscription;
}

/// Page-state capturer, created once per traced context.
#[async_trait]
pub trait Snapshotter: Send + Sync {
    async fn take_snapshot(
        &self,
        page: &PageRef,
        target: Option<&ElementHandle>,
        timeout: Duration,
    ) -> Result<Option<PageSnapshot>, TracerError>;

    fn dispose(&self);
}

/// Callbacks a snapshotter uses to hand data back to its tracer.
pub trait SnapshotterDelegate: Send + Sync {
    fn on_blob(&self, blob: Blob);
    fn on_resource(&self, resource: ResourceSnapshot);
    fn page_id(&self, page: &PageRef) -> Option<PageId>;
}

pub trait SnapshotterFactory: Send + Sync {
    fn create(
        &self,
        context: &ContextRef,
        delegate: Arc<dyn SnapshotterDelegate>,
    ) -> Arc<dyn Snapshotter>;
}

/// Factory for hosts without a capturer: every capture yields nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSnapshotterFactory;

struct NullSnapshotter;

#[async_trait]
impl Snapshotter for NullSnapshotter {
    async fn take_snapshot(
        &self,
        _page: &PageRef,
        _target: Option<&ElementHandle>,
        _timeout: Duration,
    ) -> Result<Option<PageSnapshot>, TracerError> {
        Ok(None)
    }

    fn dispose(&self) {}
}

impl SnapshotterFactory for NullSnapshotterFactory {
    fn create(
        &self,
        _context: &ContextRef,
        _delegate: Arc<dyn SnapshotterDelegate>,
    ) -> Arc<dyn Snapshotter> {
        Arc::new(NullSnapshotter)
    }
}

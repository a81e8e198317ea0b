use serde::{Deserialize, Serialize};
use serde_json::Value;

use tracerec_core_types::{ContextId, FrameId, PageId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Reference to a persisted state capture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureRef {
    pub sha1: String,
    /// Capture duration in milliseconds.
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextCreatedEvent {
    pub context_id: ContextId,
    pub browser_name: String,
    pub is_mobile: bool,
    pub device_scale_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_size: Option<ViewportSize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextScopedEvent {
    pub context_id: ContextId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageScopedEvent {
    pub context_id: ContextId,
    pub page_id: PageId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVideoEvent {
    pub context_id: ContextId,
    pub page_id: PageId,
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEvent {
    pub context_id: ContextId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<PageId>,
    pub frame_id: FrameId,
    pub url: String,
    pub content_type: String,
    pub response_headers: Vec<Header>,
    pub sha1: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub context_id: ContextId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<PageId>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<CaptureRef>,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Closed set of records a session tracer writes to its journal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TraceEvent {
    ContextCreated(ContextCreatedEvent),
    ContextDestroyed(ContextScopedEvent),
    PageCreated(PageScopedEvent),
    PageDestroyed(PageScopedEvent),
    PageVideo(PageVideoEvent),
    Resource(ResourceEvent),
    Action(ActionEvent),
}

impl TraceEvent {
    pub fn context_created(
        context_id: ContextId,
        browser_name: impl Into<String>,
        is_mobile: bool,
        device_scale_factor: f64,
        viewport_size: Option<ViewportSize>,
    ) -> Self {
        Self::ContextCreated(ContextCreatedEvent {
            context_id,
            browser_name: browser_name.into(),
            is_mobile,
            device_scale_factor,
            viewport_size,
        })
    }

    pub fn context_destroyed(context_id: ContextId) -> Self {
        Self::ContextDestroyed(ContextScopedEvent { context_id })
    }

    pub fn page_created(context_id: ContextId, page_id: PageId) -> Self {
        Self::PageCreated(PageScopedEvent {
            context_id,
            page_id,
        })
    }

    pub fn page_destroyed(context_id: ContextId, page_id: PageId) -> Self {
        Self::PageDestroyed(PageScopedEvent {
            context_id,
            page_id,
        })
    }

    pub fn page_video(
        context_id: ContextId,
        page_id: PageId,
        file_name: impl Into<String>,
    ) -> Self {
        Self::PageVideo(PageVideoEvent {
            context_id,
            page_id,
            file_name: file_name.into(),
        })
    }

    pub fn resource(event: ResourceEvent) -> Self {
        Self::Resource(event)
    }

    pub fn action(event: ActionEvent) -> Self {
        Self::Action(event)
    }

    /// Discriminator written to the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            TraceEvent::ContextCreated(_) => "context-created",
            TraceEvent::ContextDestroyed(_) => "context-destroyed",
            TraceEvent::PageCreated(_) => "page-created",
            TraceEvent::PageDestroyed(_) => "page-destroyed",
            TraceEvent::PageVideo(_) => "page-video",
            TraceEvent::Resource(_) => "resource",
            TraceEvent::Action(_) => "action",
        }
    }

    pub fn context_id(&self) -> &ContextId {
        match self {
            TraceEvent::ContextCreated(ev) => &ev.context_id,
            TraceEvent::ContextDestroyed(ev) => &ev.context_id,
            TraceEvent::PageCreated(ev) | TraceEvent::PageDestroyed(ev) => &ev.context_id,
            TraceEvent::PageVideo(ev) => &ev.context_id,
            TraceEvent::Resource(ev) => &ev.context_id,
            TraceEvent::Action(ev) => &ev.context_id,
        }
    }

    pub fn page_id(&self) -> Option<&PageId> {
        match self {
            TraceEvent::ContextCreated(_) | TraceEvent::ContextDestroyed(_) => None,
            TraceEvent::PageCreated(ev) | TraceEvent::PageDestroyed(ev) => Some(&ev.page_id),
            TraceEvent::PageVideo(ev) => Some(&ev.page_id),
            TraceEvent::Resource(ev) => ev.page_id.as_ref(),
            TraceEvent::Action(ev) => ev.page_id.as_ref(),
        }
    }
}

/// One journal line: the event plus the monotonic time at which it was appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(flatten)]
    pub event: TraceEvent,
    pub timestamp: f64,
}

impl TraceRecord {
    pub fn new(event: TraceEvent, timestamp: f64) -> Self {
        Self { event, timestamp }
    }

    pub fn to_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tracerec_core_types::{FrameId, HandleId, PageId};
use tracerec_trace_log::{Header, ViewportSize};

use crate::ports::PageRef;

/// Context configuration fields the recorder reads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextOptions {
    /// Journal location. Tracing is disabled for the context when unset.
    #[serde(default)]
    pub trace_path: Option<PathBuf>,
    /// Artifact directory override; defaults to a sibling of the journal.
    #[serde(default)]
    pub trace_resources_path: Option<PathBuf>,
    #[serde(default)]
    pub is_mobile: bool,
    #[serde(default)]
    pub device_scale_factor: Option<f64>,
    #[serde(default)]
    pub viewport: Option<ViewportSize>,
    /// Default command timeout; zero means "no timeout".
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,
}

impl ContextOptions {
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }
}

/// Opaque reference to a DOM element owned by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementHandle {
    pub handle: HandleId,
    pub preview: Option<String>,
}

/// What an automation command acted on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionTarget {
    Selector(String),
    Element(ElementHandle),
}

impl ActionTarget {
    pub fn selector(&self) -> Option<&str> {
        match self {
            ActionTarget::Selector(selector) => Some(selector),
            ActionTarget::Element(_) => None,
        }
    }

    pub fn element(&self) -> Option<&ElementHandle> {
        match self {
            ActionTarget::Selector(_) => None,
            ActionTarget::Element(element) => Some(element),
        }
    }
}

/// Description of a completed command, supplied by the engine.
#[derive(Clone)]
pub struct ActionMetadata {
    pub action_type: String,
    pub target: Option<ActionTarget>,
    pub value: Option<Value>,
    pub page: PageRef,
    pub stack: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionFailure {
    pub message: String,
    pub stack: Option<String>,
}

impl ActionFailure {
    /// Diagnostic text recorded in the journal: the stack when the engine
    /// captured one, else the message.
    pub fn diagnostic(&self) -> String {
        self.stack.clone().unwrap_or_else(|| self.message.clone())
    }
}

/// Reported outcome of a completed command. Times are monotonic milliseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionResult {
    pub start_time: f64,
    pub end_time: f64,
    pub logs: Vec<String>,
    pub error: Option<ActionFailure>,
}

/// Serializable capture produced by the snapshotter.
pub type PageSnapshot = Value;

/// Binary payload pushed by the snapshotter, addressed by its SHA-1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub sha1: String,
    pub bytes: Vec<u8>,
}

/// A network response observed by the snapshotter. The body travels
/// separately as a [`Blob`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub page_id: Option<PageId>,
    pub frame_id: FrameId,
    pub url: String,
    pub content_type: String,
    pub response_headers: Vec<Header>,
    pub sha1: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoStarted {
    pub path: PathBuf,
}

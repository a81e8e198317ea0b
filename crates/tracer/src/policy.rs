use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Recorder-wide knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerPolicyView {
    /// Command timeout assumed when neither page nor context configures one.
    pub default_command_timeout_ms: u64,
    /// Captures get `timeout / divisor` of the command timeout.
    pub capture_timeout_divisor: u32,
    /// Sibling directory of the journal used when no artifact path is given.
    pub resources_dir_name: String,
    pub sync_artifacts: bool,
    pub sync_log_on_close: bool,
}

impl Default for TracerPolicyView {
    fn default() -> Self {
        Self {
            default_command_timeout_ms: 30_000,
            capture_timeout_divisor: 5,
            resources_dir_name: "trace-resources".to_string(),
            sync_artifacts: false,
            sync_log_on_close: true,
        }
    }
}

#[derive(Clone, Default)]
pub struct TracerPolicyHandle {
    inner: Arc<RwLock<TracerPolicyView>>,
}

impl TracerPolicyHandle {
    pub fn new_with(view: TracerPolicyView) -> Self {
        Self {
            inner: Arc::new(RwLock::new(view)),
        }
    }

    pub fn snapshot(&self) -> TracerPolicyView {
        self.inner.read().clone()
    }

    /// Applies to tracers created after the call.
    pub fn update(&self, view: TracerPolicyView) {
        *self.inner.write() = view;
    }
}

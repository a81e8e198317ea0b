use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File-level configuration for one session's trace journal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogCfg {
    pub path: PathBuf,
    /// fsync the journal once the queue has drained on close.
    #[serde(default = "default_sync_on_close")]
    pub sync_on_close: bool,
}

fn default_sync_on_close() -> bool {
    true
}

impl LogCfg {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_on_close: default_sync_on_close(),
        }
    }
}

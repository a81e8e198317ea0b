use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactCfg {
    /// Storage location; blobs live under `<root>/sha1/`.
    pub root: PathBuf,
    /// fsync each blob before it is renamed into place.
    #[serde(default)]
    pub sync_data: bool,
}

impl ArtifactCfg {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sync_data: false,
        }
    }
}

impl Default for ArtifactCfg {
    fn default() -> Self {
        Self::new("./trace-resources")
    }
}

pub mod errors;
pub mod fs;
pub mod hash;
pub mod metrics;
pub mod policy;
pub mod store;

pub use errors::{ArtifactErrKind, ArtifactError, ArtifactResult};
pub use hash::{is_sha1_hex, sha1_hex};
pub use metrics::ArtifactMetrics;
pub use policy::ArtifactCfg;
pub use store::ArtifactStore;

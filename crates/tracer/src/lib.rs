pub mod capture;
pub mod context_tracer;
pub mod errors;
pub mod lifecycle;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod ports;
pub mod registry;

pub use context_tracer::{ContextTracer, TracerPaths};
pub use errors::{TracerError, TracerResult};
pub use lifecycle::ContextListeners;
pub use model::{
    ActionFailure, ActionMetadata, ActionResult, ActionTarget, Blob, ContextOptions,
    ElementHandle, PageSnapshot, ResourceSnapshot, VideoStarted,
};
pub use policy::{TracerPolicyHandle, TracerPolicyView};
pub use ports::{
    ActionListener, BrowserContext, CloseCallback, ContextLifecycleSource, ContextListener,
    ContextRef, NullSnapshotterFactory, Page, PageCallback, PageRef, Snapshotter,
    SnapshotterDelegate, SnapshotterFactory, VideoCallback,
};
pub use registry::TraceRegistry;

pub mod config;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod writer;

pub use config::LogCfg;
pub use errors::{LogError, LogErrorKind, LogResult};
pub use metrics::LogMetrics;
pub use model::{
    ActionEvent, CaptureRef, ContextCreatedEvent, ContextScopedEvent, Header, PageScopedEvent,
    PageVideoEvent, ResourceEvent, TraceEvent, TraceRecord, ViewportSize,
};
pub use writer::TraceLogWriter;

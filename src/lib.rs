//! tracerec library
//!
//! Exposes the serve-mode building blocks for integration testing

pub mod cli;
pub mod config;
pub mod errors;
pub mod process_launcher;
pub mod router;
pub mod shutdown;
pub mod transport;

pub use config::Config;
pub use errors::{BridgeError, BridgeResult};
pub use process_launcher::{GracefulClose, ProcessId, ProcessLauncher};
pub use router::{DispatchRouter, Outbound, RejectingRouter};
pub use shutdown::{ExitReason, ShutdownCoordinator};

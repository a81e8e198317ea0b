pub mod runtime;
pub mod serve;

pub use runtime::{init_logging, load_config, LoadedConfig};
pub use serve::{cmd_serve, ServeArgs, ServeRuntime};

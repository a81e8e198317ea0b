use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use tracerec_tracer::TracerPolicyView;

pub const SHUTDOWN_GRACE_ENV: &str = "TRACEREC_SHUTDOWN_GRACE_SECS";

/// Process configuration, loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    /// Optional file that receives a copy of the log output.
    pub log_file: Option<PathBuf>,
    /// Upper bound on the orderly shutdown after the control stream closes.
    pub shutdown_grace_secs: u64,
    pub tracer: TracerPolicyView,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            shutdown_grace_secs: 30,
            tracer: TracerPolicyView::default(),
        }
    }
}

impl Config {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn apply_env_overrides(&mut self) {
        let Ok(raw) = env::var(SHUTDOWN_GRACE_ENV) else {
            return;
        };
        match raw.trim().parse::<u64>() {
            Ok(secs) => self.shutdown_grace_secs = secs,
            Err(err) => warn!(value = %raw, ?err, "ignoring invalid {}", SHUTDOWN_GRACE_ENV),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "log_level: debug\ntracer:\n  capture_timeout_divisor: 4\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.shutdown_grace_secs, 30);
        assert_eq!(config.tracer.capture_timeout_divisor, 4);
        assert_eq!(config.tracer.resources_dir_name, "trace-resources");
    }

    #[test]
    #[serial]
    fn env_override_replaces_grace_period() {
        env::set_var(SHUTDOWN_GRACE_ENV, "5");
        let mut config = Config::default();
        config.apply_env_overrides();
        env::remove_var(SHUTDOWN_GRACE_ENV);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn invalid_env_override_is_ignored() {
        env::set_var(SHUTDOWN_GRACE_ENV, "soon");
        let mut config = Config::default();
        config.apply_env_overrides();
        env::remove_var(SHUTDOWN_GRACE_ENV);
        assert_eq!(config.shutdown_grace_secs, 30);
    }
}

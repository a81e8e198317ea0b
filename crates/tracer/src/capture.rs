use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use tracerec_artifact_store::ArtifactStore;
use tracerec_core_types::monotonic_time;
use tracerec_trace_log::CaptureRef;

use crate::errors::TracerError;
use crate::metrics;
use crate::model::ElementHandle;
use crate::policy::TracerPolicyView;
use crate::ports::{PageRef, Snapshotter};

/// Time box for one capture: a fraction of the effective command timeout.
///
/// A zero timeout means "unbounded" to the engine and is treated as unset,
/// so a capture always gets a finite, non-zero bound.
pub fn capture_timeout(
    page_timeout: Option<Duration>,
    context_timeout: Option<Duration>,
    policy: &TracerPolicyView,
) -> Duration {
    let base = page_timeout
        .filter(|timeout| !timeout.is_zero())
        .or_else(|| context_timeout.filter(|timeout| !timeout.is_zero()))
        .unwrap_or_else(|| Duration::from_millis(policy.default_command_timeout_ms.max(1)));
    let bound = base / policy.capture_timeout_divisor.max(1);
    if bound.is_zero() {
        Duration::from_millis(1)
    } else {
        bound
    }
}

/// Runs a time-boxed capture and queues its serialized form as an artifact.
/// Any failure, timeout included, yields `None`.
pub(crate) async fn capture_and_store(
    snapshotter: Arc<dyn Snapshotter>,
    page: &PageRef,
    target: Option<&ElementHandle>,
    timeout: Duration,
    artifacts: &ArtifactStore,
) -> Option<CaptureRef> {
    let started = monotonic_time();
    let outcome = match tokio::time::timeout(
        timeout,
        snapshotter.take_snapshot(page, target, timeout),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            metrics::record_capture_timeout();
            Err(TracerError::CaptureTimeout(timeout.as_millis()))
        }
    };
    let snapshot = match outcome {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return None,
        Err(err) => {
            debug!(%err, "capture unavailable");
            return None;
        }
    };
    let bytes = match serde_json::to_vec(&snapshot) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(%err, "capture not serializable");
            return None;
        }
    };
    let sha1 = artifacts.write_bytes(bytes);
    Some(CaptureRef {
        sha1,
        duration: monotonic_time() - started,
    })
}

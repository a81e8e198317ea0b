use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounter, IntGauge, Registry};
use tracing::error;

lazy_static! {
    static ref ACTIVE_TRACERS: IntGauge =
        IntGauge::new("tracerec_active_tracers", "Contexts currently being traced").unwrap();
    static ref ACTIONS_RECORDED: IntCounter = IntCounter::new(
        "tracerec_actions_recorded_total",
        "Action records appended to trace journals",
    )
    .unwrap();
    static ref CAPTURE_TIMEOUTS: IntCounter = IntCounter::new(
        "tracerec_capture_timeouts_total",
        "State captures abandoned after their time box",
    )
    .unwrap();
    static ref DISPOSE_FAILURES: IntCounter = IntCounter::new(
        "tracerec_dispose_failures_total",
        "Tracer disposals that reported an error",
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register tracer metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, ACTIVE_TRACERS.clone());
    register(registry, ACTIONS_RECORDED.clone());
    register(registry, CAPTURE_TIMEOUTS.clone());
    register(registry, DISPOSE_FAILURES.clone());
}

pub fn set_active_tracers(count: usize) {
    ACTIVE_TRACERS.set(count as i64);
}

pub fn record_action() {
    ACTIONS_RECORDED.inc();
}

pub fn record_capture_timeout() {
    CAPTURE_TIMEOUTS.inc();
}

pub fn record_dispose_failure() {
    DISPOSE_FAILURES.inc();
}

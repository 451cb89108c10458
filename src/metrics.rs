//! Metrics sink for probe outcomes
//!
//! The cycle reports through the [`MetricsSink`] trait rather than
//! process-global gauges, so tests can substitute [`CapturingSink`].
//! [`PrometheusSink`] owns three gauges per enabled operation inside an
//! explicit `prometheus::Registry`:
//!
//! - `<ns>_<op>_duration_seconds` — last attempt duration
//! - `<ns>_<op>_status` — 1 ok, 0 failed
//! - `<ns>_<op>_errors{error=...}` — 1 while that error is active
//!
//! An operation's error gauges are cleared when its attempt starts and set
//! once from the outcome. A scrape landing inside that window observes a
//! cleared-but-not-yet-set state for that one operation; the window is a
//! single storage call wide and is accepted rather than serialized against.

use crate::probe::{Operation, ProbeResult};
use prometheus::{Gauge, GaugeVec, Opts, Registry};
use std::collections::HashMap;

/// Metric namespace used when the configuration leaves it empty
pub const DEFAULT_NAMESPACE: &str = "bucketprobe";

/// Receives per-step outcomes from the probe cycle
pub trait MetricsSink: Send + Sync {
    /// The attempt for `operation` is starting; clear its error state.
    fn begin(&self, operation: Operation);

    /// Record the outcome of a finished step. Called exactly once per
    /// enabled step per cycle.
    fn record(&self, result: &ProbeResult);
}

struct OperationGauges {
    duration: Gauge,
    status: Gauge,
    errors: GaugeVec,
}

/// Prometheus-backed sink
pub struct PrometheusSink {
    gauges: HashMap<Operation, OperationGauges>,
}

impl PrometheusSink {
    /// Register one gauge group per enabled operation in `registry`.
    /// Disabled operations get no metrics at all: absence means "not
    /// probed", not "failed".
    pub fn register(
        namespace: &str,
        registry: &Registry,
        operations: &[Operation],
    ) -> prometheus::Result<Self> {
        let mut gauges = HashMap::with_capacity(operations.len());

        for &op in operations {
            let duration = Gauge::with_opts(
                Opts::new(
                    format!("{}_duration_seconds", op.as_str()),
                    format!("Last {} duration in seconds", op),
                )
                .namespace(namespace),
            )?;
            let status = Gauge::with_opts(
                Opts::new(
                    format!("{}_status", op.as_str()),
                    format!("Last {} status, 1 is ok", op),
                )
                .namespace(namespace),
            )?;
            let errors = GaugeVec::new(
                Opts::new(
                    format!("{}_errors", op.as_str()),
                    format!("Active {} errors", op),
                )
                .namespace(namespace),
                &["error"],
            )?;

            registry.register(Box::new(duration.clone()))?;
            registry.register(Box::new(status.clone()))?;
            registry.register(Box::new(errors.clone()))?;

            gauges.insert(
                op,
                OperationGauges {
                    duration,
                    status,
                    errors,
                },
            );
        }

        Ok(Self { gauges })
    }
}

impl MetricsSink for PrometheusSink {
    fn begin(&self, operation: Operation) {
        if let Some(group) = self.gauges.get(&operation) {
            group.errors.reset();
        }
    }

    fn record(&self, result: &ProbeResult) {
        let Some(group) = self.gauges.get(&result.operation) else {
            return;
        };

        group.duration.set(result.duration.as_secs_f64());
        if result.succeeded {
            group.status.set(1.0);
        } else {
            group.status.set(0.0);
            if let Some(label) = result.error_label() {
                group.errors.with_label_values(&[label.as_str()]).set(1.0);
            }
        }
    }
}

/// Recording sink for tests: stores every `begin`/`record` call in order.
pub struct CapturingSink {
    events: std::sync::Mutex<Vec<SinkEvent>>,
}

/// One observed sink call
#[derive(Debug, Clone)]
pub enum SinkEvent {
    Begin(Operation),
    Record(ProbeResult),
}

impl CapturingSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// All events observed so far, in call order
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Only the recorded results, in call order
    pub fn results(&self) -> Vec<ProbeResult> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Record(r) => Some(r.clone()),
                SinkEvent::Begin(_) => None,
            })
            .collect()
    }
}

impl Default for CapturingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for CapturingSink {
    fn begin(&self, operation: Operation) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Begin(operation));
    }

    fn record(&self, result: &ProbeResult) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Record(result.clone()));
    }
}

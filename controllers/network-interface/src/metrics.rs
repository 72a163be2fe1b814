//! Prometheus metrics for the controller.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Controller metrics, registered on a private registry.
pub struct Metrics {
    registry: Registry,
    reconciles: IntCounterVec,
    reconcile_duration: Histogram,
    fanout_requests: IntCounter,
    backing_off: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reconciles = IntCounterVec::new(
            Opts::new("nic_reconcile_total", "Reconciliation passes by result"),
            &["result"],
        )?;
        let reconcile_duration = Histogram::with_opts(HistogramOpts::new(
            "nic_reconcile_duration_seconds",
            "Duration of reconciliation passes",
        ))?;
        let fanout_requests = IntCounter::new(
            "nic_fanout_requests_total",
            "NetworkInterface requests triggered by PrivateNetwork updates",
        )?;
        let backing_off = IntGauge::new(
            "nic_backing_off_keys",
            "NetworkInterfaces waiting for a retry after failed passes",
        )?;

        registry.register(Box::new(reconciles.clone()))?;
        registry.register(Box::new(reconcile_duration.clone()))?;
        registry.register(Box::new(fanout_requests.clone()))?;
        registry.register(Box::new(backing_off.clone()))?;

        Ok(Self {
            registry,
            reconciles,
            reconcile_duration,
            fanout_requests,
            backing_off,
        })
    }

    pub fn observe_reconcile(&self, result: &str, elapsed: Duration) {
        self.reconciles.with_label_values(&[result]).inc();
        self.reconcile_duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_fanout(&self, requests: usize) {
        self.fanout_requests.inc_by(requests as u64);
    }

    pub fn set_backing_off(&self, keys: usize) {
        self.backing_off.set(i64::try_from(keys).unwrap_or(i64::MAX));
    }

    #[cfg(test)]
    pub fn reconcile_count(&self, result: &str) -> u64 {
        self.reconciles.with_label_values(&[result]).get()
    }

    #[cfg(test)]
    pub fn fanout_count(&self) -> u64 {
        self.fanout_requests.get()
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

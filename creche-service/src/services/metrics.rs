//! Metrics collection and Prometheus export.

use crate::models::PaymentCategory;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Call once at startup.
///
/// Panics if called more than once.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_payment(category: PaymentCategory, status: &'static str) {
    counter!(
        "creche_payments_recorded_total",
        "category" => category.as_str(),
        "status" => status
    )
    .increment(1);
}

pub fn record_validation(target: &'static str, outcome: &'static str) {
    counter!(
        "creche_validations_total",
        "target" => target,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_compensation(outcome: &'static str) {
    counter!("creche_charge_compensations_total", "outcome" => outcome).increment(1);
}

use axum::{routing::get, Router};
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

// Recording helpers. Without an installed recorder these are no-ops (tests).

pub fn record_request(route: &'static str) {
    counter!("slack_requests_total", "route" => route).increment(1);
}

pub fn record_signature_failure() {
    counter!("signature_failures_total").increment(1);
}

pub fn record_summary(outcome: &'static str) {
    counter!("summaries_total", "outcome" => outcome).increment(1);
}

pub fn record_rewrite_fallback() {
    counter!("rewrite_fallbacks_total").increment(1);
}

pub fn record_platform_error(method: &'static str) {
    counter!("platform_api_errors_total", "method" => method).increment(1);
}

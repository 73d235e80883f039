//! Prometheus metrics

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MetricsConfig;
use crate::domain::Usage;

static UUID_SEGMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});
static NUMERIC_SEGMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Prometheus handle for serving the scrape endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the recorder; `None` leaves every record call a no-op
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("ai_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("failed to initialize metrics: {e}");
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record one completion round trip, buffered or streamed
pub fn record_completion(model: &str, success: bool, duration: Duration, usage: Option<&Usage>) {
    let labels = [
        ("model", model.to_string()),
        (
            "status",
            if success { "success" } else { "error" }.to_string(),
        ),
    ];

    counter!("completion_requests_total", &labels).increment(1);
    histogram!("completion_duration_seconds", &labels).record(duration.as_secs_f64());

    if let Some(usage) = usage {
        counter!("completion_prompt_tokens_total", &labels)
            .increment(u64::from(usage.prompt_tokens));
        counter!("completion_output_tokens_total", &labels)
            .increment(u64::from(usage.completion_tokens));
    }
}

pub fn record_embedding(model: &str, success: bool, duration: Duration) {
    let labels = [
        ("model", model.to_string()),
        (
            "status",
            if success { "success" } else { "error" }.to_string(),
        ),
    ];

    counter!("embedding_requests_total", &labels).increment(1);
    histogram!("embedding_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Collapse identifier segments so label cardinality stays bounded
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENTS.replace_all(path, "{id}");
    let path = NUMERIC_SEGMENTS.replace_all(&path, "/{id}$1");

    if path.len() > 50 {
        path[..50].to_string()
    } else {
        path.to_string()
    }
}

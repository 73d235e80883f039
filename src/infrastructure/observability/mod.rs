pub mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_completion, record_embedding, record_http_request,
    PrometheusMetrics,
};

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// GET /metrics — upload counters and queue depth in Prometheus text format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}

/// Register descriptions for the metrics the service emits.
pub fn describe_metrics() {
    metrics::describe_counter!("video_uploads_total", "Uploads accepted and queued for processing");
    metrics::describe_counter!(
        "video_uploads_failed",
        "Uploads rejected or failed, labelled by the step that failed"
    );
    metrics::describe_counter!("video_download_links_total", "Signed download links issued");
    metrics::describe_counter!("accounts_registered_total", "Accounts created through registration");
    metrics::describe_counter!("login_failures_total", "Login attempts rejected for bad credentials");
    metrics::describe_gauge!("video_queue_depth", "Processing messages waiting in the queue");
}

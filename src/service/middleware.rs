//! Service middleware for request metrics.
//!
//! ## Metrics Exposed
//!
//! - `request` - path, method, status and latency per request
//! - `ingest` - documents, nodes and edges per document batch
//! - `ego` - nodes, edges and depth per ego extraction

use std::sync::OnceLock;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use regex_lite::Regex;
use tracing::info;

/// Metrics middleware that records request counts and latency.
///
/// Uses tracing; metrics are aggregated from logs.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    info!(
        target: "discourse_graph::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request_metric"
    );

    response
}

/// Collapse id-like path segments so unknown paths stay low-cardinality.
fn normalize_path(path: &str) -> String {
    static ID_SEGMENT: OnceLock<Regex> = OnceLock::new();
    let pattern = ID_SEGMENT.get_or_init(|| {
        Regex::new(r"/(?:[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}|(?:node_|edge_)?[0-9]+)(/|$)")
            .expect("static pattern")
    });

    pattern.replace_all(path, "/:id$1").to_string()
}

/// Record a document batch.
pub fn record_ingest_metrics(documents: usize, node_count: usize, edge_count: usize, latency_ms: u64) {
    info!(
        target: "discourse_graph::metrics",
        metric_type = "ingest",
        documents = documents,
        node_count = node_count,
        edge_count = edge_count,
        latency_ms = latency_ms,
        "ingest_metric"
    );
}

/// Record an ego extraction.
pub fn record_ego_metrics(node_count: usize, edge_count: usize, depth: usize, latency_ms: u64) {
    info!(
        target: "discourse_graph::metrics",
        metric_type = "ego",
        node_count = node_count,
        edge_count = edge_count,
        depth = depth,
        latency_ms = latency_ms,
        "ego_metric"
    );
}

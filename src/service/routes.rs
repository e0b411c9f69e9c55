//! Axum routes for the discourse graph service.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::ego::{EgoQuery, TypeFilter};
use crate::error::GraphError;
use crate::export::GraphExport;
use crate::ingest::{self, DocumentSource};
use crate::reconcile::ReconcileReport;
use crate::store::{GraphStore, PostgresGraphStore};
use crate::types::Graph;
use crate::GRAPH_SCHEMA_VERSION;

use super::middleware::{metrics_middleware, record_ego_metrics, record_ingest_metrics};
use super::state::ServiceState;

/// Type alias for the service state with PostgresGraphStore.
pub type AppState = ServiceState<PostgresGraphStore>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to parse and persist a document set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsRequest {
    /// Markup documents, merged in this order.
    pub documents: Vec<String>,
}

/// Result of a document ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsResponse {
    /// Number of documents merged.
    pub documents: usize,
    /// Nodes in the merged graph.
    pub node_count: usize,
    /// Edges in the merged graph.
    pub edge_count: usize,
    /// What reconciliation did to the store.
    pub report: ReconcileReport,
}

/// Filter choices for the rendering side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeChoicesResponse {
    /// Node types in discovery order.
    pub node_types: Vec<String>,
    /// Edge types in discovery order; `""` stands for untyped edges.
    pub edge_types: Vec<String>,
    /// First discovered node, used as the initial ego center.
    pub default_center: Option<String>,
    /// Depth used when an ego request omits it.
    pub default_depth: usize,
}

/// Ego-network request. A missing depth uses the configured default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EgoRequest {
    /// Center node; omitted means the whole filtered graph.
    #[serde(default)]
    pub center: Option<String>,
    /// Maximum hop count.
    #[serde(default)]
    pub depth: Option<usize>,
    /// Type allow-lists.
    #[serde(flatten)]
    pub filter: TypeFilter,
}

/// Ego-network response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EgoResponse {
    /// Center used, if any.
    pub center: Option<String>,
    /// Depth used.
    pub depth: usize,
    /// The extracted subgraph.
    pub graph: Graph,
}

/// Lemma selection for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Selected `nuclearLemmas` values.
    pub lemmas: BTreeSet<String>,
}

/// Response to a store wipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    /// Store connectivity status.
    pub store_connected: bool,
    /// Size of the cached graph, if one is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphSummary>,
}

/// Node and edge counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub store: bool,
    pub details: Option<String>,
}

/// Structured error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Error returned by handlers: a status plus an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, body: ErrorResponse) -> Self {
        Self { status, body }
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        let status = match &e {
            GraphError::MalformedDocument(_)
            | GraphError::DocumentIo { .. }
            | GraphError::Aggregation { .. } => StatusCode::BAD_REQUEST,
            GraphError::StoreIo(_) | GraphError::Snapshot(_) | GraphError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let mut body = ErrorResponse::new(e.code(), e.to_string());
        if let GraphError::Aggregation { index, .. } = &e {
            body = body.with_details(format!("document index {}", index));
        }
        Self::new(status, body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            status = self.status.as_u16(),
            code = %self.body.code,
            error = %self.body.error,
            "Request error"
        );
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Route Handlers
// ============================================================================

/// Parse a document set, reconcile the store and cache the merged graph.
async fn documents_handler<S: GraphStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Json(request): Json<DocumentsRequest>,
) -> ApiResult<DocumentsResponse> {
    let count = request.documents.len();
    let limit = state.config.max_batch_documents;
    if count == 0 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("EMPTY_BATCH", "No documents supplied"),
        ));
    }
    if count > limit {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(
                "BATCH_TOO_LARGE",
                format!("{} documents exceeds the limit of {}", count, limit),
            ),
        ));
    }

    let start = Instant::now();
    let sources = request.documents.into_iter().map(DocumentSource::Text).collect();

    let _writes = state.lock_writes().await;
    let outcome = match ingest::ingest(sources, Arc::clone(&state.store), state.config.edge_match).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // A failed reconcile may have left the store part way.
            if matches!(e, GraphError::StoreIo(_)) {
                state.invalidate();
            }
            return Err(e.into());
        }
    };

    let node_count = outcome.graph.num_nodes();
    let edge_count = outcome.graph.num_edges();
    record_ingest_metrics(count, node_count, edge_count, start.elapsed().as_millis() as u64);
    state.set_graph(outcome.graph);

    Ok(Json(DocumentsResponse {
        documents: count,
        node_count,
        edge_count,
        report: outcome.report,
    }))
}

/// Current merged graph.
async fn graph_handler<S: GraphStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> ApiResult<Graph> {
    Ok(Json(state.current_graph().await?))
}

/// Wipe the store and the cache.
async fn clear_handler<S: GraphStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> ApiResult<ClearResponse> {
    let _writes = state.lock_writes().await;
    state.invalidate();
    state.store.clear().await.map_err(GraphError::from_store)?;
    tracing::info!("Graph store cleared");
    Ok(Json(ClearResponse { cleared: true }))
}

/// Node and edge type choices.
async fn type_choices_handler<S: GraphStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> ApiResult<TypeChoicesResponse> {
    let graph = state.current_graph().await?;
    Ok(Json(TypeChoicesResponse {
        node_types: graph.node_types().into_iter().map(str::to_owned).collect(),
        edge_types: graph.edge_types().into_iter().map(str::to_owned).collect(),
        default_center: graph.first_node_id().map(str::to_owned),
        default_depth: state.config.ego_default_depth,
    }))
}

/// Bounded-depth, type-filtered ego network.
async fn ego_handler<S: GraphStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Json(request): Json<EgoRequest>,
) -> ApiResult<EgoResponse> {
    let start = Instant::now();
    let graph = state.current_graph().await?;

    let depth = request.depth.unwrap_or(state.config.ego_default_depth);
    let query = EgoQuery {
        center: request.center,
        depth,
        filter: request.filter,
    };
    let ego = query.run(&graph);

    if let Some(center) = &query.center {
        if ego.is_empty() {
            return Err(ApiError::new(
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NODE_NOT_FOUND", format!("No node {} in the filtered graph", center)),
            ));
        }
    }

    record_ego_metrics(ego.num_nodes(), ego.num_edges(), depth, start.elapsed().as_millis() as u64);

    Ok(Json(EgoResponse {
        center: query.center,
        depth,
        graph: ego,
    }))
}

/// Lemma-selection export.
async fn export_handler<S: GraphStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<GraphExport> {
    let graph = state.current_graph().await?;
    Ok(Json(GraphExport::select(&graph, &request.lemmas)))
}

/// Health check endpoint (detailed).
async fn health_handler<S: GraphStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Json<HealthResponse> {
    let store_connected = state.store.is_healthy().await;
    let graph = state.cached_graph().map(|g| GraphSummary {
        nodes: g.num_nodes(),
        edges: g.num_edges(),
    });

    Json(HealthResponse {
        status: if store_connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: GRAPH_SCHEMA_VERSION.to_string(),
        store_connected,
        graph,
    })
}

/// Liveness endpoint. Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness endpoint.
///
/// Returns 200 if the store is reachable, 503 otherwise.
async fn readiness_handler<S: GraphStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.store.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            store: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: false,
                details: Some("Store connection failed".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for any store backend.
pub fn create_router<S: GraphStore + 'static>(state: ServiceState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Ingest and graph access
        .route("/api/documents", post(documents_handler::<S>))
        .route("/api/graph", get(graph_handler::<S>).delete(clear_handler::<S>))
        .route("/api/node-types", get(type_choices_handler::<S>))
        // Views
        .route("/api/ego", post(ego_handler::<S>))
        .route("/api/export", post(export_handler::<S>))
        // Health checks
        .route("/health", get(health_handler::<S>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .with_state(state)
}

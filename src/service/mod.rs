//! Discourse Graph REST Service
//!
//! ## Endpoints
//!
//! - `POST /api/documents` - Parse a document set and reconcile the store
//! - `GET /api/graph` - Current merged graph
//! - `DELETE /api/graph` - Wipe the store
//! - `GET /api/node-types` - Node and edge type filter choices
//! - `POST /api/ego` - Type-filtered ego network around a center node
//! - `POST /api/export` - Nodes and edges for selected lemmas
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness check
//! - `GET /health/ready` - Readiness check

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_ego_metrics, record_ingest_metrics};
pub use routes::{create_router, ApiError, AppState, ErrorResponse};
pub use state::ServiceState;

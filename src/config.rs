//! Runtime configuration from environment variables.
//!
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `PORT`: Service port (default: 8002)
//! - `LOG_FORMAT`: "json" or "pretty" (default: json)
//! - `EGO_DEFAULT_DEPTH`: Depth used when a query omits it (default: 1)
//! - `MAX_BATCH_DOCUMENTS`: Largest accepted document batch (default: 256)
//! - `EDGE_MATCH`: "endpoints" or "endpoints_and_type" (default: endpoints)

use crate::reconcile::EdgeMatch;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines.
    Json,
    /// Human-readable output for local development.
    Pretty,
}

/// Service and pipeline configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log output format.
    pub log_format: LogFormat,
    /// Ego depth when a query omits it.
    pub ego_default_depth: usize,
    /// Maximum documents per ingest batch.
    pub max_batch_documents: usize,
    /// Edge match key used during reconciliation.
    pub edge_match: EdgeMatch,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8002,
            log_format: LogFormat::Json,
            ego_default_depth: 1,
            max_batch_documents: 256,
            edge_match: EdgeMatch::Endpoints,
        }
    }
}

impl GraphConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let edge_match = match lookup("EDGE_MATCH") {
            Some(raw) => raw.parse::<EdgeMatch>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Unknown EDGE_MATCH, using endpoints");
                defaults.edge_match
            }),
            None => defaults.edge_match,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT").and_then(|s| s.parse().ok()).unwrap_or(defaults.port),
            log_format,
            ego_default_depth: lookup("EGO_DEFAULT_DEPTH")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ego_default_depth),
            max_batch_documents: lookup("MAX_BATCH_DOCUMENTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_batch_documents),
            edge_match,
        }
    }

    /// `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

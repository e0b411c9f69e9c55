//! PostgreSQL graph store for persistent sessions.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Executor, Row};
use std::time::Duration;

use crate::types::{Edge, Graph, Node};
use super::GraphStore;

/// Schema for the node and edge collections.
///
/// `write_seq` is drawn from one sequence on every insert and update, so
/// ordering by it returns entities in write order.
pub const GRAPH_TABLES_SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS discourse_write_seq;

CREATE TABLE IF NOT EXISTS discourse_nodes (
    id              TEXT PRIMARY KEY,
    node_type       TEXT NOT NULL,
    class           TEXT NOT NULL,
    nuclear_lemmas  TEXT NOT NULL,
    node_values     TEXT,
    write_seq       BIGINT NOT NULL DEFAULT nextval('discourse_write_seq'),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS discourse_edges (
    id              TEXT PRIMARY KEY,
    source_id       TEXT NOT NULL,
    target_id       TEXT NOT NULL,
    edge_type       TEXT,
    edge_function   TEXT,
    write_seq       BIGINT NOT NULL DEFAULT nextval('discourse_write_seq'),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

ALTER TABLE discourse_nodes
    ADD COLUMN IF NOT EXISTS write_seq BIGINT NOT NULL DEFAULT nextval('discourse_write_seq');
ALTER TABLE discourse_edges
    ADD COLUMN IF NOT EXISTS write_seq BIGINT NOT NULL DEFAULT nextval('discourse_write_seq');

CREATE INDEX IF NOT EXISTS discourse_edges_endpoints
    ON discourse_edges (source_id, target_id);
"#;

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
}

impl PostgresConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/discourse_graph".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// PostgreSQL graph store.
pub struct PostgresGraphStore {
    pool: PgPool,
}

impl PostgresGraphStore {
    /// Connect with the given configuration and create tables if missing.
    pub async fn new(config: PostgresConfig) -> Result<Self, PostgresError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, PostgresError> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Create the node and edge tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), PostgresError> {
        self.pool.execute(GRAPH_TABLES_SCHEMA).await?;
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    /// Close the pool. Close failures are not reported.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn parse_node_row(row: &PgRow) -> Result<Node, sqlx::Error> {
        let node = Node::new(
            row.try_get::<String, _>("id")?,
            row.try_get::<String, _>("node_type")?,
            row.try_get::<String, _>("class")?,
            row.try_get::<String, _>("nuclear_lemmas")?,
        );
        Ok(node.with_values(row.try_get("node_values")?))
    }

    fn parse_edge_row(row: &PgRow) -> Result<Edge, sqlx::Error> {
        let edge = Edge::new(
            row.try_get::<String, _>("id")?,
            row.try_get::<String, _>("source_id")?,
            row.try_get::<String, _>("target_id")?,
        );
        Ok(edge
            .with_type(row.try_get("edge_type")?)
            .with_function(row.try_get("edge_function")?))
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
impl GraphStore for PostgresGraphStore {
    type Error = PostgresError;

    async fn upsert_node(&self, node: &Node) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO discourse_nodes (id, node_type, class, nuclear_lemmas, node_values, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                node_type = EXCLUDED.node_type,
                class = EXCLUDED.class,
                nuclear_lemmas = EXCLUDED.nuclear_lemmas,
                node_values = EXCLUDED.node_values,
                write_seq = nextval('discourse_write_seq'),
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(&node.id)
        .bind(&node.node_type)
        .bind(&node.class)
        .bind(&node.nuclear_lemmas)
        .bind(&node.values)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<(), Self::Error> {
        sqlx::query("DELETE FROM discourse_nodes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_edge(&self, edge: &Edge) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO discourse_edges (id, source_id, target_id, edge_type, edge_function, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                source_id = EXCLUDED.source_id,
                target_id = EXCLUDED.target_id,
                edge_type = EXCLUDED.edge_type,
                edge_function = EXCLUDED.edge_function,
                write_seq = nextval('discourse_write_seq'),
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(&edge.id)
        .bind(&edge.source)
        .bind(&edge.target)
        .bind(&edge.edge_type)
        .bind(&edge.function)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_edge(&self, id: &str) -> Result<(), Self::Error> {
        sqlx::query("DELETE FROM discourse_edges WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Graph, Self::Error> {
        let node_rows = sqlx::query(
            r#"
            SELECT id, node_type, class, nuclear_lemmas, node_values
            FROM discourse_nodes
            ORDER BY write_seq
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        let edge_rows = sqlx::query(
            r#"
            SELECT id, source_id, target_id, edge_type, edge_function
            FROM discourse_edges
            ORDER BY write_seq
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        let nodes = node_rows
            .iter()
            .map(Self::parse_node_row)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = edge_rows
            .iter()
            .map(Self::parse_edge_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Graph::from_parts(nodes, edges))
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM discourse_edges").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM discourse_nodes").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

//! Read-only SQLite implementation of [`QueryStorePort`].

use super::error::Result;
use super::pool::ReadPool;
use super::schema::{SchemaFilter, introspect};
use crate::config::FileDatabaseConfig;
use async_trait::async_trait;
use retail_application::{QueryStorePort, StoreError};
use retail_domain::{QueryResult, Row, Scalar, SchemaDescription};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// VM instructions between timeout checks
const PROGRESS_INTERVAL: i32 = 1000;

/// Everything needed to open the store
#[derive(Debug, Clone)]
pub struct SqliteStoreOptions {
    pub path: PathBuf,
    pub pool_size: usize,
    pub filter: SchemaFilter,
    pub views: BTreeMap<String, String>,
}

impl From<&FileDatabaseConfig> for SqliteStoreOptions {
    fn from(config: &FileDatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            pool_size: config.pool_size,
            filter: SchemaFilter {
                tables: config.tables.clone(),
                hidden_columns: config.hidden_columns.clone(),
            },
            views: config.views.clone(),
        }
    }
}

pub struct SqliteQueryStore {
    pool: Arc<ReadPool>,
    schema: SchemaDescription,
}

impl SqliteQueryStore {
    /// Open the pool and introspect the reduced schema once.
    pub fn open(options: &SqliteStoreOptions) -> Result<Self> {
        let pool = ReadPool::open(&options.path, options.pool_size, &options.views)?;
        let schema = pool.with_conn(|conn| introspect(conn, &options.filter))??;
        info!(
            "Opened {} ({} tables exposed: {})",
            options.path.display(),
            schema.tables.len(),
            schema.table_names().join(", ")
        );
        Ok(Self {
            pool: Arc::new(pool),
            schema,
        })
    }

    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }
}

#[async_trait]
impl QueryStorePort for SqliteQueryStore {
    async fn validate(&self, sql: &str) -> std::result::Result<(), StoreError> {
        let pool = Arc::clone(&self.pool);
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || pool.with_conn(|conn| check_statement(conn, &sql)))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }

    async fn execute(&self, sql: &str, timeout: Duration) -> QueryResult {
        let pool = Arc::clone(&self.pool);
        let owned = sql.to_string();
        let started = Instant::now();
        let joined =
            tokio::task::spawn_blocking(move || pool.with_conn(|conn| run(conn, &owned, timeout)))
                .await;

        let result = match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => QueryResult::failure(e.to_string()),
            Err(e) => QueryResult::failure(format!("query task failed: {}", e)),
        };
        debug!(
            success = result.is_success(),
            rows = result.rows().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "executed query"
        );
        result
    }
}

/// Compile without running; reject anything that would write.
fn check_statement(conn: &Connection, sql: &str) -> std::result::Result<(), StoreError> {
    let stmt = conn
        .prepare(sql)
        .map_err(|e| StoreError::Rejected(e.to_string()))?;
    if !stmt.readonly() {
        return Err(StoreError::Rejected(
            "only read-only statements are allowed".to_string(),
        ));
    }
    Ok(())
}

fn run(conn: &Connection, sql: &str, timeout: Duration) -> QueryResult {
    let deadline = Instant::now() + timeout;
    conn.progress_handler(PROGRESS_INTERVAL, Some(move || Instant::now() >= deadline));
    let result = fetch(conn, sql).unwrap_or_else(|e| {
        if e.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
            QueryResult::failure(format!(
                "query timed out after {:.1}s",
                timeout.as_secs_f64()
            ))
        } else {
            QueryResult::failure(e.to_string())
        }
    });
    conn.progress_handler(0, None::<fn() -> bool>);
    result
}

fn fetch(conn: &Connection, sql: &str) -> rusqlite::Result<QueryResult> {
    let mut stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
        return Ok(QueryResult::failure(
            "only read-only statements are allowed",
        ));
    }
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            cells.push((name.clone(), scalar(row.get_ref(idx)?)));
        }
        rows.push(Row::new(cells));
    }
    Ok(QueryResult::success(columns, rows))
}

fn scalar(value: ValueRef<'_>) -> Scalar {
    match value {
        ValueRef::Null => Scalar::Null,
        ValueRef::Integer(i) => Scalar::Integer(i),
        ValueRef::Real(r) => Scalar::Real(r),
        ValueRef::Text(t) => Scalar::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Scalar::Blob(b.to_vec()),
    }
}

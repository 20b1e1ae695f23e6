//! Query store port
//!
//! The read-only relational store that generated queries run against.

use async_trait::async_trait;
use retail_domain::QueryResult;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a query store outside of query execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The statement was rejected before execution; the text is the store's own message
    #[error("{0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only query target
///
/// `execute` never fails past its boundary: every problem (syntax, missing
/// table or column, timeout, a writing statement) is returned as
/// [`QueryResult::Failure`] carrying the store's error text.
#[async_trait]
pub trait QueryStorePort: Send + Sync {
    /// Compile the statement without running it
    async fn validate(&self, sql: &str) -> Result<(), StoreError>;

    /// Run the statement with a time budget
    async fn execute(&self, sql: &str, timeout: Duration) -> QueryResult;
}

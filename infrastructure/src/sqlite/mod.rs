//! SQLite adapter
//!
//! A pool of read-only connections implementing [`retail_application::QueryStorePort`],
//! plus the schema introspection that feeds query generation.

pub mod error;
pub mod pool;
pub mod schema;
pub mod store;

pub use error::StorageError;
pub use schema::{SchemaFilter, introspect};
pub use store::{SqliteQueryStore, SqliteStoreOptions};

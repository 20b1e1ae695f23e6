//! Structured query domain
//!
//! Everything about a generated query that can be decided without touching
//! the store: the reduced schema shown to the generator, cleaning of model
//! output into a bare statement, the result model, and the bounded repair
//! state machine.

mod repair;
mod result;
mod schema;
mod sql;

pub use repair::{MAX_REPAIRS, RepairBudget, RepairEvent, RepairState, RepairStep, RepairTrace};
pub use result::{QueryAttempt, QueryResult, Row, Scalar};
pub use schema::{ColumnSchema, SchemaDescription, TableSchema};
pub use sql::{clean_generated_sql, tables_referenced};

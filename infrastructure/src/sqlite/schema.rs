//! Schema introspection: the reduced view of the store shown to query generation.

use super::error::{Result, StorageError};
use retail_domain::{ColumnSchema, SchemaDescription, TableSchema};
use rusqlite::Connection;

/// Which tables and columns are exposed. Names compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct SchemaFilter {
    /// Empty exposes every table and view
    pub tables: Vec<String>,
    pub hidden_columns: Vec<String>,
}

impl SchemaFilter {
    fn allows_table(&self, name: &str) -> bool {
        self.tables.is_empty() || self.tables.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    fn hides_column(&self, name: &str) -> bool {
        self.hidden_columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Double-quote an identifier for SQLite
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// List allowed tables and views (TEMP views included) with their visible
/// columns, sorted by name.
pub fn introspect(conn: &Connection, filter: &SchemaFilter) -> Result<SchemaDescription> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
         UNION
         SELECT name FROM sqlite_temp_master WHERE type = 'view'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut tables = Vec::new();
    for name in names.into_iter().filter(|n| filter.allows_table(n)) {
        let columns = table_columns(conn, &name)?
            .into_iter()
            .filter(|c| !filter.hides_column(&c.name))
            .collect::<Vec<_>>();
        if !columns.is_empty() {
            tables.push(TableSchema::new(name, columns));
        }
    }

    if tables.is_empty() {
        return Err(StorageError::EmptySchema(filter.tables.join(", ")));
    }
    Ok(SchemaDescription::new(tables))
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnSchema>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnSchema::new(
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

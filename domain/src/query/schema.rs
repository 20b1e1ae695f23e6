//! Reduced relational schema description

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type as reported by the store (may be empty)
    #[serde(default)]
    pub decl_type: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, decl_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decl_type: decl_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Name as it must appear in a statement (quoted when it contains spaces)
    pub fn quoted_name(&self) -> String {
        if self.name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            self.name.clone()
        } else {
            format!("\"{}\"", self.name.replace('"', "\"\""))
        }
    }
}

/// The subset of the store's schema exposed to the query generator.
///
/// Introspected once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableSchema>,
}

impl SchemaDescription {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Case-insensitive table lookup
    pub fn find_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Render the schema for a generation prompt, one line per table
    pub fn to_prompt(&self) -> String {
        let mut out = String::from("Database schema (SQLite):");
        for table in &self.tables {
            let columns = table
                .columns
                .iter()
                .map(|c| {
                    if c.decl_type.is_empty() {
                        c.name.clone()
                    } else {
                        format!("{} {}", c.name, c.decl_type)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("\nTable {} ({})", table.quoted_name(), columns));
        }
        out
    }
}

//! Data source locations from TOML (`[corpus]`, `[database]`, `[exemplars]`)

use retail_domain::retrieval::DEFAULT_MAX_CHUNK_CHARS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Document corpus: every `*.md` file under `dir`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCorpusConfig {
    pub dir: PathBuf,
    pub max_chunk_chars: usize,
}

impl Default for FileCorpusConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("docs"),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

/// Read-only relational store
///
/// ```toml
/// [database]
/// path = "data/northwind.sqlite"
/// tables = ["Categories", "Customers", "Orders", "Products", "orderitems"]
/// hidden_columns = ["Picture", "Freight"]
///
/// [database.views]
/// orderitems = "Order Details"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDatabaseConfig {
    pub path: PathBuf,
    /// Read connections kept open
    pub pool_size: usize,
    /// Tables and views exposed to query generation (case-insensitive); empty exposes all
    pub tables: Vec<String>,
    /// Columns never shown to query generation (case-insensitive)
    pub hidden_columns: Vec<String>,
    /// Alias view name to source table, created as TEMP views per connection
    pub views: BTreeMap<String, String>,
}

impl Default for FileDatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/northwind.sqlite"),
            pool_size: 4,
            tables: ["Categories", "Customers", "Orders", "Products", "orderitems"]
                .into_iter()
                .map(String::from)
                .collect(),
            hidden_columns: [
                "SupplierID",
                "ShipperID",
                "Picture",
                "EmployeeID",
                "Freight",
                "ShipName",
                "ShipPostalCode",
                "ShipAddress",
                "ShipCity",
                "ShipRegion",
                "ShipCountry",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            views: BTreeMap::from([("orderitems".to_string(), "Order Details".to_string())]),
        }
    }
}

/// Few-shot exemplar artifacts. A missing directory means zero-shot everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExemplarsConfig {
    pub dir: PathBuf,
}

impl Default for FileExemplarsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("optimized_modules"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_table_deserializes() {
        let toml_str = r#"
[database]
path = "shop.db"
tables = []

[database.views]
line_items = "Order Details"
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.path, PathBuf::from("shop.db"));
        assert!(config.database.tables.is_empty());
        assert_eq!(config.database.views.get("line_items").unwrap(), "Order Details");
        // untouched keys keep their defaults
        assert_eq!(config.database.pool_size, 4);
    }
}

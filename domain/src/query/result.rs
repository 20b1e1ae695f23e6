//! Query attempts and their outcomes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single cell value as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Real(r) => Some(*r),
            Scalar::Text(t) => t.trim().parse().ok(),
            Scalar::Null | Scalar::Blob(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Integer(i) => Value::from(*i),
            Scalar::Real(r) => Value::from(*r),
            Scalar::Text(t) => Value::from(t.as_str()),
            Scalar::Blob(b) => Value::from(format!("<{} bytes>", b.len())),
        }
    }
}

/// One result row: column name to value, in the store's column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row(pub Vec<(String, Scalar)>);

impl Row {
    pub fn new(cells: Vec<(String, Scalar)>) -> Self {
        Self(cells)
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.0
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }

    pub fn first(&self) -> Option<&Scalar> {
        self.0.first().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object with keys in column order
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

/// Outcome of executing one query. Exactly one variant holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryResult {
    /// Rows in the store's native order; zero rows is still a success
    Success { columns: Vec<String>, rows: Vec<Row> },
    /// Error text exactly as the store reported it
    Failure { error: String },
}

impl QueryResult {
    pub fn success(columns: Vec<String>, rows: Vec<Row>) -> Self {
        QueryResult::Success { columns, rows }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        QueryResult::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success { .. })
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResult::Success { rows, .. } => rows,
            QueryResult::Failure { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryResult::Failure { error } => Some(error),
            QueryResult::Success { .. } => None,
        }
    }

    pub fn has_rows(&self) -> bool {
        !self.rows().is_empty()
    }

    /// Render for a synthesis prompt, keeping at most `max_rows` rows
    pub fn to_prompt_json(&self, max_rows: usize) -> String {
        match self {
            QueryResult::Success { columns, rows } => {
                let shown: Vec<Value> = rows.iter().take(max_rows).map(Row::to_json).collect();
                let mut out = serde_json::json!({
                    "columns": columns,
                    "rows": shown,
                    "row_count": rows.len(),
                })
                .to_string();
                if rows.len() > max_rows {
                    out.push_str(&format!("\n({} more rows omitted)", rows.len() - max_rows));
                }
                out
            }
            QueryResult::Failure { error } => format!("Query failed: {error}"),
        }
    }
}

/// One generated query, before or after execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAttempt {
    pub sql: String,
    /// 0 for the initial attempt, 1.. for repairs
    pub index: u8,
    /// Error of the attempt this one repairs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_error: Option<String>,
}

impl QueryAttempt {
    pub fn initial(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            index: 0,
            prior_error: None,
        }
    }

    pub fn repair(sql: impl Into<String>, index: u8, prior_error: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            index,
            prior_error: Some(prior_error.into()),
        }
    }

    pub fn is_repair(&self) -> bool {
        self.index > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, Scalar)]) -> Row {
        Row::new(
            cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_row_json_keeps_column_order() {
        let r = row(&[
            ("zeta", Scalar::Integer(1)),
            ("alpha", Scalar::Text("x".into())),
        ]);
        assert_eq!(r.to_json().to_string(), r#"{"zeta":1,"alpha":"x"}"#);
        assert_eq!(r.get("ALPHA"), Some(&Scalar::Text("x".into())));
    }

    #[test]
    fn test_scalar_as_f64() {
        assert_eq!(Scalar::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Scalar::Text(" 2.5 ".into()).as_f64(), Some(2.5));
        assert_eq!(Scalar::Null.as_f64(), None);
    }

    #[test]
    fn test_result_variants() {
        let ok = QueryResult::success(vec!["n".into()], vec![]);
        assert!(ok.is_success());
        assert!(!ok.has_rows());
        assert!(ok.error().is_none());

        let err = QueryResult::failure("no such table: Foo");
        assert!(!err.is_success());
        assert_eq!(err.error(), Some("no such table: Foo"));
        assert!(err.rows().is_empty());
    }

    #[test]
    fn test_prompt_json_caps_rows() {
        let rows = (0..5).map(|i| row(&[("n", Scalar::Integer(i))])).collect();
        let result = QueryResult::success(vec!["n".into()], rows);
        let text = result.to_prompt_json(2);
        assert!(text.contains(r#""row_count":5"#));
        assert!(text.contains("(3 more rows omitted)"));
    }

    #[test]
    fn test_attempt_constructors() {
        assert!(!QueryAttempt::initial("SELECT 1").is_repair());
        let r = QueryAttempt::repair("SELECT 2", 1, "syntax error");
        assert!(r.is_repair());
        assert_eq!(r.prior_error.as_deref(), Some("syntax error"));
    }
}

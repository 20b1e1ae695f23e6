//! Configuration validation issues.
//!
//! Configuration is validated once at startup. Each problem is reported as a
//! [`ConfigIssue`] with a severity so the caller can decide whether to abort
//! (errors) or continue with a warning.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A model field was set to an empty string.
    EmptyModelName { field: String },
    /// A numeric field is outside its accepted range.
    OutOfRange { field: String, value: String },
    /// A configured path does not exist.
    MissingPath { field: String, path: String },
    /// Router and query roles share a model that is not code-oriented.
    NonCodeQueryModel { model: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_severity() {
        let issue = ConfigIssue::error(
            ConfigIssueCode::EmptyModelName {
                field: "router".to_string(),
            },
            "models.router: model name cannot be empty",
        );
        assert!(issue.is_error());

        let issue = ConfigIssue::warning(
            ConfigIssueCode::NonCodeQueryModel {
                model: "llama3.2:3b".to_string(),
            },
            "query model is not code-oriented",
        );
        assert!(!issue.is_error());
    }
}

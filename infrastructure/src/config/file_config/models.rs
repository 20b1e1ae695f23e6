//! Role-based model configuration from TOML (`[models]` section)

use retail_domain::{ConfigIssue, ConfigIssueCode, Model, ModelConfig};
use serde::{Deserialize, Serialize};

/// Role-based model configuration from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// router = "phi3.5:3.8b-mini-instruct-q4_K_M"   # Route classification
/// query = "qwen2.5-coder:7b"                    # Query generation + repair
/// synthesizer = "phi3.5:3.8b-mini-instruct-q4_K_M"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub router: Option<String>,
    pub query: Option<String>,
    pub synthesizer: Option<String>,
}

impl FileModelsConfig {
    /// Parse a single model string, collecting issues for empty names.
    fn parse_single_model(
        field: &str,
        value: Option<&String>,
    ) -> (Option<Model>, Vec<ConfigIssue>) {
        match value {
            None => (None, Vec::new()),
            Some(s) if s.trim().is_empty() => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName {
                        field: field.to_string(),
                    },
                    format!("models.{}: model name cannot be empty", field),
                )],
            ),
            Some(s) => (Some(Model::from(s.trim())), Vec::new()),
        }
    }

    pub fn parse_router(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("router", self.router.as_ref())
    }

    pub fn parse_query(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("query", self.query.as_ref())
    }

    pub fn parse_synthesizer(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("synthesizer", self.synthesizer.as_ref())
    }

    /// Every parse issue across the three roles
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_router().1;
        issues.extend(self.parse_query().1);
        issues.extend(self.parse_synthesizer().1);

        if let Some(query) = self.parse_query().0
            && !query.is_code_model()
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::NonCodeQueryModel {
                    model: query.to_string(),
                },
                format!(
                    "models.query: '{}' does not look like a code model; \
                     query generation may suffer",
                    query
                ),
            ));
        }
        issues
    }

    /// Overlay configured roles onto the defaults. Empty names are ignored.
    pub fn to_model_config(&self) -> ModelConfig {
        let mut config = ModelConfig::default();
        if let Some(model) = self.parse_router().0 {
            config = config.with_router(model);
        }
        if let Some(model) = self.parse_query().0 {
            config = config.with_query(model);
        }
        if let Some(model) = self.parse_synthesizer().0 {
            config = config.with_synthesizer(model);
        }
        config
    }
}

//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod models;
mod output;
mod pipeline;
mod sources;

pub use models::FileModelsConfig;
pub use output::{FileLoggingConfig, FileOutputConfig, FileOutputFormat};
pub use pipeline::{FileInferenceConfig, FilePipelineConfig};
pub use sources::{FileCorpusConfig, FileDatabaseConfig, FileExemplarsConfig};

use retail_application::PipelineParams;
use retail_domain::{ConfigIssue, ConfigIssueCode, ModelConfig};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Role-based model selection
    pub models: FileModelsConfig,
    /// Inference backend connection
    pub inference: FileInferenceConfig,
    /// Per-question limits
    pub pipeline: FilePipelineConfig,
    pub corpus: FileCorpusConfig,
    pub database: FileDatabaseConfig,
    pub exemplars: FileExemplarsConfig,
    /// Output settings
    pub output: FileOutputConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks model names, numeric ranges, and that the database file exists.
    /// A missing corpus or exemplar directory is only a warning.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.models.issues();
        issues.extend(self.pipeline.issues());

        if self.database.pool_size == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "database.pool_size".to_string(),
                    value: "0".to_string(),
                },
                "database.pool_size: must be at least 1",
            ));
        }
        if !self.database.path.exists() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingPath {
                    field: "database.path".to_string(),
                    path: self.database.path.display().to_string(),
                },
                format!("database.path: {} not found", self.database.path.display()),
            ));
        }
        if !self.corpus.dir.is_dir() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MissingPath {
                    field: "corpus.dir".to_string(),
                    path: self.corpus.dir.display().to_string(),
                },
                format!(
                    "corpus.dir: {} not found, retrieval will find nothing",
                    self.corpus.dir.display()
                ),
            ));
        }

        issues
    }

    pub fn model_config(&self) -> ModelConfig {
        self.models.to_model_config()
    }

    pub fn pipeline_params(&self) -> PipelineParams {
        self.pipeline.to_pipeline_params(&self.inference)
    }
}

//! Inference and pipeline limits from TOML (`[inference]`, `[pipeline]`)

use retail_application::PipelineParams;
use retail_domain::{ConfigIssue, ConfigIssueCode, MAX_REPAIRS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inference backend settings
///
/// ```toml
/// [inference]
/// base_url = "http://localhost:11434"
/// timeout_secs = 120
/// seed = 42
/// temperature = 0.0
/// max_tokens = 1500
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInferenceConfig {
    pub base_url: String,
    /// Per-call timeout; 0 disables it
    pub timeout_secs: u64,
    pub seed: Option<u64>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FileInferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 120,
            seed: Some(42),
            temperature: 0.0,
            max_tokens: 1500,
        }
    }
}

impl FileInferenceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Per-question limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    pub top_k: usize,
    pub max_repairs: u8,
    pub query_timeout_secs: u64,
    pub max_result_rows: usize,
    /// Questions answered concurrently in batch mode
    pub jobs: usize,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        let params = PipelineParams::default();
        Self {
            top_k: params.top_k,
            max_repairs: params.max_repairs,
            query_timeout_secs: params.query_timeout.as_secs(),
            max_result_rows: params.max_result_rows,
            jobs: params.batch_concurrency,
        }
    }
}

impl FilePipelineConfig {
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.top_k == 0 {
            issues.push(out_of_range("pipeline.top_k", self.top_k, "must be at least 1"));
        }
        if self.max_repairs > MAX_REPAIRS {
            issues.push(out_of_range(
                "pipeline.max_repairs",
                self.max_repairs,
                &format!("cannot exceed {}", MAX_REPAIRS),
            ));
        }
        if self.query_timeout_secs == 0 {
            issues.push(out_of_range(
                "pipeline.query_timeout_secs",
                self.query_timeout_secs,
                "must be at least 1",
            ));
        }
        issues
    }

    pub fn to_pipeline_params(&self, inference: &FileInferenceConfig) -> PipelineParams {
        PipelineParams::default()
            .with_top_k(self.top_k)
            .with_max_repairs(self.max_repairs)
            .with_query_timeout(Duration::from_secs(self.query_timeout_secs))
            .with_inference_timeout(inference.timeout())
            .with_max_result_rows(self.max_result_rows)
            .with_batch_concurrency(self.jobs)
    }
}

fn out_of_range(field: &str, value: impl ToString, reason: &str) -> ConfigIssue {
    ConfigIssue::error(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
        },
        format!("{}: {}", field, reason),
    )
}

//! Few-shot exemplar loading
//!
//! Every `*.json` file in the exemplar directory is read in one of two
//! formats:
//!
//! - native: `{"stage": "router", "version": "v2", "examples": [{"inputs": {..}, "output": {..}}]}`
//! - a saved DSPy program: `{"<predictor>": {"demos": [{..}, ..]}, ..}`, with the
//!   stage taken from the file name (`router.json`, `sql_generator.json`, ...)
//!
//! Exemplars are optional. A missing directory or an unusable file only means
//! the affected stage runs zero-shot.

use retail_domain::{Exemplar, ExemplarLibrary, ExemplarSet, Stage};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExemplarError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot tell which stage {0} belongs to")]
    UnknownStage(PathBuf),
}

/// Stage for a DSPy program file, from its stem
fn stage_for_stem(stem: &str) -> Option<Stage> {
    match stem.to_lowercase().as_str() {
        "router" | "route" => Some(Stage::Router),
        "sql_generator" | "sql_gen" | "query_generation" | "generator" => {
            Some(Stage::QueryGeneration)
        }
        "sql_repair" | "repair" | "query_repair" => Some(Stage::QueryRepair),
        "synthesizer" | "synthesis" => Some(Stage::Synthesis),
        _ => None,
    }
}

/// Demo keys that are model outputs rather than inputs
fn output_fields(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Router => &["reasoning", "route"],
        Stage::QueryGeneration => &["reasoning", "sql"],
        Stage::QueryRepair => &["reasoning", "repaired_sql"],
        Stage::Synthesis => &["reasoning", "answer", "explanation"],
    }
}

/// Bookkeeping keys DSPy adds to bootstrapped demos
const DEMO_METADATA: [&str; 1] = ["augmented"];

#[derive(Debug, Clone, Default)]
pub struct ExemplarLoader;

impl ExemplarLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load every exemplar file under `dir`. Never fails: problems are logged
    /// and the affected stage stays zero-shot.
    pub fn load_dir(&self, dir: &Path) -> ExemplarLibrary {
        let mut library = ExemplarLibrary::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                info!("No exemplars at {}, running zero-shot", dir.display());
                return library;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            match self.load_file(&path) {
                Ok(set) => {
                    debug!(
                        "{}: {} {} exemplars",
                        path.display(),
                        set.len(),
                        set.stage
                    );
                    library.insert(set);
                }
                Err(ExemplarError::UnknownStage(p)) => {
                    debug!("Ignoring {}: not an exemplar file", p.display());
                }
                Err(e) => warn!("Skipping exemplars: {}", e),
            }
        }

        info!("Exemplars: {}", library.summary());
        library
    }

    /// Load a single file in either format
    pub fn load_file(&self, path: &Path) -> Result<ExemplarSet, ExemplarError> {
        let text = fs::read_to_string(path).map_err(|source| ExemplarError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| ExemplarError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        if value.get("stage").is_some() {
            return serde_json::from_value(value).map_err(|source| ExemplarError::Json {
                path: path.to_path_buf(),
                source,
            });
        }

        let stage = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(stage_for_stem)
            .ok_or_else(|| ExemplarError::UnknownStage(path.to_path_buf()))?;
        Ok(from_dspy_program(stage, &value))
    }
}

/// Collect the demos of every predictor in a saved DSPy program
fn from_dspy_program(stage: Stage, program: &Value) -> ExemplarSet {
    let outputs = output_fields(stage);
    let examples = program
        .as_object()
        .into_iter()
        .flat_map(|predictors| predictors.values())
        .filter_map(|predictor| predictor.get("demos")?.as_array())
        .flatten()
        .filter_map(Value::as_object)
        .map(|demo| split_demo(demo, outputs))
        .filter(|e| !e.inputs.is_empty() && !e.output.is_empty())
        .collect();
    ExemplarSet::new(stage, "dspy", examples)
}

fn split_demo(demo: &Map<String, Value>, outputs: &[&str]) -> Exemplar {
    let mut inputs = Map::new();
    let mut output = Map::new();
    for (key, value) in demo {
        if DEMO_METADATA.contains(&key.as_str()) {
            continue;
        }
        if outputs.contains(&key.as_str()) {
            output.insert(key.clone(), value.clone());
        } else {
            inputs.insert(key.clone(), value.clone());
        }
    }
    Exemplar::new(inputs, output)
}

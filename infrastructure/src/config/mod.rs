//! Configuration file loading for retail-copilot
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `COPILOT_<SECTION>__<KEY>` (e.g. `COPILOT_INFERENCE__BASE_URL`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./copilot.toml` or `./.copilot.toml`
//! 4. Global: `$XDG_CONFIG_HOME/retail-copilot/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileCorpusConfig, FileDatabaseConfig, FileExemplarsConfig, FileInferenceConfig,
    FileLoggingConfig, FileModelsConfig, FileOutputConfig, FileOutputFormat, FilePipelineConfig,
};
pub use loader::ConfigLoader;

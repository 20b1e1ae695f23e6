//! Application-level configuration.
//!
//! - [`PipelineParams`]: per-question limits (retrieval depth, repair budget, timeouts)

pub mod pipeline_params;

pub use pipeline_params::PipelineParams;

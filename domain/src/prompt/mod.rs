//! Prompt domain
//!
//! Templates for each model call in the pipeline: route classification,
//! query generation, query repair, and answer synthesis.

mod template;

pub use template::PromptTemplate;

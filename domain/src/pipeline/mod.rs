//! Per-question pipeline sequencing and trace

mod stage;
mod trace;

pub use stage::PipelineStage;
pub use trace::PipelineTrace;

//! Progress notification port
//!
//! Defines the interface for reporting progress while questions are answered.

use retail_domain::{PipelineStage, RouteDecision};

/// Callback for progress updates during pipeline execution
///
/// Implementations live in the presentation layer. Every method has a no-op
/// default so a reporter only implements what it displays.
pub trait ProgressNotifier: Send + Sync {
    /// Called when a question enters a stage
    fn on_stage_start(&self, _question_id: &str, _stage: PipelineStage) {}

    /// Called once the route is decided
    fn on_route(&self, _question_id: &str, _route: RouteDecision, _fell_back: bool) {}

    /// Called after each query execution attempt
    fn on_query_attempt(&self, _question_id: &str, _attempt: u8, _success: bool) {}

    /// Called when a question has its final answer
    fn on_question_complete(&self, _question_id: &str, _confidence: f64) {}

    // ==================== Batch Callbacks ====================

    fn on_batch_start(&self, _total: usize) {}

    fn on_batch_complete(&self) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {}

//! Heuristic confidence over a pipeline trace
//!
//! ```text
//! confidence = 0.3
//!            + min(avg_retrieval_score / 10, 0.3)   (0 when retrieval did not run)
//!            + 0.3  when the query ended in success
//!            + 0.2  when that success returned rows
//!            - 0.1 * repairs executed
//! ```
//!
//! clamped to `[0, 1]`. The repair penalty is deliberately blind to what the
//! repair fixed: a typo and a wrong join cost the same.

use crate::pipeline::PipelineTrace;
use serde::Serialize;

const BASE: f64 = 0.3;
const RETRIEVAL_CAP: f64 = 0.3;
const RETRIEVAL_SCALE: f64 = 10.0;
const QUERY_SUCCESS: f64 = 0.3;
const NON_EMPTY: f64 = 0.2;
const REPAIR_PENALTY: f64 = 0.1;

/// Each additive term of the score, kept for display and logging
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub base: f64,
    pub retrieval: f64,
    pub query_success: f64,
    pub non_empty: f64,
    pub repair_penalty: f64,
}

impl ConfidenceBreakdown {
    pub fn from_trace(trace: &PipelineTrace) -> Self {
        let retrieval = trace
            .retrieval
            .as_ref()
            .map(|r| (r.average_score() / RETRIEVAL_SCALE).min(RETRIEVAL_CAP))
            .unwrap_or(0.0);

        let (query_success, non_empty, repairs) = match &trace.repair {
            Some(repair) => {
                let success = repair.succeeded();
                let rows = repair
                    .final_result()
                    .is_some_and(|r| r.is_success() && r.has_rows());
                (
                    if success { QUERY_SUCCESS } else { 0.0 },
                    if rows { NON_EMPTY } else { 0.0 },
                    repair.repairs_executed(),
                )
            }
            None => (0.0, 0.0, 0),
        };

        Self {
            base: BASE,
            retrieval,
            query_success,
            non_empty,
            repair_penalty: REPAIR_PENALTY * repairs as f64,
        }
    }

    /// Sum of the terms, clamped to `[0, 1]`
    pub fn total(&self) -> f64 {
        let raw =
            self.base + self.retrieval + self.query_success + self.non_empty - self.repair_penalty;
        // strip float noise so 0.3 + 0.3 + 0.2 - 0.2 is exactly 0.6
        ((raw * 1e6).round() / 1e6).clamp(0.0, 1.0)
    }
}

/// Confidence for one question's trace
pub fn score_confidence(trace: &PipelineTrace) -> f64 {
    ConfidenceBreakdown::from_trace(trace).total()
}

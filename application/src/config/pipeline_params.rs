//! Pipeline parameters: per-question limits and timeouts.
//!
//! These are application-layer concerns, not domain policy. The repair cap
//! itself is domain policy and is enforced by
//! [`RepairBudget::new`](retail_domain::RepairBudget::new).

use retail_domain::{DomainError, MAX_REPAIRS, RepairBudget};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Chunks retrieved per question (capped at 3 by the retriever)
    pub top_k: usize,
    /// Repairs allowed after the initial query
    pub max_repairs: u8,
    /// Time budget for one query execution
    pub query_timeout: Duration,
    /// Time budget for one model call; `None` waits indefinitely
    pub inference_timeout: Option<Duration>,
    /// Rows placed into the synthesis prompt
    pub max_result_rows: usize,
    /// Questions answered concurrently in batch mode
    pub batch_concurrency: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_repairs: MAX_REPAIRS,
            query_timeout: Duration::from_secs(10),
            inference_timeout: Some(Duration::from_secs(120)),
            max_result_rows: 50,
            batch_concurrency: 4,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_repairs(mut self, max: u8) -> Self {
        self.max_repairs = max;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_inference_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn with_max_result_rows(mut self, rows: usize) -> Self {
        self.max_result_rows = rows;
        self
    }

    pub fn with_batch_concurrency(mut self, jobs: usize) -> Self {
        self.batch_concurrency = jobs.max(1);
        self
    }

    /// The repair budget these parameters ask for
    pub fn repair_budget(&self) -> Result<RepairBudget, DomainError> {
        RepairBudget::new(self.max_repairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = PipelineParams::default();
        assert_eq!(params.top_k, 3);
        assert_eq!(params.max_repairs, 2);
        assert_eq!(params.max_result_rows, 50);
        assert_eq!(params.repair_budget().unwrap().remaining(), 2);
    }

    #[test]
    fn test_builder() {
        let params = PipelineParams::default()
            .with_top_k(1)
            .with_max_repairs(0)
            .with_batch_concurrency(0)
            .with_inference_timeout(None);
        assert_eq!(params.top_k, 1);
        assert_eq!(params.repair_budget().unwrap().remaining(), 0);
        assert_eq!(params.batch_concurrency, 1);
        assert!(params.inference_timeout.is_none());
    }

    #[test]
    fn test_repair_budget_above_cap_rejected() {
        let params = PipelineParams::default().with_max_repairs(5);
        assert!(params.repair_budget().is_err());
    }
}

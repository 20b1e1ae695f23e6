//! Signals collected while answering one question

use crate::query::{QueryResult, RepairTrace};
use crate::retrieval::RetrievalResult;
use crate::routing::RouteDecision;

/// What the pipeline observed for one question.
///
/// Owned by a single request and dropped once the answer is scored.
/// `retrieval` is `None` when the route skipped retrieval, `repair` is
/// `None` when it skipped the query path.
#[derive(Debug, Clone)]
pub struct PipelineTrace {
    pub route: RouteDecision,
    /// Classification fell back to the default route
    pub route_fell_back: bool,
    pub retrieval: Option<RetrievalResult>,
    pub repair: Option<RepairTrace>,
}

impl PipelineTrace {
    pub fn new(route: RouteDecision) -> Self {
        Self {
            route,
            route_fell_back: false,
            retrieval: None,
            repair: None,
        }
    }

    pub fn has_retrieval_evidence(&self) -> bool {
        self.retrieval.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// Terminal query result, if the query path ran
    pub fn final_query_result(&self) -> Option<&QueryResult> {
        self.repair.as_ref().and_then(RepairTrace::final_result)
    }

    pub fn has_query_evidence(&self) -> bool {
        self.final_query_result()
            .is_some_and(|r| r.is_success() && r.has_rows())
    }

    /// Neither source produced anything to answer from
    pub fn is_insufficient(&self) -> bool {
        !self.has_retrieval_evidence() && !self.has_query_evidence()
    }

    pub fn repairs_executed(&self) -> usize {
        self.repair.as_ref().map_or(0, RepairTrace::repairs_executed)
    }
}

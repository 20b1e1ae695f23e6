//! Stage sequencing driven by the route decision

use crate::routing::RouteDecision;

/// Stages a question passes through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Route,
    Retrieve,
    Query,
    Synthesize,
}

impl PipelineStage {
    /// The stage after `self` for a question routed to `route`;
    /// `None` once synthesis is done.
    pub fn next(self, route: RouteDecision) -> Option<PipelineStage> {
        match self {
            PipelineStage::Route if route.needs_retrieval() => Some(PipelineStage::Retrieve),
            PipelineStage::Route => Some(PipelineStage::Query),
            PipelineStage::Retrieve if route.needs_query() => Some(PipelineStage::Query),
            PipelineStage::Retrieve => Some(PipelineStage::Synthesize),
            PipelineStage::Query => Some(PipelineStage::Synthesize),
            PipelineStage::Synthesize => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Route => "route",
            PipelineStage::Retrieve => "retrieve",
            PipelineStage::Query => "query",
            PipelineStage::Synthesize => "synthesize",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

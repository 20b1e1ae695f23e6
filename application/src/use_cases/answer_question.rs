//! Answer Question use case
//!
//! The orchestrator. Sequences route, retrieve, query and synthesize per
//! [`PipelineStage::next`], collects a [`PipelineTrace`], and scores the
//! result. Per-question failures never escape: every path ends in a
//! [`FinalAnswer`].

use crate::config::PipelineParams;
use crate::context::PipelineContext;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::query_store::QueryStorePort;
use crate::use_cases::classify_route::ClassifyRouteUseCase;
use crate::use_cases::generate_query::{GenerateQueryUseCase, QueryRequest};
use crate::use_cases::repair_loop::RepairLoopUseCase;
use crate::use_cases::synthesize_answer::SynthesizeAnswerUseCase;
use retail_domain::{
    ConfidenceBreakdown, DomainError, FinalAnswer, ModelConfig, PipelineStage, PipelineTrace,
    QueryAttempt, Question, RepairTrace, RouteDecision, Stage,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Errors raised while assembling the use case
#[derive(Error, Debug)]
pub enum AnswerQuestionError {
    #[error("Invalid pipeline parameters: {0}")]
    InvalidParams(#[from] DomainError),
}

/// A final answer with the signals it was scored from
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: FinalAnswer,
    pub trace: PipelineTrace,
    pub breakdown: ConfidenceBreakdown,
}

/// Use case for answering one question end to end
pub struct AnswerQuestionUseCase {
    context: Arc<PipelineContext>,
    params: PipelineParams,
    router: ClassifyRouteUseCase,
    repair_loop: RepairLoopUseCase,
    synthesizer: SynthesizeAnswerUseCase,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl AnswerQuestionUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        store: Arc<dyn QueryStorePort>,
        context: Arc<PipelineContext>,
        models: ModelConfig,
        params: PipelineParams,
    ) -> Result<Self, AnswerQuestionError> {
        Self::with_conversation_logger(
            gateway,
            store,
            context,
            models,
            params,
            Arc::new(NoConversationLogger),
        )
    }

    /// Create with a conversation logger shared by every stage
    pub fn with_conversation_logger(
        gateway: Arc<dyn LlmGateway>,
        store: Arc<dyn QueryStorePort>,
        context: Arc<PipelineContext>,
        models: ModelConfig,
        params: PipelineParams,
        logger: Arc<dyn ConversationLogger>,
    ) -> Result<Self, AnswerQuestionError> {
        let budget = params.repair_budget()?;
        let timeout = params.inference_timeout;

        let router = ClassifyRouteUseCase::new(Arc::clone(&gateway), models.router.clone())
            .with_timeout(timeout)
            .with_conversation_logger(Arc::clone(&logger));
        let generator = GenerateQueryUseCase::new(Arc::clone(&gateway), models.query.clone())
            .with_timeout(timeout)
            .with_conversation_logger(Arc::clone(&logger));
        let repair_loop = RepairLoopUseCase::new(generator, store, budget, params.query_timeout)
            .with_conversation_logger(Arc::clone(&logger));
        let synthesizer = SynthesizeAnswerUseCase::new(gateway, models.synthesizer.clone())
            .with_timeout(timeout)
            .with_max_result_rows(params.max_result_rows)
            .with_conversation_logger(Arc::clone(&logger));

        Ok(Self {
            context,
            params,
            router,
            repair_loop,
            synthesizer,
            conversation_logger: logger,
        })
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Answer with default (no-op) progress
    pub async fn execute(&self, question: &Question) -> FinalAnswer {
        self.execute_with_progress(question, &NoProgress).await
    }

    /// Answer with progress callbacks
    pub async fn execute_with_progress(
        &self,
        question: &Question,
        progress: &dyn ProgressNotifier,
    ) -> FinalAnswer {
        self.execute_traced(question, progress).await.answer
    }

    /// Answer and keep the trace and score breakdown
    pub async fn execute_traced(
        &self,
        question: &Question,
        progress: &dyn ProgressNotifier,
    ) -> AnswerOutcome {
        let qid = question.display_id();
        info!("Question {}: {}", qid, question.content());

        let exemplars = &self.context.exemplars;
        let mut trace = PipelineTrace::new(RouteDecision::default());
        let mut stage = PipelineStage::Route;

        loop {
            progress.on_stage_start(qid, stage);
            match stage {
                PipelineStage::Route => {
                    let classification = self
                        .router
                        .execute(question, &exemplars.render(Stage::Router))
                        .await;
                    trace.route = classification.route;
                    trace.route_fell_back = classification.fell_back;
                    progress.on_route(qid, trace.route, trace.route_fell_back);
                }
                PipelineStage::Retrieve => {
                    let result = self
                        .context
                        .retriever
                        .retrieve(question.content(), self.params.top_k);
                    info!(
                        "Question {}: retrieved {} chunks (avg score {:.2})",
                        qid,
                        result.len(),
                        result.average_score()
                    );
                    trace.retrieval = Some(result);
                }
                PipelineStage::Query => {
                    trace.repair = Some(self.run_query(question, &trace, progress).await);
                }
                PipelineStage::Synthesize => break,
            }
            match stage.next(trace.route) {
                Some(next) => stage = next,
                None => break,
            }
        }

        let synthesized = self
            .synthesizer
            .execute(
                question,
                &trace,
                &self.context.schema,
                &exemplars.render(Stage::Synthesis),
            )
            .await;

        let breakdown = ConfidenceBreakdown::from_trace(&trace);
        let answer = FinalAnswer {
            value: synthesized.value,
            citations: synthesized.citations,
            confidence: breakdown.total(),
            explanation: synthesized.explanation,
            sql: trace
                .repair
                .as_ref()
                .and_then(RepairTrace::final_sql)
                .map(str::to_string),
            route: trace.route,
            insufficient_evidence: synthesized.insufficient_evidence,
            format_mismatch: synthesized.format_mismatch,
        };

        info!(
            "Question {}: route={} repairs={} confidence={:.2}",
            qid,
            answer.route,
            trace.repairs_executed(),
            answer.confidence
        );
        self.conversation_logger.log(ConversationEvent::new(
            "answer",
            serde_json::json!({
                "question_id": question.id(),
                "question": question.content(),
                "answer": &answer,
                "confidence_breakdown": breakdown,
            }),
        ));
        progress.on_question_complete(qid, answer.confidence);

        AnswerOutcome {
            answer,
            trace,
            breakdown,
        }
    }

    async fn run_query(
        &self,
        question: &Question,
        trace: &PipelineTrace,
        progress: &dyn ProgressNotifier,
    ) -> RepairTrace {
        let exemplars = &self.context.exemplars;
        let schema = self.context.schema.to_prompt();
        let context = trace
            .retrieval
            .as_ref()
            .filter(|r| !r.is_empty())
            .map(|r| r.context_string());
        let generation_exemplars = exemplars.render(Stage::QueryGeneration);
        let repair_exemplars = exemplars.render(Stage::QueryRepair);

        let request = QueryRequest {
            question: question.content(),
            schema: &schema,
            context: context.as_deref(),
            generation_exemplars: &generation_exemplars,
            repair_exemplars: &repair_exemplars,
        };

        match self
            .repair_loop
            .execute(&request, question.display_id(), progress)
            .await
        {
            Ok(outcome) => {
                info!(
                    "Question {}: query {} after {} attempt(s)",
                    question.display_id(),
                    outcome.state.name(),
                    outcome.trace.len()
                );
                outcome.trace
            }
            Err(e) => {
                error!("Question {}: repair loop fault: {}", question.display_id(), e);
                let mut failed = RepairTrace::new();
                // an empty trace cannot reject its first entry
                let _ =
                    failed.record_unexecuted(QueryAttempt::initial(String::new()), e.to_string());
                failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use crate::use_cases::shared::test_support::{MockGateway, MockStore, context, one_row};
    use retail_domain::{Citation, FormatHint, QueryResult, Row, Scalar};
    use serde_json::json;

    fn use_case(
        gateway: MockGateway,
        store: MockStore,
    ) -> (Arc<MockGateway>, Arc<MockStore>, AnswerQuestionUseCase) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(store);
        let uc = AnswerQuestionUseCase::new(
            gateway.clone(),
            store.clone(),
            Arc::new(context()),
            ModelConfig::default(),
            PipelineParams::default(),
        )
        .unwrap();
        (gateway, store, uc)
    }

    #[tokio::test]
    async fn test_query_route_first_try() {
        let (gateway, store, uc) = use_case(
            MockGateway::replying(&[
                "Reasoning: a total over orders.\nRoute: sql",
                "SELECT SUM(od.UnitPrice * od.Quantity) AS total FROM Orders o \
                 JOIN \"Order Details\" od ON od.OrderID = o.OrderID \
                 WHERE o.OrderDate LIKE '1997-06%'",
                "Answer: 61234.5\nExplanation: Sum of June 1997 order lines.",
            ]),
            MockStore::new(vec![one_row("total", Scalar::Real(61234.5))]),
        );
        let question = Question::new("What were total sales in June 1997?")
            .with_format_hint(FormatHint::Float);
        let outcome = uc.execute_traced(&question, &NoProgress).await;

        assert_eq!(outcome.answer.route, RouteDecision::Query);
        assert_eq!(outcome.trace.repairs_executed(), 0);
        assert!(outcome.trace.retrieval.is_none());
        assert_eq!(outcome.answer.value, json!(61234.5));
        assert!(outcome.answer.confidence >= 0.8);
        assert!(outcome.answer.citations.contains(&Citation::Query));
        assert!(outcome.answer.sql.as_deref().is_some_and(|s| s.contains("SUM")));
        assert_eq!(store.executions(), 1);
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn test_format_mismatch_keeps_trace_confidence() {
        let rows = vec![Row::new(vec![
            ("category".into(), Scalar::Text("Beverages".into())),
            ("quantity".into(), Scalar::Integer(123)),
        ])];
        let (_, _, uc) = use_case(
            MockGateway::replying(&[
                "Reasoning: a ranking over order lines.\nRoute: sql",
                "SELECT CategoryName AS category, SUM(Quantity) AS quantity FROM Orders",
                "Answer: Beverages and Dairy",
            ]),
            MockStore::new(vec![QueryResult::success(
                vec!["category".into(), "quantity".into()],
                rows,
            )]),
        );
        let question = Question::new("Top category by quantity?")
            .with_format_hint(FormatHint::parse("{category:str, quantity:int}"));
        let outcome = uc.execute_traced(&question, &NoProgress).await;

        assert!(outcome.answer.format_mismatch);
        assert_eq!(outcome.answer.value, json!({"category": "Beverages", "quantity": 123}));
        assert_eq!(
            outcome.answer.confidence,
            ConfidenceBreakdown::from_trace(&outcome.trace).total()
        );
        assert!((outcome.answer.confidence - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_undefined_kpi_is_hybrid_with_zero_retrieval() {
        let (gateway, _, uc) = use_case(
            MockGateway::replying(&[
                "I cannot tell what this refers to.",
                "SELECT 0 AS zorblax WHERE 0",
            ]),
            MockStore::new(vec![QueryResult::success(vec!["zorblax".into()], vec![])]),
        );
        let question = Question::new("What is the zorblax quotient for flimflam?")
            .with_format_hint(FormatHint::Float);
        let outcome = uc.execute_traced(&question, &NoProgress).await;

        assert_eq!(outcome.answer.route, RouteDecision::Hybrid);
        assert!(outcome.trace.route_fell_back);
        assert!(outcome.trace.retrieval.as_ref().is_some_and(|r| r.is_empty()));
        assert_eq!(outcome.breakdown.retrieval, 0.0);
        assert!(outcome.answer.insufficient_evidence);
        assert_eq!(outcome.answer.value, json!(0.0));
        // no synthesis call on insufficient evidence
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_fails_twice_then_gives_up() {
        let (_, store, uc) = use_case(
            MockGateway::replying(&[
                "Route: query",
                "SELECT Foo FROM Orders",
                "SELECT Bar FROM Orders",
                "SELECT Baz FROM Orders",
            ]),
            MockStore::new(vec![
                QueryResult::failure("no such column: Foo"),
                QueryResult::failure("no such column: Bar"),
                QueryResult::failure("no such column: Baz"),
            ]),
        );
        let question =
            Question::new("Total freight by shipper?").with_format_hint(FormatHint::Float);
        let outcome = uc.execute_traced(&question, &NoProgress).await;

        assert_eq!(store.executions(), 3);
        assert_eq!(outcome.trace.repairs_executed(), 2);
        assert!(outcome.answer.confidence <= 0.3);
        assert!(outcome.answer.insufficient_evidence);
        assert_eq!(outcome.answer.sql.as_deref(), Some("SELECT Baz FROM Orders"));
        assert!(outcome.answer.citations.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_route_never_touches_store() {
        let (_, store, uc) = use_case(
            MockGateway::replying(&[
                "Reasoning: a policy question.\nRoute: rag",
                "Answer: 14\nExplanation: Unopened beverages have a 14 day window.",
            ]),
            MockStore::new(vec![]),
        );
        let question = Question::new("What is the return window for unopened Beverages?")
            .with_format_hint(FormatHint::Integer);
        let outcome = uc.execute_traced(&question, &NoProgress).await;

        assert_eq!(outcome.answer.route, RouteDecision::Retrieval);
        assert_eq!(outcome.answer.value, json!(14));
        assert_eq!(store.executions(), 0);
        assert!(outcome.answer.sql.is_none());
        assert!(
            outcome
                .answer
                .citations
                .iter()
                .all(|c| matches!(c, Citation::Chunk(_)))
        );
        assert!(outcome.breakdown.retrieval > 0.0);
    }

    #[tokio::test]
    async fn test_hybrid_passes_retrieved_dates_to_generator() {
        let (gateway, _, uc) = use_case(
            MockGateway::replying(&[
                "Route: hybrid",
                "SELECT SUM(Quantity) AS qty FROM \"Order Details\"",
                "Answer: 512\nExplanation: Units sold during Summer Beverages 1997.",
            ]),
            MockStore::new(vec![one_row("qty", Scalar::Integer(512))]),
        );
        let question = Question::new("Units sold during Summer Beverages 1997?")
            .with_format_hint(FormatHint::Integer);
        let outcome = uc.execute_traced(&question, &NoProgress).await;

        assert!(gateway.prompt(1).contains("1997-06-01 to 1997-06-30"));
        assert_eq!(outcome.answer.value, json!(512));
        assert!(outcome.answer.confidence > 0.8);
        assert!(
            outcome
                .answer
                .citations
                .contains(&Citation::Table("Order Details".into()))
        );
    }

    #[tokio::test]
    async fn test_backend_down_still_answers() {
        let (_, _, uc) = use_case(
            MockGateway::new(vec![
                Err(GatewayError::ConnectionError("refused".into())),
                Err(GatewayError::ConnectionError("refused".into())),
                Err(GatewayError::ConnectionError("refused".into())),
                Err(GatewayError::ConnectionError("refused".into())),
            ]),
            MockStore::new(vec![]),
        );
        let question = Question::new("Anything about xyzzy?");
        let answer = uc.execute(&question).await;
        assert_eq!(answer.route, RouteDecision::Hybrid);
        assert!(answer.insufficient_evidence);
        assert!((0.0..=1.0).contains(&answer.confidence));
    }

    #[test]
    fn test_rejects_budget_above_cap() {
        let result = AnswerQuestionUseCase::new(
            Arc::new(MockGateway::default()),
            Arc::new(MockStore::new(vec![])),
            Arc::new(context()),
            ModelConfig::default(),
            PipelineParams::default().with_max_repairs(3),
        );
        assert!(matches!(result, Err(AnswerQuestionError::InvalidParams(_))));
    }
}

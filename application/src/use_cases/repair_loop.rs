//! Repair Loop use case
//!
//! Drives [`RepairState`] from generation through execution to a terminal
//! state, recording every attempt in a [`RepairTrace`].
//!
//! A statement rejected by offline validation is revised before it ever
//! reaches the executor, under its own allowance of
//! [`MAX_VALIDATION_REVISIONS`] per question. Those revisions spend neither
//! repair budget nor an execution. Once the allowance is gone a rejection is
//! recorded as an unexecuted failed attempt and consumes budget, as does a
//! model call that produced no statement.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::ProgressNotifier;
use crate::ports::query_store::QueryStorePort;
use crate::use_cases::generate_query::{GenerateQueryUseCase, QueryRequest};
use retail_domain::{
    DomainError, QueryAttempt, QueryResult, RepairBudget, RepairEvent, RepairState, RepairTrace,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Offline revisions allowed per question before rejections count as attempts
pub const MAX_VALIDATION_REVISIONS: u8 = 2;

/// Terminal state plus every recorded attempt
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub state: RepairState,
    pub trace: RepairTrace,
}

/// How a generated statement fared
enum AttemptResult {
    Executed(QueryResult),
    /// Never reached the store
    Unexecuted(String),
}

pub struct RepairLoopUseCase {
    generator: GenerateQueryUseCase,
    store: Arc<dyn QueryStorePort>,
    budget: RepairBudget,
    query_timeout: Duration,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RepairLoopUseCase {
    pub fn new(
        generator: GenerateQueryUseCase,
        store: Arc<dyn QueryStorePort>,
        budget: RepairBudget,
        query_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            store,
            budget,
            query_timeout,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Generate, execute and repair until success or the budget runs out.
    ///
    /// Errors only on an internal sequencing fault; every store or model
    /// failure is recorded in the trace instead.
    pub async fn execute(
        &self,
        request: &QueryRequest<'_>,
        question_id: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<RepairOutcome, DomainError> {
        let mut state = RepairState::start(self.budget);
        let mut trace = RepairTrace::new();
        let mut revisions = MAX_VALIDATION_REVISIONS;
        // Last statement that produced a store error, and that error
        let mut last_failure: Option<(String, String)> = None;
        let mut prior_error: Option<String> = None;
        let mut pending = self
            .generator
            .generate(request)
            .await
            .map_err(|e| format!("query generation failed: {e}"));

        loop {
            state = state.next(RepairEvent::Generated)?;
            let index = state.attempt();

            let (sql, outcome) = match pending {
                Ok(sql) => self.run(request, question_id, sql, &mut revisions).await,
                Err(error) => (String::new(), AttemptResult::Unexecuted(error)),
            };

            let attempt = match prior_error.take() {
                Some(prior) => QueryAttempt::repair(sql.clone(), index, prior),
                None => QueryAttempt::initial(sql.clone()),
            };
            let (success, error) = match outcome {
                AttemptResult::Executed(result) => {
                    self.log_attempt(question_id, index, &sql, &result);
                    let success = result.is_success();
                    let error = result.error().map(str::to_string);
                    trace.record(attempt, result)?;
                    (success, error)
                }
                AttemptResult::Unexecuted(error) => {
                    self.log_attempt(question_id, index, &sql, &QueryResult::failure(&error));
                    trace.record_unexecuted(attempt, error.clone())?;
                    (false, Some(error))
                }
            };
            progress.on_query_attempt(question_id, index, success);

            if let Some(error) = &error
                && !sql.trim().is_empty()
            {
                last_failure = Some((sql.clone(), error.clone()));
            }

            let event = if success {
                RepairEvent::Succeeded
            } else {
                RepairEvent::Failed
            };
            state = state.next(event)?;

            match (state, error) {
                (RepairState::Regenerating { attempt, .. }, Some(error)) => {
                    warn!(
                        "Question {}: attempt {} failed ({}), repairing",
                        question_id, index, error
                    );
                    info!("Question {}: repair {}", question_id, attempt);
                    pending = match &last_failure {
                        Some((failed_sql, failed_error)) => {
                            prior_error = Some(failed_error.clone());
                            self.generator
                                .repair(request, failed_sql, failed_error)
                                .await
                                .map_err(|e| format!("query repair failed: {e}"))
                        }
                        // Nothing to revise yet: start over
                        None => {
                            prior_error = Some(error);
                            self.generator
                                .generate(request)
                                .await
                                .map_err(|e| format!("query generation failed: {e}"))
                        }
                    };
                }
                (RepairState::GaveUp { attempt }, error) => {
                    warn!(
                        "Question {}: giving up after attempt {} ({})",
                        question_id,
                        attempt,
                        error.unwrap_or_default()
                    );
                    break;
                }
                _ => break,
            }
        }

        Ok(RepairOutcome { state, trace })
    }

    /// Validate `sql`, revising it offline while the allowance lasts, then
    /// execute it. Returns the statement that was finally used.
    async fn run(
        &self,
        request: &QueryRequest<'_>,
        question_id: &str,
        mut sql: String,
        revisions: &mut u8,
    ) -> (String, AttemptResult) {
        loop {
            let rejection = if sql.trim().is_empty() {
                "model returned no query".to_string()
            } else {
                match self.store.validate(&sql).await {
                    Ok(()) => {
                        let result = self.store.execute(&sql, self.query_timeout).await;
                        return (sql, AttemptResult::Executed(result));
                    }
                    Err(e) => e.to_string(),
                }
            };

            if *revisions == 0 {
                return (sql, AttemptResult::Unexecuted(rejection));
            }
            *revisions -= 1;
            warn!(
                "Question {}: statement rejected before execution ({}), revising",
                question_id, rejection
            );
            self.conversation_logger.log(ConversationEvent::new(
                "query_rejected",
                serde_json::json!({
                    "question_id": question_id,
                    "sql": sql,
                    "error": rejection,
                }),
            ));

            match self.generator.repair(request, &sql, &rejection).await {
                Ok(revised) => sql = revised,
                Err(e) => {
                    warn!("Question {}: offline revision failed: {}", question_id, e);
                    return (sql, AttemptResult::Unexecuted(rejection));
                }
            }
        }
    }

    fn log_attempt(&self, question_id: &str, index: u8, sql: &str, result: &QueryResult) {
        self.conversation_logger.log(ConversationEvent::new(
            "query_executed",
            serde_json::json!({
                "question_id": question_id,
                "attempt": index,
                "sql": sql,
                "success": result.is_success(),
                "rows": result.rows().len(),
                "error": result.error(),
            }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use crate::ports::progress::NoProgress;
    use crate::use_cases::shared::test_support::{MockGateway, MockStore, one_row};
    use retail_domain::{Model, PipelineTrace, RouteDecision, Scalar, score_confidence};
    use std::sync::atomic::Ordering;

    const REQUEST: QueryRequest<'static> = QueryRequest {
        question: "How many orders?",
        schema: "Database schema (SQLite):\nTable Orders (OrderID)",
        context: None,
        generation_exemplars: "",
        repair_exemplars: "",
    };

    fn use_case(
        gateway: MockGateway,
        store: MockStore,
    ) -> (Arc<MockGateway>, Arc<MockStore>, RepairLoopUseCase) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(store);
        let generator = GenerateQueryUseCase::new(gateway.clone(), Model::default_query());
        let uc = RepairLoopUseCase::new(
            generator,
            store.clone(),
            RepairBudget::full(),
            Duration::from_secs(1),
        );
        (gateway, store, uc)
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let (gateway, store, uc) = use_case(
            MockGateway::replying(&["SELECT COUNT(*) AS n FROM Orders"]),
            MockStore::new(vec![one_row("n", Scalar::Integer(830))]),
        );
        let outcome = uc.execute(&REQUEST, "q1", &NoProgress).await.unwrap();
        assert_eq!(outcome.state, RepairState::Success { attempt: 0 });
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(outcome.trace.repairs_executed(), 0);
        assert_eq!(store.executions(), 1);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_repair_then_success() {
        let (gateway, store, uc) = use_case(
            MockGateway::replying(&["SELECT Foo FROM Orders", "SELECT OrderID FROM Orders"]),
            MockStore::new(vec![
                QueryResult::failure("no such column: Foo"),
                one_row("OrderID", Scalar::Integer(10248)),
            ]),
        );
        let outcome = uc.execute(&REQUEST, "q1", &NoProgress).await.unwrap();
        assert_eq!(outcome.state, RepairState::Success { attempt: 1 });
        let steps = outcome.trace.steps();
        assert_eq!(steps[1].attempt.index, 1);
        assert_eq!(
            steps[1].attempt.prior_error.as_deref(),
            Some("no such column: Foo")
        );
        assert!(gateway.prompt(1).contains("no such column: Foo"));
        assert_eq!(store.executions(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_executions() {
        let (gateway, store, uc) = use_case(
            MockGateway::replying(&["SELECT a", "SELECT b", "SELECT c", "SELECT d"]),
            MockStore::new(vec![
                QueryResult::failure("e1"),
                QueryResult::failure("e2"),
                QueryResult::failure("e3"),
                QueryResult::failure("e4"),
            ]),
        );
        let outcome = uc.execute(&REQUEST, "q1", &NoProgress).await.unwrap();
        assert_eq!(outcome.state, RepairState::GaveUp { attempt: 2 });
        assert_eq!(store.executions(), 3);
        assert_eq!(outcome.trace.len(), 3);
        assert_eq!(outcome.trace.final_result().and_then(|r| r.error()), Some("e3"));
        // one unused scripted repair remains
        assert_eq!(gateway.remaining(), 1);
    }

    #[tokio::test]
    async fn test_validation_rejection_is_revised_without_spending_budget() {
        let (gateway, store, uc) = use_case(
            MockGateway::replying(&["SELECT INVALID", "SELECT 1 AS n"]),
            MockStore::new(vec![one_row("n", Scalar::Integer(1))]),
        );
        let outcome = uc.execute(&REQUEST, "q1", &NoProgress).await.unwrap();
        assert_eq!(outcome.state, RepairState::Success { attempt: 0 });
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(outcome.trace.repairs_executed(), 0);
        assert_eq!(outcome.trace.final_sql(), Some("SELECT 1 AS n"));
        assert_eq!(store.executions(), 1);
        assert_eq!(store.validations.load(Ordering::SeqCst), 2);
        // the revision prompt carries the rejected statement and the reason
        assert!(gateway.prompt(1).contains("SELECT INVALID"));
        assert!(gateway.prompt(1).contains("syntax error"));

        let mut pipeline = PipelineTrace::new(RouteDecision::Query);
        pipeline.repair = Some(outcome.trace);
        assert_eq!(score_confidence(&pipeline), 0.8);
    }

    #[tokio::test]
    async fn test_exhausted_revisions_count_as_unexecuted_attempts() {
        let (gateway, store, uc) = use_case(
            MockGateway::replying(&[
                "SELECT INVALID a",
                "SELECT INVALID b",
                "SELECT INVALID c",
                "SELECT INVALID d",
                "SELECT INVALID e",
            ]),
            MockStore::new(vec![]),
        );
        let outcome = uc.execute(&REQUEST, "q1", &NoProgress).await.unwrap();
        assert_eq!(outcome.state, RepairState::GaveUp { attempt: 2 });
        assert_eq!(outcome.trace.len(), 3);
        assert_eq!(outcome.trace.executions(), 0);
        assert_eq!(outcome.trace.repairs_executed(), 0);
        assert_eq!(store.executions(), 0);
        assert_eq!(gateway.calls(), 5);
    }

    #[tokio::test]
    async fn test_failed_repair_call_keeps_last_statement_and_error() {
        let (gateway, store, uc) = use_case(
            MockGateway::new(vec![
                Ok("SELECT Foo FROM Orders".to_string()),
                Err(GatewayError::Timeout),
                Ok("SELECT OrderID FROM Orders".to_string()),
            ]),
            MockStore::new(vec![
                QueryResult::failure("no such column: Foo"),
                one_row("OrderID", Scalar::Integer(10248)),
            ]),
        );
        let outcome = uc.execute(&REQUEST, "q1", &NoProgress).await.unwrap();
        assert_eq!(outcome.state, RepairState::Success { attempt: 2 });

        let third = gateway.prompt(2);
        assert!(third.contains("SELECT Foo FROM Orders"));
        assert!(third.contains("no such column: Foo"));

        let steps = outcome.trace.steps();
        assert!(!steps[1].executed);
        assert_eq!(
            steps[2].attempt.prior_error.as_deref(),
            Some("no such column: Foo")
        );
        assert_eq!(outcome.trace.repairs_executed(), 1);
        assert_eq!(store.executions(), 2);
    }

    #[tokio::test]
    async fn test_generation_error_is_a_failed_attempt() {
        let (_, store, uc) = use_case(
            MockGateway::new(vec![
                Err(GatewayError::Timeout),
                Ok("SELECT 1 AS n".to_string()),
            ]),
            MockStore::new(vec![one_row("n", Scalar::Integer(1))]),
        );
        let outcome = uc.execute(&REQUEST, "q1", &NoProgress).await.unwrap();
        assert_eq!(outcome.trace.len(), 2);
        assert_eq!(outcome.trace.steps()[0].attempt.sql, "");
        assert!(outcome.trace.succeeded());
        assert_eq!(store.executions(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_single_attempt() {
        let gateway = Arc::new(MockGateway::replying(&["SELECT x", "SELECT y"]));
        let store = Arc::new(MockStore::new(vec![QueryResult::failure("boom")]));
        let uc = RepairLoopUseCase::new(
            GenerateQueryUseCase::new(gateway.clone(), Model::default_query()),
            store.clone(),
            RepairBudget::new(0).unwrap(),
            Duration::from_secs(1),
        );
        let outcome = uc.execute(&REQUEST, "q1", &NoProgress).await.unwrap();
        assert_eq!(outcome.state, RepairState::GaveUp { attempt: 0 });
        assert_eq!(store.executions(), 1);
        assert_eq!(gateway.calls(), 1);
    }
}

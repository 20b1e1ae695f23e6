//! Answer Batch use case
//!
//! Runs the orchestrator over many questions with bounded concurrency.
//! Records come back in input order regardless of completion order.

use crate::ports::progress::ProgressNotifier;
use crate::use_cases::answer_question::AnswerQuestionUseCase;
use futures::stream::{self, StreamExt};
use retail_domain::{FinalAnswer, Question};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// One line of batch output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecord {
    pub id: Option<String>,
    pub final_answer: Value,
    pub sql: String,
    pub confidence: f64,
    pub explanation: String,
    pub citations: Vec<String>,
}

impl BatchRecord {
    pub fn from_answer(question: &Question, answer: &FinalAnswer) -> Self {
        Self {
            id: question.id().map(str::to_string),
            final_answer: answer.value.clone(),
            sql: answer.sql.clone().unwrap_or_default(),
            confidence: answer.confidence,
            explanation: answer.explanation.clone(),
            citations: answer.citation_strings(),
        }
    }
}

pub struct AnswerBatchUseCase {
    answerer: Arc<AnswerQuestionUseCase>,
    concurrency: usize,
}

impl AnswerBatchUseCase {
    pub fn new(answerer: Arc<AnswerQuestionUseCase>) -> Self {
        let concurrency = answerer.params().batch_concurrency;
        Self {
            answerer,
            concurrency,
        }
    }

    /// Override the concurrency limit (minimum 1)
    pub fn with_concurrency(mut self, jobs: usize) -> Self {
        self.concurrency = jobs.max(1);
        self
    }

    pub async fn execute(
        &self,
        questions: &[Question],
        progress: &dyn ProgressNotifier,
    ) -> Vec<BatchRecord> {
        info!(
            "Answering {} questions ({} at a time)",
            questions.len(),
            self.concurrency
        );
        progress.on_batch_start(questions.len());

        let records = stream::iter(questions)
            .map(|question| async move {
                let answer = self
                    .answerer
                    .execute_with_progress(question, progress)
                    .await;
                BatchRecord::from_answer(question, &answer)
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        progress.on_batch_complete();
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineParams;
    use crate::use_cases::shared::test_support::{MockGateway, MockStore, context};
    use retail_domain::{FormatHint, ModelConfig};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProgress {
        started: AtomicUsize,
        completed: AtomicUsize,
        batches: AtomicUsize,
    }

    impl ProgressNotifier for CountingProgress {
        fn on_question_complete(&self, _question_id: &str, _confidence: f64) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_start(&self, total: usize) {
            self.started.store(total, Ordering::SeqCst);
        }

        fn on_batch_complete(&self) {
            self.batches.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn batch(gateway: MockGateway, jobs: usize) -> AnswerBatchUseCase {
        let answerer = AnswerQuestionUseCase::new(
            Arc::new(gateway),
            Arc::new(MockStore::new(vec![])),
            Arc::new(context()),
            ModelConfig::default(),
            PipelineParams::default(),
        )
        .unwrap();
        AnswerBatchUseCase::new(Arc::new(answerer)).with_concurrency(jobs)
    }

    #[tokio::test]
    async fn test_records_keep_input_order() {
        // sequential so the shared script is consumed question by question
        let uc = batch(
            MockGateway::replying(&[
                "Route: rag",
                "Answer: 14\nExplanation: Unopened beverages.",
                "Route: rag",
                "Answer: 1997-06-01\nExplanation: Campaign start.",
            ]),
            1,
        );
        let questions = vec![
            Question::new("Return window for unopened Beverages?")
                .with_id("rag_policy")
                .with_format_hint(FormatHint::Integer),
            Question::new("When does Summer Beverages 1997 start?").with_id("rag_calendar"),
        ];
        let progress = CountingProgress::default();
        let records = uc.execute(&questions, &progress).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("rag_policy"));
        assert_eq!(records[0].final_answer, json!(14));
        assert_eq!(records[0].sql, "");
        assert_eq!(records[1].id.as_deref(), Some("rag_calendar"));
        assert_eq!(progress.started.load(Ordering::SeqCst), 2);
        assert_eq!(progress.completed.load(Ordering::SeqCst), 2);
        assert_eq!(progress.batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_batch_answers_everything() {
        // gateway down: every question takes the fallback path
        let uc = batch(MockGateway::default(), 4);
        let questions: Vec<Question> = (0..6)
            .map(|i| Question::new(format!("Question number {i}?")).with_id(format!("q{i}")))
            .collect();
        let records = uc.execute(&questions, &CountingProgress::default()).await;

        let ids: Vec<_> = records.iter().filter_map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["q0", "q1", "q2", "q3", "q4", "q5"]);
        assert!(records.iter().all(|r| (0.0..=1.0).contains(&r.confidence)));
    }

    #[test]
    fn test_record_serializes_expected_keys() {
        let question = Question::new("Total?").with_id("q1");
        let answer = FinalAnswer {
            value: json!(12.5),
            citations: vec![retail_domain::Citation::Query],
            confidence: 0.8,
            explanation: "Summed.".into(),
            sql: Some("SELECT 12.5".into()),
            route: retail_domain::RouteDecision::Query,
            insufficient_evidence: false,
            format_mismatch: false,
        };
        let value = serde_json::to_value(BatchRecord::from_answer(&question, &answer)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "q1",
                "final_answer": 12.5,
                "sql": "SELECT 12.5",
                "confidence": 0.8,
                "explanation": "Summed.",
                "citations": ["query"],
            })
        );
    }
}

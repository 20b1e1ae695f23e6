//! Synthesize Answer use case
//!
//! Merges retrieved chunks and the terminal query result into a typed value
//! with an explanation and citations. Confidence is scored separately by the
//! orchestrator from the same trace.
//!
//! Fallback order when the model's answer is unusable:
//! 1. the query rows, shaped to the format hint
//! 2. for numeric hints, the first number in the retrieved text
//! 3. the hint's typed default, flagged as insufficient evidence

use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::LlmGateway;
use crate::use_cases::shared::{Completion, complete};
use retail_domain::core::string::{single_line, truncate};
use retail_domain::synthesis::{
    MAX_EXPLANATION_CHARS, coerce_rows, coerce_text, default_value, first_number,
};
use retail_domain::{
    Citation, FormatHint, Model, PipelineTrace, PromptTemplate, Question, SchemaDescription,
    parse_synthesis_response, tables_referenced,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything the answer carries except its confidence
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAnswer {
    pub value: Value,
    pub explanation: String,
    pub citations: Vec<Citation>,
    pub insufficient_evidence: bool,
    /// The model's answer did not fit the format hint and `value` was rebuilt
    /// from the evidence. Only flagged; confidence is scored from the trace
    /// and is not lowered for a mismatch.
    pub format_mismatch: bool,
}

pub struct SynthesizeAnswerUseCase {
    gateway: Arc<dyn LlmGateway>,
    model: Model,
    timeout: Option<Duration>,
    max_result_rows: usize,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl SynthesizeAnswerUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, model: Model) -> Self {
        Self {
            gateway,
            model,
            timeout: None,
            max_result_rows: 50,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_result_rows(mut self, rows: usize) -> Self {
        self.max_result_rows = rows;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub async fn execute(
        &self,
        question: &Question,
        trace: &PipelineTrace,
        schema: &SchemaDescription,
        exemplars: &str,
    ) -> SynthesizedAnswer {
        let hint = question.format_hint().cloned().unwrap_or_default();
        let citations = citations_for(trace, schema);

        if trace.is_insufficient() {
            debug!(
                "Question {}: no evidence from any source",
                question.display_id()
            );
            return SynthesizedAnswer {
                value: default_value(&hint),
                explanation: insufficient_explanation(trace),
                citations,
                insufficient_evidence: true,
                format_mismatch: false,
            };
        }

        let query_results = trace
            .final_query_result()
            .map(|r| r.to_prompt_json(self.max_result_rows));
        let doc_context = trace
            .retrieval
            .as_ref()
            .filter(|r| !r.is_empty())
            .map(|r| r.context_string());

        let prompt = PromptTemplate::synthesis_prompt(
            question.content(),
            &hint,
            query_results.as_deref(),
            doc_context.as_deref(),
            exemplars,
        );

        let response = complete(
            self.gateway.as_ref(),
            self.conversation_logger.as_ref(),
            Completion {
                stage: "synthesize",
                model: &self.model,
                system_prompt: PromptTemplate::synthesis_system(),
                prompt: &prompt,
                timeout: self.timeout,
            },
        )
        .await;

        match response {
            Ok(text) => {
                let output = parse_synthesis_response(&text);
                match coerce_text(&output.answer, &hint) {
                    Ok(value) => SynthesizedAnswer {
                        value,
                        explanation: output.explanation,
                        citations,
                        insufficient_evidence: false,
                        format_mismatch: false,
                    },
                    Err(mismatch) => {
                        warn!(
                            "Question {}: answer does not fit format hint: {}",
                            question.display_id(),
                            mismatch
                        );
                        let (value, insufficient) = fallback_value(trace, &hint);
                        SynthesizedAnswer {
                            value,
                            explanation: format!("Best-effort value ({mismatch})"),
                            citations,
                            insufficient_evidence: insufficient,
                            format_mismatch: true,
                        }
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Question {}: synthesis failed, extracting from data: {}",
                    question.display_id(),
                    e
                );
                let (value, insufficient) = fallback_value(trace, &hint);
                SynthesizedAnswer {
                    value,
                    explanation: "Extracted from data".to_string(),
                    citations,
                    insufficient_evidence: insufficient,
                    format_mismatch: false,
                }
            }
        }
    }
}

/// Cite only what was actually used: chunks when retrieval found any, and
/// the query plus its tables when the query succeeded.
pub(crate) fn citations_for(trace: &PipelineTrace, schema: &SchemaDescription) -> Vec<Citation> {
    let mut citations: Vec<Citation> = trace
        .retrieval
        .iter()
        .flat_map(|r| r.chunk_ids())
        .map(Citation::Chunk)
        .collect();

    if let Some(repair) = &trace.repair
        && repair.succeeded()
    {
        citations.push(Citation::Query);
        if let Some(sql) = repair.final_sql() {
            citations.extend(
                tables_referenced(sql, schema)
                    .into_iter()
                    .map(Citation::Table),
            );
        }
    }
    citations
}

/// Deterministic value without the model. The flag is true when nothing
/// better than the typed default was found.
fn fallback_value(trace: &PipelineTrace, hint: &FormatHint) -> (Value, bool) {
    if let Some(result) = trace.final_query_result()
        && result.has_rows()
        && let Ok(value) = coerce_rows(result.rows(), hint)
    {
        return (value, false);
    }

    if matches!(hint, FormatHint::Integer | FormatHint::Float)
        && let Some(n) = trace
            .retrieval
            .iter()
            .flat_map(|r| r.chunks.iter())
            .find_map(|c| first_number(&c.chunk.content))
        && let Ok(value) = coerce_text(&n.to_string(), hint)
    {
        return (value, false);
    }

    (default_value(hint), true)
}

fn insufficient_explanation(trace: &PipelineTrace) -> String {
    let query_note = match trace.final_query_result() {
        Some(result) => match result.error() {
            Some(error) => format!("query failed: {}", single_line(error)),
            None => "query returned no rows".to_string(),
        },
        None => "no query was run".to_string(),
    };
    let retrieval_note = if trace.retrieval.is_some() {
        "no matching documents"
    } else {
        "documents not consulted"
    };
    truncate(
        &format!("Insufficient evidence: {retrieval_note}; {query_note}"),
        MAX_EXPLANATION_CHARS,
    )
}

//! Shared utilities for use cases.
//!
//! Every model call in the pipeline goes through [`complete`]: one fresh
//! session per call, an optional timeout, and a transcript entry for the
//! request and its response.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use retail_domain::Model;
use retail_domain::core::string::truncate;
use std::time::Duration;
use tracing::debug;

/// One model call: which model, under what instructions, for which stage
pub(crate) struct Completion<'a> {
    pub stage: &'static str,
    pub model: &'a Model,
    pub system_prompt: &'a str,
    pub prompt: &'a str,
    pub timeout: Option<Duration>,
}

/// Send `prompt` to a new session and return the response text.
///
/// A timeout is reported as [`GatewayError::Timeout`].
pub(crate) async fn complete(
    gateway: &dyn LlmGateway,
    logger: &dyn ConversationLogger,
    request: Completion<'_>,
) -> Result<String, GatewayError> {
    let Completion {
        stage,
        model,
        system_prompt,
        prompt,
        timeout,
    } = request;

    logger.log(ConversationEvent::new(
        "llm_request",
        serde_json::json!({
            "stage": stage,
            "model": model.to_string(),
            "prompt": prompt,
        }),
    ));

    let call = async {
        let session = gateway
            .create_session_with_system_prompt(model, system_prompt)
            .await?;
        session.send(prompt).await
    };

    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(GatewayError::Timeout)),
        None => call.await,
    };

    match &result {
        Ok(text) => {
            debug!("{} response from {}: {}", stage, model, truncate(text, 200));
            logger.log(ConversationEvent::new(
                "llm_response",
                serde_json::json!({
                    "stage": stage,
                    "model": model.to_string(),
                    "bytes": text.len(),
                    "text": text,
                }),
            ));
        }
        Err(e) => {
            logger.log(ConversationEvent::new(
                "llm_error",
                serde_json::json!({
                    "stage": stage,
                    "model": model.to_string(),
                    "error": e.to_string(),
                }),
            ));
        }
    }

    result
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted gateway and store shared by the use case tests.

    use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
    use crate::ports::query_store::{QueryStorePort, StoreError};
    use async_trait::async_trait;
    use retail_domain::{
        Chunk, ChunkStore, ColumnSchema, ExemplarLibrary, LexicalRetriever, Model, QueryResult,
        Row, Scalar, SchemaDescription, StructuralChunker, TableSchema,
    };
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::context::PipelineContext;

    pub type Script = Arc<Mutex<VecDeque<Result<String, GatewayError>>>>;

    pub struct MockSession {
        model: Model,
        script: Script,
        prompts: Arc<Mutex<Vec<(String, String)>>>,
        system_prompt: String,
    }

    #[async_trait]
    impl LlmSession for MockSession {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn send(&self, content: &str) -> Result<String, GatewayError> {
            self.prompts
                .lock()
                .unwrap()
                .push((self.system_prompt.clone(), content.to_string()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Other("No more responses".to_string())))
        }
    }

    /// Gateway whose sessions all draw from one ordered response script
    #[derive(Default)]
    pub struct MockGateway {
        pub script: Script,
        /// (system prompt, user prompt) for every call, in order
        pub prompts: Arc<Mutex<Vec<(String, String)>>>,
        /// Optional artificial delay before each session is created
        pub delay: Option<Duration>,
    }

    impl MockGateway {
        pub fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(VecDeque::from(responses))),
                ..Default::default()
            }
        }

        pub fn replying(responses: &[&str]) -> Self {
            Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn prompt(&self, index: usize) -> String {
            self.prompts.lock().unwrap()[index].1.clone()
        }

        pub fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        async fn create_session_with_system_prompt(
            &self,
            model: &Model,
            system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(Box::new(MockSession {
                model: model.clone(),
                script: Arc::clone(&self.script),
                prompts: Arc::clone(&self.prompts),
                system_prompt: system_prompt.to_string(),
            }))
        }

        async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
            Ok(vec![])
        }
    }

    /// Store with scripted execution results. Statements containing
    /// `INVALID` fail validation.
    pub struct MockStore {
        results: Mutex<VecDeque<QueryResult>>,
        pub executions: AtomicUsize,
        pub validations: AtomicUsize,
    }

    impl MockStore {
        pub fn new(results: Vec<QueryResult>) -> Self {
            Self {
                results: Mutex::new(VecDeque::from(results)),
                executions: AtomicUsize::new(0),
                validations: AtomicUsize::new(0),
            }
        }

        pub fn executions(&self) -> usize {
            self.executions.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryStorePort for MockStore {
        async fn validate(&self, sql: &str) -> Result<(), StoreError> {
            self.validations.fetch_add(1, Ordering::SeqCst);
            if sql.contains("INVALID") {
                Err(StoreError::Rejected(format!(
                    "near \"INVALID\": syntax error in {sql}"
                )))
            } else {
                Ok(())
            }
        }

        async fn execute(&self, _sql: &str, _timeout: Duration) -> QueryResult {
            self.executions.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| QueryResult::failure("no scripted result"))
        }
    }

    pub fn one_row(column: &str, value: Scalar) -> QueryResult {
        QueryResult::success(
            vec![column.to_string()],
            vec![Row::new(vec![(column.to_string(), value)])],
        )
    }

    pub fn context() -> PipelineContext {
        let chunker = StructuralChunker::default();
        let mut chunks: Vec<Chunk> = chunker.chunk(
            "product_policy",
            "# Returns & Policy\n\
- Perishables (Produce, Seafood, Dairy): 3-7 days.\n\
- Beverages unopened: 14 days; opened: no returns.\n",
        );
        chunks.extend(chunker.chunk(
            "marketing_calendar",
            "# Marketing Calendar (1997)\n\
## Summer Beverages 1997\n\
- Dates: 1997-06-01 to 1997-06-30\n",
        ));
        let schema = SchemaDescription::new(vec![
            TableSchema::new(
                "Orders",
                vec![
                    ColumnSchema::new("OrderID", "INTEGER"),
                    ColumnSchema::new("OrderDate", "DATETIME"),
                ],
            ),
            TableSchema::new(
                "Order Details",
                vec![
                    ColumnSchema::new("OrderID", "INTEGER"),
                    ColumnSchema::new("UnitPrice", "NUMERIC"),
                    ColumnSchema::new("Quantity", "INTEGER"),
                ],
            ),
        ]);
        PipelineContext::new(
            LexicalRetriever::new(ChunkStore::new(chunks)),
            schema,
            ExemplarLibrary::new(),
        )
    }
}

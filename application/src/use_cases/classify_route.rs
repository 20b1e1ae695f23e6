//! Classify Route use case
//!
//! Asks the router model which evidence a question needs. Classification
//! fails closed: an inference error, a timeout, or an unparseable label
//! yields the hybrid route.

use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::LlmGateway;
use crate::use_cases::shared::{Completion, complete};
use retail_domain::{Classification, Model, PromptTemplate, Question, parse_classification};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct ClassifyRouteUseCase {
    gateway: Arc<dyn LlmGateway>,
    model: Model,
    timeout: Option<Duration>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ClassifyRouteUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, model: Model) -> Self {
        Self {
            gateway,
            model,
            timeout: None,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Classify `question`, conditioning the model on rendered `exemplars`
    pub async fn execute(&self, question: &Question, exemplars: &str) -> Classification {
        let prompt = PromptTemplate::router_prompt(question.content(), exemplars);
        let response = complete(
            self.gateway.as_ref(),
            self.conversation_logger.as_ref(),
            Completion {
                stage: "route",
                model: &self.model,
                system_prompt: PromptTemplate::router_system(),
                prompt: &prompt,
                timeout: self.timeout,
            },
        )
        .await;

        let classification = match response {
            Ok(text) => parse_classification(&text),
            Err(e) => {
                warn!("Route classification failed, falling back: {}", e);
                Classification::fail_closed(format!("classifier unavailable: {e}"))
            }
        };

        if classification.fell_back {
            warn!(
                "Question {}: no usable route label ({}), using {}",
                question.display_id(),
                classification.rationale,
                classification.route
            );
        } else {
            info!(
                "Question {}: route {}",
                question.display_id(),
                classification.route
            );
        }
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use crate::use_cases::shared::test_support::MockGateway;
    use retail_domain::RouteDecision;

    fn use_case(gateway: MockGateway) -> (Arc<MockGateway>, ClassifyRouteUseCase) {
        let gateway = Arc::new(gateway);
        let uc = ClassifyRouteUseCase::new(gateway.clone(), Model::default_router());
        (gateway, uc)
    }

    #[tokio::test]
    async fn test_parses_route_label() {
        let (gateway, uc) = use_case(MockGateway::replying(&[
            "Reasoning: totals come from the orders table.\nRoute: sql",
        ]));
        let c = uc
            .execute(&Question::new("What were total sales in June 1997?"), "")
            .await;
        assert_eq!(c.route, RouteDecision::Query);
        assert!(!c.fell_back);
        assert_eq!(gateway.calls(), 1);
        assert!(gateway.prompt(0).ends_with("Question: What were total sales in June 1997?"));
    }

    #[tokio::test]
    async fn test_gateway_error_fails_closed() {
        let (_, uc) = use_case(MockGateway::new(vec![Err(GatewayError::ConnectionError(
            "refused".to_string(),
        ))]));
        let c = uc.execute(&Question::new("Anything"), "").await;
        assert_eq!(c.route, RouteDecision::Hybrid);
        assert!(c.fell_back);
    }

    #[tokio::test]
    async fn test_timeout_fails_closed() {
        let gateway = MockGateway::replying(&["Route: rag"]).with_delay(Duration::from_millis(200));
        let (_, uc) = use_case(gateway);
        let uc = uc.with_timeout(Some(Duration::from_millis(10)));
        let c = uc.execute(&Question::new("Return window?"), "").await;
        assert_eq!(c.route, RouteDecision::Hybrid);
        assert!(c.fell_back);
    }

    #[tokio::test]
    async fn test_exemplars_precede_question() {
        let (gateway, uc) = use_case(MockGateway::replying(&["Route: rag"]));
        uc.execute(
            &Question::new("Return window for beverages?"),
            "Example 1:\nQuestion: Return policy?\nRoute: retrieval",
        )
        .await;
        assert!(gateway.prompt(0).starts_with("Example 1:"));
    }
}

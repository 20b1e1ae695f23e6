//! Ollama LLM Gateway implementation

use crate::ollama::error::{OllamaError, Result};
use crate::ollama::protocol::{
    ChatOptions, ChatRequest, ChatResponse, ErrorResponse, Message, TagsResponse,
};
use crate::ollama::session::OllamaSession;
use async_trait::async_trait;
use reqwest::Client;
use retail_application::{GatewayError, LlmGateway, LlmSession};
use retail_domain::Model;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared HTTP state behind every session
pub(crate) struct OllamaClient {
    http: Client,
    base_url: String,
    options: ChatOptions,
}

impl OllamaClient {
    /// One non-streaming chat round trip
    pub(crate) async fn chat(&self, model: &Model, messages: Vec<Message>) -> Result<String> {
        let request = ChatRequest {
            model: model.as_str(),
            messages,
            stream: false,
            options: &self.options,
        };
        let url = format!("{}/api/chat", self.base_url);
        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.to_string());
            if status == reqwest::StatusCode::NOT_FOUND && message.contains("not found") {
                return Err(OllamaError::ModelNotFound(model.to_string()));
            }
            return Err(OllamaError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        debug!(model = %model, tokens = ?body.eval_count, "chat completed");
        body.message
            .map(|m| m.content)
            .ok_or(OllamaError::EmptyResponse)
    }

    async fn tags(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::Status {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// LLM Gateway implementation for a local Ollama server
pub struct OllamaLlmGateway {
    client: Arc<OllamaClient>,
}

impl OllamaLlmGateway {
    /// Create a gateway for `base_url` (e.g. `http://localhost:11434`).
    ///
    /// `request_timeout` bounds each HTTP call; the pipeline applies its own
    /// per-stage timeout on top.
    pub fn new(
        base_url: impl Into<String>,
        options: ChatOptions,
        request_timeout: Option<Duration>,
    ) -> std::result::Result<Self, GatewayError> {
        let mut builder = Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("OllamaLlmGateway initialized for {}", base_url);

        Ok(Self {
            client: Arc::new(OllamaClient {
                http,
                base_url,
                options,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.client.base_url
    }

    /// Check the server is reachable and every required model is installed.
    ///
    /// Installed names are matched exactly, or with an implicit `:latest` tag.
    pub async fn health_check(&self, required: &[&Model]) -> std::result::Result<(), GatewayError> {
        let installed = self.client.tags().await.map_err(|e| {
            warn!("Ollama health check failed: {}", e);
            GatewayError::ConnectionError(format!(
                "inference backend at {} is unreachable: {}",
                self.client.base_url, e
            ))
        })?;

        for model in required {
            let name = model.as_str();
            let present = installed
                .iter()
                .any(|tag| tag == name || tag.strip_suffix(":latest") == Some(name));
            if !present {
                return Err(GatewayError::ModelNotAvailable(format!(
                    "{} (try `ollama pull {}`)",
                    name, name
                )));
            }
        }
        debug!("Ollama health check passed ({} models installed)", installed.len());
        Ok(())
    }
}

#[async_trait]
impl LlmGateway for OllamaLlmGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> std::result::Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(OllamaSession::new(
            Arc::clone(&self.client),
            model.clone(),
            Some(system_prompt.to_string()),
        )))
    }

    async fn available_models(&self) -> std::result::Result<Vec<Model>, GatewayError> {
        let names = self.client.tags().await?;
        Ok(names.iter().map(|n| Model::from(n.as_str())).collect())
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! Minimal HTTP/1.1 responder standing in for an Ollama server.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `responses` in order, one per connection, and return the base
    /// URL plus a handle yielding the raw request bodies received.
    pub async fn serve(
        responses: Vec<(u16, String)>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut bodies = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                bodies.push(read_request_body(&mut socket).await);
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            bodies
        });
        (format!("http://{}", addr), handle)
    }

    async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return String::from_utf8_lossy(&buf[end + 4..end + 4 + length]).into_owned();
                }
            }
        }
        String::new()
    }
}

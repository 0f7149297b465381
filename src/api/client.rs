use super::error::GatewayError;
use super::logging::{debug_payload_enabled, emit_debug_payload, emit_gateway_error};
use crate::config::Config;
use crate::types::{ApiMessage, ChatCompletion, ChatMode};
use crate::util::is_local_endpoint_url;
use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;
use std::time::Duration;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, messages: &[ApiMessage]) -> Result<ByteStream>;
}

/// A forced single-function tool call, as the framework and discovery
/// endpoints use to get structured JSON back.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub tool_name: &'static str,
    pub tool_description: &'static str,
    pub parameters: Value,
}

impl ToolRequest {
    fn tool_definition(&self) -> Value {
        json!([{
            "type": "function",
            "function": {
                "name": self.tool_name,
                "description": self.tool_description,
                "parameters": self.parameters,
            }
        }])
    }
}

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_url: String,
    timeout: Duration,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl GatewayClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.clone(),
            timeout: config.timeout(),
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: None,
            model: "mock-model".to_string(),
            api_url: "http://localhost:8000/v1/chat/completions".to_string(),
            timeout: Duration::from_secs(5),
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }

    /// Open a streamed chat completion for `history` under `mode`'s system
    /// prompt, with retrieved `context` appended to it when present. The body
    /// is returned unparsed; feed it to `StreamParser`.
    pub async fn create_stream(
        &self,
        mode: ChatMode,
        context: Option<&str>,
        history: &[ApiMessage],
    ) -> Result<ByteStream> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ApiMessage::system(system_prompt(mode, context)));
        messages.extend_from_slice(history);

        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(&messages);
            }
        }

        let payload = json!({
            "model": self.model,
            "stream": true,
            "messages": messages,
        });
        let response = self.send(&payload, None).await?;

        let request_url = self.api_url.clone();
        let stream = response
            .bytes_stream()
            .map(move |item| item.map_err(|error| map_api_request_error(error, &request_url)));
        Ok(Box::pin(stream))
    }

    /// Run a non-streaming completion that must answer through `request`'s tool.
    pub async fn complete_with_tool(&self, request: &ToolRequest) -> Result<ChatCompletion> {
        let payload = json!({
            "model": self.model,
            "messages": [
                ApiMessage::system(request.system_prompt.clone()),
                ApiMessage::user(request.user_prompt.clone()),
            ],
            "tools": request.tool_definition(),
            "tool_choice": {
                "type": "function",
                "function": { "name": request.tool_name }
            },
        });

        let response = self.send(&payload, Some(self.timeout)).await?;
        let body = response
            .text()
            .await
            .map_err(|error| map_api_request_error(error, &self.api_url))?;
        serde_json::from_str::<ChatCompletion>(&body)
            .with_context(|| format!("gateway returned an unexpected completion body from '{}'", self.api_url))
    }

    async fn send(&self, payload: &Value, timeout: Option<Duration>) -> Result<reqwest::Response> {
        if debug_payload_enabled() {
            emit_debug_payload(&self.api_url, payload);
        }

        let mut request = self
            .http
            .post(&self.api_url)
            .header("content-type", "application/json")
            .json(payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &self.api_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            emit_gateway_error(&self.api_url, status.as_u16(), &body);
            return Err(GatewayError::from_status(status.as_u16(), &body).into());
        }

        Ok(response)
    }
}

fn system_prompt(mode: ChatMode, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|context| !context.is_empty()) {
        Some(context) => format!(
            "{}\n\nRelevant passages from the research knowledge base. Prefer them over \
             general knowledge and cite them as [Source N]:\n\n{context}",
            mode.system_prompt()
        ),
        None => mode.system_prompt().to_string(),
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local gateway '{}': {}. Start your local server or update INSIGHTFORGE_API_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach AI gateway '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("AI gateway request to '{}' timed out: {}", request_url, error);
    }
    anyhow!("AI gateway request to '{}' failed: {}", request_url, error)
}

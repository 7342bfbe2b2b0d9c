//! Language-model client: OpenAI-compatible chat completions with tool calls.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::types::{Message, ToolCallRequest};

/// Request body for chat completions (OpenAI format).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolDef {
    #[serde(rename = "type")]
    typ: String,
    function: FunctionDef,
}

#[derive(Debug, Serialize)]
struct FunctionDef {
    name: String,
    description: Option<String>,
    parameters: Option<serde_json::Value>,
}

/// Response: choices[0].message.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantReply,
}

/// What the model came back with: a final answer, tool calls, or both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

/// The seam the control loop depends on; production uses [`LlmClient`],
/// tests use a scripted stand-in.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Submit the ordered message history plus the declared tool catalog.
    /// Catalog entries carry `name`, `description` and `parameters` keys.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<AssistantReply>;
}

const BASE_BACKOFF_MS: u64 = 200;

fn should_retry_status(status: u16) -> bool {
    status == 408 || status == 429 || status >= 500
}

fn next_backoff_ms(attempt: usize) -> u64 {
    let shift = attempt.min(6);
    BASE_BACKOFF_MS.saturating_mul(1_u64 << shift)
}

/// HTTP client for chat completions.
pub struct LlmClient {
    client: reqwest::Client,
    inference_url: String,
    model: String,
    api_key: Option<String>,
    max_retries: usize,
}

impl LlmClient {
    pub fn new(
        inference_url: String,
        model: String,
        api_key: Option<String>,
        request_timeout: Duration,
        max_retries: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            inference_url,
            model,
            api_key,
            max_retries,
        })
    }

    async fn send_once(&self, body: &ChatCompletionRequest<'_>) -> Result<AssistantReply> {
        let mut req = self
            .client
            .post(&self.inference_url)
            .json(body)
            .header("Content-Type", "application/json");
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("LLM API error {}: {}", status, text));
        }
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("LLM response parse error: {}; body: {}", e, text))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("LLM response has no choices"))?;
        Ok(choice.message)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<AssistantReply> {
        let tool_defs: Vec<ToolDef> = tools
            .iter()
            .filter_map(|v| {
                let name = v.get("name")?.as_str()?.to_string();
                let description = v
                    .get("description")
                    .and_then(|d| d.as_str())
                    .map(String::from);
                let parameters = v.get("parameters").cloned();
                Some(ToolDef {
                    typ: "function".to_string(),
                    function: FunctionDef {
                        name,
                        description,
                        parameters,
                    },
                })
            })
            .collect();

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            tool_choice: (!tool_defs.is_empty()).then(|| "auto".to_string()),
            tools: (!tool_defs.is_empty()).then_some(tool_defs),
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(reply) => return Ok(reply),
                Err(err) if attempt < self.max_retries && is_transient(&err) => {
                    let delay = next_backoff_ms(attempt);
                    tracing::warn!(attempt, delay_ms = delay, error = %err, "retrying model request");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_transient(err: &anyhow::Error) -> bool {
    if let Some(req_err) = err.downcast_ref::<reqwest::Error>() {
        return req_err.is_timeout() || req_err.is_connect();
    }
    // Errors we raised ourselves carry the HTTP status in their text.
    let text = err.to_string();
    if let Some(rest) = text.strip_prefix("LLM API error ") {
        if let Some(code) = rest.split_whitespace().next() {
            if let Ok(status) = code.parse::<u16>() {
                return should_retry_status(status);
            }
        }
    }
    false
}

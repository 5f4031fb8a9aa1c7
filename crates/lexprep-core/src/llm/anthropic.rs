//! Hosted Anthropic backend speaking the Messages API.
//!
//! Throttling (429, and the 529 overload status) maps to
//! [`LlmError::Throttled`] so the pipeline's retry policy treats it as
//! transient; everything else non-2xx becomes [`LlmError::Backend`].

use super::{GenerationParams, LlmClient, LlmResponse, TokenUsage};
use crate::error::LlmError;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Pinned API revision sent with every request.
const API_REVISION: &str = "2023-06-01";

/// Wait this long on a 529 overload, which carries no retry-after header.
const OVERLOAD_WAIT_SECS: u64 = 30;

/// Client for the hosted Anthropic Messages API.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    default_model: String,
    base_url: String,
}

impl AnthropicClient {
    /// Point at the production endpoint.
    pub fn new(api_key: String, default_model: String) -> Self {
        Self::with_base_url(api_key, default_model, DEFAULT_BASE_URL.to_string())
    }

    /// Point at an arbitrary endpoint. Tests aim this at a local server.
    pub fn with_base_url(api_key: String, default_model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            default_model,
            base_url,
        }
    }

    fn request_body(&self, system: &str, user: &str, params: &GenerationParams) -> serde_json::Value {
        let model = params.model.as_deref().unwrap_or(&self.default_model);
        let mut body = serde_json::json!({
            "model": model,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "messages": [{ "role": "user", "content": user }],
        });
        if !system.is_empty() {
            body["system"] = serde_json::Value::from(system);
        }
        body
    }

    async fn read_reply(&self, response: reqwest::Response) -> Result<LlmResponse, LlmError> {
        let reply: MessagesReply = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(format!("messages reply: {e}")))?;

        let text = reply.joined_text();
        let usage = reply.token_usage();
        tracing::debug!(
            chars = text.len(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Anthropic reply"
        );

        Ok(LlmResponse {
            text,
            usage,
            model: reply.model,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        system: &str,
        user: &str,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError> {
        tracing::debug!(
            model = params.model.as_deref().unwrap_or(&self.default_model),
            max_tokens = params.max_tokens,
            "Anthropic request"
        );

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_REVISION)
            .json(&self.request_body(system, user, params))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            self.read_reply(response).await
        } else {
            Err(classify_failure(status.as_u16(), response).await)
        }
    }
}

/// Turn a non-2xx response into the matching error.
async fn classify_failure(status: u16, response: reqwest::Response) -> LlmError {
    match status {
        429 => LlmError::Throttled {
            retry_after_secs: retry_after(&response).unwrap_or(60),
        },
        529 => LlmError::Throttled {
            retry_after_secs: OVERLOAD_WAIT_SECS,
        },
        _ => LlmError::Backend {
            status,
            detail: failure_detail(response).await,
        },
    }
}

fn retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Pull the structured error message out of the body, falling back to the
/// raw text when the body is not the documented error envelope.
async fn failure_detail(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body)
}

#[derive(Deserialize)]
struct MessagesReply {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ReplyBlock>,
    #[serde(default)]
    usage: Option<ReplyUsage>,
}

#[derive(Deserialize)]
struct ReplyBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct ReplyUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl MessagesReply {
    /// Concatenate the text blocks, ignoring tool-use and thinking blocks.
    fn joined_text(&self) -> String {
        let mut out = String::new();
        for block in &self.content {
            if block.kind == "text" {
                out.push_str(&block.text);
            }
        }
        out
    }

    fn token_usage(&self) -> TokenUsage {
        let usage = self.usage.as_ref().map(|u| (u.input_tokens, u.output_tokens));
        let (input_tokens, output_tokens) = usage.unwrap_or((0, 0));
        TokenUsage {
            input_tokens,
            output_tokens,
        }
    }
}

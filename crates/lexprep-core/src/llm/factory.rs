//! Construct the configured LLM backend.

use std::sync::Arc;

use super::anthropic::AnthropicClient;
use super::mock::MockClient;
use super::LlmClient;
use crate::config::LlmConfig;
use crate::error::LlmError;

/// Build the backend named by `config.provider`.
///
/// An unknown or empty provider string, or a hosted provider without an
/// API key, is [`LlmError::Unconfigured`]. The API key itself never hits
/// the logs.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    match config.provider.as_str() {
        "mock" => {
            tracing::info!(backend = "mock", "LLM backend ready");
            Ok(Arc::new(MockClient::new()))
        }
        "anthropic" => {
            let api_key = match config.api_key.as_deref() {
                Some(key) if !key.is_empty() => key.to_string(),
                _ => return Err(LlmError::Unconfigured),
            };

            tracing::info!(
                backend = "anthropic",
                model = %config.generation_model,
                "LLM backend ready"
            );

            let client = match config.base_url.as_deref().filter(|u| !u.is_empty()) {
                Some(url) => AnthropicClient::with_base_url(
                    api_key,
                    config.generation_model.clone(),
                    url.to_string(),
                ),
                None => AnthropicClient::new(api_key, config.generation_model.clone()),
            };
            Ok(Arc::new(client))
        }
        _ => Err(LlmError::Unconfigured),
    }
}

//! The LLM seam: one small trait, two backends.
//!
//! The pipeline only ever asks a backend for one thing: text for a pair
//! of prompts. Everything else (deadlines, retries, cancellation, cost
//! accounting) lives with the caller. The hosted Anthropic transport and
//! the offline mock both fit behind [`LlmClient`].

pub mod anthropic;
pub mod factory;
pub mod mock;
pub mod pricing;

use crate::error::LlmError;

/// Token counts reported for one completion.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    /// Prompt-side tokens.
    pub input_tokens: u32,
    /// Completion-side tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Fold another record into this one, summing both sides.
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// What a backend hands back: raw text plus accounting.
///
/// The text may still be wrapped in markdown code fences; the stage
/// parsers tolerate that.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: TokenUsage,
    /// The model that actually answered (may differ from the one asked for).
    pub model: String,
}

/// Per-call generation knobs.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Output token ceiling.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Model override; `None` means the backend's configured default.
    pub model: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
            model: None,
        }
    }
}

/// A text-in, text-out LLM backend.
///
/// Object-safe, shared as `Arc<dyn LlmClient>`. Implementations do only
/// the transport; deadlines and cancellation are wrapped around the call
/// by the pipeline.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short backend name for logs and pricing lookup.
    fn name(&self) -> &str;

    /// Run one completion for a (system, user) prompt pair.
    async fn generate(
        &self,
        system: &str,
        user: &str,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError>;
}

//! Parsing of LLM responses for all three pipeline stages.
//!
//! Models return JSON, frequently wrapped in markdown code fences; the
//! parsers here strip the fences and deserialize into typed shapes.

use crate::error::LlmError;
use serde::Deserialize;

/// Stage-1 response: a batch of generated questions, plus a passage for
/// reading-comprehension requests.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedBatch {
    pub questions: Vec<GeneratedQuestion>,
    #[serde(default)]
    pub passage: Option<GeneratedPassage>,
}

/// One generated question.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub stimulus: String,
    pub question_stem: String,
    pub choices: Vec<GeneratedChoice>,
    pub correct_answer_id: String,
    #[serde(default)]
    pub explanation: String,
}

/// One generated answer choice.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedChoice {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub wrong_answer_type: Option<String>,
}

/// A generated reading-comprehension passage.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedPassage {
    pub title: String,
    pub subject_area: String,
    pub content: String,
    #[serde(default)]
    pub is_comparative: bool,
    #[serde(default)]
    pub passage_b: Option<String>,
}

/// Verifier confidence in its own answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Stage-2 response: an independent solve with the key withheld.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationResponse {
    pub selected_answer: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub potential_issues: Vec<String>,
}

/// How strong a case could be made for a wrong answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseStrength {
    None,
    Weak,
    Moderate,
    Strong,
}

/// One adversarial challenge against a wrong choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Challenge {
    pub choice_id: String,
    pub defense_strength: DefenseStrength,
    #[serde(default)]
    pub defense_argument: String,
    #[serde(default)]
    pub correct_answer_weakness: Option<String>,
    #[serde(default)]
    pub recommendation: String,
}

/// Stage-3 response: the strongest case for each wrong answer.
#[derive(Debug, Clone, Deserialize)]
pub struct AdversarialResponse {
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub overall_quality: String,
    #[serde(default)]
    pub overall_recommendation: String,
}

/// Parse a stage-1 generation response.
pub fn parse_generation(text: &str) -> Result<GeneratedBatch, LlmError> {
    let body = strip_code_fences(text);
    serde_json::from_str(body).map_err(|e| LlmError::Malformed(format!("generation response: {e}")))
}

/// Parse a stage-2 verification response.
pub fn parse_verification(text: &str) -> Result<VerificationResponse, LlmError> {
    let body = strip_code_fences(text);
    serde_json::from_str(body).map_err(|e| LlmError::Malformed(format!("verification response: {e}")))
}

/// Parse a stage-3 adversarial response.
pub fn parse_adversarial(text: &str) -> Result<AdversarialResponse, LlmError> {
    let body = strip_code_fences(text);
    serde_json::from_str(body).map_err(|e| LlmError::Malformed(format!("adversarial response: {e}")))
}

/// Strip a leading/trailing markdown code fence (```json ... ```), if any.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

//! Mock LLM backend for offline runs and demos.
//!
//! Synthesizes structurally valid JSON for all three pipeline stages by
//! keying off the JSON shape each prompt requests. The content is filler;
//! startup disables stages 2 and 3 in mock mode because the mock cannot
//! actually solve questions.

use super::{GenerationParams, LlmClient, LlmResponse, TokenUsage};
use crate::error::LlmError;
use crate::model::CHOICE_LABELS;

/// LLM backend that fabricates well-formed responses without a network.
pub struct MockClient;

impl MockClient {
    pub fn new() -> Self {
        Self
    }

    fn generation_body(user: &str) -> String {
        let count = requested_count(user);
        let wants_passage = user.contains("\"passage\"");

        let questions: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                let correct = CHOICE_LABELS[i % CHOICE_LABELS.len()];
                let choices: Vec<serde_json::Value> = CHOICE_LABELS
                    .iter()
                    .map(|label| {
                        let is_correct = *label == correct;
                        serde_json::json!({
                            "id": label,
                            "text": format!(
                                "Answer choice {label} offering a distinct account of the argument's structure and evidence."
                            ),
                            "explanation": if is_correct {
                                format!("Choice {label} follows directly from the stated premises.")
                            } else {
                                format!("Choice {label} distorts what the premises actually establish.")
                            },
                            "wrong_answer_type": if is_correct {
                                serde_json::Value::Null
                            } else {
                                serde_json::Value::from("out_of_scope")
                            },
                        })
                    })
                    .collect();

                serde_json::json!({
                    "stimulus": if wants_passage {
                        String::new()
                    } else {
                        format!(
                            "A columnist argues that municipal recycling programs {i} reduce landfill \
                             volume substantially. Critics respond that collection trucks add road wear \
                             and emissions. The columnist counters that the net environmental effect \
                             remains positive once processing efficiency is considered."
                        )
                    },
                    "question_stem": format!("Which one of the following, if true, most affects the argument above? ({i})"),
                    "choices": choices,
                    "correct_answer_id": correct,
                    "explanation": format!("Choice {correct} is correct because it tracks the stated premises."),
                })
            })
            .collect();

        let mut body = serde_json::json!({ "questions": questions });
        if wants_passage {
            let paragraph = "The doctrine of adverse possession has long occupied an uneasy place in \
                 property law. Its defenders describe it as a doctrine of repose, one that quiets \
                 stale claims and rewards productive use of land. Its critics answer that it \
                 legitimizes trespass and burdens absent owners unfairly. Courts have mediated \
                 between these positions by demanding that possession be open, notorious, and \
                 continuous for a statutory period.";
            let content = format!("{paragraph} {paragraph} {paragraph} {paragraph} {paragraph} {paragraph} {paragraph}");
            body["passage"] = serde_json::json!({
                "title": "Adverse Possession and the Logic of Repose",
                "subject_area": "law",
                "content": content,
                "is_comparative": false,
                "passage_b": serde_json::Value::Null,
            });
        }
        body.to_string()
    }

    fn verification_body() -> String {
        serde_json::json!({
            "selected_answer": "A",
            "confidence": "high",
            "reasoning": "Choice A is the only option compelled by the premises.",
            "potential_issues": [],
        })
        .to_string()
    }

    fn adversarial_body(user: &str) -> String {
        // Challenge every label except the one revealed as correct.
        let correct = user
            .split("correct answer is ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .map(|s| s.trim_matches(|c: char| !c.is_ascii_alphabetic()).to_string())
            .unwrap_or_else(|| "A".to_string());

        let challenges: Vec<serde_json::Value> = CHOICE_LABELS
            .iter()
            .filter(|label| **label != correct)
            .map(|label| {
                serde_json::json!({
                    "choice_id": label,
                    "defense_strength": "weak",
                    "defense_argument": format!(
                        "Choice {label} could appeal to a reader who conflates correlation with causation, \
                         but the stimulus explicitly blocks that reading."
                    ),
                    "correct_answer_weakness": serde_json::Value::Null,
                    "recommendation": "keep",
                })
            })
            .collect();

        serde_json::json!({
            "challenges": challenges,
            "overall_quality": "good",
            "overall_recommendation": "keep",
        })
        .to_string()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        _system: &str,
        user: &str,
        _params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError> {
        let text = if user.contains("\"selected_answer\"") {
            Self::verification_body()
        } else if user.contains("\"challenges\"") {
            Self::adversarial_body(user)
        } else {
            Self::generation_body(user)
        };

        // A plausible token estimate keeps cost accounting exercised.
        let usage = TokenUsage {
            input_tokens: (user.len() / 4) as u32,
            output_tokens: (text.len() / 4) as u32,
        };

        Ok(LlmResponse {
            text,
            usage,
            model: "mock".to_string(),
        })
    }
}

/// Parse the requested question count from the leading "Generate N ..."
/// instruction. Falls back to 6 if the prompt deviates.
fn requested_count(user: &str) -> usize {
    user.split_whitespace()
        .find_map(|w| w.parse::<usize>().ok())
        .unwrap_or(6)
        .clamp(1, 12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generation_response_is_valid_json_with_count() {
        let client = MockClient::new();
        let resp = client
            .generate("sys", "Generate 4 medium logical reasoning questions.", &GenerationParams::default())
            .await
            .expect("generate");

        let parsed: serde_json::Value = serde_json::from_str(&resp.text).expect("json");
        assert_eq!(parsed["questions"].as_array().expect("questions").len(), 4);
    }

    #[tokio::test]
    async fn generation_response_includes_passage_when_requested() {
        let client = MockClient::new();
        let resp = client
            .generate(
                "sys",
                "Generate 5 questions. Return JSON with a \"passage\" object and \"questions\".",
                &GenerationParams::default(),
            )
            .await
            .expect("generate");

        let parsed: serde_json::Value = serde_json::from_str(&resp.text).expect("json");
        let content = parsed["passage"]["content"].as_str().expect("content");
        assert!(content.len() >= 1500 && content.len() <= 3000);
    }

    #[tokio::test]
    async fn verification_prompt_yields_verification_shape() {
        let client = MockClient::new();
        let resp = client
            .generate(
                "sys",
                "Solve this. Respond with JSON: {\"selected_answer\": ...}",
                &GenerationParams::default(),
            )
            .await
            .expect("generate");

        let parsed: serde_json::Value = serde_json::from_str(&resp.text).expect("json");
        assert_eq!(parsed["confidence"], "high");
    }

    #[tokio::test]
    async fn adversarial_prompt_challenges_four_wrong_choices() {
        let client = MockClient::new();
        let resp = client
            .generate(
                "sys",
                "The correct answer is C. Respond with JSON: {\"challenges\": [...]}",
                &GenerationParams::default(),
            )
            .await
            .expect("generate");

        let parsed: serde_json::Value = serde_json::from_str(&resp.text).expect("json");
        let challenges = parsed["challenges"].as_array().expect("challenges");
        assert_eq!(challenges.len(), 4);
        assert!(challenges.iter().all(|c| c["choice_id"] != "C"));
    }

    #[test]
    fn requested_count_parses_leading_integer() {
        assert_eq!(requested_count("Generate 6 hard questions"), 6);
        assert_eq!(requested_count("no number here"), 6);
        assert_eq!(requested_count("Generate 99 questions"), 12);
    }
}

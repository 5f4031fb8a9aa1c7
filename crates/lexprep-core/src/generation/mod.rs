//! Three-stage LLM generation pipeline.
//!
//! Stage 1 generates a batch and structurally validates it. Stage 2 solves
//! each question independently with the key withheld. Stage 3 argues for
//! the wrong answers to surface ambiguity. Survivors are scored, then
//! persisted in a single transaction and the batch row is finalized.
//!
//! Stages 2 and 3 are advisory: a transport failure downgrades the item to
//! `unvalidated` instead of blocking the batch.

pub mod parser;
pub mod prompts;
pub mod quality;
pub mod structural;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::catalog;
use crate::config::Config;
use crate::error::{GenerationError, LlmError};
use crate::llm::{pricing, GenerationParams, LlmClient, LlmResponse};
use crate::model::{
    BatchStatus, Difficulty, GenerationRequest, SubjectArea, Subtype, ValidationStatus,
};
use crate::storage::items::{NewChoice, NewItem, NewPassage};
use crate::storage::{self, DbPool};
use parser::{GeneratedBatch, GeneratedQuestion};
use quality::{AdversarialOutcome, StructuralFlags, VerificationVerdict};

/// Stage timeouts. Generation is the long pole; the later stages handle
/// one question at a time.
const STAGE1_TIMEOUT_SECS: u64 = 60;
const STAGE2_TIMEOUT_SECS: u64 = 30;
const STAGE3_TIMEOUT_SECS: u64 = 45;

/// Backoff before the single transient-error retry.
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Sampling temperatures: creative generation, careful validation.
const GENERATION_TEMPERATURE: f32 = 0.8;
const VALIDATION_TEMPERATURE: f32 = 0.2;

/// Pipeline knobs derived from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub validation_enabled: bool,
    pub adversarial_enabled: bool,
    pub daily_cost_limit_cents: u32,
    pub generation_model: String,
    pub validation_model: String,
}

impl PipelineSettings {
    /// Derive settings from config. Mock mode disables stages 2 and 3,
    /// since the mock backend cannot actually solve questions.
    pub fn from_config(config: &Config) -> Self {
        let mock = config.llm.provider == "mock";
        if mock && (config.generation.validation_enabled || config.generation.adversarial_enabled)
        {
            tracing::info!("Mock LLM backend: disabling verification and adversarial stages");
        }
        Self {
            validation_enabled: config.generation.validation_enabled && !mock,
            adversarial_enabled: config.generation.adversarial_enabled && !mock,
            daily_cost_limit_cents: config.generation.daily_cost_limit_cents,
            generation_model: config.llm.generation_model.clone(),
            validation_model: config.llm.validation_model.clone(),
        }
    }
}

/// Summary of one completed batch.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub batch_id: i64,
    pub requested: u32,
    pub passed: u32,
    pub flagged: u32,
    pub rejected: u32,
    pub item_ids: Vec<i64>,
}

/// The generation pipeline. Cheap to clone; safe to share across tasks.
#[derive(Clone)]
pub struct GenerationPipeline {
    pool: DbPool,
    client: Arc<dyn LlmClient>,
    settings: PipelineSettings,
}

impl GenerationPipeline {
    /// Create a pipeline over a pool, an LLM client, and settings.
    pub fn new(pool: DbPool, client: Arc<dyn LlmClient>, settings: PipelineSettings) -> Self {
        Self {
            pool,
            client,
            settings,
        }
    }

    /// Run one generation batch to completion.
    ///
    /// On success the batch row is `completed` with aggregate counts; on
    /// any failure it is `failed` with the error string, and no items are
    /// persisted (the save is a single transaction).
    pub async fn run(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, GenerationError> {
        let spent = storage::llm_usage::cost_today_cents(&self.pool).await?;
        if spent >= self.settings.daily_cost_limit_cents {
            return Err(GenerationError::BudgetExhausted {
                spent_cents: spent,
                limit_cents: self.settings.daily_cost_limit_cents,
            });
        }

        // Jobs without a subtype (bucket triggers) get a random one so the
        // prompt catalogue always applies.
        let subtype = match request.subtype {
            Some(s) => s,
            None => *Subtype::all_for_section(request.section)
                .choose(&mut rand::thread_rng())
                .expect("sections have subtypes"),
        };

        let batch_id = storage::batches::create(
            &self.pool,
            request.section,
            Some(subtype.as_str()),
            request.difficulty,
            request.count,
        )
        .await?;

        tracing::info!(
            batch_id,
            section = request.section.as_str(),
            subtype = subtype.as_str(),
            difficulty = request.difficulty.as_str(),
            count = request.count,
            "Generation batch started"
        );

        let started = Instant::now();
        match self.execute(batch_id, request, subtype, cancel, started).await {
            Ok(summary) => {
                tracing::info!(
                    batch_id,
                    passed = summary.passed,
                    flagged = summary.flagged,
                    rejected = summary.rejected,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Generation batch completed"
                );
                Ok(summary)
            }
            Err(e) => {
                if let Err(mark) =
                    storage::batches::fail(&self.pool, batch_id, &e.to_string()).await
                {
                    tracing::warn!(batch_id, error = %mark, "Failed to mark batch as failed");
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        batch_id: i64,
        request: &GenerationRequest,
        subtype: Subtype,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<BatchSummary, GenerationError> {
        storage::batches::set_status(&self.pool, batch_id, BatchStatus::Generating).await?;

        // ---- Stage 1: generate and structurally validate -----------------
        let guide = catalog::guide(subtype);
        let mut stage_request = request.clone();
        stage_request.subtype = Some(subtype);
        let system = prompts::generation_system(request.section);
        let user = prompts::generation_user(&stage_request, &guide);
        let params = GenerationParams {
            max_tokens: 8192,
            temperature: GENERATION_TEMPERATURE,
            model: Some(self.settings.generation_model.clone()),
        };

        let resp = self
            .call_llm("generate", &system, &user, &params, STAGE1_TIMEOUT_SECS, cancel)
            .await?;
        let generation_tokens = resp.usage.input_tokens + resp.usage.output_tokens;

        let parsed = parser::parse_generation(&resp.text)?;
        let structure = structural::validate_batch(request.section, &parsed)?;
        for warning in &structure.warnings {
            tracing::warn!(batch_id, warning = %warning, "Structural warning");
        }

        storage::batches::set_status(&self.pool, batch_id, BatchStatus::Validating).await?;

        let passage_text = parsed.passage.as_ref().map(|p| match &p.passage_b {
            Some(b) if !b.is_empty() => format!("{}\n\n---\n\n{b}", p.content),
            _ => p.content.clone(),
        });

        // ---- Stage 2: independent solve ----------------------------------
        let mut validation_tokens = 0u32;
        let mut verdicts = Vec::with_capacity(parsed.questions.len());
        for question in &parsed.questions {
            let verdict = if self.settings.validation_enabled {
                self.verify_question(question, passage_text.as_deref(), cancel, &mut validation_tokens)
                    .await?
            } else {
                VerificationVerdict::Unavailable
            };
            verdicts.push(verdict);
        }

        // ---- Stage 3: adversarial defense (skipped for easy items) -------
        let run_adversarial =
            self.settings.adversarial_enabled && request.difficulty != Difficulty::Easy;
        let mut adversarials = vec![AdversarialOutcome::Skipped; parsed.questions.len()];
        if run_adversarial {
            for (idx, question) in parsed.questions.iter().enumerate() {
                if matches!(verdicts[idx], VerificationVerdict::Disagreed { .. }) {
                    continue; // already rejected
                }
                adversarials[idx] = self
                    .challenge_question(question, passage_text.as_deref(), cancel, &mut validation_tokens)
                    .await?;
            }
        }

        // ---- Scoring, classification, persistence ------------------------
        let (new_items, passed, flagged, rejected) =
            self.assemble_items(&parsed, &stage_request, subtype, &verdicts, &adversarials, &structure);

        let new_passage = if new_items.is_empty() {
            None
        } else {
            parsed.passage.as_ref().map(|p| build_passage(p, request))
        };

        let item_ids = storage::items::save_generated_batch(
            &self.pool,
            Some(batch_id),
            new_passage.as_ref(),
            &new_items,
        )
        .await?;

        storage::batches::complete(
            &self.pool,
            batch_id,
            passed,
            flagged,
            rejected,
            generation_tokens,
            validation_tokens,
            started.elapsed().as_millis() as u64,
        )
        .await?;

        Ok(BatchSummary {
            batch_id,
            requested: request.count,
            passed,
            flagged,
            rejected,
            item_ids,
        })
    }

    /// Stage-2 call for one question. Transport and parse failures reduce
    /// to `Unavailable`; only cancellation propagates.
    async fn verify_question(
        &self,
        question: &GeneratedQuestion,
        passage: Option<&str>,
        cancel: &CancellationToken,
        validation_tokens: &mut u32,
    ) -> Result<VerificationVerdict, GenerationError> {
        let system = prompts::verification_system();
        let user = prompts::verification_user(question, passage);
        let params = GenerationParams {
            max_tokens: 1024,
            temperature: VALIDATION_TEMPERATURE,
            model: Some(self.settings.validation_model.clone()),
        };

        match self
            .call_llm("verify", &system, &user, &params, STAGE2_TIMEOUT_SECS, cancel)
            .await
        {
            Ok(resp) => {
                *validation_tokens += resp.usage.input_tokens + resp.usage.output_tokens;
                match parser::parse_verification(&resp.text) {
                    Ok(v) if v.selected_answer == question.correct_answer_id => {
                        Ok(VerificationVerdict::Agreed(v.confidence))
                    }
                    Ok(v) => {
                        tracing::info!(
                            generator = %question.correct_answer_id,
                            verifier = %v.selected_answer,
                            "Verifier disagreed with generator"
                        );
                        Ok(VerificationVerdict::Disagreed {
                            verifier_choice: v.selected_answer,
                        })
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Verifier response unparseable, item unvalidated");
                        Ok(VerificationVerdict::Unavailable)
                    }
                }
            }
            Err(LlmError::Cancelled) => Err(GenerationError::Cancelled),
            Err(e) => {
                tracing::warn!(error = %e, "Verifier call failed, item unvalidated");
                Ok(VerificationVerdict::Unavailable)
            }
        }
    }

    /// Stage-3 call for one question. Failures reduce to `Skipped`.
    async fn challenge_question(
        &self,
        question: &GeneratedQuestion,
        passage: Option<&str>,
        cancel: &CancellationToken,
        validation_tokens: &mut u32,
    ) -> Result<AdversarialOutcome, GenerationError> {
        let system = prompts::adversarial_system();
        let user = prompts::adversarial_user(question, passage);
        let params = GenerationParams {
            max_tokens: 2048,
            temperature: VALIDATION_TEMPERATURE,
            model: Some(self.settings.validation_model.clone()),
        };

        match self
            .call_llm("adversarial", &system, &user, &params, STAGE3_TIMEOUT_SECS, cancel)
            .await
        {
            Ok(resp) => {
                *validation_tokens += resp.usage.input_tokens + resp.usage.output_tokens;
                match parser::parse_adversarial(&resp.text) {
                    Ok(a) => Ok(AdversarialOutcome::from_challenges(&a.challenges)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Adversarial response unparseable, skipping");
                        Ok(AdversarialOutcome::Skipped)
                    }
                }
            }
            Err(LlmError::Cancelled) => Err(GenerationError::Cancelled),
            Err(e) => {
                tracing::warn!(error = %e, "Adversarial call failed, skipping");
                Ok(AdversarialOutcome::Skipped)
            }
        }
    }

    /// Score every question, fold statuses (escalate-only), and build the
    /// rows to persist. Returns (items, passed, flagged, rejected).
    fn assemble_items(
        &self,
        parsed: &GeneratedBatch,
        request: &GenerationRequest,
        subtype: Subtype,
        verdicts: &[VerificationVerdict],
        adversarials: &[AdversarialOutcome],
        structural: &structural::StructuralOutcome,
    ) -> (Vec<NewItem>, u32, u32, u32) {
        let mut rng = rand::thread_rng();
        let (score_lo, score_hi) = request.difficulty.score_range();
        let flags = StructuralFlags::surviving(structural.letter_distribution_ok);

        let mut items = Vec::new();
        let (mut passed, mut flagged, mut rejected) = (0u32, 0u32, 0u32);

        for (idx, question) in parsed.questions.iter().enumerate() {
            let stage_status = stage_status(&verdicts[idx], adversarials[idx]);
            let score = quality::composite_score(&verdicts[idx], adversarials[idx], flags);
            let status = quality::final_status(stage_status, score);

            match status {
                ValidationStatus::Rejected => {
                    rejected += 1;
                    continue;
                }
                ValidationStatus::Flagged => flagged += 1,
                ValidationStatus::Passed | ValidationStatus::Unvalidated => passed += 1,
            }

            let choices = question
                .choices
                .iter()
                .map(|c| NewChoice {
                    choice_id: c.id.clone(),
                    choice_text: c.text.clone(),
                    explanation: c.explanation.clone(),
                    is_correct: c.id == question.correct_answer_id,
                    wrong_answer_type: if c.id == question.correct_answer_id {
                        None
                    } else {
                        c.wrong_answer_type.clone()
                    },
                })
                .collect();

            items.push(NewItem {
                section: request.section,
                subtype,
                difficulty: request.difficulty,
                // Seed the adaptive window before real usage data exists.
                difficulty_score: rng.gen_range(score_lo..=score_hi),
                stimulus: question.stimulus.clone(),
                question_stem: question.question_stem.clone(),
                correct_choice_id: question.correct_answer_id.clone(),
                quality_score: Some(score),
                validation_status: status,
                choices,
            });
        }

        (items, passed, flagged, rejected)
    }

    /// One LLM call with stage timeout, cancellation, one transient retry,
    /// and usage recording.
    async fn call_llm(
        &self,
        stage: &'static str,
        system: &str,
        user: &str,
        params: &GenerationParams,
        timeout_secs: u64,
        cancel: &CancellationToken,
    ) -> Result<LlmResponse, LlmError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = tokio::select! {
                () = cancel.cancelled() => Err(LlmError::Cancelled),
                outcome = tokio::time::timeout(
                    Duration::from_secs(timeout_secs),
                    self.client.generate(system, user, params),
                ) => match outcome {
                    Ok(inner) => inner,
                    Err(_) => Err(LlmError::DeadlineExceeded { seconds: timeout_secs }),
                },
            };

            match result {
                Ok(resp) => {
                    self.record_usage(stage, &resp).await;
                    return Ok(resp);
                }
                Err(LlmError::Cancelled) => return Err(LlmError::Cancelled),
                Err(e) if attempt == 1 && is_transient(&e) => {
                    tracing::warn!(stage, error = %e, "Transient LLM failure, retrying once");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Record token usage and estimated cost. Best-effort.
    async fn record_usage(&self, stage: &'static str, resp: &LlmResponse) {
        let pricing = pricing::lookup(self.client.name(), &resp.model);
        let cost = pricing.compute_cost(resp.usage.input_tokens, resp.usage.output_tokens);
        if let Err(e) = storage::llm_usage::insert_usage(
            &self.pool,
            stage,
            self.client.name(),
            &resp.model,
            resp.usage.input_tokens,
            resp.usage.output_tokens,
            cost,
        )
        .await
        {
            tracing::warn!(stage, error = %e, "Failed to record LLM usage");
        }
    }
}

/// Fold the stage-2 verdict and stage-3 outcome into a pre-classification
/// status, taking the more severe of the two.
fn stage_status(
    verdict: &VerificationVerdict,
    adversarial: AdversarialOutcome,
) -> ValidationStatus {
    let from_verdict = verdict.status();
    let from_adversarial = match adversarial {
        AdversarialOutcome::Ambiguous => ValidationStatus::Rejected,
        AdversarialOutcome::MinorConcern { .. } => ValidationStatus::Flagged,
        AdversarialOutcome::Clean | AdversarialOutcome::Skipped => return from_verdict,
    };
    if rank(from_adversarial) > rank(from_verdict) {
        from_adversarial
    } else {
        from_verdict
    }
}

fn rank(status: ValidationStatus) -> u8 {
    match status {
        ValidationStatus::Passed => 0,
        ValidationStatus::Unvalidated => 1,
        ValidationStatus::Flagged => 2,
        ValidationStatus::Rejected => 3,
    }
}

fn is_transient(error: &LlmError) -> bool {
    match error {
        LlmError::Transport(_) | LlmError::Throttled { .. } | LlmError::DeadlineExceeded { .. } => true,
        LlmError::Backend { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Build the passage row from a parsed passage, computing the word count
/// over both bodies.
fn build_passage(
    parsed: &parser::GeneratedPassage,
    request: &GenerationRequest,
) -> NewPassage {
    let has_second_body = parsed.passage_b.as_deref().map_or(false, |b| !b.is_empty());
    let mut word_count = parsed.content.split_whitespace().count() as i64;
    if let Some(b) = parsed.passage_b.as_deref() {
        word_count += b.split_whitespace().count() as i64;
    }
    NewPassage {
        title: parsed.title.clone(),
        subject_area: SubjectArea::parse(&parsed.subject_area)
            .or(request.subject_area)
            .unwrap_or(SubjectArea::Law),
        content: parsed.content.clone(),
        content_b: parsed.passage_b.clone(),
        is_comparative: parsed.is_comparative && has_second_body,
        word_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::TokenUsage;
    use crate::model::{LrSubtype, Section};
    use crate::storage::init_test_db;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // --- Scripted LLM client -------------------------------------------

    enum Reply {
        Text(String),
        Fail,
    }

    /// Test client that pops scripted replies per stage, routed by the
    /// JSON shape each prompt names.
    struct ScriptedClient {
        generate: Mutex<VecDeque<Reply>>,
        verify: Mutex<VecDeque<Reply>>,
        adversarial: Mutex<VecDeque<Reply>>,
    }

    impl ScriptedClient {
        fn new(
            generate: Vec<Reply>,
            verify: Vec<Reply>,
            adversarial: Vec<Reply>,
        ) -> Arc<Self> {
            Arc::new(Self {
                generate: Mutex::new(generate.into()),
                verify: Mutex::new(verify.into()),
                adversarial: Mutex::new(adversarial.into()),
            })
        }

        fn remaining_adversarial(&self) -> usize {
            self.adversarial.lock().expect("lock").len()
        }
    }

    #[async_trait::async_trait]
    impl crate::llm::LlmClient for ScriptedClient {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(
            &self,
            _system: &str,
            user: &str,
            _params: &GenerationParams,
        ) -> Result<LlmResponse, LlmError> {
            let queue = if user.contains("\"selected_answer\"") {
                &self.verify
            } else if user.contains("\"challenges\"") {
                &self.adversarial
            } else {
                &self.generate
            };
            let reply = queue.lock().expect("lock").pop_front().expect("script exhausted");
            match reply {
                Reply::Text(text) => Ok(LlmResponse {
                    text,
                    usage: TokenUsage {
                        input_tokens: 100,
                        output_tokens: 50,
                    },
                    model: "mock".to_string(),
                }),
                Reply::Fail => Err(LlmError::Backend {
                    status: 500,
                    detail: "upstream".to_string(),
                }),
            }
        }
    }

    // --- Fixtures -------------------------------------------------------

    fn stimulus(topic: &str) -> String {
        format!(
            "Researchers studying {topic} observed a steady decline over the last decade. \
             They concluded that a single environmental factor explains the decline. \
             However, their survey covered only a fraction of the affected region. \
             Critics note that several other factors changed over the same period."
        )
    }

    fn question_json(correct: &str, topic: &str) -> serde_json::Value {
        let choices: Vec<serde_json::Value> = crate::model::CHOICE_LABELS
            .iter()
            .map(|label| {
                serde_json::json!({
                    "id": label,
                    "text": format!("A plausible answer choice {label} about {topic}."),
                    "explanation": format!("Choice {label} evaluated against the argument."),
                    "wrong_answer_type": if *label == correct { serde_json::Value::Null } else { "out_of_scope".into() },
                })
            })
            .collect();
        serde_json::json!({
            "stimulus": stimulus(topic),
            "question_stem": "Which one of the following, if true, most weakens the argument?",
            "choices": choices,
            "correct_answer_id": correct,
            "explanation": "The correct choice undercuts the causal claim.",
        })
    }

    fn generation_json(corrects: &[(&str, &str)]) -> String {
        let questions: Vec<serde_json::Value> = corrects
            .iter()
            .map(|(correct, topic)| question_json(correct, topic))
            .collect();
        serde_json::json!({ "questions": questions }).to_string()
    }

    fn verify_json(answer: &str, confidence: &str) -> String {
        serde_json::json!({
            "selected_answer": answer,
            "confidence": confidence,
            "reasoning": "Worked through the choices.",
            "potential_issues": [],
        })
        .to_string()
    }

    fn adversarial_json(correct: &str, strengths: &[&str]) -> String {
        let challenges: Vec<serde_json::Value> = crate::model::CHOICE_LABELS
            .iter()
            .filter(|l| **l != correct)
            .zip(strengths)
            .map(|(label, strength)| {
                serde_json::json!({
                    "choice_id": label,
                    "defense_strength": strength,
                    "defense_argument": "The strongest case available.",
                    "correct_answer_weakness": null,
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

    fn request(difficulty: Difficulty, count: u32) -> GenerationRequest {
        GenerationRequest {
            section: Section::LogicalReasoning,
            subtype: Some(Subtype::Lr(LrSubtype::Weaken)),
            difficulty,
            count,
            subject_area: None,
            is_comparative: false,
        }
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            validation_enabled: true,
            adversarial_enabled: true,
            daily_cost_limit_cents: 1000,
            generation_model: "mock".to_string(),
            validation_model: "mock".to_string(),
        }
    }

    async fn servable_count(pool: &DbPool) -> i64 {
        storage::items::count_servable_in_bucket(pool, Section::LogicalReasoning, None, 0, 100)
            .await
            .expect("count")
    }

    // --- Tests ----------------------------------------------------------

    #[tokio::test]
    async fn happy_path_persists_passed_items() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![Reply::Text(generation_json(&[("A", "wetland loss"), ("B", "coral reefs")]))],
            vec![
                Reply::Text(verify_json("A", "high")),
                Reply::Text(verify_json("B", "high")),
            ],
            vec![
                Reply::Text(adversarial_json("A", &["none", "weak", "none", "weak"])),
                Reply::Text(adversarial_json("B", &["weak", "none", "none", "none"])),
            ],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let summary = pipeline
            .run(&request(Difficulty::Medium, 2), &CancellationToken::new())
            .await
            .expect("run");

        assert_eq!(summary.passed, 2);
        assert_eq!(summary.flagged, 0);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.item_ids.len(), 2);

        let batch = storage::batches::get(&pool, summary.batch_id).await.expect("batch");
        assert_eq!(batch.status, BatchStatus::Completed);
        assert_eq!(batch.passed_count, 2);
        assert!(batch.generation_tokens > 0);
        assert!(batch.validation_tokens > 0);

        for id in &summary.item_ids {
            let item = storage::items::get_item_with_choices(&pool, *id)
                .await
                .expect("item")
                .item;
            assert_eq!(item.validation_status, ValidationStatus::Passed);
            assert!(item.difficulty.contains(item.difficulty_score));
            assert!(item.quality_score.expect("quality") > 0.70);
        }
    }

    #[tokio::test]
    async fn verifier_disagreement_rejects_item() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![Reply::Text(generation_json(&[("B", "glacier retreat")]))],
            // Verifier picks C with high confidence: reject.
            vec![Reply::Text(verify_json("C", "high"))],
            vec![],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let summary = pipeline
            .run(&request(Difficulty::Medium, 1), &CancellationToken::new())
            .await
            .expect("run");

        assert_eq!(summary.passed, 0);
        assert_eq!(summary.rejected, 1);
        assert!(summary.item_ids.is_empty());
        assert_eq!(servable_count(&pool).await, 0);

        let batch = storage::batches::get(&pool, summary.batch_id).await.expect("batch");
        assert_eq!(batch.rejected_count, 1);
    }

    #[tokio::test]
    async fn moderate_defense_flags_item() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![Reply::Text(generation_json(&[("C", "antibiotic resistance")]))],
            vec![Reply::Text(verify_json("C", "high"))],
            vec![Reply::Text(adversarial_json("C", &["none", "moderate", "weak", "none"]))],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let summary = pipeline
            .run(&request(Difficulty::Medium, 1), &CancellationToken::new())
            .await
            .expect("run");

        assert_eq!(summary.flagged, 1);
        let item = storage::items::get_item_with_choices(&pool, summary.item_ids[0])
            .await
            .expect("item")
            .item;
        assert_eq!(item.validation_status, ValidationStatus::Flagged);
    }

    #[tokio::test]
    async fn strong_defense_rejects_item() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![Reply::Text(generation_json(&[("D", "supply chains")]))],
            vec![Reply::Text(verify_json("D", "high"))],
            vec![Reply::Text(adversarial_json("D", &["strong", "none", "none", "none"]))],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let summary = pipeline
            .run(&request(Difficulty::Hard, 1), &CancellationToken::new())
            .await
            .expect("run");

        assert_eq!(summary.rejected, 1);
        assert!(summary.item_ids.is_empty());
    }

    #[tokio::test]
    async fn easy_batches_skip_adversarial() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![Reply::Text(generation_json(&[("A", "library funding")]))],
            vec![Reply::Text(verify_json("A", "high"))],
            // Would panic if consumed.
            vec![],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client.clone(), settings());

        let summary = pipeline
            .run(&request(Difficulty::Easy, 1), &CancellationToken::new())
            .await
            .expect("run");

        assert_eq!(summary.passed, 1);
        assert_eq!(client.remaining_adversarial(), 0);
    }

    #[tokio::test]
    async fn verifier_transport_failure_leaves_item_unvalidated() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![Reply::Text(generation_json(&[("E", "urban heat islands")]))],
            // Both the call and its retry fail.
            vec![Reply::Fail, Reply::Fail],
            vec![Reply::Text(adversarial_json("E", &["none", "none", "weak", "none"]))],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let summary = pipeline
            .run(&request(Difficulty::Medium, 1), &CancellationToken::new())
            .await
            .expect("run");

        assert_eq!(summary.passed, 1);
        let item = storage::items::get_item_with_choices(&pool, summary.item_ids[0])
            .await
            .expect("item")
            .item;
        assert_eq!(item.validation_status, ValidationStatus::Unvalidated);
        assert!(item.is_servable());
    }

    #[tokio::test]
    async fn structural_failure_fails_batch() {
        let pool = init_test_db().await.expect("init db");
        // Four choices only.
        let mut bad = question_json("A", "rail subsidies");
        bad["choices"].as_array_mut().expect("choices").pop();
        let body = serde_json::json!({ "questions": [bad] }).to_string();

        let client = ScriptedClient::new(vec![Reply::Text(body)], vec![], vec![]);
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let err = pipeline
            .run(&request(Difficulty::Medium, 1), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::BatchRejected { .. }));
        assert_eq!(servable_count(&pool).await, 0);

        // The batch row records the failure.
        let row: (String, Option<String>) = sqlx::query_as(
            "SELECT status, error_message FROM generation_batches ORDER BY id DESC LIMIT 1",
        )
        .fetch_one(&pool)
        .await
        .expect("row");
        assert_eq!(row.0, "failed");
        assert!(row.1.expect("error").contains("choices"));
    }

    #[tokio::test]
    async fn unparseable_generation_fails_batch() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![Reply::Text("I cannot help with that.".to_string())],
            vec![],
            vec![],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let err = pipeline
            .run(&request(Difficulty::Medium, 1), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Llm(LlmError::Malformed(_))));
    }

    #[tokio::test]
    async fn budget_gate_blocks_before_any_call() {
        let pool = init_test_db().await.expect("init db");
        // Spend past the limit.
        storage::llm_usage::insert_usage(&pool, "generate", "anthropic", "sonnet", 0, 0, 11.0)
            .await
            .expect("seed spend");

        let client = ScriptedClient::new(vec![], vec![], vec![]);
        let mut s = settings();
        s.daily_cost_limit_cents = 1000;
        let pipeline = GenerationPipeline::new(pool.clone(), client, s);

        let err = pipeline
            .run(&request(Difficulty::Medium, 1), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::BudgetExhausted { .. }));
    }

    #[tokio::test]
    async fn transient_generation_failure_retries_once_then_succeeds() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![
                Reply::Fail,
                Reply::Text(generation_json(&[("A", "honeybee colonies")])),
            ],
            vec![Reply::Text(verify_json("A", "high"))],
            vec![Reply::Text(adversarial_json("A", &["none", "none", "none", "none"]))],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let summary = pipeline
            .run(&request(Difficulty::Medium, 1), &CancellationToken::new())
            .await
            .expect("run");
        assert_eq!(summary.passed, 1);
    }

    #[tokio::test]
    async fn medium_confidence_agreement_flags() {
        let pool = init_test_db().await.expect("init db");
        let client = ScriptedClient::new(
            vec![Reply::Text(generation_json(&[("B", "noise ordinances")]))],
            vec![Reply::Text(verify_json("B", "medium"))],
            vec![Reply::Text(adversarial_json("B", &["none", "none", "none", "none"]))],
        );
        let pipeline = GenerationPipeline::new(pool.clone(), client, settings());

        let summary = pipeline
            .run(&request(Difficulty::Medium, 1), &CancellationToken::new())
            .await
            .expect("run");

        assert_eq!(summary.flagged, 1);
        let item = storage::items::get_item_with_choices(&pool, summary.item_ids[0])
            .await
            .expect("item")
            .item;
        assert_eq!(item.validation_status, ValidationStatus::Flagged);
        // Flagged items are not servable.
        assert!(!item.is_servable());
    }
}

//! Stage-1 structural validation.
//!
//! Hard failures reject the whole batch; soft failures are recorded as
//! warnings and feed the structural component of the quality score.

use std::collections::HashSet;

use super::parser::GeneratedBatch;
use crate::error::GenerationError;
use crate::model::{Section, CHOICE_LABELS};

/// Stimulus length bounds for logical-reasoning items, in characters.
const STIMULUS_LEN: (usize, usize) = (100, 700);

/// Passage length bounds for reading-comprehension batches, in characters.
const PASSAGE_LEN: (usize, usize) = (1500, 3000);

/// Choice text length bounds, in characters.
const CHOICE_LEN: (usize, usize) = (20, 400);

/// Jaccard similarity above which two stimuli are flagged as near-duplicates.
const STIMULUS_OVERLAP_MAX: f64 = 0.6;

/// Outcome of structural validation on a surviving batch.
#[derive(Debug, Clone)]
pub struct StructuralOutcome {
    /// Whether no correct letter is over-represented in the batch.
    pub letter_distribution_ok: bool,
    /// Soft findings, logged but not fatal.
    pub warnings: Vec<String>,
}

/// Validate a parsed generation batch.
///
/// Returns the soft-check outcome on success, or a
/// [`GenerationError::BatchRejected`] naming the first hard failure.
pub fn validate_batch(
    section: Section,
    batch: &GeneratedBatch,
) -> Result<StructuralOutcome, GenerationError> {
    if batch.questions.is_empty() {
        return Err(reject("response contained no questions"));
    }

    if section == Section::ReadingComprehension && batch.passage.is_none() {
        return Err(reject("reading-comprehension batch is missing its passage"));
    }

    for (idx, question) in batch.questions.iter().enumerate() {
        // Exactly five choices labeled A..E, in order.
        if question.choices.len() != CHOICE_LABELS.len() {
            return Err(reject(&format!(
                "question {idx} has {} choices, expected 5",
                question.choices.len()
            )));
        }
        for (choice, expected) in question.choices.iter().zip(CHOICE_LABELS) {
            if choice.id != expected {
                return Err(reject(&format!(
                    "question {idx} choice labeled '{}', expected '{expected}'",
                    choice.id
                )));
            }
        }

        if !CHOICE_LABELS.contains(&question.correct_answer_id.as_str()) {
            return Err(reject(&format!(
                "question {idx} correct_answer_id '{}' is not A-E",
                question.correct_answer_id
            )));
        }

        if section == Section::LogicalReasoning {
            let len = question.stimulus.chars().count();
            if !(STIMULUS_LEN.0..=STIMULUS_LEN.1).contains(&len) {
                return Err(reject(&format!(
                    "question {idx} stimulus length {len} outside {}..={}",
                    STIMULUS_LEN.0, STIMULUS_LEN.1
                )));
            }
        }

        for choice in &question.choices {
            let len = choice.text.chars().count();
            if !(CHOICE_LEN.0..=CHOICE_LEN.1).contains(&len) {
                return Err(reject(&format!(
                    "question {idx} choice {} text length {len} outside {}..={}",
                    choice.id, CHOICE_LEN.0, CHOICE_LEN.1
                )));
            }
            if choice.explanation.trim().is_empty() {
                return Err(reject(&format!(
                    "question {idx} choice {} has no explanation",
                    choice.id
                )));
            }
        }
    }

    let mut warnings = Vec::new();

    if let Some(passage) = &batch.passage {
        let len = passage.content.chars().count();
        if !(PASSAGE_LEN.0..=PASSAGE_LEN.1).contains(&len) {
            warnings.push(format!(
                "passage length {len} outside {}..={}",
                PASSAGE_LEN.0, PASSAGE_LEN.1
            ));
        }
    }

    let letter_distribution_ok = check_letter_distribution(batch, &mut warnings);
    check_stimulus_overlap(batch, &mut warnings);

    for (idx, question) in batch.questions.iter().enumerate() {
        let missing: Vec<&str> = question
            .choices
            .iter()
            .filter(|c| c.id != question.correct_answer_id)
            .filter(|c| c.wrong_answer_type.as_deref().map_or(true, str::is_empty))
            .map(|c| c.id.as_str())
            .collect();
        if !missing.is_empty() {
            warnings.push(format!(
                "question {idx} wrong choices missing archetype labels: {}",
                missing.join(", ")
            ));
        }
    }

    Ok(StructuralOutcome {
        letter_distribution_ok,
        warnings,
    })
}

/// No correct letter should carry more than its share of a batch: at most
/// 2 occurrences in a 6-item batch, scaled up for larger ones.
fn check_letter_distribution(batch: &GeneratedBatch, warnings: &mut Vec<String>) -> bool {
    let n = batch.questions.len();
    let max_allowed = 2.max((n + 2) / 3);

    for label in CHOICE_LABELS {
        let count = batch
            .questions
            .iter()
            .filter(|q| q.correct_answer_id == label)
            .count();
        if count > max_allowed {
            warnings.push(format!(
                "correct letter '{label}' appears {count} times in a {n}-item batch"
            ));
            return false;
        }
    }
    true
}

/// Warn when two stimuli share more than 60% of their significant tokens.
fn check_stimulus_overlap(batch: &GeneratedBatch, warnings: &mut Vec<String>) {
    let token_sets: Vec<HashSet<String>> = batch
        .questions
        .iter()
        .map(|q| tokenize(&q.stimulus))
        .collect();

    for i in 0..token_sets.len() {
        for j in (i + 1)..token_sets.len() {
            if token_sets[i].is_empty() || token_sets[j].is_empty() {
                continue;
            }
            let overlap = jaccard_similarity(&token_sets[i], &token_sets[j]);
            if overlap > STIMULUS_OVERLAP_MAX {
                warnings.push(format!(
                    "stimuli {i} and {j} share {:.0}% token overlap",
                    overlap * 100.0
                ));
            }
        }
    }
}

/// Significant tokens of a stimulus: lowercased words longer than 3
/// characters, stripped of surrounding punctuation.
fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.len() > 3)
        .collect()
}

/// Jaccard index over two token sets, with |A ∪ B| computed as
/// |A| + |B| − |A ∩ B|. Two empty sets count as identical.
fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let shared = a.intersection(b).count();
    let total = a.len() + b.len() - shared;
    if total == 0 {
        1.0
    } else {
        shared as f64 / total as f64
    }
}

fn reject(reason: &str) -> GenerationError {
    GenerationError::BatchRejected {
        reason: reason.to_string(),
    }
}

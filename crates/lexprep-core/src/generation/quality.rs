//! Composite quality scoring and final status classification.
//!
//! `score = 0.40·verification + 0.35·adversarial + 0.25·structural`.
//! Classification can only escalate: a rejection from any stage is final.

use super::parser::{Challenge, Confidence, DefenseStrength};
use crate::model::ValidationStatus;

/// Weight of the verification component.
const W_VERIFICATION: f64 = 0.40;
/// Weight of the adversarial component.
const W_ADVERSARIAL: f64 = 0.35;
/// Weight of the structural component.
const W_STRUCTURAL: f64 = 0.25;

/// Below this composite score an item is rejected.
const REJECT_BELOW: f64 = 0.50;
/// At or below this composite score (and at or above the reject line) an
/// item is flagged.
const FLAG_BELOW_OR_EQUAL: f64 = 0.70;

/// Stage-2 verdict for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationVerdict {
    /// Verifier picked the same answer as the generator.
    Agreed(Confidence),
    /// Verifier picked a different answer. The item is rejected.
    Disagreed {
        /// The answer the verifier chose instead.
        verifier_choice: String,
    },
    /// Verification did not run (disabled, or transport failure after retry).
    Unavailable,
}

impl VerificationVerdict {
    /// The validation status this verdict maps to, before quality
    /// classification.
    pub fn status(&self) -> ValidationStatus {
        match self {
            VerificationVerdict::Agreed(Confidence::High) => ValidationStatus::Passed,
            VerificationVerdict::Agreed(_) => ValidationStatus::Flagged,
            VerificationVerdict::Disagreed { .. } => ValidationStatus::Rejected,
            VerificationVerdict::Unavailable => ValidationStatus::Unvalidated,
        }
    }
}

/// Stage-3 outcome for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdversarialOutcome {
    /// All wrong-answer defenses were none or weak.
    Clean,
    /// At least one moderate defense: flag the item.
    MinorConcern {
        /// How many wrong answers drew a moderate defense.
        moderate_count: u32,
    },
    /// At least one strong defense: the item is ambiguous and rejected.
    Ambiguous,
    /// The stage did not run (easy item, disabled, or transport failure).
    Skipped,
}

impl AdversarialOutcome {
    /// Fold a set of challenges into an outcome.
    pub fn from_challenges(challenges: &[Challenge]) -> Self {
        if challenges
            .iter()
            .any(|c| c.defense_strength == DefenseStrength::Strong)
        {
            return AdversarialOutcome::Ambiguous;
        }
        let moderate_count = challenges
            .iter()
            .filter(|c| c.defense_strength == DefenseStrength::Moderate)
            .count() as u32;
        if moderate_count > 0 {
            AdversarialOutcome::MinorConcern { moderate_count }
        } else {
            AdversarialOutcome::Clean
        }
    }
}

/// Structural facts about one item, as established by stage-1 validation.
#[derive(Debug, Clone, Copy)]
pub struct StructuralFlags {
    pub stimulus_ok: bool,
    pub choices_ok: bool,
    pub explanations_ok: bool,
    pub letter_distribution_ok: bool,
}

impl StructuralFlags {
    /// Flags for an item that survived hard validation; only the
    /// batch-level letter distribution can still be off.
    pub fn surviving(letter_distribution_ok: bool) -> Self {
        Self {
            stimulus_ok: true,
            choices_ok: true,
            explanations_ok: true,
            letter_distribution_ok,
        }
    }
}

/// Verification component: high 1.0, medium 0.7, low 0.4, absent 0.4.
fn verification_score(verdict: &VerificationVerdict) -> f64 {
    match verdict {
        VerificationVerdict::Agreed(Confidence::High) => 1.0,
        VerificationVerdict::Agreed(Confidence::Medium) => 0.7,
        VerificationVerdict::Agreed(Confidence::Low) => 0.4,
        VerificationVerdict::Disagreed { .. } => 0.0,
        VerificationVerdict::Unavailable => 0.4,
    }
}

/// Adversarial component: clean 1.0, one moderate 0.6, two or more 0.3,
/// any strong 0.0, absent 1.0.
fn adversarial_score(outcome: AdversarialOutcome) -> f64 {
    match outcome {
        AdversarialOutcome::Clean | AdversarialOutcome::Skipped => 1.0,
        AdversarialOutcome::MinorConcern { moderate_count: 1 } => 0.6,
        AdversarialOutcome::MinorConcern { .. } => 0.3,
        AdversarialOutcome::Ambiguous => 0.0,
    }
}

/// Structural component: four independent checks each worth 0.25.
fn structural_score(flags: StructuralFlags) -> f64 {
    [
        flags.stimulus_ok,
        flags.choices_ok,
        flags.explanations_ok,
        flags.letter_distribution_ok,
    ]
    .iter()
    .map(|ok| if *ok { 0.25 } else { 0.0 })
    .sum()
}

/// Composite quality score on [0, 1].
pub fn composite_score(
    verdict: &VerificationVerdict,
    adversarial: AdversarialOutcome,
    flags: StructuralFlags,
) -> f64 {
    W_VERIFICATION * verification_score(verdict)
        + W_ADVERSARIAL * adversarial_score(adversarial)
        + W_STRUCTURAL * structural_score(flags)
}

/// Status implied by the composite score alone.
fn classify(score: f64) -> ValidationStatus {
    if score < REJECT_BELOW {
        ValidationStatus::Rejected
    } else if score <= FLAG_BELOW_OR_EQUAL {
        ValidationStatus::Flagged
    } else {
        ValidationStatus::Passed
    }
}

/// Severity rank used for escalate-only folding.
fn severity(status: ValidationStatus) -> u8 {
    match status {
        ValidationStatus::Passed => 0,
        ValidationStatus::Unvalidated => 1,
        ValidationStatus::Flagged => 2,
        ValidationStatus::Rejected => 3,
    }
}

/// Final status for an item: the stage-derived status, escalated (never
/// relaxed) by the quality classification.
///
/// An `Unvalidated` item stays unvalidated unless the classifier demands a
/// flag or rejection; the classifier can never upgrade it to passed.
pub fn final_status(stage_status: ValidationStatus, score: f64) -> ValidationStatus {
    let classified = classify(score);
    if stage_status == ValidationStatus::Unvalidated
        && classified == ValidationStatus::Passed
    {
        return ValidationStatus::Unvalidated;
    }
    if severity(classified) > severity(stage_status) {
        classified
    } else {
        stage_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_flags() -> StructuralFlags {
        StructuralFlags::surviving(true)
    }

    #[test]
    fn perfect_item_scores_one() {
        let score = composite_score(
            &VerificationVerdict::Agreed(Confidence::High),
            AdversarialOutcome::Clean,
            clean_flags(),
        );
        assert!((score - 1.0).abs() < 1e-9);
        assert_eq!(final_status(ValidationStatus::Passed, score), ValidationStatus::Passed);
    }

    #[test]
    fn score_is_always_in_unit_interval() {
        let verdicts = [
            VerificationVerdict::Agreed(Confidence::High),
            VerificationVerdict::Agreed(Confidence::Medium),
            VerificationVerdict::Agreed(Confidence::Low),
            VerificationVerdict::Disagreed { verifier_choice: "C".to_string() },
            VerificationVerdict::Unavailable,
        ];
        let outcomes = [
            AdversarialOutcome::Clean,
            AdversarialOutcome::MinorConcern { moderate_count: 1 },
            AdversarialOutcome::MinorConcern { moderate_count: 3 },
            AdversarialOutcome::Ambiguous,
            AdversarialOutcome::Skipped,
        ];
        for verdict in &verdicts {
            for outcome in outcomes {
                for letters_ok in [true, false] {
                    let score = composite_score(
                        verdict,
                        outcome,
                        StructuralFlags::surviving(letters_ok),
                    );
                    assert!((0.0..=1.0).contains(&score), "score {score} out of bounds");
                }
            }
        }
    }

    #[test]
    fn medium_confidence_clean_item_flags_by_stage_not_score() {
        // 0.4*0.7 + 0.35*1.0 + 0.25*1.0 = 0.88: the score alone would pass,
        // but the stage verdict already flagged it.
        let verdict = VerificationVerdict::Agreed(Confidence::Medium);
        let score = composite_score(&verdict, AdversarialOutcome::Clean, clean_flags());
        assert!(score > FLAG_BELOW_OR_EQUAL);
        assert_eq!(final_status(verdict.status(), score), ValidationStatus::Flagged);
    }

    #[test]
    fn one_moderate_defense_flags() {
        let verdict = VerificationVerdict::Agreed(Confidence::High);
        let outcome = AdversarialOutcome::MinorConcern { moderate_count: 1 };
        // 0.4 + 0.35*0.6 + 0.25 = 0.86 -> passes on score, stage says flag.
        let score = composite_score(&verdict, outcome, clean_flags());
        let stage = ValidationStatus::Flagged;
        assert_eq!(final_status(stage, score), ValidationStatus::Flagged);
    }

    #[test]
    fn strong_defense_rejects_regardless_of_score() {
        let verdict = VerificationVerdict::Agreed(Confidence::High);
        let score = composite_score(&verdict, AdversarialOutcome::Ambiguous, clean_flags());
        // 0.4 + 0.0 + 0.25 = 0.65 -> flag range, but the stage already rejected.
        assert_eq!(
            final_status(ValidationStatus::Rejected, score),
            ValidationStatus::Rejected
        );
    }

    #[test]
    fn low_score_escalates_passed_to_rejected() {
        // Unavailable verification + two moderates + bad letters:
        // 0.4*0.4 + 0.35*0.3 + 0.25*0.75 = 0.4525 -> reject.
        let verdict = VerificationVerdict::Unavailable;
        let outcome = AdversarialOutcome::MinorConcern { moderate_count: 2 };
        let score = composite_score(&verdict, outcome, StructuralFlags::surviving(false));
        assert!(score < REJECT_BELOW);
        assert_eq!(
            final_status(ValidationStatus::Flagged, score),
            ValidationStatus::Rejected
        );
    }

    #[test]
    fn unvalidated_never_upgrades_to_passed() {
        // Skipped stages give 0.4*0.4 + 0.35 + 0.25 = 0.76 -> pass range,
        // but an unvalidated item must stay unvalidated.
        let score = composite_score(
            &VerificationVerdict::Unavailable,
            AdversarialOutcome::Skipped,
            clean_flags(),
        );
        assert!(score > FLAG_BELOW_OR_EQUAL);
        assert_eq!(
            final_status(ValidationStatus::Unvalidated, score),
            ValidationStatus::Unvalidated
        );
    }

    #[test]
    fn midband_score_flags() {
        // 0.4*1.0 + 0.35*0.3 + 0.25*0.75 = 0.6925 -> flag band.
        let verdict = VerificationVerdict::Agreed(Confidence::High);
        let outcome = AdversarialOutcome::MinorConcern { moderate_count: 2 };
        let score = composite_score(&verdict, outcome, StructuralFlags::surviving(false));
        assert!((REJECT_BELOW..=FLAG_BELOW_OR_EQUAL).contains(&score));
        assert_eq!(
            final_status(ValidationStatus::Passed, score),
            ValidationStatus::Flagged
        );
    }

    #[test]
    fn adversarial_outcome_folding() {
        use crate::generation::parser::DefenseStrength as D;
        let mk = |strengths: &[D]| {
            strengths
                .iter()
                .enumerate()
                .map(|(i, s)| Challenge {
                    choice_id: format!("{}", (b'B' + i as u8) as char),
                    defense_strength: *s,
                    defense_argument: String::new(),
                    correct_answer_weakness: None,
                    recommendation: String::new(),
                })
                .collect::<Vec<_>>()
        };

        assert_eq!(
            AdversarialOutcome::from_challenges(&mk(&[D::None, D::Weak, D::None, D::Weak])),
            AdversarialOutcome::Clean
        );
        assert_eq!(
            AdversarialOutcome::from_challenges(&mk(&[D::None, D::Moderate, D::None, D::Weak])),
            AdversarialOutcome::MinorConcern { moderate_count: 1 }
        );
        assert_eq!(
            AdversarialOutcome::from_challenges(&mk(&[D::Moderate, D::Moderate, D::Strong, D::Weak])),
            AdversarialOutcome::Ambiguous
        );
    }
}

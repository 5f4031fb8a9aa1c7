//! Logical-reasoning subtype guides.

use super::SubtypeGuide;
use crate::model::LrSubtype;

pub(super) fn guide(subtype: LrSubtype) -> SubtypeGuide {
    match subtype {
        LrSubtype::MustBeTrue => SubtypeGuide {
            stems: &[
                "If the statements above are true, which one of the following must also be true?",
                "Which one of the following can be properly inferred from the statements above?",
                "If the information above is accurate, which one of the following CANNOT be false?",
            ],
            correct_answer_rules:
                "The correct answer is logically entailed by the stimulus: combining two or more \
                 stated claims forces it. It must not require any outside assumption, and it is \
                 usually weaker in scope than test-takers expect. Conditional chains and \
                 quantifier overlaps are the standard machinery.",
            wrong_answer_archetypes:
                "too_strong: overstates a supported claim into certainty or universality. \
                 out_of_scope: introduces an entity or property the stimulus never constrains. \
                 reversal: affirms the consequent of a stated conditional. \
                 could_be_true: consistent with the stimulus but not forced by it.",
        },
        LrSubtype::MostStronglySupported => SubtypeGuide {
            stems: &[
                "The statements above, if true, most strongly support which one of the following?",
                "Which one of the following is most strongly supported by the information above?",
            ],
            correct_answer_rules:
                "The correct answer is the claim the stimulus makes highly likely, though short of \
                 strict entailment. It stays close to the stated facts and hedges its scope with \
                 words like 'some', 'can', or 'at least one'. A small inferential step is allowed; \
                 a new causal theory is not.",
            wrong_answer_archetypes:
                "too_strong: converts probabilistic support into necessity. \
                 out_of_scope: speculates about cases the stimulus never touches. \
                 opposite: supported-sounding claim that actually contradicts a stated fact. \
                 wrong_comparison: ranks two things the stimulus never compares.",
        },
        LrSubtype::MainPoint => SubtypeGuide {
            stems: &[
                "Which one of the following most accurately expresses the main conclusion of the argument?",
                "The main point of the argument is that which one of the following?",
            ],
            correct_answer_rules:
                "The correct answer restates the argument's main conclusion, the claim every other \
                 statement exists to support, in different words. It matches the conclusion's \
                 strength and scope exactly. The conclusion is frequently not the final sentence \
                 and is often marked by a pivot like 'however' or 'but'.",
            wrong_answer_archetypes:
                "premise_restatement: accurately restates a premise instead of the conclusion. \
                 intermediate_conclusion: picks a subsidiary conclusion that itself supports the \
                 main one. too_strong: inflates the conclusion's hedged language. \
                 out_of_scope: a related claim the author never commits to.",
        },
        LrSubtype::NecessaryAssumption => SubtypeGuide {
            stems: &[
                "The argument depends on assuming which one of the following?",
                "Which one of the following is an assumption required by the argument?",
                "The conclusion above follows logically only if which one of the following is assumed?",
            ],
            correct_answer_rules:
                "The correct answer is a claim the argument cannot survive without: negate it and \
                 the conclusion collapses. Necessary assumptions are modest, often merely ruling \
                 out an alternative explanation or bridging a term shift between premises and \
                 conclusion. Apply the negation test when drafting.",
            wrong_answer_archetypes:
                "too_strong: sufficient-but-not-necessary claim whose negation leaves the argument \
                 standing. premise_booster: strengthens a premise the argument already asserts. \
                 out_of_scope: new consideration irrelevant to the premise-conclusion gap. \
                 opposite: an assumption that would undermine the conclusion.",
        },
        LrSubtype::SufficientAssumption => SubtypeGuide {
            stems: &[
                "Which one of the following, if assumed, enables the conclusion to be properly drawn?",
                "The conclusion follows logically if which one of the following is assumed?",
            ],
            correct_answer_rules:
                "The correct answer, added to the premises, makes the conclusion deductively valid. \
                 It is typically a broad conditional linking the premises' terms to the \
                 conclusion's terms, and it may be far stronger than anything the author actually \
                 believes. Strength is a virtue here, not a flaw.",
            wrong_answer_archetypes:
                "too_weak: necessary-style claim that narrows the gap without closing it. \
                 reversal: conditional pointing the wrong direction across the gap. \
                 shell_game: links the right concepts but swaps in a subtly different predicate. \
                 premise_booster: restates support the argument already has.",
        },
        LrSubtype::Strengthen => SubtypeGuide {
            stems: &[
                "Which one of the following, if true, most strengthens the argument?",
                "Which one of the following, if true, adds the most support for the conclusion above?",
            ],
            correct_answer_rules:
                "The correct answer makes the conclusion more likely, usually by ruling out an \
                 alternative cause, confirming a representative sample, or supplying the bridge \
                 between evidence and conclusion. It need not prove the conclusion; any genuine \
                 probability boost wins.",
            wrong_answer_archetypes:
                "opposite: quietly weakens the argument. irrelevant: true-sounding fact with no \
                 bearing on the conclusion's likelihood. premise_booster: re-asserts a premise \
                 without touching the gap. wrong_conclusion: strengthens a nearby claim the \
                 argument never draws.",
        },
        LrSubtype::Weaken => SubtypeGuide {
            stems: &[
                "Which one of the following, if true, most weakens the argument?",
                "Which one of the following, if true, most seriously undermines the argument?",
                "Which one of the following, if true, most calls into question the conclusion above?",
            ],
            correct_answer_rules:
                "The correct answer makes the conclusion less likely, typically by offering an \
                 alternative explanation for the evidence, exposing a sampling problem, or showing \
                 the predicted mechanism fails. It attacks the inference, never the truth of a \
                 premise.",
            wrong_answer_archetypes:
                "opposite: quietly strengthens the argument. irrelevant: changes the subject to an \
                 unmeasured quantity. premise_attack: denies a stated premise rather than the \
                 reasoning. too_weak: a marginal quibble that leaves the core inference intact.",
        },
        LrSubtype::Flaw => SubtypeGuide {
            stems: &[
                "The reasoning in the argument is most vulnerable to criticism on the grounds that the argument",
                "Which one of the following most accurately describes a flaw in the argument's reasoning?",
            ],
            correct_answer_rules:
                "The correct answer names, in abstract terms, the specific logical error the \
                 argument commits: confusing necessity with sufficiency, mistaking correlation for \
                 causation, attacking the source, equivocating on a term, or over-generalizing \
                 from an unrepresentative sample. The description must match what actually happens \
                 in the stimulus, not merely name a famous fallacy.",
            wrong_answer_archetypes:
                "wrong_flaw: a real fallacy the argument does not commit. \
                 not_a_flaw: describes something the argument does that is logically harmless. \
                 too_strong: accuses the argument of a more extreme error than it makes. \
                 premise_description: describes the evidence rather than the reasoning error.",
        },
        LrSubtype::Method => SubtypeGuide {
            stems: &[
                "The argument proceeds by which one of the following methods?",
                "Which one of the following most accurately describes the technique of reasoning used in the argument?",
            ],
            correct_answer_rules:
                "The correct answer describes the argumentative move in abstract terms: appealing \
                 to an analogy, deriving a general principle from cases, ruling out alternatives, \
                 or showing a position leads to absurd consequences. Every component of the \
                 description must be present in the stimulus.",
            wrong_answer_archetypes:
                "partial_match: describes one premise's role but mislabels the overall structure. \
                 wrong_method: a common technique the argument never uses. \
                 too_strong: claims the argument proves what it merely supports. \
                 out_of_scope: imports content claims absent from the stimulus.",
        },
        LrSubtype::ParallelReasoning => SubtypeGuide {
            stems: &[
                "Which one of the following arguments is most similar in its pattern of reasoning to the argument above?",
                "The pattern of reasoning in which one of the following is most parallel to that in the argument above?",
            ],
            correct_answer_rules:
                "The correct answer reproduces the stimulus's logical skeleton: same conditional \
                 structure, same quantifiers, same validity status, same conclusion strength, in a \
                 different subject matter. Match structure, never topic.",
            wrong_answer_archetypes:
                "topic_trap: same subject matter, different logic. \
                 strength_mismatch: conclusion certainty differs from the original. \
                 structure_drift: one premise's conditional direction is flipped. \
                 validity_mismatch: valid where the original is invalid or vice versa.",
        },
        LrSubtype::ParallelFlaw => SubtypeGuide {
            stems: &[
                "Which one of the following arguments exhibits flawed reasoning most similar to that in the argument above?",
                "The flawed pattern of reasoning in the argument above is most closely paralleled in which one of the following?",
            ],
            correct_answer_rules:
                "The correct answer commits exactly the same logical error as the stimulus, in new \
                 subject matter. First identify the flaw precisely, then reproduce it. An answer \
                 that is flawed differently, or not flawed at all, is wrong no matter how similar \
                 it sounds.",
            wrong_answer_archetypes:
                "different_flaw: flawed, but by another error. valid_argument: sound reasoning \
                 dressed in the stimulus's clothing. topic_trap: same subject matter without the \
                 matching error. strength_mismatch: reproduces the flaw but changes the \
                 conclusion's force.",
        },
        LrSubtype::Principle => SubtypeGuide {
            stems: &[
                "Which one of the following principles, if valid, most helps to justify the reasoning above?",
                "The reasoning above most closely conforms to which one of the following principles?",
            ],
            correct_answer_rules:
                "The correct answer states a general rule whose antecedent is satisfied by the \
                 case described and whose consequent delivers the conclusion drawn. Check both \
                 halves: a principle with an inapplicable trigger or an off-target verdict \
                 justifies nothing.",
            wrong_answer_archetypes:
                "wrong_trigger: antecedent the facts of the case never satisfy. \
                 wrong_verdict: applies but yields a different conclusion. \
                 too_narrow: covers only part of the case. \
                 opposite: a principle that would condemn the action the argument endorses.",
        },
        LrSubtype::ResolveParadox => SubtypeGuide {
            stems: &[
                "Which one of the following, if true, most helps to resolve the apparent discrepancy described above?",
                "Which one of the following, if true, most helps to explain the surprising finding described above?",
            ],
            correct_answer_rules:
                "The correct answer supplies a fact under which both sides of the discrepancy are \
                 true at once, usually a hidden difference between the groups, times, or measures \
                 being compared. It must embrace both facts, not deny either one.",
            wrong_answer_archetypes:
                "deepens_paradox: makes the surprising finding more surprising. \
                 one_sided: explains one fact while ignoring the other. \
                 irrelevant: background detail that leaves the tension untouched. \
                 restates_paradox: rephrases the discrepancy without explaining it.",
        },
        LrSubtype::PointAtIssue => SubtypeGuide {
            stems: &[
                "The dialogue provides the most support for the claim that the two speakers disagree over whether",
                "On the basis of their statements, the two speakers are committed to disagreeing about which one of the following?",
            ],
            correct_answer_rules:
                "The correct answer is a claim one speaker is committed to affirming and the other \
                 to denying, on the basis of what each actually said. Run both speakers through \
                 the answer: one must say yes, the other no. Commitments may be implicit but must \
                 be real.",
            wrong_answer_archetypes:
                "one_speaker_silent: a claim only one speaker addresses. \
                 both_agree: a point of common ground dressed as dispute. \
                 out_of_scope: an issue neither speaker raises. \
                 too_strong: exaggerates a speaker's hedged position into a commitment.",
        },
    }
}

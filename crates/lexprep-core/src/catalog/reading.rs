//! Reading-comprehension subtype guides.

use super::SubtypeGuide;
use crate::model::RcSubtype;

pub(super) fn guide(subtype: RcSubtype) -> SubtypeGuide {
    match subtype {
        RcSubtype::MainIdea => SubtypeGuide {
            stems: &[
                "Which one of the following most accurately expresses the main point of the passage?",
                "Which one of the following most accurately summarizes the central idea of the passage?",
            ],
            correct_answer_rules:
                "The correct answer captures the thesis the whole passage is organized to \
                 establish, including the author's stance where one is taken. It is broad enough \
                 to cover every paragraph and narrow enough to exclude claims the passage never \
                 makes.",
            wrong_answer_archetypes:
                "too_narrow: promotes one paragraph's point to the whole passage. \
                 too_broad: a topic-level claim the passage does not fully defend. \
                 opposite: reverses the author's verdict on the debate. \
                 detail_trap: a true detail presented as the main point.",
        },
        RcSubtype::PrimaryPurpose => SubtypeGuide {
            stems: &[
                "The primary purpose of the passage is to",
                "Which one of the following most accurately describes the author's primary purpose in the passage?",
            ],
            correct_answer_rules:
                "The correct answer names what the author is doing, led by an accurate verb: \
                 defend a reinterpretation, evaluate competing explanations, trace a development, \
                 challenge a consensus. The verb must match the author's actual engagement, not \
                 merely the topic.",
            wrong_answer_archetypes:
                "wrong_verb: right topic, wrong activity (describes where the author argues). \
                 too_narrow: the purpose of a single paragraph. \
                 too_strong: 'refute' or 'prove' where the author merely questions. \
                 out_of_scope: a purpose served by no part of the passage.",
        },
        RcSubtype::AuthorAttitude => SubtypeGuide {
            stems: &[
                "The author's attitude toward the theory discussed in the passage can most accurately be described as",
                "Which one of the following most accurately characterizes the author's stance toward the development described in the passage?",
            ],
            correct_answer_rules:
                "The correct answer matches both the direction and the temperature of the author's \
                 evaluative language. Authors are usually measured: qualified approval, cautious \
                 skepticism, scholarly reservation. Extreme or purely neutral descriptions are \
                 rarely right when evaluative wording is present.",
            wrong_answer_archetypes:
                "too_extreme: inflates measured language into enthusiasm or contempt. \
                 opposite: reads criticism as endorsement or vice versa. \
                 false_neutrality: 'detached indifference' despite clear evaluative cues. \
                 misattributed: the attitude of a critic the author quotes, not the author's own.",
        },
        RcSubtype::SpecificDetail => SubtypeGuide {
            stems: &[
                "According to the passage, which one of the following is true?",
                "The passage states which one of the following?",
            ],
            correct_answer_rules:
                "The correct answer restates something the passage explicitly says, usually \
                 paraphrased. There is a line you could point to. No inference beyond synonym \
                 substitution is needed.",
            wrong_answer_archetypes:
                "distortion: a stated detail with its scope or agent quietly altered. \
                 wrong_location: combines words from two unrelated sentences. \
                 out_of_scope: plausible-sounding fact never stated. \
                 opposite: negates the stated detail.",
        },
        RcSubtype::Inference => SubtypeGuide {
            stems: &[
                "It can be inferred from the passage that the author would most likely agree with which one of the following?",
                "The passage most strongly supports which one of the following statements?",
            ],
            correct_answer_rules:
                "The correct answer follows from combining passage statements, without outside \
                 knowledge. It is modest in scope, and frequently rests on the author's hedged \
                 evaluations. If defending it requires any sentence the passage does not contain, \
                 it is wrong.",
            wrong_answer_archetypes:
                "too_strong: a universal claim from qualified evidence. \
                 out_of_scope: relies on plausible outside knowledge. \
                 opposite: contradicts the author's expressed leaning. \
                 speaker_swap: attributes a quoted critic's view to the author.",
        },
        RcSubtype::Function => SubtypeGuide {
            stems: &[
                "The author mentions the example in the second paragraph primarily in order to",
                "Which one of the following most accurately describes the function of the reference in the passage?",
            ],
            correct_answer_rules:
                "The correct answer explains why the author included the referenced element: what \
                 claim it supports, qualifies, or illustrates. Locate the element, read its \
                 surroundings, and name its argumentative job, not its content.",
            wrong_answer_archetypes:
                "content_restatement: says what the element says instead of what it does. \
                 wrong_target: attaches the element to a claim it does not serve. \
                 wrong_direction: reads supporting material as a counterexample. \
                 global_trap: assigns the element the whole passage's purpose.",
        },
        RcSubtype::Organization => SubtypeGuide {
            stems: &[
                "Which one of the following most accurately describes the organization of the passage?",
                "The passage proceeds in which one of the following ways?",
            ],
            correct_answer_rules:
                "The correct answer maps the passage's structure move by move: a phenomenon is \
                 described, an explanation offered, an objection raised, a modification defended. \
                 Every clause in the description must correspond to a real segment, in order.",
            wrong_answer_archetypes:
                "sequence_error: right moves, wrong order. \
                 phantom_move: includes a rebuttal or proposal the passage lacks. \
                 missing_move: skips a segment a fuller description covers. \
                 strength_mismatch: 'refutes' where the passage merely questions.",
        },
        RcSubtype::Application => SubtypeGuide {
            stems: &[
                "Which one of the following is most analogous to the approach described in the passage?",
                "Given the passage's description, which one of the following would be the best example of the practice discussed?",
            ],
            correct_answer_rules:
                "The correct answer presents a new scenario with the same structure as the \
                 passage's account: same relationship between the parties, same kind of mechanism, \
                 same outcome logic. Abstract the pattern first, then match it; surface \
                 resemblance counts for nothing.",
            wrong_answer_archetypes:
                "surface_match: same domain, different underlying relation. \
                 partial_pattern: matches the setup but not the resolution. \
                 inverted_relation: swaps the direction of influence. \
                 overreach: adds a feature the passage's pattern excludes.",
        },
        RcSubtype::ComparativeRelationship => SubtypeGuide {
            stems: &[
                "Which one of the following most accurately describes the relationship between passage A and passage B?",
                "The author of passage B would be most likely to regard the argument in passage A as",
            ],
            correct_answer_rules:
                "The correct answer characterizes how the two passages interact: one supplies a \
                 framework the other applies, attacks, or narrows. Ground the characterization in \
                 claims both passages actually make; the right answer survives a check against \
                 each passage separately.",
            wrong_answer_archetypes:
                "false_conflict: manufactures disagreement between compatible passages. \
                 false_harmony: papers over an explicit dispute. \
                 scope_swap: attributes the general framework to the narrower passage. \
                 one_passage_only: a relation supported by one passage alone.",
        },
        RcSubtype::MeaningInContext => SubtypeGuide {
            stems: &[
                "Which one of the following most accurately expresses the meaning of the word as it is used in the passage?",
                "In context, the phrase in the passage most nearly means which one of the following?",
            ],
            correct_answer_rules:
                "The correct answer gives the sense the surrounding sentences force, which is \
                 often not the word's most common meaning. Substitute each candidate back into \
                 the sentence; the correct one preserves the author's point exactly.",
            wrong_answer_archetypes:
                "dictionary_trap: the most familiar sense, wrong in this context. \
                 connotation_drift: right register, wrong evaluative charge. \
                 too_literal: concrete reading of a figurative use. \
                 context_clash: a sense that breaks the paragraph's logic on substitution.",
        },
    }
}

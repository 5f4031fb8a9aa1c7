//! Prompt construction for the three pipeline stages.
//!
//! The system prompt carries structural constraints; the user prompt
//! injects the subtype guide (stems, correct-answer rules, wrong-answer
//! archetypes) and the exact JSON shape each stage must return.

use super::parser::GeneratedQuestion;
use crate::catalog::SubtypeGuide;
use crate::model::{Difficulty, GenerationRequest, Section, SubjectArea};

/// Stage-1 system prompt: format and register constraints.
pub fn generation_system(section: Section) -> String {
    let section_rules = match section {
        Section::LogicalReasoning => {
            "Each question has a stimulus of 4-7 sentences presenting an argument or set of \
             facts, followed by a question stem. Stimuli must span diverse, concrete topics \
             (science, policy, business, arts, everyday reasoning) and must not reuse scenarios \
             within a batch."
        }
        Section::ReadingComprehension => {
            "Write one passage of 450-500 words in the register of an academic journal, then \
             questions that all refer to that passage. Each question's stimulus field must be \
             empty. For comparative requests, produce two passages (content and passage_b) that \
             take related but distinct positions."
        }
    };

    format!(
        "You are an expert LSAT question writer producing original practice material.\n\
         {section_rules}\n\
         Every question has exactly five answer choices labeled A through E, in order. \
         Exactly one choice is correct. Each choice text is a complete statement of 20 to 400 \
         characters, and every choice carries an explanation of why it is right or wrong. \
         Wrong choices should each embody a distinct wrong-answer archetype and carry its \
         label. Use formal, precise language at the register of real LSAT questions. \
         Calibrate difficulty honestly: easy questions turn on one clear step, hard questions \
         demand tracking several interacting claims. \
         Return only JSON, with no commentary."
    )
}

/// Stage-1 user prompt: the concrete order, with the subtype guide inlined.
pub fn generation_user(request: &GenerationRequest, guide: &SubtypeGuide) -> String {
    let subtype_name = request
        .subtype
        .map(|s| s.as_str().replace('_', " "))
        .unwrap_or_else(|| "mixed-subtype".to_string());
    let difficulty = difficulty_guidance(request.difficulty);
    let stems = guide
        .stems
        .iter()
        .map(|s| format!("  - \"{s}\""))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "Generate {count} {band} {subtype_name} questions.\n\
         {difficulty}\n\n\
         Canonical stems for this question type:\n{stems}\n\n\
         Correct answer rules: {rules}\n\n\
         Wrong answer archetypes to draw distractors from: {archetypes}\n",
        count = request.count,
        band = request.difficulty.as_str(),
        rules = guide.correct_answer_rules,
        archetypes = guide.wrong_answer_archetypes,
    );

    match request.section {
        Section::LogicalReasoning => {
            prompt.push_str(
                "\nRespond with JSON of the form:\n\
                 {\"questions\": [{\"stimulus\", \"question_stem\", \
                 \"choices\": [{\"id\", \"text\", \"explanation\", \"wrong_answer_type\"} x5], \
                 \"correct_answer_id\", \"explanation\"}]}",
            );
        }
        Section::ReadingComprehension => {
            let subject = request
                .subject_area
                .unwrap_or(SubjectArea::Law)
                .as_str()
                .replace('_', " ");
            prompt.push_str(&format!(
                "\nThe passage's subject area is {subject}."
            ));
            if request.is_comparative {
                prompt.push_str(" Produce a comparative passage pair.");
            }
            prompt.push_str(
                "\nRespond with JSON of the form:\n\
                 {\"passage\": {\"title\", \"subject_area\", \"content\", \"is_comparative\", \
                 \"passage_b\"}, \"questions\": [{\"stimulus\" (empty), \"question_stem\", \
                 \"choices\": [{\"id\", \"text\", \"explanation\", \"wrong_answer_type\"} x5], \
                 \"correct_answer_id\", \"explanation\"}]}",
            );
        }
    }

    prompt
}

/// Stage-2 system prompt: independent solve, key withheld.
pub fn verification_system() -> String {
    "You are an expert LSAT solver. Solve the question using only the material provided. \
     Work from the text alone, choose exactly one answer, and report your confidence \
     honestly. Note anything that makes the question ambiguous or defective. \
     Return only JSON."
        .to_string()
}

/// Stage-2 user prompt for one question. The answer key is withheld.
pub fn verification_user(question: &GeneratedQuestion, passage: Option<&str>) -> String {
    let mut prompt = String::new();
    if let Some(passage) = passage {
        prompt.push_str(&format!("Passage:\n{passage}\n\n"));
    }
    if !question.stimulus.is_empty() {
        prompt.push_str(&format!("Stimulus:\n{}\n\n", question.stimulus));
    }
    prompt.push_str(&format!("Question: {}\n\n", question.question_stem));
    for choice in &question.choices {
        prompt.push_str(&format!("{}. {}\n", choice.id, choice.text));
    }
    prompt.push_str(
        "\nSelect the correct answer choice. Respond with JSON of the form:\n\
         {\"selected_answer\": \"A\"-\"E\", \"confidence\": \"high\"|\"medium\"|\"low\", \
         \"reasoning\", \"potential_issues\": []}",
    );
    prompt
}

/// Stage-3 system prompt: adversarial defense of the wrong answers.
pub fn adversarial_system() -> String {
    "You are a skeptical LSAT editor stress-testing a draft question. For each wrong \
     answer, make the strongest possible case that it could be credited, then judge how \
     strong that case really is. A defensible wrong answer makes the question ambiguous. \
     Return only JSON."
        .to_string()
}

/// Stage-3 user prompt for one question, with the key revealed.
pub fn adversarial_user(question: &GeneratedQuestion, passage: Option<&str>) -> String {
    let mut prompt = String::new();
    if let Some(passage) = passage {
        prompt.push_str(&format!("Passage:\n{passage}\n\n"));
    }
    if !question.stimulus.is_empty() {
        prompt.push_str(&format!("Stimulus:\n{}\n\n", question.stimulus));
    }
    prompt.push_str(&format!("Question: {}\n\n", question.question_stem));
    for choice in &question.choices {
        prompt.push_str(&format!("{}. {}\n", choice.id, choice.text));
    }
    let wrong: Vec<&str> = question
        .choices
        .iter()
        .filter(|c| c.id != question.correct_answer_id)
        .map(|c| c.id.as_str())
        .collect();
    prompt.push_str(&format!(
        "\nThe intended correct answer is {correct}. For each of the wrong answers \
         ({wrong}), argue the strongest possible case that it deserves credit.\n\
         Respond with JSON of the form:\n\
         {{\"challenges\": [{{\"choice_id\", \"defense_strength\": \
         \"none\"|\"weak\"|\"moderate\"|\"strong\", \"defense_argument\", \
         \"correct_answer_weakness\", \"recommendation\"}} x4], \
         \"overall_quality\", \"overall_recommendation\"}}",
        correct = question.correct_answer_id,
        wrong = wrong.join(", "),
    ));
    prompt
}

fn difficulty_guidance(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "Difficulty: easy. One clear inferential step; distractors are plainly wrong on \
             a careful first read."
        }
        Difficulty::Medium => {
            "Difficulty: medium. Two or three interacting claims; at least one distractor \
             requires a second look to eliminate."
        }
        Difficulty::Hard => {
            "Difficulty: hard. Dense stimuli with subtle scope shifts; the best distractor \
             should tempt a strong test-taker."
        }
    }
}

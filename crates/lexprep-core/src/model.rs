//! Domain model: sections, subtypes, difficulty bands, entities, and the
//! wire DTOs exchanged at the core boundary.
//!
//! Enums are stored as their snake_case string form in SQLite and on the
//! wire; `as_str`/`parse` pairs are the single source of truth for that
//! representation.

use serde::{Deserialize, Serialize};

/// Choice labels, in order. Every item has exactly these five.
pub const CHOICE_LABELS: [&str; 5] = ["A", "B", "C", "D", "E"];

/// Minimum quality score for an item to be servable (null passes too).
pub const SERVABLE_MIN_QUALITY: f64 = 0.50;

/// The two LSAT sections covered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Section A: logical reasoning (arguments).
    LogicalReasoning,
    /// Section B: reading comprehension (passages).
    ReadingComprehension,
}

impl Section {
    /// The stable string form used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::LogicalReasoning => "logical_reasoning",
            Section::ReadingComprehension => "reading_comprehension",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "logical_reasoning" => Some(Section::LogicalReasoning),
            "reading_comprehension" => Some(Section::ReadingComprehension),
            _ => None,
        }
    }
}

/// The 14 logical-reasoning subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LrSubtype {
    MustBeTrue,
    MostStronglySupported,
    MainPoint,
    NecessaryAssumption,
    SufficientAssumption,
    Strengthen,
    Weaken,
    Flaw,
    Method,
    ParallelReasoning,
    ParallelFlaw,
    Principle,
    ResolveParadox,
    PointAtIssue,
}

impl LrSubtype {
    /// All logical-reasoning subtypes.
    pub const ALL: [LrSubtype; 14] = [
        LrSubtype::MustBeTrue,
        LrSubtype::MostStronglySupported,
        LrSubtype::MainPoint,
        LrSubtype::NecessaryAssumption,
        LrSubtype::SufficientAssumption,
        LrSubtype::Strengthen,
        LrSubtype::Weaken,
        LrSubtype::Flaw,
        LrSubtype::Method,
        LrSubtype::ParallelReasoning,
        LrSubtype::ParallelFlaw,
        LrSubtype::Principle,
        LrSubtype::ResolveParadox,
        LrSubtype::PointAtIssue,
    ];

    /// The stable string form.
    pub fn as_str(self) -> &'static str {
        match self {
            LrSubtype::MustBeTrue => "must_be_true",
            LrSubtype::MostStronglySupported => "most_strongly_supported",
            LrSubtype::MainPoint => "main_point",
            LrSubtype::NecessaryAssumption => "necessary_assumption",
            LrSubtype::SufficientAssumption => "sufficient_assumption",
            LrSubtype::Strengthen => "strengthen",
            LrSubtype::Weaken => "weaken",
            LrSubtype::Flaw => "flaw",
            LrSubtype::Method => "method",
            LrSubtype::ParallelReasoning => "parallel_reasoning",
            LrSubtype::ParallelFlaw => "parallel_flaw",
            LrSubtype::Principle => "principle",
            LrSubtype::ResolveParadox => "resolve_paradox",
            LrSubtype::PointAtIssue => "point_at_issue",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// The 10 reading-comprehension subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RcSubtype {
    MainIdea,
    PrimaryPurpose,
    AuthorAttitude,
    SpecificDetail,
    Inference,
    Function,
    Organization,
    Application,
    ComparativeRelationship,
    MeaningInContext,
}

impl RcSubtype {
    /// All reading-comprehension subtypes.
    pub const ALL: [RcSubtype; 10] = [
        RcSubtype::MainIdea,
        RcSubtype::PrimaryPurpose,
        RcSubtype::AuthorAttitude,
        RcSubtype::SpecificDetail,
        RcSubtype::Inference,
        RcSubtype::Function,
        RcSubtype::Organization,
        RcSubtype::Application,
        RcSubtype::ComparativeRelationship,
        RcSubtype::MeaningInContext,
    ];

    /// The stable string form.
    pub fn as_str(self) -> &'static str {
        match self {
            RcSubtype::MainIdea => "main_idea",
            RcSubtype::PrimaryPurpose => "primary_purpose",
            RcSubtype::AuthorAttitude => "author_attitude",
            RcSubtype::SpecificDetail => "specific_detail",
            RcSubtype::Inference => "inference",
            RcSubtype::Function => "function",
            RcSubtype::Organization => "organization",
            RcSubtype::Application => "application",
            RcSubtype::ComparativeRelationship => "comparative_relationship",
            RcSubtype::MeaningInContext => "meaning_in_context",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// A subtype from either section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtype {
    Lr(LrSubtype),
    Rc(RcSubtype),
}

impl Serialize for Subtype {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Subtype {
    /// The section this subtype belongs to.
    pub fn section(self) -> Section {
        match self {
            Subtype::Lr(_) => Section::LogicalReasoning,
            Subtype::Rc(_) => Section::ReadingComprehension,
        }
    }

    /// The stable string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Subtype::Lr(s) => s.as_str(),
            Subtype::Rc(s) => s.as_str(),
        }
    }

    /// Parse a subtype string belonging to the given section.
    pub fn parse(section: Section, s: &str) -> Option<Self> {
        match section {
            Section::LogicalReasoning => LrSubtype::parse(s).map(Subtype::Lr),
            Section::ReadingComprehension => RcSubtype::parse(s).map(Subtype::Rc),
        }
    }

    /// All subtypes for a section, as stable strings.
    pub fn all_for_section(section: Section) -> Vec<Subtype> {
        match section {
            Section::LogicalReasoning => LrSubtype::ALL.into_iter().map(Subtype::Lr).collect(),
            Section::ReadingComprehension => RcSubtype::ALL.into_iter().map(Subtype::Rc).collect(),
        }
    }
}

/// Coarse difficulty band. The fine-grained currency is `difficulty_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// The inclusive difficulty-score range implied by this band.
    pub fn score_range(self) -> (i64, i64) {
        match self {
            Difficulty::Easy => (10, 35),
            Difficulty::Medium => (40, 65),
            Difficulty::Hard => (70, 95),
        }
    }

    /// Whether a difficulty score lies inside this band.
    pub fn contains(self, score: i64) -> bool {
        let (lo, hi) = self.score_range();
        (lo..=hi).contains(&score)
    }

    /// The band a target score maps to (used when a bucket midpoint must
    /// be turned into a band for a generation job).
    pub fn for_target(score: i64) -> Self {
        if score <= 35 {
            Difficulty::Easy
        } else if score <= 65 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    /// The stable string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Validation status of an item after the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Unvalidated,
    Passed,
    Flagged,
    Rejected,
}

impl ValidationStatus {
    /// The stable string form.
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Unvalidated => "unvalidated",
            ValidationStatus::Passed => "passed",
            ValidationStatus::Flagged => "flagged",
            ValidationStatus::Rejected => "rejected",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unvalidated" => Some(ValidationStatus::Unvalidated),
            "passed" => Some(ValidationStatus::Passed),
            "flagged" => Some(ValidationStatus::Flagged),
            "rejected" => Some(ValidationStatus::Rejected),
            _ => None,
        }
    }
}

/// Lifecycle status of a generation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Generating,
    Validating,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Generating => "generating",
            BatchStatus::Validating => "validating",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BatchStatus::Pending),
            "generating" => Some(BatchStatus::Generating),
            "validating" => Some(BatchStatus::Validating),
            "completed" => Some(BatchStatus::Completed),
            "failed" => Some(BatchStatus::Failed),
            _ => None,
        }
    }
}

/// Lifecycle status of a generation queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Generating => "generating",
            QueueStatus::Completed => "completed",
            QueueStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(QueueStatus::Pending),
            "generating" => Some(QueueStatus::Generating),
            "completed" => Some(QueueStatus::Completed),
            "failed" => Some(QueueStatus::Failed),
            _ => None,
        }
    }
}

/// Subject area of a reading-comprehension passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectArea {
    Law,
    NaturalScience,
    SocialScience,
    Humanities,
}

impl SubjectArea {
    /// Round-robin rotation order for passage inventory generation.
    pub const ROTATION: [SubjectArea; 4] = [
        SubjectArea::Law,
        SubjectArea::NaturalScience,
        SubjectArea::SocialScience,
        SubjectArea::Humanities,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubjectArea::Law => "law",
            SubjectArea::NaturalScience => "natural_science",
            SubjectArea::SocialScience => "social_science",
            SubjectArea::Humanities => "humanities",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ROTATION.into_iter().find(|v| v.as_str() == s)
    }

    /// The next subject area in the round-robin rotation.
    pub fn next(self) -> Self {
        let idx = Self::ROTATION.iter().position(|v| *v == self).unwrap_or(0);
        Self::ROTATION[(idx + 1) % Self::ROTATION.len()]
    }
}

/// Scope of an ability score row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityScope {
    Overall,
    Section,
    Subtype,
}

impl AbilityScope {
    pub fn as_str(self) -> &'static str {
        match self {
            AbilityScope::Overall => "overall",
            AbilityScope::Section => "section",
            AbilityScope::Subtype => "subtype",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "overall" => Some(AbilityScope::Overall),
            "section" => Some(AbilityScope::Section),
            "subtype" => Some(AbilityScope::Subtype),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A single answer choice belonging to an item.
#[derive(Debug, Clone)]
pub struct Choice {
    pub id: i64,
    pub item_id: i64,
    /// Label A-E.
    pub choice_id: String,
    pub choice_text: String,
    pub explanation: String,
    pub is_correct: bool,
    /// Wrong-answer archetype label, when the generator supplied one.
    pub wrong_answer_type: Option<String>,
}

/// A practice question.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: i64,
    pub batch_id: Option<i64>,
    pub passage_id: Option<i64>,
    pub section: Section,
    pub subtype: Subtype,
    pub difficulty: Difficulty,
    /// Fine-grained difficulty on [0, 100]; the adaptive currency.
    pub difficulty_score: i64,
    /// Empty for reading-comprehension items (the passage carries the text).
    pub stimulus: String,
    pub question_stem: String,
    pub correct_choice_id: String,
    pub quality_score: Option<f64>,
    pub validation_status: ValidationStatus,
    pub times_served: i64,
    pub times_correct: i64,
    pub created_at: String,
}

impl Item {
    /// Whether this item may be served to users.
    pub fn is_servable(&self) -> bool {
        matches!(
            self.validation_status,
            ValidationStatus::Passed | ValidationStatus::Unvalidated
        ) && self.quality_score.map_or(true, |q| q >= SERVABLE_MIN_QUALITY)
    }
}

/// An item together with its five choices, in label order.
#[derive(Debug, Clone)]
pub struct ItemWithChoices {
    pub item: Item,
    pub choices: Vec<Choice>,
}

/// A reading-comprehension passage.
#[derive(Debug, Clone)]
pub struct Passage {
    pub id: i64,
    pub title: String,
    pub subject_area: SubjectArea,
    pub content: String,
    /// Second body, present only for comparative passages.
    pub content_b: Option<String>,
    pub is_comparative: bool,
    pub word_count: i64,
    pub created_at: String,
}

/// A generation batch row (the provenance of items and passages).
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: i64,
    pub section: Section,
    pub subtype: Option<String>,
    pub difficulty: Difficulty,
    pub requested_count: i64,
    pub status: BatchStatus,
    pub passed_count: i64,
    pub flagged_count: i64,
    pub rejected_count: i64,
    pub generation_tokens: i64,
    pub validation_tokens: i64,
    pub elapsed_ms: i64,
    pub error_message: Option<String>,
    pub created_at: String,
}

/// A per-(user, scope, scope_value) Elo-style ability row.
#[derive(Debug, Clone)]
pub struct AbilityScore {
    pub user_id: String,
    pub scope: AbilityScope,
    pub scope_value: String,
    pub score: i64,
    pub questions_answered: i64,
    pub questions_correct: i64,
}

/// One (user, item) answer record. Re-answers overwrite correctness and
/// increment `attempt_count`.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub user_id: String,
    pub item_id: i64,
    pub correct: bool,
    pub selected_choice_id: String,
    pub time_spent_secs: i64,
    pub attempt_count: i64,
    pub answered_at: String,
}

/// A pending unit of background generation work.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: i64,
    pub section: Section,
    pub subtype: Option<String>,
    pub bucket_min: i64,
    pub bucket_max: i64,
    pub target_difficulty: Difficulty,
    pub questions_needed: i64,
    pub status: QueueStatus,
    pub subject_area: Option<SubjectArea>,
    pub is_comparative: bool,
    pub error_message: Option<String>,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

/// Input for one generation call.
///
/// On the wire the subtype arrives split by section
/// (`lr_subtype` / `rc_subtype`); internally it is a single typed field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GenerationRequestWire")]
pub struct GenerationRequest {
    pub section: Section,
    pub subtype: Option<Subtype>,
    pub difficulty: Difficulty,
    pub count: u32,
    pub subject_area: Option<SubjectArea>,
    pub is_comparative: bool,
}

#[derive(Debug, Deserialize)]
struct GenerationRequestWire {
    section: Section,
    #[serde(default)]
    lr_subtype: Option<String>,
    #[serde(default)]
    rc_subtype: Option<String>,
    difficulty: Difficulty,
    count: u32,
    #[serde(default)]
    subject_area: Option<SubjectArea>,
    #[serde(default)]
    is_comparative: bool,
}

impl TryFrom<GenerationRequestWire> for GenerationRequest {
    type Error = String;

    fn try_from(w: GenerationRequestWire) -> Result<Self, Self::Error> {
        let raw = match w.section {
            Section::LogicalReasoning => w.lr_subtype.as_deref(),
            Section::ReadingComprehension => w.rc_subtype.as_deref(),
        };
        let subtype = match raw {
            Some(s) => Some(
                Subtype::parse(w.section, s).ok_or_else(|| format!("unknown subtype: {s}"))?,
            ),
            None => None,
        };
        Ok(GenerationRequest {
            section: w.section,
            subtype,
            difficulty: w.difficulty,
            count: w.count,
            subject_area: w.subject_area,
            is_comparative: w.is_comparative,
        })
    }
}

/// A choice as served in a drill: text only, no answer key.
#[derive(Debug, Clone, Serialize)]
pub struct DrillChoice {
    pub choice_id: String,
    pub choice_text: String,
}

/// A passage as served in a drill.
#[derive(Debug, Clone, Serialize)]
pub struct DrillPassage {
    pub id: i64,
    pub title: String,
    pub subject_area: SubjectArea,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_b: Option<String>,
}

/// A drill item with answers stripped.
#[derive(Debug, Clone, Serialize)]
pub struct DrillItem {
    pub id: i64,
    pub section: Section,
    pub subtype: String,
    pub difficulty: Difficulty,
    pub difficulty_score: i64,
    pub stimulus: String,
    pub question_stem: String,
    pub choices: Vec<DrillChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage: Option<DrillPassage>,
}

impl DrillItem {
    /// Strip an item down to its servable form.
    pub fn from_item(item: &ItemWithChoices, passage: Option<&Passage>) -> Self {
        DrillItem {
            id: item.item.id,
            section: item.item.section,
            subtype: item.item.subtype.as_str().to_string(),
            difficulty: item.item.difficulty,
            difficulty_score: item.item.difficulty_score,
            stimulus: item.item.stimulus.clone(),
            question_stem: item.item.question_stem.clone(),
            choices: item
                .choices
                .iter()
                .map(|c| DrillChoice {
                    choice_id: c.choice_id.clone(),
                    choice_text: c.choice_text.clone(),
                })
                .collect(),
            passage: passage.map(|p| DrillPassage {
                id: p.id,
                title: p.title.clone(),
                subject_area: p.subject_area,
                content: p.content.clone(),
                content_b: p.content_b.clone(),
            }),
        }
    }
}

/// Answer submission input.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    pub selected_choice_id: String,
    #[serde(default)]
    pub time_spent_secs: Option<i64>,
}

/// A choice in the post-answer review, with the key revealed.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewChoice {
    pub choice_id: String,
    pub text: String,
    pub explanation: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrong_answer_type: Option<String>,
}

/// Post-update ability snapshot returned with every answer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AbilitySnapshot {
    pub overall: i64,
    pub section: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<i64>,
}

/// Full answer review returned after a submission.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReview {
    pub correct: bool,
    pub correct_answer_id: String,
    pub explanation: String,
    pub choices: Vec<ReviewChoice>,
    pub ability_updated: AbilitySnapshot,
    pub xp_awarded: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_round_trips() {
        for s in [Section::LogicalReasoning, Section::ReadingComprehension] {
            assert_eq!(Section::parse(s.as_str()), Some(s));
        }
        assert_eq!(Section::parse("logic_games"), None);
    }

    #[test]
    fn all_subtypes_round_trip() {
        for s in LrSubtype::ALL {
            assert_eq!(LrSubtype::parse(s.as_str()), Some(s));
        }
        for s in RcSubtype::ALL {
            assert_eq!(RcSubtype::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn subtype_counts_match_sections() {
        assert_eq!(Subtype::all_for_section(Section::LogicalReasoning).len(), 14);
        assert_eq!(
            Subtype::all_for_section(Section::ReadingComprehension).len(),
            10
        );
    }

    #[test]
    fn difficulty_bands_are_disjoint() {
        assert!(Difficulty::Easy.contains(10));
        assert!(Difficulty::Easy.contains(35));
        assert!(!Difficulty::Easy.contains(36));
        assert!(Difficulty::Medium.contains(40));
        assert!(!Difficulty::Medium.contains(66));
        assert!(Difficulty::Hard.contains(95));
        assert!(!Difficulty::Hard.contains(96));
    }

    #[test]
    fn band_for_target_midpoints() {
        assert_eq!(Difficulty::for_target(10), Difficulty::Easy);
        assert_eq!(Difficulty::for_target(30), Difficulty::Easy);
        assert_eq!(Difficulty::for_target(50), Difficulty::Medium);
        assert_eq!(Difficulty::for_target(70), Difficulty::Hard);
        assert_eq!(Difficulty::for_target(90), Difficulty::Hard);
    }

    #[test]
    fn subject_area_rotation_wraps() {
        assert_eq!(SubjectArea::Law.next(), SubjectArea::NaturalScience);
        assert_eq!(SubjectArea::Humanities.next(), SubjectArea::Law);
    }

    #[test]
    fn servable_requires_status_and_quality() {
        let mut item = Item {
            id: 1,
            batch_id: None,
            passage_id: None,
            section: Section::LogicalReasoning,
            subtype: Subtype::Lr(LrSubtype::Weaken),
            difficulty: Difficulty::Medium,
            difficulty_score: 50,
            stimulus: String::new(),
            question_stem: String::new(),
            correct_choice_id: "A".to_string(),
            quality_score: None,
            validation_status: ValidationStatus::Passed,
            times_served: 0,
            times_correct: 0,
            created_at: String::new(),
        };
        assert!(item.is_servable());

        item.quality_score = Some(0.49);
        assert!(!item.is_servable());

        item.quality_score = Some(0.50);
        assert!(item.is_servable());

        item.validation_status = ValidationStatus::Flagged;
        assert!(!item.is_servable());

        item.validation_status = ValidationStatus::Unvalidated;
        assert!(item.is_servable());
    }

    #[test]
    fn generation_request_parses_wire_form() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"section":"logical_reasoning","lr_subtype":"weaken","difficulty":"medium","count":6}"#,
        )
        .expect("parse");
        assert_eq!(req.section, Section::LogicalReasoning);
        assert_eq!(req.subtype, Some(Subtype::Lr(LrSubtype::Weaken)));
        assert_eq!(req.count, 6);
        assert!(!req.is_comparative);
    }

    #[test]
    fn generation_request_rejects_unknown_subtype() {
        let res: Result<GenerationRequest, _> = serde_json::from_str(
            r#"{"section":"logical_reasoning","lr_subtype":"logic_games","difficulty":"easy","count":1}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn generation_request_ignores_subtype_for_other_section() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"section":"reading_comprehension","lr_subtype":"weaken","difficulty":"hard","count":5,"subject_area":"law"}"#,
        )
        .expect("parse");
        assert_eq!(req.subtype, None);
        assert_eq!(req.subject_area, Some(SubjectArea::Law));
    }
}

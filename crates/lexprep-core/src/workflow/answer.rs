//! Answer submission: grading, history, counters, the three-scope ability
//! update, and the post-answer inventory triggers.
//!
//! The ability update completes before the response returns; history and
//! counter writes are best-effort; the inventory triggers are
//! fire-and-forget and survive the request's cancellation.

use crate::ability;
use crate::error::StorageError;
use crate::model::{
    AnswerReview, AnswerSubmission, ItemWithChoices, ReviewChoice,
};
use crate::scheduler::inventory::{self, InventorySettings};
use crate::storage::{self, DbPool};

/// Grades answers and maintains per-user state.
#[derive(Clone)]
pub struct AnswerService {
    pool: DbPool,
    inventory: InventorySettings,
}

impl AnswerService {
    pub fn new(pool: DbPool, inventory: InventorySettings) -> Self {
        Self { pool, inventory }
    }

    /// Submit an answer for an item and return the full review.
    ///
    /// Fails only when the item cannot be loaded; every side effect
    /// degrades to a logged warning.
    pub async fn submit_answer(
        &self,
        user_id: &str,
        item_id: i64,
        submission: &AnswerSubmission,
    ) -> Result<AnswerReview, StorageError> {
        let item = storage::items::get_item_with_choices(&self.pool, item_id).await?;
        let correct = submission.selected_choice_id == item.item.correct_choice_id;

        tracing::debug!(
            user_id = %user_id,
            item_id,
            selected = %submission.selected_choice_id,
            correct,
            "Answer submitted"
        );

        // History and counters are best-effort; a failed write must not
        // block the response.
        if let Err(e) = storage::history::upsert_answer(
            &self.pool,
            user_id,
            item_id,
            correct,
            &submission.selected_choice_id,
            submission.time_spent_secs.unwrap_or(0),
        )
        .await
        {
            tracing::warn!(item_id, error = %e, "History write failed");
        }
        if correct {
            if let Err(e) = storage::items::increment_correct(&self.pool, item_id).await {
                tracing::warn!(item_id, error = %e, "Correct counter update failed");
            }
        }

        // All three ability scopes update before the response returns.
        let snapshot = ability::update_for_answer(&self.pool, user_id, &item.item, correct).await;

        self.fire_triggers(user_id, &item, snapshot.section);

        Ok(build_review(&item, correct, snapshot))
    }

    /// Post-answer inventory checks: the global bucket check around the
    /// user's window, and the per-user unseen check for the subtype served.
    fn fire_triggers(&self, user_id: &str, item: &ItemWithChoices, section_ability: i64) {
        let section = item.item.section;
        let subtype = item.item.subtype;

        let target = ability::target_difficulty(section_ability, 50);
        let window = (
            (target - ability::WINDOW_NARROW).max(0),
            (target + ability::WINDOW_NARROW).min(100),
        );

        inventory::spawn_bucket_check(
            self.pool.clone(),
            self.inventory.clone(),
            section,
            Some(subtype),
            window,
        );
        inventory::spawn_user_check(
            self.pool.clone(),
            self.inventory.clone(),
            user_id.to_string(),
            section,
            subtype,
            section_ability,
        );
    }
}

/// Assemble the review DTO with the key revealed.
///
/// `xp_awarded` is reported as 0; gamification lives outside the core.
fn build_review(
    item: &ItemWithChoices,
    correct: bool,
    snapshot: crate::model::AbilitySnapshot,
) -> AnswerReview {
    let explanation = item
        .choices
        .iter()
        .find(|c| c.is_correct)
        .map(|c| c.explanation.clone())
        .unwrap_or_default();

    AnswerReview {
        correct,
        correct_answer_id: item.item.correct_choice_id.clone(),
        explanation,
        choices: item
            .choices
            .iter()
            .map(|c| ReviewChoice {
                choice_id: c.choice_id.clone(),
                text: c.choice_text.clone(),
                explanation: c.explanation.clone(),
                is_correct: c.is_correct,
                wrong_answer_type: c.wrong_answer_type.clone(),
            })
            .collect(),
        ability_updated: snapshot,
        xp_awarded: 0,
    }
}

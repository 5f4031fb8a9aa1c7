//! Elo-style ability tracking.
//!
//! Every answered question updates three ability rows (overall, section,
//! subtype) through the same logistic update. The spread constant of 12.5
//! points equals one logistic unit: equal ability and difficulty predict
//! ~50% accuracy, a 25-point edge predicts ~88%.

use crate::error::StorageError;
use crate::model::{AbilityScope, AbilitySnapshot, Item};
use crate::storage::{self, DbPool};

/// Logistic spread: one unit of the exponent per 12.5 ability points.
const SPREAD: f64 = 12.5;

/// Half-width of the initial difficulty window around the target.
pub const WINDOW_NARROW: i64 = 15;

/// Half-width of the widened difficulty window.
pub const WINDOW_WIDE: i64 = 35;

/// Expected probability that a user at `ability` answers an item at
/// `difficulty` correctly.
pub fn expected_accuracy(ability: i64, difficulty: i64) -> f64 {
    1.0 / (1.0 + ((difficulty - ability) as f64 / SPREAD).exp())
}

/// K-factor by prior answer count: fast convergence for new users,
/// stability once a scope has seen 100 items.
pub fn k_factor(answered: i64) -> f64 {
    if answered < 20 {
        3.0
    } else if answered < 100 {
        2.0
    } else {
        1.0
    }
}

/// Apply one Elo update and return the new ability score.
///
/// The adjustment truncates toward zero before clamping, so a new user's
/// first correct answer at matched difficulty moves 50 to 51 (adjustment
/// +1.5, truncated to +1).
pub fn apply_update(ability: i64, difficulty: i64, correct: bool, answered: i64) -> i64 {
    let result = if correct { 1.0 } else { 0.0 };
    let expected = expected_accuracy(ability, difficulty);
    let adjustment = (result - expected) * k_factor(answered);
    (ability + adjustment as i64).clamp(0, 100)
}

/// Target difficulty for a future drill: the slider shifts the window by
/// up to ±15 points around current ability.
pub fn target_difficulty(ability: i64, slider: i64) -> i64 {
    let shifted = ability as f64 + (slider - 50) as f64 * 0.3;
    (shifted.round() as i64).clamp(0, 100)
}

/// Update all three ability scopes for an answered item and return the
/// post-update snapshot.
///
/// Scope updates are best-effort: a failed write is logged and the default
/// score is reported in the snapshot, so answer submission never fails here.
pub async fn update_for_answer(
    pool: &DbPool,
    user_id: &str,
    item: &Item,
    correct: bool,
) -> AbilitySnapshot {
    let overall = update_scope(pool, user_id, AbilityScope::Overall, "overall", item, correct).await;
    let section = update_scope(
        pool,
        user_id,
        AbilityScope::Section,
        item.section.as_str(),
        item,
        correct,
    )
    .await;
    let subtype = update_scope(
        pool,
        user_id,
        AbilityScope::Subtype,
        item.subtype.as_str(),
        item,
        correct,
    )
    .await;

    AbilitySnapshot {
        overall,
        section,
        subtype: Some(subtype),
    }
}

async fn update_scope(
    pool: &DbPool,
    user_id: &str,
    scope: AbilityScope,
    scope_value: &str,
    item: &Item,
    correct: bool,
) -> i64 {
    match try_update_scope(pool, user_id, scope, scope_value, item, correct).await {
        Ok(score) => score,
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                scope = scope.as_str(),
                scope_value = %scope_value,
                error = %e,
                "Ability update failed, reporting default score"
            );
            50
        }
    }
}

async fn try_update_scope(
    pool: &DbPool,
    user_id: &str,
    scope: AbilityScope,
    scope_value: &str,
    item: &Item,
    correct: bool,
) -> Result<i64, StorageError> {
    let current = storage::ability::get_or_create(pool, user_id, scope, scope_value).await?;
    let new_score = apply_update(
        current.score,
        item.difficulty_score,
        correct,
        current.questions_answered,
    );
    storage::ability::record_answer(pool, user_id, scope, scope_value, new_score, correct).await?;
    Ok(new_score)
}

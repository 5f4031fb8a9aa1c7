//! Per-user answer history. One row per (user, item); re-answers bump
//! `attempt_count` and overwrite correctness.

use super::DbPool;
use crate::error::StorageError;
use crate::model::HistoryEntry;

/// Upsert an answer record for (user, item).
pub async fn upsert_answer(
    pool: &DbPool,
    user_id: &str,
    item_id: i64,
    correct: bool,
    selected_choice_id: &str,
    time_spent_secs: i64,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO user_history (user_id, item_id, correct, selected_choice_id, time_spent_secs)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (user_id, item_id) DO UPDATE SET
             correct = excluded.correct,
             selected_choice_id = excluded.selected_choice_id,
             time_spent_secs = excluded.time_spent_secs,
             attempt_count = attempt_count + 1,
             answered_at = datetime('now')",
    )
    .bind(user_id)
    .bind(item_id)
    .bind(correct)
    .bind(selected_choice_id)
    .bind(time_spent_secs)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Fetch the history row for (user, item) if one exists.
pub async fn get(
    pool: &DbPool,
    user_id: &str,
    item_id: i64,
) -> Result<Option<HistoryEntry>, StorageError> {
    let row: Option<(String, i64, bool, String, i64, i64, String)> = sqlx::query_as(
        "SELECT user_id, item_id, correct, selected_choice_id, time_spent_secs, attempt_count, answered_at
         FROM user_history WHERE user_id = ?1 AND item_id = ?2",
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(row.map(
        |(user_id, item_id, correct, selected_choice_id, time_spent_secs, attempt_count, answered_at)| {
            HistoryEntry {
                user_id,
                item_id,
                correct,
                selected_choice_id,
                time_spent_secs,
                attempt_count,
                answered_at,
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LrSubtype, Section, ValidationStatus};
    use crate::storage::init_test_db;
    use crate::storage::items::test_support::{lr, seed_item};

    #[tokio::test]
    async fn first_answer_creates_row() {
        let pool = init_test_db().await.expect("init db");
        let item = seed_item(
            &pool,
            Section::LogicalReasoning,
            lr(LrSubtype::Weaken),
            50,
            ValidationStatus::Passed,
            None,
        )
        .await;

        upsert_answer(&pool, "u1", item, true, "B", 42).await.expect("upsert");

        let entry = get(&pool, "u1", item).await.expect("get").expect("row");
        assert!(entry.correct);
        assert_eq!(entry.selected_choice_id, "B");
        assert_eq!(entry.attempt_count, 1);
        assert_eq!(entry.time_spent_secs, 42);
    }

    #[tokio::test]
    async fn reanswer_overwrites_and_increments_attempts() {
        let pool = init_test_db().await.expect("init db");
        let item = seed_item(
            &pool,
            Section::LogicalReasoning,
            lr(LrSubtype::Flaw),
            50,
            ValidationStatus::Passed,
            None,
        )
        .await;

        upsert_answer(&pool, "u1", item, false, "C", 30).await.expect("first");
        upsert_answer(&pool, "u1", item, true, "B", 25).await.expect("second");

        let entry = get(&pool, "u1", item).await.expect("get").expect("row");
        assert!(entry.correct);
        assert_eq!(entry.selected_choice_id, "B");
        assert_eq!(entry.attempt_count, 2);

        // Still exactly one row for the pair.
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_history WHERE user_id = 'u1'")
                .fetch_one(&pool)
                .await
                .expect("count");
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn histories_are_per_user() {
        let pool = init_test_db().await.expect("init db");
        let item = seed_item(
            &pool,
            Section::LogicalReasoning,
            lr(LrSubtype::MainPoint),
            50,
            ValidationStatus::Passed,
            None,
        )
        .await;

        upsert_answer(&pool, "u1", item, true, "B", 10).await.expect("u1");
        assert!(get(&pool, "u2", item).await.expect("get").is_none());
    }
}

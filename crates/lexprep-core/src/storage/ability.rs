//! Ability score rows: one per (user, scope, scope_value).

use super::DbPool;
use crate::error::StorageError;
use crate::model::{AbilityScope, AbilityScore};

/// Fetch the ability row for a scope, creating it at the default score of
/// 50 if absent.
pub async fn get_or_create(
    pool: &DbPool,
    user_id: &str,
    scope: AbilityScope,
    scope_value: &str,
) -> Result<AbilityScore, StorageError> {
    sqlx::query(
        "INSERT OR IGNORE INTO ability_scores (user_id, scope, scope_value) VALUES (?1, ?2, ?3)",
    )
    .bind(user_id)
    .bind(scope.as_str())
    .bind(scope_value)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    get(pool, user_id, scope, scope_value)
        .await?
        .ok_or_else(|| StorageError::NotFound {
            entity: "ability_score",
            id: format!("{user_id}/{}/{scope_value}", scope.as_str()),
        })
}

/// Fetch an ability row if it exists.
pub async fn get(
    pool: &DbPool,
    user_id: &str,
    scope: AbilityScope,
    scope_value: &str,
) -> Result<Option<AbilityScore>, StorageError> {
    let row: Option<(String, String, String, i64, i64, i64)> = sqlx::query_as(
        "SELECT user_id, scope, scope_value, score, questions_answered, questions_correct
         FROM ability_scores WHERE user_id = ?1 AND scope = ?2 AND scope_value = ?3",
    )
    .bind(user_id)
    .bind(scope.as_str())
    .bind(scope_value)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    let Some((user_id, scope_raw, scope_value, score, questions_answered, questions_correct)) = row
    else {
        return Ok(None);
    };

    let scope = AbilityScope::parse(&scope_raw).ok_or_else(|| StorageError::CorruptRow {
        table: "ability_scores",
        message: format!("bad scope '{scope_raw}'"),
    })?;

    Ok(Some(AbilityScore {
        user_id,
        scope,
        scope_value,
        score,
        questions_answered,
        questions_correct,
    }))
}

/// Record an answer against a scope: store the new score and bump the
/// monotonic counters.
pub async fn record_answer(
    pool: &DbPool,
    user_id: &str,
    scope: AbilityScope,
    scope_value: &str,
    new_score: i64,
    correct: bool,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE ability_scores
         SET score = ?1,
             questions_answered = questions_answered + 1,
             questions_correct = questions_correct + ?2,
             updated_at = datetime('now')
         WHERE user_id = ?3 AND scope = ?4 AND scope_value = ?5",
    )
    .bind(new_score)
    .bind(i64::from(correct))
    .bind(user_id)
    .bind(scope.as_str())
    .bind(scope_value)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    #[tokio::test]
    async fn get_or_create_defaults_to_50() {
        let pool = init_test_db().await.expect("init db");
        let row = get_or_create(&pool, "u1", AbilityScope::Overall, "overall")
            .await
            .expect("create");
        assert_eq!(row.score, 50);
        assert_eq!(row.questions_answered, 0);
        assert_eq!(row.questions_correct, 0);
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let pool = init_test_db().await.expect("init db");
        get_or_create(&pool, "u1", AbilityScope::Subtype, "weaken").await.expect("first");
        record_answer(&pool, "u1", AbilityScope::Subtype, "weaken", 53, true)
            .await
            .expect("record");

        let row = get_or_create(&pool, "u1", AbilityScope::Subtype, "weaken")
            .await
            .expect("second");
        assert_eq!(row.score, 53);
        assert_eq!(row.questions_answered, 1);
    }

    #[tokio::test]
    async fn counters_are_monotonic_even_when_score_drops() {
        let pool = init_test_db().await.expect("init db");
        get_or_create(&pool, "u1", AbilityScope::Overall, "overall").await.expect("create");

        record_answer(&pool, "u1", AbilityScope::Overall, "overall", 51, true)
            .await
            .expect("record");
        record_answer(&pool, "u1", AbilityScope::Overall, "overall", 49, false)
            .await
            .expect("record");

        let row = get(&pool, "u1", AbilityScope::Overall, "overall")
            .await
            .expect("get")
            .expect("row");
        assert_eq!(row.score, 49);
        assert_eq!(row.questions_answered, 2);
        assert_eq!(row.questions_correct, 1);
    }

    #[tokio::test]
    async fn scopes_are_independent_rows() {
        let pool = init_test_db().await.expect("init db");
        get_or_create(&pool, "u1", AbilityScope::Overall, "overall").await.expect("a");
        get_or_create(&pool, "u1", AbilityScope::Section, "logical_reasoning")
            .await
            .expect("b");
        get_or_create(&pool, "u2", AbilityScope::Overall, "overall").await.expect("c");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ability_scores")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count.0, 3);
    }
}

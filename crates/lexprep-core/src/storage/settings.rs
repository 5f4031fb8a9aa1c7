//! Per-user preferences. Currently just the difficulty slider.

use super::DbPool;
use crate::error::StorageError;

/// Fetch the user's saved slider, if any.
pub async fn get_slider(pool: &DbPool, user_id: &str) -> Result<Option<i64>, StorageError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT slider FROM user_settings WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| StorageError::Query { source: e })?;
    Ok(row.map(|(s,)| s))
}

/// Save the user's slider preference.
pub async fn set_slider(pool: &DbPool, user_id: &str, slider: i64) -> Result<(), StorageError> {
    let slider = slider.clamp(0, 100);
    sqlx::query(
        "INSERT INTO user_settings (user_id, slider) VALUES (?1, ?2)
         ON CONFLICT (user_id) DO UPDATE SET slider = excluded.slider, updated_at = datetime('now')",
    )
    .bind(user_id)
    .bind(slider)
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
    async fn missing_slider_is_none() {
        let pool = init_test_db().await.expect("init db");
        assert!(get_slider(&pool, "u1").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn slider_round_trips_and_clamps() {
        let pool = init_test_db().await.expect("init db");
        set_slider(&pool, "u1", 70).await.expect("set");
        assert_eq!(get_slider(&pool, "u1").await.expect("get"), Some(70));

        set_slider(&pool, "u1", 150).await.expect("set");
        assert_eq!(get_slider(&pool, "u1").await.expect("get"), Some(100));
    }
}

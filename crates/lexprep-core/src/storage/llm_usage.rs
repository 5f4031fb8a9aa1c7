//! LLM usage tracking: per-call token counts and costs.
//!
//! The `llm_usage` table doubles as the daily budget accumulator, so
//! multiple processes sharing one database share one budget.

use super::DbPool;
use crate::error::StorageError;

/// Insert a new LLM usage record.
pub async fn insert_usage(
    pool: &DbPool,
    stage: &str,
    provider: &str,
    model: &str,
    input_tokens: u32,
    output_tokens: u32,
    cost_usd: f64,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO llm_usage (stage, provider, model, input_tokens, output_tokens, cost_usd)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(stage)
    .bind(provider)
    .bind(model)
    .bind(input_tokens)
    .bind(output_tokens)
    .bind(cost_usd)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Total generation spend today (UTC), in whole cents (rounded up so the
/// budget gate errs on the side of stopping).
pub async fn cost_today_cents(pool: &DbPool) -> Result<u32, StorageError> {
    // Rows are stamped with SQLite's datetime('now'), which is UTC.
    let day_start = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let row: (f64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(cost_usd), 0.0) FROM llm_usage WHERE created_at >= ?1",
    )
    .bind(day_start)
    .fetch_one(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok((row.0 * 100.0).ceil() as u32)
}

/// Total calls and spend across all time, for status reporting.
pub async fn totals(pool: &DbPool) -> Result<(i64, f64), StorageError> {
    let row: (i64, f64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(cost_usd), 0.0) FROM llm_usage")
            .fetch_one(pool)
            .await
            .map_err(|e| StorageError::Query { source: e })?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    #[tokio::test]
    async fn empty_table_costs_zero() {
        let pool = init_test_db().await.expect("init db");
        assert_eq!(cost_today_cents(&pool).await.expect("cost"), 0);
    }

    #[tokio::test]
    async fn todays_usage_accumulates_and_rounds_up() {
        let pool = init_test_db().await.expect("init db");

        insert_usage(&pool, "generate", "anthropic", "claude-sonnet-4-5", 1000, 500, 0.012)
            .await
            .expect("insert");
        insert_usage(&pool, "verify", "anthropic", "claude-sonnet-4-5", 400, 100, 0.003)
            .await
            .expect("insert");

        // 0.015 USD = 1.5 cents, rounded up to 2.
        assert_eq!(cost_today_cents(&pool).await.expect("cost"), 2);

        let (calls, spend) = totals(&pool).await.expect("totals");
        assert_eq!(calls, 2);
        assert!((spend - 0.015).abs() < 1e-9);
    }
}

//! Generation batch lifecycle: create, transition, finalize.

use super::DbPool;
use crate::error::StorageError;
use crate::model::{Batch, BatchStatus, Difficulty, Section};

/// Create a new batch row in `pending` and return its id.
pub async fn create(
    pool: &DbPool,
    section: Section,
    subtype: Option<&str>,
    difficulty: Difficulty,
    requested_count: u32,
) -> Result<i64, StorageError> {
    let result = sqlx::query(
        "INSERT INTO generation_batches (section, subtype, difficulty, requested_count)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(section.as_str())
    .bind(subtype)
    .bind(difficulty.as_str())
    .bind(requested_count)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(result.last_insert_rowid())
}

/// Transition a batch to a new status.
pub async fn set_status(
    pool: &DbPool,
    batch_id: i64,
    status: BatchStatus,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE generation_batches SET status = ?1 WHERE id = ?2")
        .bind(status.as_str())
        .bind(batch_id)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Finalize a batch as completed with its aggregate counts.
#[allow(clippy::too_many_arguments)]
pub async fn complete(
    pool: &DbPool,
    batch_id: i64,
    passed: u32,
    flagged: u32,
    rejected: u32,
    generation_tokens: u32,
    validation_tokens: u32,
    elapsed_ms: u64,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE generation_batches
         SET status = 'completed', passed_count = ?1, flagged_count = ?2, rejected_count = ?3,
             generation_tokens = ?4, validation_tokens = ?5, elapsed_ms = ?6
         WHERE id = ?7",
    )
    .bind(passed)
    .bind(flagged)
    .bind(rejected)
    .bind(generation_tokens)
    .bind(validation_tokens)
    .bind(elapsed_ms as i64)
    .bind(batch_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Mark a batch as failed with an error string.
pub async fn fail(pool: &DbPool, batch_id: i64, error: &str) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE generation_batches SET status = 'failed', error_message = ?1 WHERE id = ?2",
    )
    .bind(error)
    .bind(batch_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Fetch a batch by id.
pub async fn get(pool: &DbPool, batch_id: i64) -> Result<Batch, StorageError> {
    #[allow(clippy::type_complexity)]
    let row: Option<(
        i64,
        String,
        Option<String>,
        String,
        i64,
        String,
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
        Option<String>,
        String,
    )> = sqlx::query_as(
        "SELECT id, section, subtype, difficulty, requested_count, status, passed_count,
                flagged_count, rejected_count, generation_tokens, validation_tokens,
                elapsed_ms, error_message, created_at
         FROM generation_batches WHERE id = ?1",
    )
    .bind(batch_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    let (
        id,
        section,
        subtype,
        difficulty,
        requested_count,
        status,
        passed_count,
        flagged_count,
        rejected_count,
        generation_tokens,
        validation_tokens,
        elapsed_ms,
        error_message,
        created_at,
    ) = row.ok_or_else(|| StorageError::NotFound {
        entity: "batch",
        id: batch_id.to_string(),
    })?;

    let section = Section::parse(&section).ok_or_else(|| StorageError::CorruptRow {
        table: "generation_batches",
        message: format!("bad section '{section}'"),
    })?;
    let difficulty = Difficulty::parse(&difficulty).ok_or_else(|| StorageError::CorruptRow {
        table: "generation_batches",
        message: format!("bad difficulty '{difficulty}'"),
    })?;
    let status = BatchStatus::parse(&status).ok_or_else(|| StorageError::CorruptRow {
        table: "generation_batches",
        message: format!("bad status '{status}'"),
    })?;

    Ok(Batch {
        id,
        section,
        subtype,
        difficulty,
        requested_count,
        status,
        passed_count,
        flagged_count,
        rejected_count,
        generation_tokens,
        validation_tokens,
        elapsed_ms,
        error_message,
        created_at,
    })
}

//! Generation queue: conditional enqueue, pending fetch, status flips.
//!
//! The conditional insert is the idempotency discipline for event-driven
//! enqueueing: at most one row per (section, subtype, bucket) may sit in
//! `pending` or `generating` at a time.

use super::DbPool;
use crate::error::StorageError;
use crate::model::{Difficulty, QueueItem, QueueStatus, Section, SubjectArea};

/// A queue entry to enqueue.
#[derive(Debug, Clone)]
pub struct NewQueueItem {
    pub section: Section,
    pub subtype: Option<String>,
    pub bucket_min: i64,
    pub bucket_max: i64,
    pub target_difficulty: Difficulty,
    pub questions_needed: u32,
    pub subject_area: Option<SubjectArea>,
    pub is_comparative: bool,
}

/// Conditionally enqueue a job. Returns `true` if a row was inserted,
/// `false` if an equivalent job is already pending or generating.
pub async fn try_enqueue(pool: &DbPool, job: &NewQueueItem) -> Result<bool, StorageError> {
    let result = sqlx::query(
        "INSERT INTO generation_queue
             (section, subtype, bucket_min, bucket_max, target_difficulty, questions_needed,
              subject_area, is_comparative)
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
         WHERE NOT EXISTS (
             SELECT 1 FROM generation_queue
             WHERE section = ?1 AND subtype IS ?2 AND bucket_min = ?3 AND bucket_max = ?4
               AND status IN ('pending', 'generating')
         )",
    )
    .bind(job.section.as_str())
    .bind(&job.subtype)
    .bind(job.bucket_min)
    .bind(job.bucket_max)
    .bind(job.target_difficulty.as_str())
    .bind(job.questions_needed)
    .bind(job.subject_area.map(SubjectArea::as_str))
    .bind(job.is_comparative)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(result.rows_affected() > 0)
}

/// Fetch up to `limit` pending jobs, oldest first.
pub async fn fetch_pending(pool: &DbPool, limit: i64) -> Result<Vec<QueueItem>, StorageError> {
    #[allow(clippy::type_complexity)]
    let rows: Vec<(
        i64,
        String,
        Option<String>,
        i64,
        i64,
        String,
        i64,
        String,
        Option<String>,
        bool,
        Option<String>,
        String,
    )> = sqlx::query_as(
        "SELECT id, section, subtype, bucket_min, bucket_max, target_difficulty,
                questions_needed, status, subject_area, is_comparative, error_message, created_at
         FROM generation_queue
         WHERE status = 'pending'
         ORDER BY created_at, id
         LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter()
        .map(
            |(
                id,
                section,
                subtype,
                bucket_min,
                bucket_max,
                target_difficulty,
                questions_needed,
                status,
                subject_area,
                is_comparative,
                error_message,
                created_at,
            )| {
                let section = Section::parse(&section).ok_or_else(|| StorageError::CorruptRow {
                    table: "generation_queue",
                    message: format!("bad section '{section}'"),
                })?;
                let target_difficulty = Difficulty::parse(&target_difficulty).ok_or_else(|| {
                    StorageError::CorruptRow {
                        table: "generation_queue",
                        message: format!("bad target_difficulty '{target_difficulty}'"),
                    }
                })?;
                let status = QueueStatus::parse(&status).ok_or_else(|| StorageError::CorruptRow {
                    table: "generation_queue",
                    message: format!("bad status '{status}'"),
                })?;
                Ok(QueueItem {
                    id,
                    section,
                    subtype,
                    bucket_min,
                    bucket_max,
                    target_difficulty,
                    questions_needed,
                    status,
                    subject_area: subject_area.as_deref().and_then(SubjectArea::parse),
                    is_comparative,
                    error_message,
                    created_at,
                })
            },
        )
        .collect()
}

/// Flip a job's status, optionally recording an error string.
pub async fn set_status(
    pool: &DbPool,
    queue_id: i64,
    status: QueueStatus,
    error: Option<&str>,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE generation_queue
         SET status = ?1, error_message = ?2, updated_at = datetime('now')
         WHERE id = ?3",
    )
    .bind(status.as_str())
    .bind(error)
    .bind(queue_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Reset all `generating` jobs back to `pending`. Admin affordance for
/// resuming after a worker crash.
pub async fn reset_generating(pool: &DbPool) -> Result<u64, StorageError> {
    let result = sqlx::query(
        "UPDATE generation_queue
         SET status = 'pending', updated_at = datetime('now')
         WHERE status = 'generating'",
    )
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    fn job(subtype: Option<&str>, bucket_min: i64, bucket_max: i64) -> NewQueueItem {
        NewQueueItem {
            section: Section::LogicalReasoning,
            subtype: subtype.map(str::to_string),
            bucket_min,
            bucket_max,
            target_difficulty: Difficulty::Medium,
            questions_needed: 6,
            subject_area: None,
            is_comparative: false,
        }
    }

    #[tokio::test]
    async fn enqueue_then_duplicate_is_rejected() {
        let pool = init_test_db().await.expect("init db");

        assert!(try_enqueue(&pool, &job(Some("weaken"), 41, 60)).await.expect("first"));
        assert!(!try_enqueue(&pool, &job(Some("weaken"), 41, 60)).await.expect("second"));

        let pending = fetch_pending(&pool, 10).await.expect("fetch");
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn different_buckets_are_distinct_keys() {
        let pool = init_test_db().await.expect("init db");

        assert!(try_enqueue(&pool, &job(Some("weaken"), 41, 60)).await.expect("a"));
        assert!(try_enqueue(&pool, &job(Some("weaken"), 61, 80)).await.expect("b"));
        assert!(try_enqueue(&pool, &job(Some("flaw"), 41, 60)).await.expect("c"));
        assert!(try_enqueue(&pool, &job(None, 41, 60)).await.expect("d"));

        assert_eq!(fetch_pending(&pool, 10).await.expect("fetch").len(), 4);
    }

    #[tokio::test]
    async fn null_subtype_dedupes_against_null() {
        let pool = init_test_db().await.expect("init db");

        assert!(try_enqueue(&pool, &job(None, 41, 60)).await.expect("first"));
        assert!(!try_enqueue(&pool, &job(None, 41, 60)).await.expect("second"));
    }

    #[tokio::test]
    async fn completed_job_frees_the_key() {
        let pool = init_test_db().await.expect("init db");

        assert!(try_enqueue(&pool, &job(Some("weaken"), 41, 60)).await.expect("first"));
        let pending = fetch_pending(&pool, 1).await.expect("fetch");
        set_status(&pool, pending[0].id, QueueStatus::Generating, None)
            .await
            .expect("claim");

        // Still held while generating.
        assert!(!try_enqueue(&pool, &job(Some("weaken"), 41, 60)).await.expect("held"));

        set_status(&pool, pending[0].id, QueueStatus::Completed, None)
            .await
            .expect("complete");
        assert!(try_enqueue(&pool, &job(Some("weaken"), 41, 60)).await.expect("free"));
    }

    #[tokio::test]
    async fn fetch_pending_is_oldest_first_and_limited() {
        let pool = init_test_db().await.expect("init db");
        for (i, subtype) in ["weaken", "flaw", "strengthen"].iter().enumerate() {
            assert!(try_enqueue(&pool, &job(Some(subtype), (i as i64) * 20, (i as i64) * 20 + 19))
                .await
                .expect("enqueue"));
        }

        let pending = fetch_pending(&pool, 2).await.expect("fetch");
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].subtype.as_deref(), Some("weaken"));
        assert_eq!(pending[1].subtype.as_deref(), Some("flaw"));
    }

    #[tokio::test]
    async fn reset_generating_reclaims_stuck_jobs() {
        let pool = init_test_db().await.expect("init db");
        assert!(try_enqueue(&pool, &job(Some("weaken"), 41, 60)).await.expect("enqueue"));
        let pending = fetch_pending(&pool, 1).await.expect("fetch");
        set_status(&pool, pending[0].id, QueueStatus::Generating, None)
            .await
            .expect("claim");

        assert_eq!(reset_generating(&pool).await.expect("reset"), 1);
        assert_eq!(fetch_pending(&pool, 10).await.expect("fetch").len(), 1);
    }

    #[tokio::test]
    async fn failed_job_records_error() {
        let pool = init_test_db().await.expect("init db");
        assert!(try_enqueue(&pool, &job(Some("weaken"), 41, 60)).await.expect("enqueue"));
        let pending = fetch_pending(&pool, 1).await.expect("fetch");

        set_status(&pool, pending[0].id, QueueStatus::Failed, Some("budget exhausted"))
            .await
            .expect("fail");

        let row: (String, Option<String>) =
            sqlx::query_as("SELECT status, error_message FROM generation_queue WHERE id = ?1")
                .bind(pending[0].id)
                .fetch_one(&pool)
                .await
                .expect("row");
        assert_eq!(row.0, "failed");
        assert_eq!(row.1.as_deref(), Some("budget exhausted"));
    }
}

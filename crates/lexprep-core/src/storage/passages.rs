//! Passage storage: lookups and the inventory statistics driving
//! reading-comprehension generation.

use super::DbPool;
use crate::error::StorageError;
use crate::model::{Passage, SubjectArea};

/// Fetch a passage by id.
pub async fn get_passage(pool: &DbPool, id: i64) -> Result<Passage, StorageError> {
    let row: Option<(i64, String, String, String, Option<String>, bool, i64, String)> =
        sqlx::query_as(
            "SELECT id, title, subject_area, content, content_b, is_comparative, word_count, created_at
             FROM passages WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    let (id, title, subject_area, content, content_b, is_comparative, word_count, created_at) =
        row.ok_or_else(|| StorageError::NotFound {
            entity: "passage",
            id: id.to_string(),
        })?;

    let subject_area =
        SubjectArea::parse(&subject_area).ok_or_else(|| StorageError::CorruptRow {
            table: "passages",
            message: format!("bad subject_area '{subject_area}'"),
        })?;

    Ok(Passage {
        id,
        title,
        subject_area,
        content,
        content_b,
        is_comparative,
        word_count,
        created_at,
    })
}

/// Subject area of the most recently created passage, for round-robin
/// rotation of generation jobs.
pub async fn most_recent_subject_area(
    pool: &DbPool,
) -> Result<Option<SubjectArea>, StorageError> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT subject_area FROM passages ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(row.and_then(|(s,)| SubjectArea::parse(&s)))
}

/// Total and comparative passage counts, for the comparative-ratio trigger.
pub async fn comparative_stats(pool: &DbPool) -> Result<(i64, i64), StorageError> {
    let row: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_comparative THEN 1 ELSE 0 END), 0)
         FROM passages",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(row)
}

/// Count distinct passages with at least one servable item in the bucket.
pub async fn count_distinct_in_bucket(
    pool: &DbPool,
    min_diff: i64,
    max_diff: i64,
) -> Result<i64, StorageError> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT i.passage_id) FROM items i
         WHERE i.section = 'reading_comprehension' AND i.passage_id IS NOT NULL
           AND i.difficulty_score BETWEEN ?1 AND ?2
           AND i.validation_status IN ('passed', 'unvalidated')
           AND (i.quality_score IS NULL OR i.quality_score >= 0.50)",
    )
    .bind(min_diff)
    .bind(max_diff)
    .fetch_one(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(row.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;
    use crate::storage::items::test_support::seed_passage_with_items;

    #[tokio::test]
    async fn get_missing_passage_is_not_found() {
        let pool = init_test_db().await.expect("init db");
        let err = get_passage(&pool, 1).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { entity: "passage", .. }));
    }

    #[tokio::test]
    async fn seeded_passage_round_trips() {
        let pool = init_test_db().await.expect("init db");
        let ids = seed_passage_with_items(&pool, 3, 50).await;
        let item = crate::storage::items::get_item_with_choices(&pool, ids[0])
            .await
            .expect("item");
        let passage_id = item.item.passage_id.expect("passage id");

        let passage = get_passage(&pool, passage_id).await.expect("passage");
        assert_eq!(passage.subject_area, SubjectArea::Law);
        assert_eq!(passage.word_count, 460);
        assert!(!passage.is_comparative);
    }

    #[tokio::test]
    async fn most_recent_subject_area_empty_is_none() {
        let pool = init_test_db().await.expect("init db");
        assert!(most_recent_subject_area(&pool).await.expect("query").is_none());
    }

    #[tokio::test]
    async fn comparative_stats_counts() {
        let pool = init_test_db().await.expect("init db");
        seed_passage_with_items(&pool, 3, 50).await;
        let (total, comparative) = comparative_stats(&pool).await.expect("stats");
        assert_eq!(total, 1);
        assert_eq!(comparative, 0);
    }

    #[tokio::test]
    async fn distinct_bucket_count() {
        let pool = init_test_db().await.expect("init db");
        seed_passage_with_items(&pool, 3, 50).await;
        seed_passage_with_items(&pool, 3, 50).await;
        seed_passage_with_items(&pool, 3, 90).await;

        assert_eq!(count_distinct_in_bucket(&pool, 41, 60).await.expect("count"), 2);
        assert_eq!(count_distinct_in_bucket(&pool, 81, 100).await.expect("count"), 1);
        assert_eq!(count_distinct_in_bucket(&pool, 0, 20).await.expect("count"), 0);
    }
}

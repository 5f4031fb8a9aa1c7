//! Item and choice storage: batch persistence, adaptive drill queries,
//! seen-tracking joins, and serve/correct counters.

use super::DbPool;
use crate::error::StorageError;
use crate::model::{
    Choice, Difficulty, Item, ItemWithChoices, Section, SubjectArea, Subtype, ValidationStatus,
};

/// Servable predicate shared by every drill query. `i` is the items alias.
const SERVABLE: &str = "i.validation_status IN ('passed', 'unvalidated') \
     AND (i.quality_score IS NULL OR i.quality_score >= 0.50)";

/// Column list matching [`ItemRow`].
const ITEM_COLS: &str = "i.id, i.batch_id, i.passage_id, i.section, i.subtype, i.difficulty, \
     i.difficulty_score, i.stimulus, i.question_stem, i.correct_choice_id, i.quality_score, \
     i.validation_status, i.times_served, i.times_correct, i.created_at";

/// Ordering that puts unseen items first, then randomizes within each class.
const UNSEEN_FIRST: &str = "ORDER BY EXISTS (SELECT 1 FROM user_history h \
     WHERE h.user_id = ?1 AND h.item_id = i.id) ASC, RANDOM()";

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    batch_id: Option<i64>,
    passage_id: Option<i64>,
    section: String,
    subtype: String,
    difficulty: String,
    difficulty_score: i64,
    stimulus: String,
    question_stem: String,
    correct_choice_id: String,
    quality_score: Option<f64>,
    validation_status: String,
    times_served: i64,
    times_correct: i64,
    created_at: String,
}

impl ItemRow {
    fn into_item(self) -> Result<Item, StorageError> {
        let section = Section::parse(&self.section).ok_or_else(|| StorageError::CorruptRow {
            table: "items",
            message: format!("bad section '{}'", self.section),
        })?;
        let subtype =
            Subtype::parse(section, &self.subtype).ok_or_else(|| StorageError::CorruptRow {
                table: "items",
                message: format!("bad subtype '{}'", self.subtype),
            })?;
        let difficulty =
            Difficulty::parse(&self.difficulty).ok_or_else(|| StorageError::CorruptRow {
                table: "items",
                message: format!("bad difficulty '{}'", self.difficulty),
            })?;
        let validation_status = ValidationStatus::parse(&self.validation_status).ok_or_else(|| {
            StorageError::CorruptRow {
                table: "items",
                message: format!("bad validation_status '{}'", self.validation_status),
            }
        })?;

        Ok(Item {
            id: self.id,
            batch_id: self.batch_id,
            passage_id: self.passage_id,
            section,
            subtype,
            difficulty,
            difficulty_score: self.difficulty_score,
            stimulus: self.stimulus,
            question_stem: self.question_stem,
            correct_choice_id: self.correct_choice_id,
            quality_score: self.quality_score,
            validation_status,
            times_served: self.times_served,
            times_correct: self.times_correct,
            created_at: self.created_at,
        })
    }
}

/// A passage to be inserted with a batch.
#[derive(Debug, Clone)]
pub struct NewPassage {
    pub title: String,
    pub subject_area: SubjectArea,
    pub content: String,
    pub content_b: Option<String>,
    pub is_comparative: bool,
    pub word_count: i64,
}

/// A choice to be inserted with its item.
#[derive(Debug, Clone)]
pub struct NewChoice {
    pub choice_id: String,
    pub choice_text: String,
    pub explanation: String,
    pub is_correct: bool,
    pub wrong_answer_type: Option<String>,
}

/// An item to be inserted with a batch.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub section: Section,
    pub subtype: Subtype,
    pub difficulty: Difficulty,
    pub difficulty_score: i64,
    pub stimulus: String,
    pub question_stem: String,
    pub correct_choice_id: String,
    pub quality_score: Option<f64>,
    pub validation_status: ValidationStatus,
    pub choices: Vec<NewChoice>,
}

/// Persist a generated batch atomically: the passage (if any), then every
/// surviving item with its five choices. Returns the new item ids.
pub async fn save_generated_batch(
    pool: &DbPool,
    batch_id: Option<i64>,
    passage: Option<&NewPassage>,
    items: &[NewItem],
) -> Result<Vec<i64>, StorageError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    let passage_id = match passage {
        Some(p) => {
            let result = sqlx::query(
                "INSERT INTO passages (title, subject_area, content, content_b, is_comparative, word_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&p.title)
            .bind(p.subject_area.as_str())
            .bind(&p.content)
            .bind(&p.content_b)
            .bind(p.is_comparative)
            .bind(p.word_count)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Query { source: e })?;
            Some(result.last_insert_rowid())
        }
        None => None,
    };

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let result = sqlx::query(
            "INSERT INTO items (batch_id, passage_id, section, subtype, difficulty, \
                 difficulty_score, stimulus, question_stem, correct_choice_id, quality_score, \
                 validation_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(batch_id)
        .bind(passage_id)
        .bind(item.section.as_str())
        .bind(item.subtype.as_str())
        .bind(item.difficulty.as_str())
        .bind(item.difficulty_score)
        .bind(&item.stimulus)
        .bind(&item.question_stem)
        .bind(&item.correct_choice_id)
        .bind(item.quality_score)
        .bind(item.validation_status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

        let item_id = result.last_insert_rowid();
        for choice in &item.choices {
            sqlx::query(
                "INSERT INTO choices (item_id, choice_id, choice_text, explanation, is_correct, wrong_answer_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(item_id)
            .bind(&choice.choice_id)
            .bind(&choice.choice_text)
            .bind(&choice.explanation)
            .bind(choice.is_correct)
            .bind(&choice.wrong_answer_type)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Query { source: e })?;
        }
        ids.push(item_id);
    }

    tx.commit()
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(ids)
}

/// Fetch an item and its choices by id.
pub async fn get_item_with_choices(
    pool: &DbPool,
    id: i64,
) -> Result<ItemWithChoices, StorageError> {
    let row: Option<ItemRow> =
        sqlx::query_as(&format!("SELECT {ITEM_COLS} FROM items i WHERE i.id = ?1"))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| StorageError::Query { source: e })?;

    let row = row.ok_or_else(|| StorageError::NotFound {
        entity: "item",
        id: id.to_string(),
    })?;
    let item = row.into_item()?;
    let choices = get_choices(pool, id).await?;
    Ok(ItemWithChoices { item, choices })
}

/// Fetch the choices for an item, in label order.
pub async fn get_choices(pool: &DbPool, item_id: i64) -> Result<Vec<Choice>, StorageError> {
    let rows: Vec<(i64, i64, String, String, String, bool, Option<String>)> = sqlx::query_as(
        "SELECT id, item_id, choice_id, choice_text, explanation, is_correct, wrong_answer_type
         FROM choices WHERE item_id = ?1 ORDER BY choice_id",
    )
    .bind(item_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(rows
        .into_iter()
        .map(
            |(id, item_id, choice_id, choice_text, explanation, is_correct, wrong_answer_type)| {
                Choice {
                    id,
                    item_id,
                    choice_id,
                    choice_text,
                    explanation,
                    is_correct,
                    wrong_answer_type,
                }
            },
        )
        .collect())
}

/// Pick one servable item for a user in the given window, unseen-first.
pub async fn pick_one(
    pool: &DbPool,
    user_id: &str,
    section: Section,
    subtype: Subtype,
    min_diff: i64,
    max_diff: i64,
) -> Result<Option<ItemWithChoices>, StorageError> {
    let sql = format!(
        "SELECT {ITEM_COLS} FROM items i
         WHERE i.section = ?2 AND i.subtype = ?3
           AND i.difficulty_score BETWEEN ?4 AND ?5
           AND {SERVABLE}
         {UNSEEN_FIRST}
         LIMIT 1"
    );
    let row: Option<ItemRow> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(section.as_str())
        .bind(subtype.as_str())
        .bind(min_diff)
        .bind(max_diff)
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    attach_choices(pool, row).await
}

/// Pick up to `limit` servable items in the window, unseen-first.
pub async fn pick_many(
    pool: &DbPool,
    user_id: &str,
    section: Section,
    subtype: Option<Subtype>,
    min_diff: i64,
    max_diff: i64,
    limit: i64,
) -> Result<Vec<ItemWithChoices>, StorageError> {
    let rows: Vec<ItemRow> = match subtype {
        Some(subtype) => {
            let sql = format!(
                "SELECT {ITEM_COLS} FROM items i
                 WHERE i.section = ?2 AND i.subtype = ?3
                   AND i.difficulty_score BETWEEN ?4 AND ?5
                   AND {SERVABLE}
                 {UNSEEN_FIRST}
                 LIMIT ?6"
            );
            sqlx::query_as(&sql)
                .bind(user_id)
                .bind(section.as_str())
                .bind(subtype.as_str())
                .bind(min_diff)
                .bind(max_diff)
                .bind(limit)
                .fetch_all(pool)
                .await
        }
        None => {
            let sql = format!(
                "SELECT {ITEM_COLS} FROM items i
                 WHERE i.section = ?2
                   AND i.difficulty_score BETWEEN ?3 AND ?4
                   AND {SERVABLE}
                 {UNSEEN_FIRST}
                 LIMIT ?5"
            );
            sqlx::query_as(&sql)
                .bind(user_id)
                .bind(section.as_str())
                .bind(min_diff)
                .bind(max_diff)
                .bind(limit)
                .fetch_all(pool)
                .await
        }
    }
    .map_err(|e| StorageError::Query { source: e })?;

    collect_with_choices(pool, rows).await
}

/// Pick up to `limit` servable items from one passage, unseen-first.
/// Used for same-passage locality in reading-comprehension drills.
pub async fn pick_from_passage(
    pool: &DbPool,
    user_id: &str,
    passage_id: i64,
    min_diff: i64,
    max_diff: i64,
    limit: i64,
) -> Result<Vec<ItemWithChoices>, StorageError> {
    let sql = format!(
        "SELECT {ITEM_COLS} FROM items i
         WHERE i.passage_id = ?2
           AND i.difficulty_score BETWEEN ?3 AND ?4
           AND {SERVABLE}
         {UNSEEN_FIRST}
         LIMIT ?5"
    );
    let rows: Vec<ItemRow> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(passage_id)
        .bind(min_diff)
        .bind(max_diff)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    collect_with_choices(pool, rows).await
}

/// Find the passage with at least `min_unseen` unseen servable items in the
/// window, preferring the one with the most unseen items (random among ties).
pub async fn passage_with_unseen(
    pool: &DbPool,
    user_id: &str,
    min_diff: i64,
    max_diff: i64,
    min_unseen: i64,
) -> Result<Option<i64>, StorageError> {
    let sql = format!(
        "SELECT i.passage_id, COUNT(*) AS unseen FROM items i
         WHERE i.section = 'reading_comprehension' AND i.passage_id IS NOT NULL
           AND i.difficulty_score BETWEEN ?2 AND ?3
           AND {SERVABLE}
           AND NOT EXISTS (SELECT 1 FROM user_history h
                           WHERE h.user_id = ?1 AND h.item_id = i.id)
         GROUP BY i.passage_id
         HAVING COUNT(*) >= ?4
         ORDER BY unseen DESC, RANDOM()
         LIMIT 1"
    );
    let row: Option<(i64, i64)> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(min_diff)
        .bind(max_diff)
        .bind(min_unseen)
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    Ok(row.map(|(passage_id, _)| passage_id))
}

/// Count servable items in a difficulty bucket.
pub async fn count_servable_in_bucket(
    pool: &DbPool,
    section: Section,
    subtype: Option<Subtype>,
    min_diff: i64,
    max_diff: i64,
) -> Result<i64, StorageError> {
    let row: (i64,) = match subtype {
        Some(subtype) => {
            let sql = format!(
                "SELECT COUNT(*) FROM items i
                 WHERE i.section = ?1 AND i.subtype = ?2
                   AND i.difficulty_score BETWEEN ?3 AND ?4 AND {SERVABLE}"
            );
            sqlx::query_as(&sql)
                .bind(section.as_str())
                .bind(subtype.as_str())
                .bind(min_diff)
                .bind(max_diff)
                .fetch_one(pool)
                .await
        }
        None => {
            let sql = format!(
                "SELECT COUNT(*) FROM items i
                 WHERE i.section = ?1
                   AND i.difficulty_score BETWEEN ?2 AND ?3 AND {SERVABLE}"
            );
            sqlx::query_as(&sql)
                .bind(section.as_str())
                .bind(min_diff)
                .bind(max_diff)
                .fetch_one(pool)
                .await
        }
    }
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(row.0)
}

/// Count servable items this user has never answered for a (section, subtype).
pub async fn count_unseen_servable(
    pool: &DbPool,
    user_id: &str,
    section: Section,
    subtype: Subtype,
) -> Result<i64, StorageError> {
    let sql = format!(
        "SELECT COUNT(*) FROM items i
         WHERE i.section = ?2 AND i.subtype = ?3 AND {SERVABLE}
           AND NOT EXISTS (SELECT 1 FROM user_history h
                           WHERE h.user_id = ?1 AND h.item_id = i.id)"
    );
    let row: (i64,) = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(section.as_str())
        .bind(subtype.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    Ok(row.0)
}

/// Increment an item's served counter.
pub async fn increment_served(pool: &DbPool, item_id: i64) -> Result<(), StorageError> {
    sqlx::query("UPDATE items SET times_served = times_served + 1 WHERE id = ?1")
        .bind(item_id)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Increment an item's correct counter.
pub async fn increment_correct(pool: &DbPool, item_id: i64) -> Result<(), StorageError> {
    sqlx::query("UPDATE items SET times_correct = times_correct + 1 WHERE id = ?1")
        .bind(item_id)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

/// Admin recalibration: set a new difficulty score and re-derive the band.
pub async fn recalibrate_difficulty(
    pool: &DbPool,
    item_id: i64,
    new_score: i64,
) -> Result<(), StorageError> {
    let new_score = new_score.clamp(0, 100);
    let band = Difficulty::for_target(new_score);
    sqlx::query("UPDATE items SET difficulty_score = ?1, difficulty = ?2 WHERE id = ?3")
        .bind(new_score)
        .bind(band.as_str())
        .bind(item_id)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(())
}

async fn attach_choices(
    pool: &DbPool,
    row: Option<ItemRow>,
) -> Result<Option<ItemWithChoices>, StorageError> {
    match row {
        Some(row) => {
            let item = row.into_item()?;
            let choices = get_choices(pool, item.id).await?;
            Ok(Some(ItemWithChoices { item, choices }))
        }
        None => Ok(None),
    }
}

async fn collect_with_choices(
    pool: &DbPool,
    rows: Vec<ItemRow>,
) -> Result<Vec<ItemWithChoices>, StorageError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let item = row.into_item()?;
        let choices = get_choices(pool, item.id).await?;
        out.push(ItemWithChoices { item, choices });
    }
    Ok(out)
}

//! Export and import of the servable item set.
//!
//! Used to seed a fresh store from an existing one. Import dedupes on
//! (stimulus, question_stem), so re-importing the same file is a no-op,
//! and passages shared by several exported items are inserted once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::DbPool;
use crate::error::StorageError;
use crate::model::{Difficulty, Section, SubjectArea, Subtype, ValidationStatus};

/// A choice in the export format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedChoice {
    pub choice_id: String,
    pub choice_text: String,
    pub explanation: String,
    pub is_correct: bool,
    #[serde(default)]
    pub wrong_answer_type: Option<String>,
}

/// A passage in the export format, embedded in each of its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedPassage {
    pub title: String,
    pub subject_area: SubjectArea,
    pub content: String,
    #[serde(default)]
    pub content_b: Option<String>,
    #[serde(default)]
    pub is_comparative: bool,
    pub word_count: i64,
}

/// One item in the export format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedItem {
    pub section: Section,
    pub subtype: String,
    pub difficulty: Difficulty,
    pub difficulty_score: i64,
    pub stimulus: String,
    pub question_stem: String,
    pub correct_choice_id: String,
    #[serde(default)]
    pub quality_score: Option<f64>,
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub passage: Option<ExportedPassage>,
    pub choices: Vec<ExportedChoice>,
}

/// Export every servable item, with choices and its passage embedded.
pub async fn export_servable(pool: &DbPool) -> Result<Vec<ExportedItem>, StorageError> {
    let rows: Vec<(i64, Option<i64>, String, String, String, i64, String, String, String, Option<f64>, String)> =
        sqlx::query_as(
            "SELECT i.id, i.passage_id, i.section, i.subtype, i.difficulty, i.difficulty_score,
                    i.stimulus, i.question_stem, i.correct_choice_id, i.quality_score,
                    i.validation_status
             FROM items i
             WHERE i.validation_status IN ('passed', 'unvalidated')
               AND (i.quality_score IS NULL OR i.quality_score >= 0.50)
             ORDER BY i.id",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    let mut passages: HashMap<i64, ExportedPassage> = HashMap::new();
    let mut out = Vec::with_capacity(rows.len());

    for (
        id,
        passage_id,
        section,
        subtype,
        difficulty,
        difficulty_score,
        stimulus,
        question_stem,
        correct_choice_id,
        quality_score,
        validation_status,
    ) in rows
    {
        let section = Section::parse(&section).ok_or_else(|| StorageError::CorruptRow {
            table: "items",
            message: format!("bad section '{section}'"),
        })?;
        let difficulty =
            Difficulty::parse(&difficulty).ok_or_else(|| StorageError::CorruptRow {
                table: "items",
                message: format!("bad difficulty '{difficulty}'"),
            })?;
        let validation_status = ValidationStatus::parse(&validation_status).ok_or_else(|| {
            StorageError::CorruptRow {
                table: "items",
                message: format!("bad validation_status '{validation_status}'"),
            }
        })?;

        let passage = match passage_id {
            Some(pid) => Some(match passages.get(&pid) {
                Some(p) => p.clone(),
                None => {
                    let p = super::passages::get_passage(pool, pid).await?;
                    let exported = ExportedPassage {
                        title: p.title,
                        subject_area: p.subject_area,
                        content: p.content,
                        content_b: p.content_b,
                        is_comparative: p.is_comparative,
                        word_count: p.word_count,
                    };
                    passages.insert(pid, exported.clone());
                    exported
                }
            }),
            None => None,
        };

        let choices = super::items::get_choices(pool, id)
            .await?
            .into_iter()
            .map(|c| ExportedChoice {
                choice_id: c.choice_id,
                choice_text: c.choice_text,
                explanation: c.explanation,
                is_correct: c.is_correct,
                wrong_answer_type: c.wrong_answer_type,
            })
            .collect();

        out.push(ExportedItem {
            section,
            subtype,
            difficulty,
            difficulty_score,
            stimulus,
            question_stem,
            correct_choice_id,
            quality_score,
            validation_status,
            passage,
            choices,
        });
    }

    Ok(out)
}

/// Import items, skipping any whose (stimulus, question_stem) already
/// exists. Returns the number actually inserted.
pub async fn import_items(pool: &DbPool, items: &[ExportedItem]) -> Result<u32, StorageError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    // Passages shared by several items are inserted once, keyed by their
    // (title, content).
    let mut inserted_passages: HashMap<(String, String), i64> = HashMap::new();
    let mut inserted = 0u32;

    for item in items {
        if Subtype::parse(item.section, &item.subtype).is_none() {
            return Err(StorageError::CorruptRow {
                table: "items",
                message: format!("bad subtype '{}' in import", item.subtype),
            });
        }

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM items WHERE stimulus = ?1 AND question_stem = ?2",
        )
        .bind(&item.stimulus)
        .bind(&item.question_stem)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
        if existing.is_some() {
            continue;
        }

        let passage_id = match &item.passage {
            Some(p) => {
                let key = (p.title.clone(), p.content.clone());
                match inserted_passages.get(&key) {
                    Some(id) => Some(*id),
                    None => {
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
                        let id = result.last_insert_rowid();
                        inserted_passages.insert(key, id);
                        Some(id)
                    }
                }
            }
            None => None,
        };

        let result = sqlx::query(
            "INSERT INTO items (passage_id, section, subtype, difficulty, difficulty_score,
                 stimulus, question_stem, correct_choice_id, quality_score, validation_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(passage_id)
        .bind(item.section.as_str())
        .bind(&item.subtype)
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

        inserted += 1;
    }

    tx.commit()
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    Ok(inserted)
}

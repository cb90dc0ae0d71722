//! Tag and entity associations

use rusqlite::{params, OptionalExtension, Transaction};

use super::Store;
use crate::models::{normalize_labels, TagResponse};
use crate::storage::StorageResult;

impl Store {
    /// All tags ever used, with the number of questions currently using them
    pub fn get_tags(&self) -> StorageResult<Vec<TagResponse>> {
        self.db.read(|tx| {
            let mut stmt = tx.prepare(
                r#"
                SELECT t.tag, COUNT(qt.question_id) AS count
                FROM tags t
                LEFT JOIN question_tags qt ON t.id = qt.tag_id
                GROUP BY t.id
                ORDER BY count DESC, t.tag
                "#,
            )?;

            let tags = stmt
                .query_map([], |row| {
                    Ok(TagResponse {
                        tag: row.get(0)?,
                        questions_count: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tags)
        })
    }
}

/// Replace the tag set of a question, creating tag rows on first use
pub(crate) fn replace_question_tags(
    tx: &Transaction,
    question_id: i64,
    tags: &[String],
) -> StorageResult<()> {
    tx.execute(
        "DELETE FROM question_tags WHERE question_id = ?",
        params![question_id],
    )?;
    for tag in normalize_labels(tags) {
        let tag_id = get_or_create_tag(tx, &tag)?;
        tx.execute(
            "INSERT INTO question_tags (question_id, tag_id) VALUES (?, ?)",
            params![question_id, tag_id],
        )?;
    }
    Ok(())
}

/// Replace the entity set of a question
pub(crate) fn replace_question_entities(
    tx: &Transaction,
    question_id: i64,
    entities: &[String],
) -> StorageResult<()> {
    tx.execute(
        "DELETE FROM question_entities WHERE question_id = ?",
        params![question_id],
    )?;
    for entity_ref in normalize_labels(entities) {
        let entity_id = get_or_create_entity(tx, &entity_ref)?;
        tx.execute(
            "INSERT INTO question_entities (question_id, entity_id) VALUES (?, ?)",
            params![question_id, entity_id],
        )?;
    }
    Ok(())
}

/// Get or create a tag, returning its ID
fn get_or_create_tag(tx: &Transaction, name: &str) -> StorageResult<i64> {
    let existing: Option<i64> = tx
        .query_row("SELECT id FROM tags WHERE tag = ?", params![name], |row| {
            row.get(0)
        })
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute("INSERT INTO tags (tag) VALUES (?)", params![name])?;
    Ok(tx.last_insert_rowid())
}

/// Get or create an entity reference, returning its ID
fn get_or_create_entity(tx: &Transaction, entity_ref: &str) -> StorageResult<i64> {
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM entities WHERE entity_ref = ?",
            params![entity_ref],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(
        "INSERT INTO entities (entity_ref) VALUES (?)",
        params![entity_ref],
    )?;
    Ok(tx.last_insert_rowid())
}

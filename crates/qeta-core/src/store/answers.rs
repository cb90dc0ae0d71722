//! Answer lifecycle

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::attachments::replace_answer_images;
use super::rows::{exists, load_answer};
use super::{now_ms, Store};
use crate::models::Answer;
use crate::storage::StorageResult;

impl Store {
    /// Answer an existing question
    ///
    /// Returns `None` if the question does not exist.
    pub fn answer_question(
        &self,
        user: &str,
        question_id: i64,
        content: &str,
        images: &[i64],
    ) -> StorageResult<Option<Answer>> {
        self.db.write(|tx| {
            if !exists(tx, "questions", question_id)? {
                return Ok(None);
            }

            tx.execute(
                "INSERT INTO answers (question_id, author, content, created) VALUES (?, ?, ?, ?)",
                params![question_id, user, content, now_ms()],
            )?;
            let id = tx.last_insert_rowid();
            replace_answer_images(tx, id, images)?;
            debug!("Posted answer {} on question {} by {}", id, question_id, user);

            load_answer(tx, id, Some(user))
        })
    }

    /// Replace the content and images of an answer
    ///
    /// Returns `None` unless the answer belongs to `question_id` and was
    /// written by `user`.
    pub fn update_answer(
        &self,
        user: &str,
        question_id: i64,
        answer_id: i64,
        content: &str,
        images: &[i64],
    ) -> StorageResult<Option<Answer>> {
        self.db.write(|tx| {
            let updated = tx.execute(
                r#"
                UPDATE answers
                SET content = ?, updated = ?, updated_by = ?
                WHERE id = ? AND question_id = ? AND author = ?
                "#,
                params![content, now_ms(), user, answer_id, question_id, user],
            )?;
            if updated == 0 {
                debug!(
                    "Answer {} on question {} not updatable by {}",
                    answer_id, question_id, user
                );
                return Ok(None);
            }

            replace_answer_images(tx, answer_id, images)?;
            load_answer(tx, answer_id, Some(user))
        })
    }

    /// Fetch a single answer with its comments and votes
    pub fn get_answer(&self, answer_id: i64) -> StorageResult<Option<Answer>> {
        self.db.read(|tx| load_answer(tx, answer_id, None))
    }

    /// Delete an answer with its comments and votes
    ///
    /// Returns `true` iff the answer existed and `user` was its author.
    pub fn delete_answer(&self, user: &str, id: i64) -> StorageResult<bool> {
        self.db.write(|tx| {
            let question_id: Option<i64> = tx
                .query_row(
                    "SELECT question_id FROM answers WHERE id = ? AND author = ?",
                    params![id, user],
                    |row| row.get(0),
                )
                .optional()?;

            match question_id {
                Some(question_id) => {
                    tx.execute("DELETE FROM answers WHERE id = ?", params![id])?;
                    debug!("Deleted answer {} from question {}", id, question_id);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }
}

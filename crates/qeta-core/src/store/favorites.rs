//! Per-user favorite questions

use rusqlite::params;

use super::rows::exists;
use super::{now_ms, Store};
use crate::storage::StorageResult;

impl Store {
    /// Add a question to `user`'s favorites; idempotent
    ///
    /// Returns `false` only if the question does not exist.
    pub fn favorite_question(&self, user: &str, question_id: i64) -> StorageResult<bool> {
        self.db.write(|tx| {
            if !exists(tx, "questions", question_id)? {
                return Ok(false);
            }
            tx.execute(
                "INSERT OR IGNORE INTO favorites (user, question_id, created) VALUES (?, ?, ?)",
                params![user, question_id, now_ms()],
            )?;
            Ok(true)
        })
    }

    /// Remove a question from `user`'s favorites; idempotent
    pub fn unfavorite_question(&self, user: &str, question_id: i64) -> StorageResult<bool> {
        self.db.write(|tx| {
            if !exists(tx, "questions", question_id)? {
                return Ok(false);
            }
            tx.execute(
                "DELETE FROM favorites WHERE user = ? AND question_id = ?",
                params![user, question_id],
            )?;
            Ok(true)
        })
    }
}

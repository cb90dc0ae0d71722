//! Voting and correct-answer marking
//!
//! Votes are keyed by `(target, author)`; a repeated vote replaces the
//! earlier one. The stored score of the target is recomputed from the vote
//! rows inside the same transaction as the upsert.

use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

use super::rows::{exists, question_author};
use super::{now_ms, Store};
use crate::storage::{StorageError, StorageResult};

/// Which kind of content a vote applies to
#[derive(Debug, Clone, Copy)]
enum Target {
    Question,
    Answer,
}

impl Target {
    fn table(self) -> &'static str {
        match self {
            Target::Question => "questions",
            Target::Answer => "answers",
        }
    }

    fn upsert_sql(self) -> &'static str {
        match self {
            Target::Question => {
                r#"
                INSERT INTO question_votes (question_id, author, score, timestamp)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(question_id, author)
                DO UPDATE SET score = excluded.score, timestamp = excluded.timestamp
                "#
            }
            Target::Answer => {
                r#"
                INSERT INTO answer_votes (answer_id, author, score, timestamp)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(answer_id, author)
                DO UPDATE SET score = excluded.score, timestamp = excluded.timestamp
                "#
            }
        }
    }

    fn rescore_sql(self) -> &'static str {
        match self {
            Target::Question => {
                "UPDATE questions SET score = \
                 (SELECT COALESCE(SUM(score), 0) FROM question_votes WHERE question_id = ?1) \
                 WHERE id = ?1"
            }
            Target::Answer => {
                "UPDATE answers SET score = \
                 (SELECT COALESCE(SUM(score), 0) FROM answer_votes WHERE answer_id = ?1) \
                 WHERE id = ?1"
            }
        }
    }
}

impl Store {
    /// Set `user`'s vote on a question
    ///
    /// Returns `false` if the question does not exist. Scores outside
    /// `-1..=1` fail with [`StorageError::InvalidVote`].
    pub fn vote_question(&self, user: &str, question_id: i64, score: i32) -> StorageResult<bool> {
        self.vote(Target::Question, user, question_id, score)
    }

    /// Set `user`'s vote on an answer
    pub fn vote_answer(&self, user: &str, answer_id: i64, score: i32) -> StorageResult<bool> {
        self.vote(Target::Answer, user, answer_id, score)
    }

    fn vote(&self, target: Target, user: &str, id: i64, score: i32) -> StorageResult<bool> {
        if !(-1..=1).contains(&score) {
            return Err(StorageError::InvalidVote { score });
        }

        self.db.write(|tx| {
            if !exists(tx, target.table(), id)? {
                return Ok(false);
            }
            tx.execute(target.upsert_sql(), params![id, user, score, now_ms()])?;
            tx.execute(target.rescore_sql(), params![id])?;
            debug!("{:?} {} voted {} by {}", target, id, score, user);
            Ok(true)
        })
    }

    /// Mark an answer as the correct one for its question
    ///
    /// Only the question's author may mark. Returns `false` if the answer is
    /// not part of the question, or if a different answer is already marked
    /// correct. Marking the already-correct answer again succeeds.
    pub fn mark_answer_correct(
        &self,
        user: &str,
        question_id: i64,
        answer_id: i64,
    ) -> StorageResult<bool> {
        self.db.write(|tx| {
            let correct = match answer_state(tx, user, question_id, answer_id)? {
                Some(correct) => correct,
                None => return Ok(false),
            };
            if correct {
                return Ok(true);
            }

            let other_correct = tx
                .prepare("SELECT 1 FROM answers WHERE question_id = ? AND correct = 1")?
                .exists(params![question_id])?;
            if other_correct {
                debug!(
                    "Question {} already has a correct answer, not marking {}",
                    question_id, answer_id
                );
                return Ok(false);
            }

            tx.execute(
                "UPDATE answers SET correct = 1 WHERE id = ?",
                params![answer_id],
            )?;
            Ok(true)
        })
    }

    /// Clear the correct flag of an answer; idempotent
    pub fn mark_answer_incorrect(
        &self,
        user: &str,
        question_id: i64,
        answer_id: i64,
    ) -> StorageResult<bool> {
        self.db.write(|tx| {
            if answer_state(tx, user, question_id, answer_id)?.is_none() {
                return Ok(false);
            }
            tx.execute(
                "UPDATE answers SET correct = 0 WHERE id = ?",
                params![answer_id],
            )?;
            Ok(true)
        })
    }
}

/// Current `correct` flag of an answer, if `user` authored its question and
/// the answer belongs to it
fn answer_state(
    tx: &Transaction,
    user: &str,
    question_id: i64,
    answer_id: i64,
) -> StorageResult<Option<bool>> {
    match question_author(tx, question_id)? {
        Some(author) if author == user => {}
        _ => {
            debug!(
                "{} may not mark answers of question {}",
                user, question_id
            );
            return Ok(None);
        }
    }

    Ok(tx
        .query_row(
            "SELECT correct FROM answers WHERE id = ? AND question_id = ?",
            params![answer_id, question_id],
            |row| row.get(0),
        )
        .optional()?)
}

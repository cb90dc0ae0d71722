//! Question lifecycle and view accounting

use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

use super::attachments::replace_question_images;
use super::rows::{load_question, question_author, Hydration};
use super::tags::{replace_question_entities, replace_question_tags};
use super::{now_ms, Store};
use crate::models::{Question, QuestionDraft};
use crate::storage::{StorageError, StorageResult};

impl Store {
    /// Create a question owned by `user`
    pub fn post_question(&self, user: &str, draft: &QuestionDraft) -> StorageResult<Question> {
        self.db.write(|tx| {
            let now = now_ms();
            tx.execute(
                "INSERT INTO questions (author, title, content, created) VALUES (?, ?, ?, ?)",
                params![user, draft.title, draft.content, now],
            )?;
            let id = tx.last_insert_rowid();
            write_associations(tx, id, draft)?;
            debug!("Posted question {} by {}", id, user);

            let question = load_question(tx, id, user, Hydration::FULL, now)?;
            question.ok_or(StorageError::Database(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    /// Replace title, content, tags, entities and images of a question
    ///
    /// Returns `None` if the question does not exist or `user` is not its author.
    pub fn update_question(
        &self,
        id: i64,
        user: &str,
        draft: &QuestionDraft,
    ) -> StorageResult<Option<Question>> {
        self.db.write(|tx| {
            match question_author(tx, id)? {
                Some(author) if author == user => {}
                Some(_) => {
                    debug!("Rejected update of question {} by non-author {}", id, user);
                    return Ok(None);
                }
                None => return Ok(None),
            }

            let now = now_ms();
            tx.execute(
                r#"
                UPDATE questions
                SET title = ?, content = ?, updated = ?, updated_by = ?
                WHERE id = ?
                "#,
                params![draft.title, draft.content, now, user, id],
            )?;
            write_associations(tx, id, draft)?;

            load_question(tx, id, user, Hydration::FULL, now)
        })
    }

    /// Fetch a question with answers, comments, votes and entities
    ///
    /// With `record_view` the view counter is incremented in the same
    /// transaction as the read.
    pub fn get_question(
        &self,
        user: &str,
        id: i64,
        record_view: bool,
    ) -> StorageResult<Option<Question>> {
        if record_view {
            self.db.write(|tx| fetch_question(tx, user, id, true))
        } else {
            self.db.read(|tx| fetch_question(tx, user, id, false))
        }
    }

    /// Fetch the question an answer belongs to, as [`Store::get_question`]
    pub fn get_question_by_answer_id(
        &self,
        user: &str,
        answer_id: i64,
        record_view: bool,
    ) -> StorageResult<Option<Question>> {
        if record_view {
            self.db
                .write(|tx| fetch_question_by_answer(tx, user, answer_id, true))
        } else {
            self.db
                .read(|tx| fetch_question_by_answer(tx, user, answer_id, false))
        }
    }

    /// Delete a question and everything attached to it
    ///
    /// Returns `true` iff the question existed and `user` was its author.
    pub fn delete_question(&self, user: &str, id: i64) -> StorageResult<bool> {
        self.db.write(|tx| {
            let deleted = tx.execute(
                "DELETE FROM questions WHERE id = ? AND author = ?",
                params![id, user],
            )?;
            debug!("Delete question {} by {}: {} row(s)", id, user, deleted);
            Ok(deleted > 0)
        })
    }
}

fn write_associations(tx: &Transaction, id: i64, draft: &QuestionDraft) -> StorageResult<()> {
    replace_question_tags(tx, id, &draft.tags)?;
    replace_question_entities(tx, id, &draft.entities)?;
    replace_question_images(tx, id, &draft.images)
}

fn fetch_question_by_answer(
    tx: &Transaction,
    user: &str,
    answer_id: i64,
    record_view: bool,
) -> StorageResult<Option<Question>> {
    let question_id: Option<i64> = tx
        .query_row(
            "SELECT question_id FROM answers WHERE id = ?",
            params![answer_id],
            |row| row.get(0),
        )
        .optional()?;

    match question_id {
        Some(id) => fetch_question(tx, user, id, record_view),
        None => Ok(None),
    }
}

fn fetch_question(
    tx: &Transaction,
    user: &str,
    id: i64,
    record_view: bool,
) -> StorageResult<Option<Question>> {
    if record_view {
        let updated = tx.execute(
            "UPDATE questions SET views = views + 1 WHERE id = ?",
            params![id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        debug!("Recorded view of question {}", id);
    }
    load_question(tx, id, user, Hydration::FULL, now_ms())
}

#[cfg(test)]
mod tests {
    use crate::models::QuestionDraft;
    use crate::store::test_support::store;

    #[test]
    fn test_post_question() {
        let store = store();
        let draft = QuestionDraft::new("How do I deploy?", "Details")
            .tag("backstage")
            .entity("component:default/portal");

        let q = store.post_question("alice", &draft).unwrap();
        assert!(q.id > 0);
        assert_eq!(q.author, "alice");
        assert_eq!(q.title, "How do I deploy?");
        assert_eq!(q.score, 0);
        assert_eq!(q.views, 0);
        assert_eq!(q.answers_count, 0);
        assert!(!q.correct_answer);
        assert!(!q.favorite);
        assert!(q.own);
        assert!(q.own_vote.is_none());
        assert!(q.updated.is_none());
        assert_eq!(q.tags, vec!["backstage"]);
        assert_eq!(q.entities, Some(vec!["component:default/portal".to_string()]));
        assert_eq!(q.answers.as_deref().map(|a| a.len()), Some(0));
    }

    #[test]
    fn test_ids_follow_creation_order() {
        let store = store();
        let a = store.post_question("alice", &QuestionDraft::new("a", "a")).unwrap();
        let b = store.post_question("alice", &QuestionDraft::new("b", "b")).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_update_question_by_author() {
        let store = store();
        let q = store
            .post_question("alice", &QuestionDraft::new("Old", "old").tag("a").tag("b"))
            .unwrap();

        let updated = store
            .update_question(q.id, "alice", &QuestionDraft::new("New", "new").tag("c"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.content, "new");
        assert_eq!(updated.tags, vec!["c"]);
        assert!(updated.updated.is_some());
        assert_eq!(updated.updated_by.as_deref(), Some("alice"));
    }

    #[test]
    fn test_update_question_rejects_other_users() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();

        assert!(store
            .update_question(q.id, "mallory", &QuestionDraft::new("x", "x"))
            .unwrap()
            .is_none());
        assert!(store
            .update_question(9999, "alice", &QuestionDraft::new("x", "x"))
            .unwrap()
            .is_none());

        let unchanged = store.get_question("alice", q.id, false).unwrap().unwrap();
        assert_eq!(unchanged.title, "t");
    }

    #[test]
    fn test_get_question_counts_views() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();

        for _ in 0..5 {
            store.get_question("bob", q.id, true).unwrap().unwrap();
        }
        let q = store.get_question("bob", q.id, false).unwrap().unwrap();
        assert_eq!(q.views, 5);
        assert!(!q.own);
    }

    #[test]
    fn test_get_missing_question() {
        let store = store();
        assert!(store.get_question("alice", 42, true).unwrap().is_none());
        assert!(store.get_question("alice", 42, false).unwrap().is_none());
    }

    #[test]
    fn test_get_question_by_answer_id() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();
        let a = store
            .answer_question("bob", q.id, "answer", &[])
            .unwrap()
            .unwrap();

        let found = store
            .get_question_by_answer_id("carol", a.id, true)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, q.id);
        assert_eq!(found.views, 1);
        assert_eq!(found.answers_count, 1);

        assert!(store
            .get_question_by_answer_id("carol", 999, true)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_question_by_author() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();

        assert!(store.delete_question("alice", q.id).unwrap());
        assert!(store.get_question("alice", q.id, true).unwrap().is_none());
        assert!(!store.delete_question("alice", q.id).unwrap());
    }

    #[test]
    fn test_delete_question_by_other_user() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();

        assert!(!store.delete_question("bob", q.id).unwrap());
        assert!(store.get_question("alice", q.id, false).unwrap().is_some());
    }

    #[test]
    fn test_delete_question_cascades() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();
        let a = store
            .answer_question("bob", q.id, "answer", &[])
            .unwrap()
            .unwrap();
        store.vote_question("bob", q.id, 1).unwrap();
        store.vote_answer("alice", a.id, 1).unwrap();
        store.comment_question(q.id, "bob", "nice").unwrap();
        store.comment_answer(a.id, "alice", "thanks").unwrap();
        store.favorite_question("bob", q.id).unwrap();

        assert!(store.delete_question("alice", q.id).unwrap());
        assert!(store.get_answer(a.id).unwrap().is_none());

        let orphans: i64 = store
            .db
            .read(|tx| {
                Ok(tx.query_row(
                    r#"
                    SELECT (SELECT COUNT(*) FROM answers)
                         + (SELECT COUNT(*) FROM question_votes)
                         + (SELECT COUNT(*) FROM answer_votes)
                         + (SELECT COUNT(*) FROM question_comments)
                         + (SELECT COUNT(*) FROM answer_comments)
                         + (SELECT COUNT(*) FROM favorites)
                    "#,
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_out_of_range_timestamp_is_an_error() {
        let store = store();
        let id = store
            .post_question("alice", &QuestionDraft::new("t", "c"))
            .unwrap()
            .id;
        store
            .db
            .write(|tx| {
                tx.execute(
                    "UPDATE questions SET created = ?1 WHERE id = ?2",
                    rusqlite::params![i64::MAX, id],
                )?;
                Ok(())
            })
            .unwrap();

        let err = store.get_question("alice", id, false).unwrap_err();
        assert!(matches!(
            err,
            crate::storage::StorageError::Database(rusqlite::Error::FromSqlConversionFailure(..))
        ));
    }
}

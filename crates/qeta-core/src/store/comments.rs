//! Comments on questions and answers

use rusqlite::params;
use tracing::debug;

use super::rows::{exists, load_answer, load_question, Hydration};
use super::{now_ms, Store};
use crate::models::{Answer, Question};
use crate::storage::StorageResult;

impl Store {
    /// Comment on a question, returning the refreshed question
    pub fn comment_question(
        &self,
        question_id: i64,
        user: &str,
        content: &str,
    ) -> StorageResult<Option<Question>> {
        self.db.write(|tx| {
            if !exists(tx, "questions", question_id)? {
                return Ok(None);
            }
            let now = now_ms();
            tx.execute(
                "INSERT INTO question_comments (question_id, author, content, created) VALUES (?, ?, ?, ?)",
                params![question_id, user, content, now],
            )?;
            load_question(tx, question_id, user, Hydration::FULL, now)
        })
    }

    /// Comment on an answer, returning the refreshed answer
    pub fn comment_answer(
        &self,
        answer_id: i64,
        user: &str,
        content: &str,
    ) -> StorageResult<Option<Answer>> {
        self.db.write(|tx| {
            if !exists(tx, "answers", answer_id)? {
                return Ok(None);
            }
            tx.execute(
                "INSERT INTO answer_comments (answer_id, author, content, created) VALUES (?, ?, ?, ?)",
                params![answer_id, user, content, now_ms()],
            )?;
            load_answer(tx, answer_id, Some(user))
        })
    }

    /// Delete one of `user`'s comments on a question
    ///
    /// Returns `None` if the comment is not on that question or belongs to
    /// someone else.
    pub fn delete_question_comment(
        &self,
        question_id: i64,
        comment_id: i64,
        user: &str,
    ) -> StorageResult<Option<Question>> {
        self.db.write(|tx| {
            let deleted = tx.execute(
                "DELETE FROM question_comments WHERE id = ? AND question_id = ? AND author = ?",
                params![comment_id, question_id, user],
            )?;
            if deleted == 0 {
                debug!("Comment {} on question {} not deletable by {}", comment_id, question_id, user);
                return Ok(None);
            }
            load_question(tx, question_id, user, Hydration::FULL, now_ms())
        })
    }

    /// Delete one of `user`'s comments on an answer
    pub fn delete_answer_comment(
        &self,
        answer_id: i64,
        comment_id: i64,
        user: &str,
    ) -> StorageResult<Option<Answer>> {
        self.db.write(|tx| {
            let deleted = tx.execute(
                "DELETE FROM answer_comments WHERE id = ? AND answer_id = ? AND author = ?",
                params![comment_id, answer_id, user],
            )?;
            if deleted == 0 {
                debug!("Comment {} on answer {} not deletable by {}", comment_id, answer_id, user);
                return Ok(None);
            }
            load_answer(tx, answer_id, Some(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::models::QuestionDraft;
    use crate::store::test_support::store;

    #[test]
    fn test_comment_question() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();

        let q = store.comment_question(q.id, "bob", "Which version?").unwrap().unwrap();
        let comments = q.comments.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, "bob");
        assert_eq!(comments[0].content, "Which version?");
        assert!(comments[0].own);

        assert!(store.comment_question(404, "bob", "?").unwrap().is_none());
    }

    #[test]
    fn test_comment_answer() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();
        let a = store.answer_question("bob", q.id, "a", &[]).unwrap().unwrap();

        let a = store.comment_answer(a.id, "alice", "Thanks").unwrap().unwrap();
        assert_eq!(a.comments.len(), 1);
        assert!(a.comments[0].own);
        assert!(!a.own);

        assert!(store.comment_answer(404, "alice", "?").unwrap().is_none());
    }

    #[test]
    fn test_delete_question_comment() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();
        let commented = store.comment_question(q.id, "bob", "hi").unwrap().unwrap();
        let comment_id = commented.comments.unwrap()[0].id;

        assert!(store
            .delete_question_comment(q.id, comment_id, "alice")
            .unwrap()
            .is_none());

        let q = store
            .delete_question_comment(q.id, comment_id, "bob")
            .unwrap()
            .unwrap();
        assert_eq!(q.comments.unwrap().len(), 0);

        assert!(store
            .delete_question_comment(q.id, comment_id, "bob")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_answer_comment_checks_parent() {
        let store = store();
        let q = store.post_question("alice", &QuestionDraft::new("t", "c")).unwrap();
        let a1 = store.answer_question("bob", q.id, "one", &[]).unwrap().unwrap();
        let a2 = store.answer_question("bob", q.id, "two", &[]).unwrap().unwrap();
        let comment_id = store
            .comment_answer(a1.id, "carol", "hm")
            .unwrap()
            .unwrap()
            .comments[0]
            .id;

        assert!(store
            .delete_answer_comment(a2.id, comment_id, "carol")
            .unwrap()
            .is_none());

        let a1 = store
            .delete_answer_comment(a1.id, comment_id, "carol")
            .unwrap()
            .unwrap();
        assert!(a1.comments.is_empty());
    }
}

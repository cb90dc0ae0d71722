//! Time-bucketed rollups over questions, answers and votes
//!
//! Everything is computed from the same tables the CRUD operations write,
//! so results always match the current state after cascades.

use chrono::NaiveDate;
use rusqlite::types::ToSql;

use super::Store;
use crate::models::{Granularity, Statistic, StatisticsRequest};
use crate::storage::StorageResult;

#[derive(Debug, Clone, Copy)]
enum Rollup {
    TotalQuestions,
    TotalAnswers,
    UpvotedQuestions,
    UpvotedAnswers,
    UpvotedCorrectAnswers,
}

impl Rollup {
    /// (metric, time column, author column, FROM clause, fixed condition)
    fn parts(self) -> (&'static str, &'static str, &'static str, &'static str, Option<&'static str>) {
        match self {
            Rollup::TotalQuestions => ("COUNT(*)", "q.created", "q.author", "questions q", None),
            Rollup::TotalAnswers => ("COUNT(*)", "a.created", "a.author", "answers a", None),
            Rollup::UpvotedQuestions => (
                "SUM(v.score)",
                "v.timestamp",
                "q.author",
                "question_votes v JOIN questions q ON q.id = v.question_id",
                None,
            ),
            Rollup::UpvotedAnswers => (
                "SUM(v.score)",
                "v.timestamp",
                "a.author",
                "answer_votes v JOIN answers a ON a.id = v.answer_id",
                None,
            ),
            Rollup::UpvotedCorrectAnswers => (
                "SUM(v.score)",
                "v.timestamp",
                "a.author",
                "answer_votes v JOIN answers a ON a.id = v.answer_id",
                Some("a.correct = 1"),
            ),
        }
    }
}

/// SQL expression mapping a millisecond timestamp to the first day of its bucket
fn bucket_expr(granularity: Granularity, column: &str) -> String {
    let seconds = format!("{} / 1000, 'unixepoch'", column);
    match granularity {
        Granularity::Day => format!("strftime('%Y-%m-%d', {})", seconds),
        Granularity::Week => format!("date({}, 'weekday 0', '-6 days')", seconds),
        Granularity::Month => format!("strftime('%Y-%m-01', {})", seconds),
        Granularity::Year => format!("strftime('%Y-01-01', {})", seconds),
    }
}

impl Store {
    /// Sum of question vote scores per bucket
    pub fn get_most_upvoted_questions(
        &self,
        request: &StatisticsRequest,
    ) -> StorageResult<Vec<Statistic>> {
        self.rollup(Rollup::UpvotedQuestions, request)
    }

    /// Number of questions created per bucket
    pub fn get_total_questions(&self, request: &StatisticsRequest) -> StorageResult<Vec<Statistic>> {
        self.rollup(Rollup::TotalQuestions, request)
    }

    /// Sum of answer vote scores per bucket
    pub fn get_most_upvoted_answers(
        &self,
        request: &StatisticsRequest,
    ) -> StorageResult<Vec<Statistic>> {
        self.rollup(Rollup::UpvotedAnswers, request)
    }

    /// Sum of vote scores on correct answers per bucket
    pub fn get_most_upvoted_correct_answers(
        &self,
        request: &StatisticsRequest,
    ) -> StorageResult<Vec<Statistic>> {
        self.rollup(Rollup::UpvotedCorrectAnswers, request)
    }

    /// Number of answers created per bucket
    pub fn get_total_answers(&self, request: &StatisticsRequest) -> StorageResult<Vec<Statistic>> {
        self.rollup(Rollup::TotalAnswers, request)
    }

    fn rollup(&self, rollup: Rollup, request: &StatisticsRequest) -> StorageResult<Vec<Statistic>> {
        let (metric, time_col, author_col, from_sql, fixed) = rollup.parts();
        let options = &request.options;

        let mut conditions: Vec<String> = fixed.into_iter().map(str::to_string).collect();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(author) = &request.author {
            conditions.push(format!("{} = ?", author_col));
            args.push(Box::new(author.clone()));
        }
        if let Some(from) = options.from {
            conditions.push(format!("{} >= ?", time_col));
            args.push(Box::new(from.timestamp_millis()));
        }
        if let Some(to) = options.to {
            conditions.push(format!("{} < ?", time_col));
            args.push(Box::new(to.timestamp_millis()));
        }

        let where_sql = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} AS bucket, COALESCE({}, 0) FROM {}{} GROUP BY bucket ORDER BY bucket",
            bucket_expr(options.granularity, time_col),
            metric,
            from_sql,
            where_sql,
        );

        self.db.read(|tx| {
            let mut stmt = tx.prepare(&sql)?;
            let stats = stmt
                .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                    let bucket: String = row.get(0)?;
                    let date = NaiveDate::parse_from_str(&bucket, "%Y-%m-%d").map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    Ok(Statistic {
                        date,
                        total: row.get(1)?,
                        author: request.author.clone(),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(stats)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionDraft;
    use crate::store::test_support::store;
    use chrono::{TimeZone, Utc};
    use rusqlite::params;

    fn ms(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().timestamp_millis()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Move a question's creation time; tests only
    fn backdate_question(store: &Store, id: i64, created: i64) {
        store
            .db
            .write(|tx| {
                tx.execute(
                    "UPDATE questions SET created = ? WHERE id = ?",
                    params![created, id],
                )?;
                Ok(())
            })
            .unwrap();
    }

    fn backdate_votes(store: &Store, created: i64) {
        store
            .db
            .write(|tx| {
                tx.execute("UPDATE question_votes SET timestamp = ?", params![created])?;
                tx.execute("UPDATE answer_votes SET timestamp = ?", params![created])?;
                Ok(())
            })
            .unwrap();
    }

    fn post_on(store: &Store, author: &str, created: i64) -> i64 {
        let id = store
            .post_question(author, &QuestionDraft::new("t", "c"))
            .unwrap()
            .id;
        backdate_question(store, id, created);
        id
    }

    #[test]
    fn test_total_questions_per_day() {
        let store = store();
        post_on(&store, "alice", ms(2024, 3, 4));
        post_on(&store, "bob", ms(2024, 3, 4));
        post_on(&store, "alice", ms(2024, 3, 6));

        let stats = store
            .get_total_questions(&StatisticsRequest::new(Granularity::Day))
            .unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].date, date(2024, 3, 4));
        assert_eq!(stats[0].total, 2);
        assert_eq!(stats[1].date, date(2024, 3, 6));
        assert_eq!(stats[1].total, 1);
        assert!(stats[0].author.is_none());
    }

    #[test]
    fn test_buckets_start_on_first_day() {
        let store = store();
        // Wednesday and Sunday of the same ISO week
        post_on(&store, "alice", ms(2024, 3, 6));
        post_on(&store, "alice", ms(2024, 3, 10));
        post_on(&store, "alice", ms(2024, 5, 20));

        let weeks = store
            .get_total_questions(&StatisticsRequest::new(Granularity::Week))
            .unwrap();
        assert_eq!(weeks[0].date, date(2024, 3, 4));
        assert_eq!(weeks[0].total, 2);

        let months = store
            .get_total_questions(&StatisticsRequest::new(Granularity::Month))
            .unwrap();
        assert_eq!(
            months.iter().map(|s| s.date).collect::<Vec<_>>(),
            vec![date(2024, 3, 1), date(2024, 5, 1)]
        );

        let years = store
            .get_total_questions(&StatisticsRequest::new(Granularity::Year))
            .unwrap();
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].date, date(2024, 1, 1));
        assert_eq!(years[0].total, 3);
    }

    #[test]
    fn test_author_and_range() {
        let store = store();
        post_on(&store, "alice", ms(2024, 1, 10));
        post_on(&store, "alice", ms(2024, 2, 10));
        post_on(&store, "bob", ms(2024, 2, 10));

        let request = StatisticsRequest::new(Granularity::Month)
            .for_author("alice")
            .between(
                Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            );
        let stats = store.get_total_questions(&request).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total, 1);
        assert_eq!(stats[0].author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_upvote_rollups() {
        let store = store();
        let q = post_on(&store, "alice", ms(2024, 1, 1));
        let a1 = store.answer_question("bob", q, "one", &[]).unwrap().unwrap();
        let a2 = store.answer_question("carol", q, "two", &[]).unwrap().unwrap();

        store.vote_question("bob", q, 1).unwrap();
        store.vote_question("carol", q, 1).unwrap();
        store.vote_answer("alice", a1.id, 1).unwrap();
        store.vote_answer("dave", a1.id, 1).unwrap();
        store.vote_answer("alice", a2.id, -1).unwrap();
        store.mark_answer_correct("alice", q, a1.id).unwrap();
        backdate_votes(&store, ms(2024, 1, 2));

        let request = StatisticsRequest::new(Granularity::Day);
        let questions = store.get_most_upvoted_questions(&request).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].date, date(2024, 1, 2));
        assert_eq!(questions[0].total, 2);

        let answers = store.get_most_upvoted_answers(&request).unwrap();
        assert_eq!(answers[0].total, 1);

        let correct = store.get_most_upvoted_correct_answers(&request).unwrap();
        assert_eq!(correct[0].total, 2);

        let bobs = store
            .get_most_upvoted_answers(&request.clone().for_author("bob"))
            .unwrap();
        assert_eq!(bobs[0].total, 2);

        let totals = store.get_total_answers(&request).unwrap();
        assert_eq!(totals.iter().map(|s| s.total).sum::<i64>(), 2);
    }

    #[test]
    fn test_rollups_follow_cascades() {
        let store = store();
        let q = post_on(&store, "alice", ms(2024, 1, 1));
        store.answer_question("bob", q, "a", &[]).unwrap();
        store.vote_question("bob", q, 1).unwrap();
        assert!(store.delete_question("alice", q).unwrap());

        let request = StatisticsRequest::new(Granularity::Day);
        assert!(store.get_total_questions(&request).unwrap().is_empty());
        assert!(store.get_total_answers(&request).unwrap().is_empty());
        assert!(store.get_most_upvoted_questions(&request).unwrap().is_empty());
    }
}

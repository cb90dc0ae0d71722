//! Row mapping and hydration shared by the store operations
//!
//! All derived fields are computed here, per read, relative to the
//! requesting user.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, RowIndex, Transaction};

use crate::models::{Answer, Comment, Question, QuestionsOptions, Vote};
use crate::storage::StorageResult;

/// Which children of a question to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Hydration {
    pub answers: bool,
    pub votes: bool,
    pub entities: bool,
    pub comments: bool,
    pub trend: bool,
}

impl Hydration {
    /// Everything a single-question view needs
    pub const FULL: Hydration = Hydration {
        answers: true,
        votes: true,
        entities: true,
        comments: true,
        trend: false,
    };

    pub fn from_options(options: &QuestionsOptions) -> Self {
        Self {
            answers: options.include_answers,
            votes: options.include_votes,
            entities: options.include_entities,
            comments: false,
            trend: options.include_trend,
        }
    }
}

/// Millisecond timestamp column as UTC; out-of-range values fail the row
pub(crate) fn datetime<I: RowIndex + Copy>(row: &Row, idx: I) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    to_datetime(row, idx, ms)
}

pub(crate) fn opt_datetime<I: RowIndex + Copy>(
    row: &Row,
    idx: I,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let ms: Option<i64> = row.get(idx)?;
    ms.map(|ms| to_datetime(row, idx, ms)).transpose()
}

fn to_datetime<I: RowIndex>(row: &Row, idx: I, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx.idx(row.as_ref()).unwrap_or_default(),
            Type::Integer,
            format!("timestamp out of range: {}", ms).into(),
        )
    })
}

/// SELECT list for questions; `user` and `now` are the positional
/// parameter numbers holding the requesting user and the current time
pub(crate) fn question_columns(user: usize, now: usize) -> String {
    format!(
        "q.id, q.author, q.title, q.content, q.created, q.updated, q.updated_by, q.score, q.views, \
         (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id) AS answers_count, \
         EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND a.correct = 1) AS correct_answer, \
         EXISTS (SELECT 1 FROM favorites f WHERE f.question_id = q.id AND f.user = ?{user}) AS favorite, \
         (SELECT v.score FROM question_votes v WHERE v.question_id = q.id AND v.author = ?{user}) AS own_vote, \
         {trend}(q.score, (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id), q.views, q.created, ?{now}) AS trend",
        user = user,
        now = now,
        trend = crate::storage::trend::TREND_FUNCTION,
    )
}

/// Map a row selected with [`question_columns`]; children are left empty
pub(crate) fn question_from_row(row: &Row, user: &str) -> rusqlite::Result<Question> {
    let author: String = row.get("author")?;
    Ok(Question {
        id: row.get("id")?,
        own: author == user,
        author,
        title: row.get("title")?,
        content: row.get("content")?,
        created: datetime(row, "created")?,
        updated: opt_datetime(row, "updated")?,
        updated_by: row.get("updated_by")?,
        score: row.get("score")?,
        views: row.get("views")?,
        answers_count: row.get("answers_count")?,
        correct_answer: row.get("correct_answer")?,
        favorite: row.get("favorite")?,
        own_vote: row.get("own_vote")?,
        tags: Vec::new(),
        entities: None,
        images: Vec::new(),
        answers: None,
        votes: None,
        comments: None,
        trend: Some(row.get("trend")?),
    })
}

const ANSWER_COLUMNS: &str = "a.id, a.question_id, a.author, a.content, a.correct, a.created, \
     a.updated, a.updated_by, a.score, \
     (SELECT v.score FROM answer_votes v WHERE v.answer_id = a.id AND v.author = ?1) AS own_vote";

fn answer_from_row(row: &Row, user: Option<&str>) -> rusqlite::Result<Answer> {
    let author: String = row.get("author")?;
    Ok(Answer {
        id: row.get("id")?,
        question_id: row.get("question_id")?,
        own: user == Some(author.as_str()),
        author,
        content: row.get("content")?,
        correct: row.get("correct")?,
        created: datetime(row, "created")?,
        updated: opt_datetime(row, "updated")?,
        updated_by: row.get("updated_by")?,
        score: row.get("score")?,
        own_vote: row.get("own_vote")?,
        images: Vec::new(),
        votes: None,
        comments: Vec::new(),
    })
}

/// Load a question with the requested children
pub(crate) fn load_question(
    tx: &Transaction,
    id: i64,
    user: &str,
    hydration: Hydration,
    now_ms: i64,
) -> StorageResult<Option<Question>> {
    let sql = format!(
        "SELECT {} FROM questions q WHERE q.id = ?3",
        question_columns(1, 2)
    );
    let question = tx
        .query_row(&sql, params![user, now_ms, id], |row| {
            question_from_row(row, user)
        })
        .optional()?;

    match question {
        Some(mut q) => {
            hydrate_question(tx, &mut q, user, hydration)?;
            Ok(Some(q))
        }
        None => Ok(None),
    }
}

/// Fill in the children of a question mapped by [`question_from_row`]
pub(crate) fn hydrate_question(
    tx: &Transaction,
    question: &mut Question,
    user: &str,
    hydration: Hydration,
) -> StorageResult<()> {
    question.tags = load_question_tags(tx, question.id)?;
    question.images = load_ids(
        tx,
        "SELECT attachment_id FROM question_attachments WHERE question_id = ? ORDER BY attachment_id",
        question.id,
    )?;

    if !hydration.trend {
        question.trend = None;
    }
    if hydration.entities {
        question.entities = Some(load_question_entities(tx, question.id)?);
    }
    if hydration.votes {
        question.votes = Some(load_votes(
            tx,
            "SELECT author, score, timestamp FROM question_votes WHERE question_id = ? ORDER BY timestamp",
            question.id,
        )?);
    }
    if hydration.comments {
        question.comments = Some(load_comments(
            tx,
            "SELECT id, author, content, created, updated, updated_by FROM question_comments \
             WHERE question_id = ? ORDER BY created, id",
            question.id,
            Some(user),
        )?);
    }
    if hydration.answers {
        question.answers = Some(load_answers(tx, question.id, Some(user), hydration.votes)?);
    }
    Ok(())
}

/// Load all answers of a question, correct first, then by score
pub(crate) fn load_answers(
    tx: &Transaction,
    question_id: i64,
    user: Option<&str>,
    with_votes: bool,
) -> StorageResult<Vec<Answer>> {
    let sql = format!(
        "SELECT {} FROM answers a WHERE a.question_id = ?2 \
         ORDER BY a.correct DESC, a.score DESC, a.created, a.id",
        ANSWER_COLUMNS
    );
    let mut stmt = tx.prepare(&sql)?;
    let answers = stmt
        .query_map(params![user, question_id], |row| answer_from_row(row, user))?
        .collect::<Result<Vec<_>, _>>()?;

    answers
        .into_iter()
        .map(|mut answer| {
            hydrate_answer(tx, &mut answer, user, with_votes)?;
            Ok(answer)
        })
        .collect()
}

/// Load a single answer with comments, images and votes
pub(crate) fn load_answer(
    tx: &Transaction,
    answer_id: i64,
    user: Option<&str>,
) -> StorageResult<Option<Answer>> {
    let sql = format!("SELECT {} FROM answers a WHERE a.id = ?2", ANSWER_COLUMNS);
    let answer = tx
        .query_row(&sql, params![user, answer_id], |row| {
            answer_from_row(row, user)
        })
        .optional()?;

    match answer {
        Some(mut a) => {
            hydrate_answer(tx, &mut a, user, true)?;
            Ok(Some(a))
        }
        None => Ok(None),
    }
}

fn hydrate_answer(
    tx: &Transaction,
    answer: &mut Answer,
    user: Option<&str>,
    with_votes: bool,
) -> StorageResult<()> {
    answer.images = load_ids(
        tx,
        "SELECT attachment_id FROM answer_attachments WHERE answer_id = ? ORDER BY attachment_id",
        answer.id,
    )?;
    answer.comments = load_comments(
        tx,
        "SELECT id, author, content, created, updated, updated_by FROM answer_comments \
         WHERE answer_id = ? ORDER BY created, id",
        answer.id,
        user,
    )?;
    if with_votes {
        answer.votes = Some(load_votes(
            tx,
            "SELECT author, score, timestamp FROM answer_votes WHERE answer_id = ? ORDER BY timestamp",
            answer.id,
        )?);
    }
    Ok(())
}

pub(crate) fn load_question_tags(tx: &Transaction, question_id: i64) -> StorageResult<Vec<String>> {
    load_labels(
        tx,
        r#"
        SELECT t.tag FROM tags t
        JOIN question_tags qt ON t.id = qt.tag_id
        WHERE qt.question_id = ?
        ORDER BY t.tag
        "#,
        question_id,
    )
}

pub(crate) fn load_question_entities(
    tx: &Transaction,
    question_id: i64,
) -> StorageResult<Vec<String>> {
    load_labels(
        tx,
        r#"
        SELECT e.entity_ref FROM entities e
        JOIN question_entities qe ON e.id = qe.entity_id
        WHERE qe.question_id = ?
        ORDER BY e.entity_ref
        "#,
        question_id,
    )
}

fn load_labels(tx: &Transaction, sql: &str, id: i64) -> StorageResult<Vec<String>> {
    let mut stmt = tx.prepare(sql)?;
    let labels = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(labels)
}

fn load_ids(tx: &Transaction, sql: &str, id: i64) -> StorageResult<Vec<i64>> {
    let mut stmt = tx.prepare(sql)?;
    let ids = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn load_votes(tx: &Transaction, sql: &str, id: i64) -> StorageResult<Vec<Vote>> {
    let mut stmt = tx.prepare(sql)?;
    let votes = stmt
        .query_map(params![id], |row| {
            Ok(Vote {
                author: row.get(0)?,
                score: row.get(1)?,
                timestamp: datetime(row, 2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(votes)
}

fn load_comments(
    tx: &Transaction,
    sql: &str,
    id: i64,
    user: Option<&str>,
) -> StorageResult<Vec<Comment>> {
    let mut stmt = tx.prepare(sql)?;
    let comments = stmt
        .query_map(params![id], |row| {
            let author: String = row.get(1)?;
            Ok(Comment {
                id: row.get(0)?,
                own: user == Some(author.as_str()),
                author,
                content: row.get(2)?,
                created: datetime(row, 3)?,
                updated: opt_datetime(row, 4)?,
                updated_by: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

/// Author of a question, `None` if it does not exist
pub(crate) fn question_author(tx: &Transaction, id: i64) -> StorageResult<Option<String>> {
    Ok(tx
        .query_row(
            "SELECT author FROM questions WHERE id = ?",
            params![id],
            |row| row.get(0),
        )
        .optional()?)
}

/// Check a row exists by id in `table`
pub(crate) fn exists(tx: &Transaction, table: &str, id: i64) -> StorageResult<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
    Ok(tx.prepare(&sql)?.exists(params![id])?)
}

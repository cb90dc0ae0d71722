//! Filtered, ordered and paginated question listings
//!
//! The page and the `total` count are built from the same WHERE clause, so
//! `total` always describes the set the page was cut from.

use rusqlite::types::ToSql;
use tracing::debug;

use super::rows::{hydrate_question, question_columns, question_from_row, Hydration};
use super::{now_ms, Store};
use crate::models::{
    normalize_labels, OrderBy, Questions, QuestionsOptions, SortOrder, TagsRelation,
};
use crate::storage::StorageResult;

/// WHERE clause with explicitly numbered parameters
#[derive(Default)]
struct Filter {
    clauses: Vec<String>,
    args: Vec<Box<dyn ToSql>>,
}

impl Filter {
    /// Bind a value and return its placeholder
    fn bind<T: ToSql + 'static>(&mut self, value: T) -> String {
        self.args.push(Box::new(value));
        format!("?{}", self.args.len())
    }

    fn push(&mut self, clause: String) {
        self.clauses.push(clause);
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    fn build(user: &str, options: &QuestionsOptions) -> Self {
        let mut filter = Filter::default();

        if let Some(author) = &options.author {
            let p = filter.bind(author.clone());
            filter.push(format!("q.author = {}", p));
        }

        let tags = normalize_labels(&options.tags);
        if !tags.is_empty() {
            let placeholders: Vec<String> = tags.iter().map(|t| filter.bind(t.clone())).collect();
            let list = placeholders.join(", ");
            match options.tags_relation {
                TagsRelation::Any => filter.push(format!(
                    "q.id IN (SELECT qt.question_id FROM question_tags qt \
                     JOIN tags t ON t.id = qt.tag_id WHERE t.tag IN ({}))",
                    list
                )),
                TagsRelation::All => {
                    let count = filter.bind(tags.len() as i64);
                    filter.push(format!(
                        "q.id IN (SELECT qt.question_id FROM question_tags qt \
                         JOIN tags t ON t.id = qt.tag_id WHERE t.tag IN ({}) \
                         GROUP BY qt.question_id HAVING COUNT(DISTINCT t.tag) = {})",
                        list, count
                    ))
                }
            }
        }

        if let Some(entity) = options.entity.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            let p = filter.bind(entity.to_string());
            filter.push(format!(
                "q.id IN (SELECT qe.question_id FROM question_entities qe \
                 JOIN entities e ON e.id = qe.entity_id WHERE e.entity_ref = {})",
                p
            ));
        }

        if options.favorite {
            let p = filter.bind(user.to_string());
            filter.push(format!(
                "EXISTS (SELECT 1 FROM favorites f WHERE f.question_id = q.id AND f.user = {})",
                p
            ));
        }

        if let Some(query) = options.search_query.as_deref().and_then(fts_query) {
            let p = filter.bind(query);
            filter.push(format!(
                "q.id IN (SELECT rowid FROM questions_fts WHERE questions_fts MATCH {})",
                p
            ));
        }

        let presence = [
            (
                options.has_answers,
                "EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id)",
            ),
            (
                options.has_correct_answer,
                "EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND a.correct = 1)",
            ),
            (
                options.has_votes,
                "EXISTS (SELECT 1 FROM question_votes v WHERE v.question_id = q.id)",
            ),
        ];
        for (wanted, exists) in presence {
            match wanted {
                Some(true) => filter.push(exists.to_string()),
                Some(false) => filter.push(format!("NOT {}", exists)),
                None => {}
            }
        }

        filter
    }
}

/// Turn free text into an FTS5 query matching every word
///
/// Each word is quoted so operators and punctuation in user input are
/// matched literally. Words without any letters or digits are dropped.
fn fts_query(input: &str) -> Option<String> {
    let terms: Vec<String> = input
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .map(|word| format!("\"{}\"", word.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

fn order_clause(options: &QuestionsOptions) -> String {
    if options.random {
        return "RANDOM()".to_string();
    }

    let column = match options.order_by {
        OrderBy::Views => "q.views",
        OrderBy::Score => "q.score",
        OrderBy::AnswersCount => "answers_count",
        OrderBy::Created => "q.created",
        OrderBy::Updated => "COALESCE(q.updated, q.created)",
        OrderBy::Trend => "trend",
    };
    let direction = match options.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    format!("{column} {direction}, q.id {direction}")
}

impl Store {
    /// List questions matching `options`, with the total match count
    pub fn get_questions(&self, user: &str, options: &QuestionsOptions) -> StorageResult<Questions> {
        let limit = i64::from(self.config.page_limit(options.limit));
        let offset = i64::from(options.offset.unwrap_or(0));
        let hydration = Hydration::from_options(options);

        self.db.read(|tx| {
            let mut filter = Filter::build(user, options);
            let where_sql = filter.sql();

            let count_sql = format!("SELECT COUNT(*) FROM questions q{}", where_sql);
            let total: i64 = tx.query_row(
                &count_sql,
                rusqlite::params_from_iter(filter.args.iter()),
                |row| row.get(0),
            )?;

            let n = filter.args.len();
            filter.args.push(Box::new(user.to_string()));
            filter.args.push(Box::new(now_ms()));
            filter.args.push(Box::new(limit));
            filter.args.push(Box::new(offset));

            let page_sql = format!(
                "SELECT {} FROM questions q{} ORDER BY {} LIMIT ?{} OFFSET ?{}",
                question_columns(n + 1, n + 2),
                where_sql,
                order_clause(options),
                n + 3,
                n + 4,
            );
            debug!("Listing questions: {}", page_sql);

            let mut stmt = tx.prepare(&page_sql)?;
            let mut questions = stmt
                .query_map(rusqlite::params_from_iter(filter.args.iter()), |row| {
                    question_from_row(row, user)
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for question in &mut questions {
                hydrate_question(tx, question, user, hydration)?;
            }

            Ok(Questions { questions, total })
        })
    }
}

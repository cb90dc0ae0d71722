//! SQLite schema for the question & answer store
//!
//! Derived values (answer counts, correct-answer flags, favorites, own votes)
//! are never stored; they are computed by the queries in `store`. The only
//! aggregate kept on a row is `score`, recomputed from the vote table inside
//! the same transaction that changes a vote.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER,
            updated_by TEXT,
            score INTEGER NOT NULL DEFAULT 0,
            views INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS answers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            correct INTEGER NOT NULL DEFAULT 0,
            created INTEGER NOT NULL,
            updated INTEGER,
            updated_by TEXT,
            score INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );

        -- One vote per (target, author); re-voting overwrites
        CREATE TABLE IF NOT EXISTS question_votes (
            question_id INTEGER NOT NULL,
            author TEXT NOT NULL,
            score INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            PRIMARY KEY (question_id, author),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS answer_votes (
            answer_id INTEGER NOT NULL,
            author TEXT NOT NULL,
            score INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            PRIMARY KEY (answer_id, author),
            FOREIGN KEY (answer_id) REFERENCES answers(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS question_comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER,
            updated_by TEXT,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS answer_comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            answer_id INTEGER NOT NULL,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER,
            updated_by TEXT,
            FOREIGN KEY (answer_id) REFERENCES answers(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS favorites (
            user TEXT NOT NULL,
            question_id INTEGER NOT NULL,
            created INTEGER NOT NULL,
            PRIMARY KEY (user, question_id),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );

        -- Tags table (normalized, rows outlive their questions)
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tag TEXT UNIQUE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS question_tags (
            question_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            PRIMARY KEY (question_id, tag_id),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        );

        -- Catalog entity references
        CREATE TABLE IF NOT EXISTS entities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_ref TEXT UNIQUE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS question_entities (
            question_id INTEGER NOT NULL,
            entity_id INTEGER NOT NULL,
            PRIMARY KEY (question_id, entity_id),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
            FOREIGN KEY (entity_id) REFERENCES entities(id) ON DELETE CASCADE
        );

        -- Attachments are immutable; links live in the junction tables below
        CREATE TABLE IF NOT EXISTS attachments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            location_type TEXT NOT NULL,
            location_uri TEXT NOT NULL,
            path TEXT,
            binary_image BLOB,
            mime_type TEXT NOT NULL,
            extension TEXT NOT NULL,
            creator TEXT,
            created INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS question_attachments (
            question_id INTEGER NOT NULL,
            attachment_id INTEGER NOT NULL,
            PRIMARY KEY (question_id, attachment_id),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
            FOREIGN KEY (attachment_id) REFERENCES attachments(id)
        );

        CREATE TABLE IF NOT EXISTS answer_attachments (
            answer_id INTEGER NOT NULL,
            attachment_id INTEGER NOT NULL,
            PRIMARY KEY (answer_id, attachment_id),
            FOREIGN KEY (answer_id) REFERENCES answers(id) ON DELETE CASCADE,
            FOREIGN KEY (attachment_id) REFERENCES attachments(id)
        );

        -- Indexes for common query patterns

        CREATE INDEX IF NOT EXISTS idx_questions_author ON questions(author);
        CREATE INDEX IF NOT EXISTS idx_questions_created ON questions(created);
        CREATE INDEX IF NOT EXISTS idx_answers_question_id ON answers(question_id);
        CREATE INDEX IF NOT EXISTS idx_answers_author ON answers(author);
        CREATE INDEX IF NOT EXISTS idx_answers_created ON answers(created);
        CREATE INDEX IF NOT EXISTS idx_question_votes_timestamp ON question_votes(timestamp);
        CREATE INDEX IF NOT EXISTS idx_answer_votes_timestamp ON answer_votes(timestamp);
        CREATE INDEX IF NOT EXISTS idx_question_comments_question_id ON question_comments(question_id);
        CREATE INDEX IF NOT EXISTS idx_answer_comments_answer_id ON answer_comments(answer_id);
        CREATE INDEX IF NOT EXISTS idx_favorites_question_id ON favorites(question_id);
        CREATE INDEX IF NOT EXISTS idx_question_tags_tag_id ON question_tags(tag_id);
        CREATE INDEX IF NOT EXISTS idx_question_entities_entity_id ON question_entities(entity_id);

        -- At most one correct answer per question
        CREATE UNIQUE INDEX IF NOT EXISTS idx_answers_one_correct
            ON answers(question_id) WHERE correct = 1;

        -- Full-text search over questions (external content)
        CREATE VIRTUAL TABLE IF NOT EXISTS questions_fts USING fts5(
            title,
            content,
            content='questions',
            content_rowid='id'
        );

        CREATE TRIGGER IF NOT EXISTS questions_ai AFTER INSERT ON questions BEGIN
            INSERT INTO questions_fts(rowid, title, content)
            VALUES (NEW.id, NEW.title, NEW.content);
        END;

        CREATE TRIGGER IF NOT EXISTS questions_ad AFTER DELETE ON questions BEGIN
            INSERT INTO questions_fts(questions_fts, rowid, title, content)
            VALUES ('delete', OLD.id, OLD.title, OLD.content);
        END;

        -- Only re-index when searchable text changes (views/score churn a lot)
        CREATE TRIGGER IF NOT EXISTS questions_au AFTER UPDATE OF title, content ON questions BEGIN
            INSERT INTO questions_fts(questions_fts, rowid, title, content)
            VALUES ('delete', OLD.id, OLD.title, OLD.content);
            INSERT INTO questions_fts(rowid, title, content)
            VALUES (NEW.id, NEW.title, NEW.content);
        END;
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables = table_names(&conn);
        for expected in [
            "questions",
            "answers",
            "question_votes",
            "answer_votes",
            "question_comments",
            "answer_comments",
            "favorites",
            "tags",
            "question_tags",
            "entities",
            "question_entities",
            "attachments",
            "question_attachments",
            "answer_attachments",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version() {
        let conn = Connection::open_in_memory().unwrap();

        assert!(needs_init(&conn));

        init_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
        assert!(!needs_init(&conn));
    }

    #[test]
    fn test_fts_tracks_question_text() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO questions (author, title, content, created) VALUES ('u', 'Kafka lag', 'consumer', 0)",
            [],
        )
        .unwrap();
        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM questions_fts WHERE questions_fts MATCH 'kafka'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hits, 1);

        conn.execute("UPDATE questions SET title = 'Pulsar lag'", [])
            .unwrap();
        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM questions_fts WHERE questions_fts MATCH 'kafka'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hits, 0);
    }

    #[test]
    fn test_single_correct_answer_index() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute_batch(
            r#"
            INSERT INTO questions (id, author, title, content, created) VALUES (1, 'u', 't', 'c', 0);
            INSERT INTO answers (question_id, author, content, correct, created) VALUES (1, 'a', 'x', 1, 0);
            "#,
        )
        .unwrap();
        let second = conn.execute(
            "INSERT INTO answers (question_id, author, content, correct, created) VALUES (1, 'b', 'y', 1, 0)",
            [],
        );
        assert!(second.is_err());
    }

    #[test]
    fn test_indexes_exist() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.contains(&"idx_questions_created".to_string()));
        assert!(indexes.contains(&"idx_answers_question_id".to_string()));
        assert!(indexes.contains(&"idx_answers_one_correct".to_string()));
    }
}

//! The question and answer store
//!
//! `Store` is the single entry point for every operation on the knowledge
//! base. Each operation runs in exactly one transaction on the underlying
//! [`Database`], so the invariants below hold under concurrent use:
//!
//! - `score` is always the sum of the current votes on its target
//! - at most one answer per question is marked correct
//! - deleting a question removes its answers, comments, votes and favorites
//! - derived fields (`answers_count`, `favorite`, `own_vote`, `own`) are
//!   computed at read time for the requesting user
//!
//! Missing rows and ownership mismatches are reported the same way, as
//! `Ok(None)` or `Ok(false)`.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::open(&Config::load()?)?;
//!
//! let question = store.post_question("user:default/alice", &QuestionDraft::new("Title", "Body"))?;
//! store.vote_question("user:default/bob", question.id, 1)?;
//!
//! let listing = store.get_questions("user:default/bob", &QuestionsOptions::default())?;
//! ```

mod answers;
mod attachments;
mod comments;
mod favorites;
mod listing;
mod questions;
mod rows;
mod statistics;
mod tags;
mod votes;

use chrono::Utc;

use crate::config::Config;
use crate::storage::{Database, StorageResult};

/// Q&A store backed by SQLite
///
/// `Store` is `Send + Sync`; share it between threads with `Arc<Store>`.
pub struct Store {
    db: Database,
    config: Config,
}

impl Store {
    /// Open the store at the configured data directory
    pub fn open(config: &Config) -> StorageResult<Self> {
        let db = Database::open(&config.sqlite_path(), config.trend_gravity)?;
        Ok(Self {
            db,
            config: config.clone(),
        })
    }

    /// Open a store that lives only as long as this value
    pub fn open_in_memory(config: &Config) -> StorageResult<Self> {
        let db = Database::open_in_memory(config.trend_gravity)?;
        Ok(Self {
            db,
            config: config.clone(),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Current time in milliseconds since the epoch, the unit all timestamps are stored in
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn store() -> Store {
        Store::open_in_memory(&Config::default()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionDraft, QuestionsOptions};
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Store>();
    }

    #[test]
    fn test_open_creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let store = Store::open(&config).unwrap();
        assert!(config.sqlite_path().exists());
        assert_eq!(store.config(), &config);
    }

    #[test]
    fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let id = {
            let store = Store::open(&config).unwrap();
            let q = store
                .post_question(
                    "alice",
                    &QuestionDraft::new("Persistent", "Body").tag("rust"),
                )
                .unwrap();
            store.vote_question("bob", q.id, 1).unwrap();
            q.id
        };

        let store = Store::open(&config).unwrap();
        let q = store.get_question("bob", id, false).unwrap().unwrap();
        assert_eq!(q.title, "Persistent");
        assert_eq!(q.tags, vec!["rust"]);
        assert_eq!(q.score, 1);
        assert_eq!(q.own_vote, Some(1));

        let listing = store
            .get_questions("bob", &QuestionsOptions::default())
            .unwrap();
        assert_eq!(listing.total, 1);
    }
}

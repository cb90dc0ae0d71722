//! Storage layer
//!
//! Owns the SQLite connection and the transactional boundary every store
//! operation runs inside.
//!
//! ## Architecture
//!
//! - One connection guarded by a `Mutex`, so `Database` is `Send + Sync`
//! - Each call to [`Database::read`] or [`Database::write`] opens exactly one
//!   transaction and releases both the transaction and the lock before
//!   returning, on success and on error alike
//! - An `Err` from the closure drops the transaction uncommitted, which rolls
//!   back every statement it ran

pub mod error;
pub mod schema;
pub mod trend;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};

/// SQLite database handle shared by all store operations
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database file at `path`
    pub fn open(path: &Path, trend_gravity: f64) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        debug!("Opened SQLite database at {:?}", path);
        Self::init_connection(conn, trend_gravity)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(trend_gravity: f64) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn, trend_gravity)
    }

    fn init_connection(conn: Connection, trend_gravity: f64) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        trend::register_trend_function(&conn, trend_gravity)?;

        if needs_init(&conn) {
            init_schema(&conn)?;
            info!("Initialized qeta schema version {}", SCHEMA_VERSION);
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside a deferred (read) transaction
    pub fn read<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Transaction) -> StorageResult<T>,
    {
        self.run(TransactionBehavior::Deferred, f)
    }

    /// Run `f` inside an immediate (write) transaction
    ///
    /// The write lock is taken up front so concurrent writers queue instead
    /// of failing on lock upgrade.
    pub fn write<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Transaction) -> StorageResult<T>,
    {
        self.run(TransactionBehavior::Immediate, f)
    }

    fn run<T, F>(&self, behavior: TransactionBehavior, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Transaction) -> StorageResult<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(behavior)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

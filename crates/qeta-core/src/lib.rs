//! Qeta Core Library
//!
//! This crate provides the data layer of qeta, a question and answer
//! knowledge base: questions, answers, comments, votes, favorites, tags,
//! attachments and usage statistics.
//!
//! # Architecture
//!
//! - **SQLite**: single source of truth, one transaction per operation
//! - Derived fields (answer counts, favorites, own votes, trend) are computed
//!   per read for the requesting user; nothing is cached
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open(&Config::load()?)?;
//!
//! // Ask a question
//! let question = store.post_question("user:default/alice", &QuestionDraft::new("Title", "Body").tag("rust"))?;
//!
//! // Answer and vote
//! let answer = store.answer_question("user:default/bob", question.id, "Answer", &[])?;
//! store.vote_question("user:default/bob", question.id, 1)?;
//! ```
//!
//! # Modules
//!
//! - `store`: The question and answer store (main entry point)
//! - `models`: Questions, answers, attachments and query options
//! - `storage`: SQLite connection, schema and errors
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod storage;
pub mod store;

pub use config::Config;
pub use models::{
    Answer, Attachment, AttachmentParams, Comment, Granularity, LocationType, OrderBy, Question,
    QuestionDraft, Questions, QuestionsOptions, SortOrder, Statistic, StatisticsOptions,
    StatisticsRequest, TagResponse, TagsRelation, Vote,
};
pub use storage::{StorageError, StorageResult};
pub use store::Store;

//! Data models for qeta
//!
//! Defines the entities served by the store (questions, answers, votes,
//! comments, attachments) and the option types accepted by its queries.
//! Field names serialize in camelCase to match the API layer's wire shape.
//!
//! Fields documented as *derived* are computed per read relative to the
//! requesting user and are never persisted.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A question and, depending on the query, its hydrated children
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub author: String,
    pub title: String,
    /// Markdown content
    pub content: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// Sum of all current vote scores
    pub score: i64,
    pub views: i64,
    /// Derived: number of answers
    pub answers_count: i64,
    /// Derived: at least one answer is marked correct
    pub correct_answer: bool,
    /// Derived: the requesting user favorited this question
    pub favorite: bool,
    /// Derived: the requesting user's vote, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub own_vote: Option<i32>,
    /// Derived: the requesting user is the author
    pub own: bool,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
    /// Linked attachment ids
    pub images: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<Vote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    /// Derived: time-decayed popularity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
}

/// An answer to a question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub author: String,
    pub content: String,
    pub correct: bool,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub own_vote: Option<i32>,
    pub own: bool,
    pub images: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<Vote>>,
    pub comments: Vec<Comment>,
}

/// One user's vote on a question or answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub author: String,
    pub score: i32,
    pub timestamp: DateTime<Utc>,
}

/// A comment on a question or answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub own: bool,
}

/// Everything a caller supplies when posting or replacing a question
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Catalog entity references
    pub entities: Vec<String>,
    /// Attachment ids embedded in the content
    pub images: Vec<i64>,
}

impl QuestionDraft {
    /// Create a draft with a title and content
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add an entity reference
    pub fn entity(mut self, entity_ref: impl Into<String>) -> Self {
        self.entities.push(entity_ref.into());
        self
    }

    /// Add an attachment id
    pub fn image(mut self, id: i64) -> Self {
        self.images.push(id);
        self
    }
}

/// Trim, drop empties and deduplicate a list of labels (tags, entity refs)
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One page of questions plus the total match count
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Questions {
    pub questions: Vec<Question>,
    /// Number of questions matching the filters, ignoring limit/offset
    pub total: i64,
}

/// Sortable question columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    Views,
    Score,
    AnswersCount,
    #[default]
    Created,
    Updated,
    Trend,
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "views" => Ok(OrderBy::Views),
            "score" => Ok(OrderBy::Score),
            "answersCount" | "answers_count" | "answers" => Ok(OrderBy::AnswersCount),
            "created" => Ok(OrderBy::Created),
            "updated" => Ok(OrderBy::Updated),
            "trend" => Ok(OrderBy::Trend),
            other => Err(format!("Unknown order: {}", other)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// How multiple tag filters combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagsRelation {
    /// Question has at least one of the tags
    #[default]
    Any,
    /// Question has every tag
    All,
}

/// Filters, ordering, paging and hydration flags for question listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestionsOptions {
    /// Page size; falls back to the configured page size
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub author: Option<String>,
    pub order_by: OrderBy,
    pub order: SortOrder,
    /// Random order, ignores `order_by`
    pub random: bool,
    pub tags: Vec<String>,
    pub tags_relation: TagsRelation,
    pub entity: Option<String>,
    /// Only questions the requesting user favorited
    pub favorite: bool,
    pub search_query: Option<String>,
    pub has_answers: Option<bool>,
    pub has_correct_answer: Option<bool>,
    pub has_votes: Option<bool>,
    pub include_answers: bool,
    pub include_votes: bool,
    pub include_entities: bool,
    pub include_trend: bool,
}

/// A tag and the number of questions currently using it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagResponse {
    pub tag: String,
    pub questions_count: i64,
}

/// Where attachment content lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// Bytes stored inline in the database
    Database,
    Filesystem,
    S3,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Database => "database",
            LocationType::Filesystem => "filesystem",
            LocationType::S3 => "s3",
        }
    }

    /// Whether content is stored inline
    pub fn is_inline(&self) -> bool {
        matches!(self, LocationType::Database)
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "database" => Ok(LocationType::Database),
            "filesystem" => Ok(LocationType::Filesystem),
            "s3" => Ok(LocationType::S3),
            other => Err(format!("Unknown location type: {}", other)),
        }
    }
}

/// An immutable stored attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: i64,
    /// External identifier
    pub uuid: String,
    pub location_type: LocationType,
    pub location_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes")]
    pub binary_image: Option<Vec<u8>>,
    pub mime_type: String,
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub created: DateTime<Utc>,
}

/// Parameters for storing an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentParams {
    pub uuid: String,
    pub location_type: LocationType,
    pub location_uri: String,
    pub extension: String,
    pub mime_type: String,
    pub path: Option<String>,
    pub binary_image: Option<Vec<u8>>,
    pub creator: Option<String>,
}

impl AttachmentParams {
    /// Inline attachment with a freshly generated uuid
    pub fn inline(
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        let uuid = Uuid::new_v4().to_string();
        Self {
            location_uri: format!("/attachments/{}", uuid),
            uuid,
            location_type: LocationType::Database,
            extension: extension.into(),
            mime_type: mime_type.into(),
            path: None,
            binary_image: Some(bytes),
            creator: None,
        }
    }

    /// Attachment stored outside the database
    pub fn external(
        location_type: LocationType,
        location_uri: impl Into<String>,
        mime_type: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            location_type,
            location_uri: location_uri.into(),
            extension: extension.into(),
            mime_type: mime_type.into(),
            path: None,
            binary_image: None,
            creator: None,
        }
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Time bucket size for statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    /// ISO week, starting Monday
    Week,
    Month,
    Year,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            other => Err(format!("Unknown granularity: {}", other)),
        }
    }
}

/// Time range and bucket size of a statistics query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsOptions {
    /// Inclusive lower bound
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub to: Option<DateTime<Utc>>,
    pub granularity: Granularity,
}

/// Statistics query, optionally scoped to a single author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsRequest {
    pub author: Option<String>,
    pub options: StatisticsOptions,
}

impl StatisticsRequest {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            author: None,
            options: StatisticsOptions {
                granularity,
                ..StatisticsOptions::default()
            },
        }
    }

    pub fn for_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.options.from = Some(from);
        self.options.to = Some(to);
        self
    }
}

/// One aggregated data point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statistic {
    /// First day of the bucket
    pub date: NaiveDate,
    /// Count or score sum, depending on the query
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Serialize optional bytes as standard base64
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_str(&STANDARD.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|e| STANDARD.decode(e).map_err(serde::de::Error::custom))
            .transpose()
    }
}

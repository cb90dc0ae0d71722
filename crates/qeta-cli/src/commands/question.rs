//! Question command handlers

use anyhow::{Context, Result};
use clap::Args;

use qeta_core::{
    OrderBy, Question, QuestionDraft, QuestionsOptions, SortOrder, Store, TagsRelation,
};

use super::{not_found, Direction};
use crate::editor::{body_or_compose, confirm};
use crate::output::Output;

/// Filters and ordering for `question list`
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Page size (defaults to the configured page size)
    #[arg(short, long)]
    pub limit: Option<u32>,
    /// Number of questions to skip
    #[arg(long)]
    pub offset: Option<u32>,
    /// Only questions by this author
    #[arg(short, long)]
    pub author: Option<String>,
    /// Only questions with this tag (repeatable)
    #[arg(short, long)]
    pub tag: Vec<String>,
    /// Require every --tag instead of any
    #[arg(long)]
    pub all_tags: bool,
    /// Only questions about this catalog entity
    #[arg(short, long)]
    pub entity: Option<String>,
    /// Only your favorite questions
    #[arg(short, long)]
    pub favorites: bool,
    /// Full-text search over title and content
    #[arg(short, long)]
    pub search: Option<String>,
    /// Order by views, score, answersCount, created, updated or trend
    #[arg(short, long, value_parser = parse_order_by)]
    pub order_by: Option<OrderBy>,
    /// Ascending order (default is descending)
    #[arg(long)]
    pub asc: bool,
    /// Random order
    #[arg(long, conflicts_with = "order_by")]
    pub random: bool,
    /// Only questions without answers
    #[arg(long, conflicts_with = "answered")]
    pub unanswered: bool,
    /// Only questions with at least one answer
    #[arg(long)]
    pub answered: bool,
    /// Only questions with a correct answer
    #[arg(long, conflicts_with = "unsolved")]
    pub solved: bool,
    /// Only questions without a correct answer
    #[arg(long)]
    pub unsolved: bool,
    /// Only questions nobody voted on
    #[arg(long)]
    pub no_votes: bool,
    /// Include answers in the output
    #[arg(long)]
    pub with_answers: bool,
    /// Include votes in the output
    #[arg(long)]
    pub with_votes: bool,
    /// Include entities in the output
    #[arg(long)]
    pub with_entities: bool,
    /// Include the trend value in the output
    #[arg(long)]
    pub with_trend: bool,
}

fn parse_order_by(s: &str) -> Result<OrderBy, String> {
    s.parse()
}

fn tri_state(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl ListArgs {
    pub fn to_options(&self) -> QuestionsOptions {
        QuestionsOptions {
            limit: self.limit,
            offset: self.offset,
            author: self.author.clone(),
            order_by: self.order_by.unwrap_or_default(),
            order: if self.asc {
                SortOrder::Asc
            } else {
                SortOrder::Desc
            },
            random: self.random,
            tags: self.tag.clone(),
            tags_relation: if self.all_tags {
                TagsRelation::All
            } else {
                TagsRelation::Any
            },
            entity: self.entity.clone(),
            favorite: self.favorites,
            search_query: self.search.clone(),
            has_answers: tri_state(self.answered, self.unanswered),
            has_correct_answer: tri_state(self.solved, self.unsolved),
            has_votes: if self.no_votes { Some(false) } else { None },
            include_answers: self.with_answers,
            include_votes: self.with_votes,
            include_entities: self.with_entities,
            include_trend: self.with_trend,
        }
    }
}

/// Ask a new question
#[allow(clippy::too_many_arguments)]
pub fn ask(
    store: &Store,
    user: &str,
    title: String,
    body: Option<String>,
    tags: Vec<String>,
    entities: Vec<String>,
    images: Vec<i64>,
    output: &Output,
) -> Result<()> {
    let content = body_or_compose(body, "")?;
    let draft = QuestionDraft {
        title,
        content,
        tags,
        entities,
        images,
    };

    let question = store
        .post_question(user, &draft)
        .context("Failed to post question")?;

    output.question_changed(&format!("Posted question #{}", question.id), &question)
}

/// Show a question with its answers
pub fn show(store: &Store, user: &str, id: i64, record_view: bool, output: &Output) -> Result<()> {
    let question = store
        .get_question(user, id, record_view)?
        .ok_or_else(|| not_found("Question", id))?;
    output.print_question(&question)
}

/// List questions
pub fn list(store: &Store, user: &str, args: &ListArgs, output: &Output) -> Result<()> {
    let page = store.get_questions(user, &args.to_options())?;
    output.print_questions(&page)
}

/// Changes for `question edit`; omitted fields keep their current value
#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// New title
    #[arg(short = 'T', long)]
    pub title: Option<String>,
    /// New body (opens editor if nothing else is changed)
    #[arg(short, long)]
    pub body: Option<String>,
    /// Replace tags
    #[arg(short, long)]
    pub tag: Vec<String>,
    /// Remove all tags
    #[arg(long, conflicts_with = "tag")]
    pub clear_tags: bool,
    /// Replace entities
    #[arg(short, long)]
    pub entity: Vec<String>,
    /// Remove all entities
    #[arg(long, conflicts_with = "entity")]
    pub clear_entities: bool,
    /// Replace linked attachment ids
    #[arg(short, long)]
    pub image: Vec<i64>,
    /// Unlink all attachments
    #[arg(long, conflicts_with = "image")]
    pub clear_images: bool,
}

impl EditArgs {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.tag.is_empty()
            && self.entity.is_empty()
            && self.image.is_empty()
            && !self.clear_tags
            && !self.clear_entities
            && !self.clear_images
    }

    /// Merge these changes into `current`
    pub fn to_draft(&self, current: Question, content: Option<String>) -> QuestionDraft {
        QuestionDraft {
            title: self.title.clone().unwrap_or(current.title),
            content: content
                .or_else(|| self.body.clone())
                .unwrap_or(current.content),
            tags: replace_or_keep(&self.tag, self.clear_tags, current.tags),
            entities: replace_or_keep(
                &self.entity,
                self.clear_entities,
                current.entities.unwrap_or_default(),
            ),
            images: replace_or_keep(&self.image, self.clear_images, current.images),
        }
    }
}

/// `clear` empties, a non-empty `new` replaces, otherwise `current` stays
pub(crate) fn replace_or_keep<T: Clone>(new: &[T], clear: bool, current: Vec<T>) -> Vec<T> {
    if clear {
        Vec::new()
    } else if new.is_empty() {
        current
    } else {
        new.to_vec()
    }
}

/// Edit one of your questions
pub fn edit(store: &Store, user: &str, id: i64, changes: &EditArgs, output: &Output) -> Result<()> {
    let current = store
        .get_question(user, id, false)?
        .ok_or_else(|| not_found("Question", id))?;

    let content = if changes.is_empty() {
        Some(body_or_compose(None, &current.content)?)
    } else {
        None
    };
    let draft = changes.to_draft(current, content);

    let question = store
        .update_question(id, user, &draft)?
        .ok_or_else(|| not_found("Question", id))?;

    output.question_changed("Question updated", &question)
}

/// Delete a question with all its answers
pub fn delete(store: &Store, user: &str, id: i64, yes: bool, output: &Output) -> Result<()> {
    if !yes && output.should_prompt() {
        let question = store
            .get_question(user, id, false)?
            .ok_or_else(|| not_found("Question", id))?;
        println!(
            "Delete question #{} - {} ({} answer(s))",
            question.id, question.title, question.answers_count
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if !store.delete_question(user, id)? {
        return Err(not_found("Question", id));
    }
    output.success(&format!("Deleted question #{}", id));
    Ok(())
}

/// Vote on a question
pub fn vote(store: &Store, user: &str, id: i64, direction: Direction, output: &Output) -> Result<()> {
    if !store.vote_question(user, id, direction.score())? {
        return Err(not_found("Question", id));
    }
    output.success(&format!("Voted {:?} on question #{}", direction, id).to_lowercase());
    Ok(())
}

/// Add or remove a favorite
pub fn favorite(store: &Store, user: &str, id: i64, on: bool, output: &Output) -> Result<()> {
    let changed = if on {
        store.favorite_question(user, id)?
    } else {
        store.unfavorite_question(user, id)?
    };
    if !changed {
        return Err(not_found("Question", id));
    }
    output.success(&format!(
        "{} question #{}",
        if on { "Favorited" } else { "Unfavorited" },
        id
    ));
    Ok(())
}

/// Comment on a question
pub fn comment(store: &Store, user: &str, id: i64, content: String, output: &Output) -> Result<()> {
    let question = store
        .comment_question(id, user, &content)?
        .ok_or_else(|| not_found("Question", id))?;
    output.question_changed(&format!("Commented on question #{}", id), &question)
}

/// Delete one of your comments on a question
pub fn uncomment(
    store: &Store,
    user: &str,
    id: i64,
    comment_id: i64,
    output: &Output,
) -> Result<()> {
    store
        .delete_question_comment(id, comment_id, user)?
        .ok_or_else(|| not_found("Comment", comment_id))?;
    output.success(&format!("Deleted comment {}", comment_id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list_args() {
        let options = ListArgs::default().to_options();
        assert_eq!(options, QuestionsOptions::default());
    }

    #[test]
    fn test_list_args_to_options() {
        let args = ListArgs {
            tag: vec!["backstage".to_string(), "rust".to_string()],
            all_tags: true,
            order_by: Some(OrderBy::Score),
            asc: true,
            unanswered: true,
            solved: false,
            unsolved: true,
            no_votes: true,
            with_trend: true,
            ..Default::default()
        };
        let options = args.to_options();
        assert_eq!(options.tags_relation, TagsRelation::All);
        assert_eq!(options.order_by, OrderBy::Score);
        assert_eq!(options.order, SortOrder::Asc);
        assert_eq!(options.has_answers, Some(false));
        assert_eq!(options.has_correct_answer, Some(false));
        assert_eq!(options.has_votes, Some(false));
        assert!(options.include_trend);
    }

    fn posted(store: &Store) -> Question {
        let draft = QuestionDraft::new("How do I register a plugin?", "Details")
            .tag("backstage")
            .tag("plugins")
            .entity("component:default/catalog");
        store.post_question("alice", &draft).unwrap()
    }

    #[test]
    fn test_edit_keeps_unspecified_fields() {
        let store = Store::open_in_memory(&qeta_core::Config::default()).unwrap();
        let current = posted(&store);

        let changes = EditArgs {
            title: Some("How do I register a backend plugin?".to_string()),
            ..Default::default()
        };
        let draft = changes.to_draft(current, None);
        assert_eq!(draft.title, "How do I register a backend plugin?");
        assert_eq!(draft.content, "Details");
        assert_eq!(draft.tags, vec!["backstage", "plugins"]);
        assert_eq!(draft.entities, vec!["component:default/catalog"]);
    }

    #[test]
    fn test_edit_can_clear_lists() {
        let store = Store::open_in_memory(&qeta_core::Config::default()).unwrap();
        let current = posted(&store);
        let id = current.id;

        let changes = EditArgs {
            clear_tags: true,
            clear_entities: true,
            ..Default::default()
        };
        let output = Output::new(crate::output::OutputFormat::Quiet);
        edit(&store, "alice", id, &changes, &output).unwrap();

        let stored = store.get_question("alice", id, false).unwrap().unwrap();
        assert!(stored.tags.is_empty());
        assert!(stored.entities.unwrap_or_default().is_empty());
        assert_eq!(stored.content, "Details");
    }

    #[test]
    fn test_replace_or_keep() {
        assert_eq!(replace_or_keep(&[], false, vec![1, 2]), vec![1, 2]);
        assert_eq!(replace_or_keep(&[3], false, vec![1, 2]), vec![3]);
        assert!(replace_or_keep::<i64>(&[], true, vec![1, 2]).is_empty());
    }

    #[test]
    fn test_tri_state() {
        assert_eq!(tri_state(false, false), None);
        assert_eq!(tri_state(true, false), Some(true));
        assert_eq!(tri_state(false, true), Some(false));
    }
}

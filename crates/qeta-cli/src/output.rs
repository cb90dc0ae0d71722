//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag), ids only

use anyhow::{Context, Result};
use serde::Serialize;

use qeta_core::{Answer, Attachment, Comment, Question, Questions, Statistic, TagResponse};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", text);
        Ok(())
    }

    /// Print a single question with its answers and comments
    pub fn print_question(&self, question: &Question) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("#{} {}", question.id, question.title);
                println!(
                    "Asked by {} on {}",
                    question.author,
                    question.created.format("%Y-%m-%d %H:%M")
                );
                if let (Some(updated), Some(by)) = (&question.updated, &question.updated_by) {
                    println!("Edited by {} on {}", by, updated.format("%Y-%m-%d %H:%M"));
                }
                println!(
                    "Score: {}  Views: {}  Answers: {}{}{}",
                    question.score,
                    question.views,
                    question.answers_count,
                    if question.correct_answer { "  ✓ solved" } else { "" },
                    if question.favorite { "  ★" } else { "" },
                );
                if !question.tags.is_empty() {
                    println!("Tags: {}", question.tags.join(", "));
                }
                if let Some(entities) = question.entities.as_ref().filter(|e| !e.is_empty()) {
                    println!("Entities: {}", entities.join(", "));
                }
                if !question.images.is_empty() {
                    println!("Images: {}", join_ids(&question.images));
                }
                println!();
                println!("{}", question.content);

                if let Some(comments) = question.comments.as_ref().filter(|c| !c.is_empty()) {
                    println!();
                    print_comments(comments, "");
                }

                if let Some(answers) = &question.answers {
                    for answer in answers {
                        println!();
                        println!("────────────────────────────────────────");
                        print_answer_body(answer);
                    }
                }
                Ok(())
            }
            OutputFormat::Json => self.json(question),
            OutputFormat::Quiet => {
                println!("{}", question.id);
                Ok(())
            }
        }
    }

    /// Print a page of questions
    pub fn print_questions(&self, page: &Questions) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if page.questions.is_empty() {
                    println!("No questions found.");
                    return Ok(());
                }
                for q in &page.questions {
                    println!(
                        "{:>5} | {:>4} | {:>3} {} | {}",
                        q.id,
                        q.score,
                        q.answers_count,
                        if q.correct_answer { "✓" } else { " " },
                        truncate(&q.title, 60)
                    );
                }
                println!("\n{} of {} question(s)", page.questions.len(), page.total);
                Ok(())
            }
            OutputFormat::Json => self.json(page),
            OutputFormat::Quiet => {
                for q in &page.questions {
                    println!("{}", q.id);
                }
                Ok(())
            }
        }
    }

    /// Print a single answer
    pub fn print_answer(&self, answer: &Answer) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                print_answer_body(answer);
                Ok(())
            }
            OutputFormat::Json => self.json(answer),
            OutputFormat::Quiet => {
                println!("{}", answer.id);
                Ok(())
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[TagResponse]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return Ok(());
                }
                for tag in tags {
                    println!("{} ({})", tag.tag, tag.questions_count);
                }
                println!("\n{} tag(s)", tags.len());
                Ok(())
            }
            OutputFormat::Json => self.json(tags),
            OutputFormat::Quiet => {
                for tag in tags {
                    println!("{}", tag.tag);
                }
                Ok(())
            }
        }
    }

    /// Print statistic buckets
    pub fn print_statistics(&self, stats: &[Statistic]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if stats.is_empty() {
                    println!("No data.");
                    return Ok(());
                }
                for stat in stats {
                    println!("{}  {:>6}", stat.date, stat.total);
                }
                Ok(())
            }
            OutputFormat::Json => self.json(stats),
            OutputFormat::Quiet => {
                for stat in stats {
                    println!("{} {}", stat.date, stat.total);
                }
                Ok(())
            }
        }
    }

    /// Print attachment metadata
    pub fn print_attachment(&self, attachment: &Attachment) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", attachment.id);
                println!("UUID:     {}", attachment.uuid);
                println!("Type:     {}", attachment.location_type);
                println!("Location: {}", attachment.location_uri);
                println!("MIME:     {} (.{})", attachment.mime_type, attachment.extension);
                if let Some(bytes) = &attachment.binary_image {
                    println!("Size:     {} bytes", bytes.len());
                }
                if let Some(creator) = &attachment.creator {
                    println!("Creator:  {}", creator);
                }
                println!("Created:  {}", attachment.created.format("%Y-%m-%d %H:%M"));
                Ok(())
            }
            OutputFormat::Json => self.json(attachment),
            OutputFormat::Quiet => {
                println!("{}", attachment.uuid);
                Ok(())
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Report a change to a question and show the result
    pub fn question_changed(&self, message: &str, question: &Question) -> Result<()> {
        self.changed(message, "question", question, || self.print_question(question))
    }

    /// Report a change to an answer and show the result
    pub fn answer_changed(&self, message: &str, answer: &Answer) -> Result<()> {
        self.changed(message, "answer", answer, || self.print_answer(answer))
    }

    /// Report a stored attachment and show it
    pub fn attachment_changed(&self, message: &str, attachment: &Attachment) -> Result<()> {
        self.changed(message, "attachment", attachment, || {
            self.print_attachment(attachment)
        })
    }

    /// JSON mode emits a single document holding both status and entity
    fn changed<T: Serialize>(
        &self,
        message: &str,
        key: &str,
        value: &T,
        print: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(&success_document(message, key, value)?),
            _ => {
                self.success(message);
                print()
            }
        }
    }
}

fn success_document<T: Serialize>(message: &str, key: &str, value: &T) -> Result<serde_json::Value> {
    let mut doc = serde_json::json!({"status": "success", "message": message});
    doc[key] = serde_json::to_value(value).context("Failed to serialize output")?;
    Ok(doc)
}

fn print_answer_body(answer: &Answer) {
    println!(
        "Answer #{} by {} on {}{}",
        answer.id,
        answer.author,
        answer.created.format("%Y-%m-%d %H:%M"),
        if answer.correct { "  ✓ correct" } else { "" }
    );
    println!("Score: {}", answer.score);
    if !answer.images.is_empty() {
        println!("Images: {}", join_ids(&answer.images));
    }
    println!();
    println!("{}", answer.content);
    if !answer.comments.is_empty() {
        println!();
        print_comments(&answer.comments, "  ");
    }
}

fn print_comments(comments: &[Comment], indent: &str) {
    for comment in comments {
        println!(
            "{}[{}] {} ({}): {}",
            indent,
            comment.id,
            comment.author,
            comment.created.format("%Y-%m-%d"),
            truncate_line(&comment.content, 70)
        );
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

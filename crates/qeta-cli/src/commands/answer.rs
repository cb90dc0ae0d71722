//! Answer command handlers

use anyhow::{Context, Result};

use qeta_core::{Answer, Store};

use super::question::replace_or_keep;
use super::{not_found, Direction};
use crate::editor::{body_or_compose, confirm};
use crate::output::Output;

fn find(store: &Store, id: i64) -> Result<Answer> {
    store.get_answer(id)?.ok_or_else(|| not_found("Answer", id))
}

/// Answer a question
pub fn post(
    store: &Store,
    user: &str,
    question_id: i64,
    body: Option<String>,
    images: Vec<i64>,
    output: &Output,
) -> Result<()> {
    let content = body_or_compose(body, "")?;
    let answer = store
        .answer_question(user, question_id, &content, &images)
        .context("Failed to post answer")?
        .ok_or_else(|| not_found("Question", question_id))?;

    let message = format!("Posted answer #{} on question #{}", answer.id, question_id);
    output.answer_changed(&message, &answer)
}

/// Show a single answer
pub fn show(store: &Store, id: i64, output: &Output) -> Result<()> {
    output.print_answer(&find(store, id)?)
}

/// Edit one of your answers
pub fn edit(
    store: &Store,
    user: &str,
    id: i64,
    body: Option<String>,
    images: Vec<i64>,
    clear_images: bool,
    output: &Output,
) -> Result<()> {
    let current = find(store, id)?;
    let content = match body {
        Some(body) => body,
        None if images.is_empty() && !clear_images => body_or_compose(None, &current.content)?,
        None => current.content,
    };
    let images = replace_or_keep(&images, clear_images, current.images);

    let answer = store
        .update_answer(user, current.question_id, id, &content, &images)?
        .ok_or_else(|| not_found("Answer", id))?;

    output.answer_changed("Answer updated", &answer)
}

/// Delete one of your answers
pub fn delete(store: &Store, user: &str, id: i64, yes: bool, output: &Output) -> Result<()> {
    if !yes && output.should_prompt() {
        let answer = find(store, id)?;
        println!(
            "Delete answer #{} on question #{}",
            answer.id, answer.question_id
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if !store.delete_answer(user, id)? {
        return Err(not_found("Answer", id));
    }
    output.success(&format!("Deleted answer #{}", id));
    Ok(())
}

/// Vote on an answer
pub fn vote(store: &Store, user: &str, id: i64, direction: Direction, output: &Output) -> Result<()> {
    if !store.vote_answer(user, id, direction.score())? {
        return Err(not_found("Answer", id));
    }
    output.success(&format!("Voted {:?} on answer #{}", direction, id).to_lowercase());
    Ok(())
}

/// Mark or unmark an answer as correct; only the question's author may
pub fn mark(store: &Store, user: &str, id: i64, correct: bool, output: &Output) -> Result<()> {
    let answer = find(store, id)?;
    let done = if correct {
        store.mark_answer_correct(user, answer.question_id, id)?
    } else {
        store.mark_answer_incorrect(user, answer.question_id, id)?
    };

    if !done {
        if correct {
            anyhow::bail!(
                "Could not accept answer #{}: you must own question #{} and no other answer may be accepted",
                id,
                answer.question_id
            );
        }
        return Err(not_found("Answer", id));
    }

    output.success(&format!(
        "{} answer #{}",
        if correct { "Accepted" } else { "Unaccepted" },
        id
    ));
    Ok(())
}

/// Comment on an answer
pub fn comment(store: &Store, user: &str, id: i64, content: String, output: &Output) -> Result<()> {
    let answer = store
        .comment_answer(id, user, &content)?
        .ok_or_else(|| not_found("Answer", id))?;
    output.answer_changed(&format!("Commented on answer #{}", id), &answer)
}

/// Delete one of your comments on an answer
pub fn uncomment(
    store: &Store,
    user: &str,
    id: i64,
    comment_id: i64,
    output: &Output,
) -> Result<()> {
    store
        .delete_answer_comment(id, comment_id, user)?
        .ok_or_else(|| not_found("Comment", comment_id))?;
    output.success(&format!("Deleted comment {}", comment_id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use qeta_core::{AttachmentParams, Config, QuestionDraft};

    fn setup() -> (Store, i64, i64) {
        let store = Store::open_in_memory(&Config::default()).unwrap();
        let q = store
            .post_question("alice", &QuestionDraft::new("t", "c"))
            .unwrap();
        let a = store
            .answer_question("bob", q.id, "answer", &[])
            .unwrap()
            .unwrap();
        (store, q.id, a.id)
    }

    #[test]
    fn test_mark_finds_question_from_answer() {
        let (store, qid, aid) = setup();
        let output = Output::new(OutputFormat::Quiet);

        mark(&store, "alice", aid, true, &output).unwrap();
        assert!(store.get_question("alice", qid, false).unwrap().unwrap().correct_answer);

        mark(&store, "alice", aid, false, &output).unwrap();
        assert!(!store.get_question("alice", qid, false).unwrap().unwrap().correct_answer);
    }

    #[test]
    fn test_mark_by_non_owner_fails() {
        let (store, _, aid) = setup();
        let output = Output::new(OutputFormat::Quiet);
        assert!(mark(&store, "bob", aid, true, &output).is_err());
    }

    #[test]
    fn test_edit_clears_images_and_keeps_body() {
        let (store, qid, _) = setup();
        let image = store
            .post_attachment(&AttachmentParams::inline(vec![1, 2, 3], "image/png", "png"))
            .unwrap();
        let answer = store
            .answer_question("bob", qid, "see diagram", &[image.id])
            .unwrap()
            .unwrap();
        assert_eq!(answer.images, vec![image.id]);

        let output = Output::new(OutputFormat::Quiet);
        edit(&store, "bob", answer.id, None, Vec::new(), true, &output).unwrap();

        let stored = store.get_answer(answer.id).unwrap().unwrap();
        assert!(stored.images.is_empty());
        assert_eq!(stored.content, "see diagram");
    }

    #[test]
    fn test_delete_without_prompt_in_quiet_mode() {
        let (store, _, aid) = setup();
        let output = Output::new(OutputFormat::Quiet);
        assert!(delete(&store, "alice", aid, false, &output).is_err());
        delete(&store, "bob", aid, false, &output).unwrap();
        assert!(store.get_answer(aid).unwrap().is_none());
    }
}

//! Pull request feedback.
//!
//! DESIGN
//! ======
//! For an opened or edited pull request:
//!
//! 1. fetch the diff and changed files from GitHub
//! 2. check out the default branch and index its source files
//! 3. build the import graph of the checkout and collect the internal
//!    modules the changed files import
//! 4. load the stored code of those modules, or fall back to the files
//!    nearest to the pull request text when none are found
//! 5. ask the chat model for a point-form critique and post it as a
//!    comment
//!
//! The checkout is scanned on the blocking pool and its directory removed
//! as soon as the graph is built.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use tracing::{error, info};

use super::code_index::{SourceFile, index_files, scan_checkout};
use super::{ServiceError, embed_one};
use crate::deps::module_file_candidates;
use crate::llm::Message;
use crate::state::AppState;
use crate::vector::CodeDocument;
use crate::webhook::{PullRequestPayload, Repository};

/// Branch reviewed when the payload does not name a default branch.
pub const FALLBACK_BRANCH: &str = "main";

/// Context files are truncated to this many characters each.
const MAX_CONTEXT_FILE_CHARS: usize = 8_000;
/// Diffs are truncated to this many characters.
const MAX_DIFF_CHARS: usize = 30_000;

const SYSTEM_PROMPT: &str = "You are a Pull Request Criticiser. Follow the Instructions given the Context.";

pub const CLOSING_QUESTION: &str = "Has the PR author considered these points?";

/// Review a pull request and post the feedback as a comment.
///
/// # Errors
///
/// Returns an error if no chat model is configured, or if a GitHub call,
/// the checkout, indexing, or the chat call fails. Failures are logged
/// with the pull request number before being returned.
pub async fn handle_pull_request(
    state: &AppState,
    installation_id: i64,
    repo: &Repository,
    pr: &PullRequestPayload,
) -> Result<(), ServiceError> {
    let result = review(state, installation_id, repo, pr).await;
    if let Err(e) = &result {
        error!(repo = %repo.full_name, pr = pr.number, error = %e, "pull request feedback failed");
    }
    result
}

async fn review(
    state: &AppState,
    installation_id: i64,
    repo: &Repository,
    pr: &PullRequestPayload,
) -> Result<(), ServiceError> {
    let llm = state.llm.clone().ok_or(ServiceError::LlmUnavailable)?;
    info!(repo = %repo.full_name, pr = pr.number, "reviewing pull request");

    let diff = state.github.pull_request_diff(installation_id, &repo.full_name, pr.number).await?;
    let changed_files = state.github.pull_request_files(installation_id, &repo.full_name, pr.number).await?;

    let branch = repo.default_branch.as_deref().filter(|b| !b.is_empty()).unwrap_or(FALLBACK_BRANCH);
    let token = state.github.installation_token(installation_id).await?;
    let checkout = state.checkout.checkout(&token, &repo.full_name, branch).await?;
    let (files, graph) = scan_checkout(checkout).await?;
    index_files(state, repo.id, branch, &files).await?;

    let dependencies = graph.dependencies_for_files(&changed_files);
    let paths = dependency_paths(&dependencies, &files);
    let mut context = state.store.code_by_paths(repo.id, branch, &paths).await?;
    if context.is_empty() {
        let query = embed_one(state.embedder.as_ref(), format!("{} {}", pr.title, pr.body)).await?;
        context = state.store.nearest_code(repo.id, branch, &query, state.settings.code_context_limit).await?;
    }
    info!(
        repo = %repo.full_name,
        pr = pr.number,
        changed = changed_files.len(),
        dependencies = dependencies.len(),
        context = context.len(),
        "generating feedback"
    );

    let prompt = build_prompt(&pr.title, &pr.body, &context, &diff);
    let response = llm.chat(state.settings.feedback_max_tokens, SYSTEM_PROMPT, &[Message::user(prompt)]).await?;

    state.github.leave_comment(installation_id, &repo.full_name, pr.number, &response.text).await?;
    info!(repo = %repo.full_name, pr = pr.number, model = %response.model, "posted feedback");
    Ok(())
}

/// Map dotted dependency names to the checkout files that define them,
/// taking the most specific existing candidate for each.
#[must_use]
pub fn dependency_paths(dependencies: &BTreeSet<String>, files: &[SourceFile]) -> Vec<String> {
    let known: BTreeSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let paths: BTreeSet<String> = dependencies
        .iter()
        .filter_map(|module| module_file_candidates(module).into_iter().find(|c| known.contains(c.as_str())))
        .collect();
    paths.into_iter().collect()
}

// =============================================================================
// PROMPT
// =============================================================================

/// Reviewer prompt: instructions followed by the pull request, the
/// related code, and the diff.
#[must_use]
pub fn build_prompt(title: &str, body: &str, context: &[CodeDocument], diff: &str) -> String {
    let mut prompt = String::from(
        "Start of Instructions:\n\
         \n\
         1. Read the pull request's title, description, code diff, and relevant context from the codebase.\n\
         2. Using point-form, concisely identify potential issues, code smells, code duplication, or downsides \
         of the pull request. Include file name in your references.\n\
         3. Consider interactions of the code diff with the relevant context from the codebase and its \
         architectural design.\n\
         4. Remember that in the code diff, '+' is code addition and '-' is code subtraction.\n\
         5. Do not provide refactored code as part of your feedback.\n",
    );
    let _ = writeln!(prompt, "6. End your response with the sentence \"{CLOSING_QUESTION}\"");
    prompt.push_str("\nEnd of Instructions.\n\nStart of Context:\n\nPull Request:\n");
    let _ = writeln!(prompt, "Title: {title}");
    let _ = writeln!(prompt, "Description: {body}");

    prompt.push_str("\nRelevant context from codebase:\n");
    if context.is_empty() {
        prompt.push_str("(none found)\n");
    }
    for doc in context {
        let _ = writeln!(prompt, "File: {}\n{}\n---", doc.file_path, truncate(&doc.content, MAX_CONTEXT_FILE_CHARS));
    }

    let _ = writeln!(prompt, "\nChanges in PR:\n{}", truncate(diff, MAX_DIFF_CHARS));
    prompt.push_str("\nEnd of Context.\n");
    prompt
}

/// First `max_chars` characters of `text`, marked when cut.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\n[truncated]", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "pull_request_test.rs"]
mod tests;

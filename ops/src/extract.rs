//! Two-phase extract-and-rename.
//!
//! The server's extraction endpoint cannot take a target name: it always
//! assigns a placeholder identifier (`newLocal`, `newFunction`,
//! `newMethod`). When the caller wants a custom name, extraction runs
//! first, the placeholder declaration is located in the produced text,
//! and a rename scoped to that declaration replaces it everywhere. The
//! rename phase is an enhancement: when the declaration cannot be
//! relocated, the operation still succeeds under the placeholder name.

use std::path::{Path, PathBuf};

use anyhow::Result;
use typeshift_apply::{AppliedFile, apply_edits};
use typeshift_tsserver::{ServerSession, protocol};
use typeshift_types::{FileChangeReport, Position, RefactorOutcome};

use crate::io::FileStore;
use crate::result::{preview_info, summarize};
use crate::util::{ensure_ready, request_bounded};

/// What the selected span is extracted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractKind {
    Function,
    Constant,
}

impl ExtractKind {
    /// The server names extraction actions `<form>_scope_<n>`, innermost
    /// scope first.
    fn action_prefix(self) -> &'static str {
        match self {
            Self::Function => "function_scope",
            Self::Constant => "constant_scope",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Constant => "constant",
        }
    }
}

/// Parameters for an extraction.
#[derive(Debug)]
pub struct ExtractRequest<'a> {
    pub file: &'a Path,
    pub start: Position,
    pub end: Position,
    pub kind: ExtractKind,
    /// Custom name for the extracted declaration. `None` keeps whatever
    /// placeholder the server assigned.
    pub new_name: Option<&'a str>,
    pub preview: bool,
}

/// Extract the span into a new declaration, optionally renaming it.
pub async fn extract(session: &ServerSession, request: ExtractRequest<'_>) -> RefactorOutcome {
    match extract_inner(session, &request).await {
        Ok(outcome) => outcome,
        Err(e) => RefactorOutcome::failure(format!(
            "Extract {} from {} failed: {e:#}",
            request.kind.noun(),
            request.file.display()
        )),
    }
}

async fn extract_inner(
    session: &ServerSession,
    request: &ExtractRequest<'_>,
) -> Result<RefactorOutcome> {
    let status = ensure_ready(session, request.file).await?;
    let mut store = FileStore::new(request.preview);

    let refactors_response = request_bounded(
        session,
        "getApplicableRefactors",
        protocol::span_args(request.file, request.start, request.end),
    )
    .await?;
    if !refactors_response.success {
        return Ok(RefactorOutcome::failure(format!(
            "The compiler could not inspect the selection: {}",
            refactors_response
                .message
                .as_deref()
                .unwrap_or("no reason given")
        )));
    }

    let refactors: Vec<protocol::ApplicableRefactor> =
        refactors_response.parse_body().unwrap_or_default();
    let Some((refactor, action)) = select_action(&refactors, request.kind) else {
        return Ok(RefactorOutcome::failure(format!(
            "No extract-{} refactor applies to {} lines {}-{}. Select a complete \
             expression or statement and try again.",
            request.kind.noun(),
            request.file.display(),
            request.start.line,
            request.end.line,
        )));
    };

    let edits_response = request_bounded(
        session,
        "getEditsForRefactor",
        protocol::edits_for_refactor_args(
            request.file,
            request.start,
            request.end,
            &refactor,
            &action,
        ),
    )
    .await?;
    if !edits_response.success {
        return Ok(RefactorOutcome::failure(format!(
            "The compiler rejected the extraction: {}",
            edits_response
                .message
                .as_deref()
                .unwrap_or("no reason given")
        )));
    }

    let body: protocol::RefactorEditsBody = edits_response.parse_body()?;
    if body.edits.is_empty() {
        return Ok(RefactorOutcome::failure(
            "The extraction produced no edits. The selection may already be a \
             standalone declaration.",
        ));
    }

    let mut reports = Vec::with_capacity(body.edits.len());
    for file_edits in &body.edits {
        let path = PathBuf::from(&file_edits.file_name);
        let original = store.read(&path).await?;
        let AppliedFile { content, records } = apply_edits(&original, &file_edits.to_edits());
        store.write(&path, content).await?;
        reports.push(FileChangeReport::new(path, records));
    }

    let updated = store.read(request.file).await?;
    let placeholder = locate_placeholder(&updated);
    let mut final_name = placeholder.as_ref().map(|(name, _)| name.clone());

    if let (Some(custom), Some((name, position))) = (request.new_name, &placeholder) {
        if custom == name.as_str() {
            final_name = Some(custom.to_string());
        } else {
            match rename_placeholder(session, &mut store, request.file, &updated, *position, custom)
                .await
            {
                Ok(true) => {
                    erase_placeholder(&mut reports, name, custom);
                    final_name = Some(custom.to_string());
                }
                Ok(false) => {
                    tracing::debug!(placeholder = %name, "rename not applicable, keeping placeholder");
                }
                Err(e) => {
                    tracing::debug!(placeholder = %name, "rename failed, keeping placeholder: {e:#}");
                }
            }
        }
    } else if request.new_name.is_some() {
        tracing::debug!(
            file = %request.file.display(),
            "extracted declaration not found in updated text, keeping placeholder"
        );
    }

    let action_text = match &final_name {
        Some(name) => format!("Extracted {} '{name}'", request.kind.noun()),
        None => format!("Extracted {}", request.kind.noun()),
    };

    let mut outcome = RefactorOutcome::success(summarize(&action_text, &reports), reports)
        .with_warnings(&status.warnings());

    if request.preview {
        let mut command = format!(
            "typeshift extract --file {} --start {}:{} --end {}:{} --kind {}",
            request.file.display(),
            request.start.line,
            request.start.offset,
            request.end.line,
            request.end.offset,
            request.kind.noun(),
        );
        if let Some(custom) = request.new_name {
            command.push_str(&format!(" --name {custom}"));
        }
        outcome = outcome.with_preview(preview_info(store.files_touched(), command));
    } else {
        let mut next_actions = vec![
            "Run the project's type check or tests to confirm the extraction.".to_string(),
        ];
        if request.new_name.is_none() {
            if let Some(name) = &final_name {
                next_actions.push(format!(
                    "Rename '{name}' with 'typeshift rename' to give it a meaningful name."
                ));
            }
        }
        outcome = outcome.with_next_actions(next_actions);
    }

    Ok(outcome)
}

/// Pick the first applicable extraction action of the requested form.
fn select_action(
    refactors: &[protocol::ApplicableRefactor],
    kind: ExtractKind,
) -> Option<(String, String)> {
    let prefix = kind.action_prefix();
    for refactor in refactors {
        for action in &refactor.actions {
            if action.is_applicable() && action.name.starts_with(prefix) {
                return Some((refactor.name.clone(), action.name.clone()));
            }
        }
    }
    None
}

/// Locate the placeholder declaration in the just-produced text.
///
/// The match is over the declaration forms the server emits (`const
/// <name> =` / `function <name>(` and the `let`/method variants), not a
/// bare identifier search, so an unrelated mention of the word never
/// counts. Returns the placeholder and the position of its first
/// character, 1-indexed.
fn locate_placeholder(content: &str) -> Option<(String, Position)> {
    let pattern = regex::Regex::new(
        r"(?:function\s+|const\s+|let\s+|var\s+)(newFunction|newLocal|newMethod)\b",
    )
    .ok()?;
    let name = pattern.captures(content)?.get(1)?;

    let before = &content[..name.start()];
    let line = before.matches('\n').count() as u32 + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let offset = content[line_start..name.start()].chars().count() as u32 + 1;
    Some((name.as_str().to_string(), Position::new(line, offset)))
}

/// Phase 2: rename the placeholder declaration to the custom name.
///
/// The updated content is re-announced to the server first (`open` with an
/// explicit text override), so the rename operates on the text the edits
/// produced — on disk or in a preview buffer alike. Returns `Ok(false)`
/// when the server declines the rename.
async fn rename_placeholder(
    session: &ServerSession,
    store: &mut FileStore,
    file: &Path,
    content: &str,
    position: Position,
    new_name: &str,
) -> Result<bool> {
    session.open_file(file, Some(content)).await?;

    let response = request_bounded(session, "rename", protocol::rename_args(file, position)).await?;
    if !response.success {
        return Ok(false);
    }
    let body: protocol::RenameBody = response.parse_body()?;
    if !body.info.can_rename {
        return Ok(false);
    }

    for group in &body.locs {
        let path = PathBuf::from(&group.file);
        let original = store.read(&path).await?;
        let applied = apply_edits(&original, &group.to_edits(new_name));
        store.write(&path, applied.content).await?;
    }
    Ok(true)
}

/// Substitute the placeholder (word-boundary) with the final name in
/// every produced record, so no response exposes the transient name.
fn erase_placeholder(reports: &mut [FileChangeReport], placeholder: &str, final_name: &str) {
    let Ok(pattern) = regex::Regex::new(&format!(r"\b{}\b", regex::escape(placeholder))) else {
        return;
    };
    for report in reports {
        for edit in &mut report.edits {
            if pattern.is_match(&edit.new) {
                edit.new = pattern.replace_all(&edit.new, final_name).into_owned();
            }
        }
    }
}

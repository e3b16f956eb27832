//! Cross-file symbol rename.

use std::path::{Path, PathBuf};

use anyhow::Result;
use typeshift_apply::apply_edits;
use typeshift_tsserver::{ServerSession, protocol};
use typeshift_types::{Position, RefactorOutcome};

use crate::io::FileStore;
use crate::result::{preview_info, summarize};
use crate::util::{locate_symbol, prepare, request_bounded};

/// Parameters for a rename operation.
#[derive(Debug)]
pub struct RenameRequest<'a> {
    pub file: &'a Path,
    /// Symbol to rename. Used to locate the target when `position` is
    /// not given: the first word-boundary occurrence in `file` wins.
    pub symbol: &'a str,
    pub position: Option<Position>,
    pub new_name: &'a str,
    pub preview: bool,
}

/// Rename a symbol everywhere the server can see it.
pub async fn rename(session: &ServerSession, request: RenameRequest<'_>) -> RefactorOutcome {
    match rename_inner(session, &request).await {
        Ok(outcome) => outcome,
        Err(e) => RefactorOutcome::failure(format!(
            "Rename of '{}' failed: {e:#}",
            request.symbol
        )),
    }
}

async fn rename_inner(
    session: &ServerSession,
    request: &RenameRequest<'_>,
) -> Result<RefactorOutcome> {
    let discovery = prepare(session, request.file).await?;
    let mut store = FileStore::new(request.preview);

    let content = store.read(request.file).await?;
    let position = match request.position.or_else(|| locate_symbol(&content, request.symbol)) {
        Some(position) => position,
        None => {
            return Ok(RefactorOutcome::failure(format!(
                "Symbol '{}' was not found in {}.",
                request.symbol,
                request.file.display()
            )));
        }
    };

    let response = request_bounded(
        session,
        "rename",
        protocol::rename_args(request.file, position),
    )
    .await?;
    if !response.success {
        return Ok(RefactorOutcome::failure(format!(
            "The compiler rejected the rename: {}",
            response.message.as_deref().unwrap_or("no reason given")
        )));
    }

    let body: protocol::RenameBody = response.parse_body()?;
    if !body.info.can_rename {
        return Ok(RefactorOutcome::failure(
            body.info
                .localized_error_message
                .unwrap_or_else(|| format!("'{}' cannot be renamed here.", request.symbol)),
        ));
    }

    let mut reports = Vec::with_capacity(body.locs.len());
    for group in &body.locs {
        let path = PathBuf::from(&group.file);
        let original = store.read(&path).await?;
        let applied = apply_edits(&original, &group.to_edits(request.new_name));
        store.write(&path, applied.content.clone()).await?;
        reports.push(applied.into_report(path));
    }

    let mut outcome = RefactorOutcome::success(
        summarize(
            &format!(
                "Renamed '{}' to '{}'",
                request.symbol, request.new_name
            ),
            &reports,
        ),
        reports,
    )
    .with_warnings(&discovery.status.warnings());

    if request.preview {
        outcome = outcome.with_preview(preview_info(
            store.files_touched(),
            format!(
                "typeshift rename --file {} --symbol {} --to {}",
                request.file.display(),
                request.symbol,
                request.new_name
            ),
        ));
    } else {
        outcome = outcome.with_next_actions(vec![
            "Run the project's type check or tests to confirm the rename.".to_string(),
        ]);
    }

    Ok(outcome)
}

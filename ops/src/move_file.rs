//! Move files while keeping import paths intact.
//!
//! The server computes the import-path edits for a prospective rename
//! (`getEditsForFileRename`); those are applied as a normal edit batch
//! and only then is the file moved on disk. Edited files are re-announced
//! to the server with their new content so subsequent moves in a batch
//! see the already-rewritten imports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use typeshift_apply::{AppliedFile, apply_edits};
use typeshift_tsserver::{ServerSession, protocol};
use typeshift_types::{DiscoveryStatus, FileChangeReport, RefactorOutcome};

use crate::io::FileStore;
use crate::result::{plural, preview_info, summarize};
use crate::util::{prepare, request_bounded};

/// Move one file, updating every import that referenced it.
pub async fn move_file(
    session: &ServerSession,
    from: &Path,
    to: &Path,
    preview: bool,
) -> RefactorOutcome {
    move_files(session, &[(from.to_path_buf(), to.to_path_buf())], preview).await
}

/// Move a batch of files sequentially, aggregating one outcome.
pub async fn move_files(
    session: &ServerSession,
    moves: &[(PathBuf, PathBuf)],
    preview: bool,
) -> RefactorOutcome {
    if moves.is_empty() {
        return RefactorOutcome::failure("No files to move.");
    }
    match move_files_inner(session, moves, preview).await {
        Ok(outcome) => outcome,
        Err(e) => RefactorOutcome::failure(format!("Move failed: {e:#}")),
    }
}

async fn move_files_inner(
    session: &ServerSession,
    moves: &[(PathBuf, PathBuf)],
    preview: bool,
) -> Result<RefactorOutcome> {
    let mut store = FileStore::new(preview);
    let mut reports: Vec<FileChangeReport> = Vec::new();
    let mut status = DiscoveryStatus {
        project_fully_loaded: true,
        scan_timed_out: false,
    };

    for (from, to) in moves {
        let discovery = prepare(session, from).await?;
        status.project_fully_loaded &= discovery.status.project_fully_loaded;
        status.scan_timed_out |= discovery.status.scan_timed_out;

        let response = request_bounded(
            session,
            "getEditsForFileRename",
            protocol::file_rename_args(from, to),
        )
        .await?;
        if !response.success {
            return Ok(RefactorOutcome::failure(format!(
                "The compiler could not compute import updates for {}: {}",
                from.display(),
                response.message.as_deref().unwrap_or("no reason given")
            )));
        }

        let edits: Vec<protocol::FileCodeEdits> = response.parse_body().unwrap_or_default();
        for file_edits in &edits {
            let path = PathBuf::from(&file_edits.file_name);
            let original = store.read(&path).await?;
            let AppliedFile { content, records } = apply_edits(&original, &file_edits.to_edits());
            session.open_file(&path, Some(&content)).await?;
            store.write(&path, content).await?;
            if !records.is_empty() {
                reports.push(FileChangeReport::new(path, records));
            }
        }

        if !preview {
            relocate(from, to).await?;
        }
    }

    let moved = moves
        .iter()
        .map(|(from, to)| format!("\n- {} moved to {}", from.display(), to.display()))
        .collect::<String>();

    let action_text = format!("Moved {} file{}, updating imports", moves.len(), plural(moves.len()));
    let mut message = summarize(&action_text, &reports);
    message.push_str(&moved);

    let mut outcome = RefactorOutcome::success(message, reports).with_warnings(&status.warnings());

    if preview {
        let command = moves
            .iter()
            .map(|(from, to)| format!("typeshift move {} {}", from.display(), to.display()))
            .collect::<Vec<_>>()
            .join(" && ");
        outcome = outcome.with_preview(preview_info(store.files_touched(), command));
    } else {
        outcome = outcome.with_next_actions(vec![
            "Run the project's type check or tests to confirm the imports resolve.".to_string(),
        ]);
    }

    Ok(outcome)
}

/// The on-disk half of a move, after the import edits are applied.
async fn relocate(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::rename(from, to)
        .await
        .with_context(|| format!("moving {} to {}", from.display(), to.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relocate_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.ts");
        let to = dir.path().join("nested/deep/b.ts");
        tokio::fs::write(&from, "export const x = 1;\n").await.unwrap();

        relocate(&from, &to).await.unwrap();

        assert!(!from.exists());
        assert_eq!(
            tokio::fs::read_to_string(&to).await.unwrap(),
            "export const x = 1;\n"
        );
    }

    #[tokio::test]
    async fn test_relocate_missing_source_names_both_paths() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("missing.ts");
        let to = dir.path().join("b.ts");

        let err = relocate(&from, &to).await.unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("missing.ts") && text.contains("b.ts"), "{text}");
    }
}

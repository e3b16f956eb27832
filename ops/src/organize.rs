//! Organize the import block of a single file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use typeshift_apply::{AppliedFile, apply_edits};
use typeshift_tsserver::{ServerSession, protocol};
use typeshift_types::{FileChangeReport, RefactorOutcome};

use crate::io::FileStore;
use crate::result::{preview_info, summarize};
use crate::util::{ensure_ready, request_bounded};

/// Sort, merge, and prune the file's imports via the compiler.
pub async fn organize_imports(
    session: &ServerSession,
    file: &Path,
    preview: bool,
) -> RefactorOutcome {
    match organize_inner(session, file, preview).await {
        Ok(outcome) => outcome,
        Err(e) => RefactorOutcome::failure(format!(
            "Organize imports in {} failed: {e:#}",
            file.display()
        )),
    }
}

async fn organize_inner(
    session: &ServerSession,
    file: &Path,
    preview: bool,
) -> Result<RefactorOutcome> {
    let status = ensure_ready(session, file).await?;
    let mut store = FileStore::new(preview);

    let response = request_bounded(
        session,
        "organizeImports",
        protocol::organize_imports_args(file),
    )
    .await?;
    if !response.success {
        return Ok(RefactorOutcome::failure(format!(
            "The compiler could not organize imports: {}",
            response.message.as_deref().unwrap_or("no reason given")
        )));
    }

    let edits: Vec<protocol::FileCodeEdits> = response.parse_body().unwrap_or_default();
    if edits.iter().all(|e| e.text_changes.is_empty()) {
        return Ok(RefactorOutcome::success(
            format!("Imports in {} are already organized.", file.display()),
            Vec::new(),
        )
        .with_warnings(&status.warnings()));
    }

    let mut reports = Vec::with_capacity(edits.len());
    for file_edits in &edits {
        let path = PathBuf::from(&file_edits.file_name);
        let original = store.read(&path).await?;
        let AppliedFile { content, records } = apply_edits(&original, &file_edits.to_edits());
        store.write(&path, content).await?;
        reports.push(FileChangeReport::new(path, records));
    }

    let mut outcome = RefactorOutcome::success(summarize("Organized imports", &reports), reports)
        .with_warnings(&status.warnings());

    if preview {
        outcome = outcome.with_preview(preview_info(
            store.files_touched(),
            format!("typeshift organize {}", file.display()),
        ));
    }

    Ok(outcome)
}

//! Best-effort discovery of files related to a refactoring target.
//!
//! The compiler server only reports references in files it has been told
//! about. Before a cross-file operation, this pass asks the server for
//! the project's file list (falling back to per-file references) and
//! pre-opens likely candidates. It runs under its own timeout and never
//! fails the parent operation — a truncated scan only degrades
//! completeness and contributes advisory warning text.

use std::path::{Path, PathBuf};

use anyhow::Result;
use typeshift_types::DiscoveryStatus;

use crate::protocol::{self, ProjectInfoBody, ReferencesBody};
use crate::session::ServerSession;

/// What one discovery pass accomplished.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOutcome {
    pub status: DiscoveryStatus,
    /// Related files newly announced to the server (the target itself is
    /// not counted).
    pub files_opened: usize,
}

/// Pre-open files that might reference `target`.
///
/// `project_fully_loaded` is the gate's verdict, recorded into the
/// returned status so the operation can assemble its warnings from one
/// place.
pub async fn discover_related(
    session: &ServerSession,
    target: &Path,
    project_fully_loaded: bool,
) -> DiscoveryOutcome {
    let mut files_opened = 0usize;

    let scan_timed_out = tokio::time::timeout(
        session.config().discovery_timeout(),
        scan(session, target, &mut files_opened),
    )
    .await
    .is_err();

    if scan_timed_out {
        tracing::debug!(
            target = %target.display(),
            files_opened,
            "related-file scan timed out"
        );
    }

    DiscoveryOutcome {
        status: DiscoveryStatus {
            project_fully_loaded,
            scan_timed_out,
        },
        files_opened,
    }
}

async fn scan(session: &ServerSession, target: &Path, files_opened: &mut usize) {
    if let Err(e) = try_scan(session, target, files_opened).await {
        // Discovery is advisory: log and move on.
        tracing::debug!(target = %target.display(), "related-file scan failed: {e:#}");
    }
}

async fn try_scan(session: &ServerSession, target: &Path, files_opened: &mut usize) -> Result<()> {
    session.open_file(target, None).await?;
    let channel = session.channel()?;

    let candidates = {
        let response = channel
            .request("projectInfo", protocol::project_info_args(target))
            .await?;
        let file_names = response
            .parse_body::<ProjectInfoBody>()
            .ok()
            .and_then(|body| body.file_names)
            .unwrap_or_default();

        if file_names.is_empty() {
            referencing_files(&channel, target).await?
        } else {
            file_names
        }
    };

    let max = session.config().max_preopen_files;
    for candidate in candidates
        .into_iter()
        .map(PathBuf::from)
        .filter(|path| is_candidate(path, target))
        .take(max)
    {
        if session.open_file(&candidate, None).await? {
            *files_opened += 1;
        }
    }

    Ok(())
}

/// Fall back to the server's per-file reference query.
async fn referencing_files(
    channel: &crate::requests::RequestChannel,
    target: &Path,
) -> Result<Vec<String>> {
    let response = channel
        .request("fileReferences", protocol::file_references_args(target))
        .await?;
    let body: ReferencesBody = response.parse_body()?;
    Ok(body.refs.into_iter().map(|r| r.file).collect())
}

/// Source files worth pre-opening: TypeScript/JavaScript sources that are
/// not the target itself, not declaration files, and not vendored.
fn is_candidate(path: &Path, target: &Path) -> bool {
    if path == target {
        return false;
    }
    let name = path.to_string_lossy();
    if name.contains("node_modules") || name.ends_with(".d.ts") {
        return false;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "mts" | "cts" | "js" | "jsx")
    )
}

//! Shared plumbing for operations: the readiness prologue, bounded
//! protocol round-trips, and symbol location.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use typeshift_tsserver::{DiscoveryOutcome, ServerSession, discover_related};
use typeshift_types::{DiscoveryStatus, Position};

/// Readiness prologue for cross-file operations: wait on the load gate,
/// then pre-open related files. Neither step can fail the operation —
/// both degrade into advisory flags.
pub(crate) async fn prepare(session: &ServerSession, target: &Path) -> Result<DiscoveryOutcome> {
    let gate = session.load_gate()?;
    let loaded = gate
        .ensure_ready(session.config().project_load_timeout())
        .await;
    Ok(discover_related(session, target, loaded).await)
}

/// Gate-only prologue for single-file operations (no discovery scan).
pub(crate) async fn ensure_ready(session: &ServerSession, target: &Path) -> Result<DiscoveryStatus> {
    let gate = session.load_gate()?;
    let loaded = gate
        .ensure_ready(session.config().project_load_timeout())
        .await;
    session.open_file(target, None).await?;
    Ok(DiscoveryStatus {
        project_fully_loaded: loaded,
        scan_timed_out: false,
    })
}

/// One protocol round-trip, bounded by the configured request timeout.
///
/// The channel itself never times out (matching is purely by sequence
/// id); the bound lives here with the caller.
pub(crate) async fn request_bounded(
    session: &ServerSession,
    command: &'static str,
    arguments: serde_json::Value,
) -> Result<typeshift_tsserver::protocol::ServerResponse> {
    let channel = session.channel()?;
    let timeout = session.config().request_timeout();
    tokio::time::timeout(timeout, channel.request(command, arguments))
        .await
        .map_err(|_| anyhow!("'{command}' timed out after {}ms", timeout.as_millis()))?
        .with_context(|| format!("'{command}' request failed"))
}

/// Locate the first word-boundary occurrence of `symbol` in `content`.
pub(crate) fn locate_symbol(content: &str, symbol: &str) -> Option<Position> {
    let pattern = regex::Regex::new(&format!(r"\b{}\b", regex::escape(symbol))).ok()?;
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(found) = pattern.find(line) {
            let offset = line[..found.start()].chars().count() as u32 + 1;
            return Some(Position::new(line_idx as u32 + 1, offset));
        }
    }
    None
}

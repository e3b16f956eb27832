//! Reference listing — the one operation that produces no edits.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use typeshift_tsserver::{ServerSession, protocol};
use typeshift_types::{Position, RefactorOutcome};

use crate::result::plural;
use crate::util::{locate_symbol, prepare, request_bounded};

/// List every reference to a symbol the server can see.
///
/// `position` pins the query location; without it, the first
/// word-boundary occurrence of `symbol` in `file` is used.
pub async fn find_references(
    session: &ServerSession,
    file: &Path,
    symbol: &str,
    position: Option<Position>,
) -> RefactorOutcome {
    match references_inner(session, file, symbol, position).await {
        Ok(outcome) => outcome,
        Err(e) => {
            RefactorOutcome::failure(format!("Finding references to '{symbol}' failed: {e:#}"))
        }
    }
}

async fn references_inner(
    session: &ServerSession,
    file: &Path,
    symbol: &str,
    position: Option<Position>,
) -> Result<RefactorOutcome> {
    let discovery = prepare(session, file).await?;

    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let Some(position) = position.or_else(|| locate_symbol(&content, symbol)) else {
        return Ok(RefactorOutcome::failure(format!(
            "Symbol '{symbol}' was not found in {}.",
            file.display()
        )));
    };

    let response = request_bounded(
        session,
        "references",
        protocol::references_args(file, position),
    )
    .await?;
    if !response.success {
        return Ok(RefactorOutcome::failure(format!(
            "The compiler could not resolve references: {}",
            response.message.as_deref().unwrap_or("no reason given")
        )));
    }

    let body: protocol::ReferencesBody = response.parse_body()?;
    if body.refs.is_empty() {
        return Ok(RefactorOutcome::failure(format!(
            "No references to '{symbol}' were found. The symbol may be out of the \
             project's file graph."
        )));
    }

    let name = body.symbol_name.as_deref().unwrap_or(symbol);
    let files: BTreeSet<&str> = body.refs.iter().map(|r| r.file.as_str()).collect();

    let mut message = format!(
        "Found {} reference{} to '{name}' across {} file{}.",
        body.refs.len(),
        plural(body.refs.len()),
        files.len(),
        plural(files.len()),
    );
    for entry in &body.refs {
        message.push_str(&format_entry(entry));
    }

    Ok(RefactorOutcome::success(message, Vec::new())
        .with_warnings(&discovery.status.warnings()))
}

fn format_entry(entry: &protocol::ReferenceEntry) -> String {
    let mut line = format!("\n- {}:{}:{}", entry.file, entry.start.line, entry.start.offset);
    if entry.is_definition {
        line.push_str(" (definition)");
    }
    if let Some(text) = &entry.line_text {
        line.push_str(": ");
        line.push_str(text.trim());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: serde_json::Value) -> protocol::ReferenceEntry {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_format_entry_with_definition_and_text() {
        let formatted = format_entry(&entry(serde_json::json!({
            "file": "src/a.ts",
            "start": { "line": 1, "offset": 17 },
            "end": { "line": 1, "offset": 28 },
            "lineText": "  export function processData(input) {",
            "isDefinition": true
        })));
        assert_eq!(
            formatted,
            "\n- src/a.ts:1:17 (definition): export function processData(input) {"
        );
    }

    #[test]
    fn test_format_entry_plain_use() {
        let formatted = format_entry(&entry(serde_json::json!({
            "file": "src/b.ts",
            "start": { "line": 3, "offset": 1 },
            "end": { "line": 3, "offset": 12 },
        })));
        assert_eq!(formatted, "\n- src/b.ts:3:1");
    }
}

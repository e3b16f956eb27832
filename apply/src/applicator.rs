//! Bottom-to-top edit application over an in-memory line array.
//!
//! Every edit's coordinates are valid against the *original* file.
//! Processing edits that occur later in the document first guarantees
//! that edits earlier in the document are never shifted by a prior
//! mutation: all prior mutations happened strictly after their position.

use typeshift_types::{EditRecord, FileChangeReport, TextEdit};

/// The result of applying one file's edit batch.
#[derive(Debug, Clone)]
pub struct AppliedFile {
    /// The file content after all edits.
    pub content: String,
    /// One record per applied edit, in original top-to-bottom order.
    pub records: Vec<EditRecord>,
}

impl AppliedFile {
    /// Build the caller-facing report for this file.
    #[must_use]
    pub fn into_report(self, path: impl Into<std::path::PathBuf>) -> FileChangeReport {
        FileChangeReport::new(path.into(), self.records)
    }
}

/// Apply `edits` to `original`, returning the new content and records.
///
/// Edits are applied strictly in decreasing document order (line desc,
/// then offset desc) regardless of their order in the slice, so the
/// result is identical for any permutation of the same edit set. Edits
/// whose span falls outside the file are skipped.
#[must_use]
pub fn apply_edits(original: &str, edits: &[TextEdit]) -> AppliedFile {
    let mut lines: Vec<String> = original.split('\n').map(String::from).collect();

    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start).then_with(|| b.end.cmp(&a.end)));

    let mut records = Vec::with_capacity(ordered.len());
    for edit in ordered {
        if let Some(record) = apply_one(&mut lines, edit) {
            records.push(record);
        }
    }

    records.sort_by_key(|r| r.line);

    AppliedFile {
        content: lines.join("\n"),
        records,
    }
}

/// Apply a single edit in place. Returns `None` for out-of-range spans.
fn apply_one(lines: &mut Vec<String>, edit: &TextEdit) -> Option<EditRecord> {
    let start_idx = edit.start.line.checked_sub(1)? as usize;
    let end_idx = edit.end.line.checked_sub(1)? as usize;
    if start_idx >= lines.len() || end_idx >= lines.len() || end_idx < start_idx {
        return None;
    }

    let start_byte = byte_offset(&lines[start_idx], edit.start.offset);
    let end_byte = byte_offset(&lines[end_idx], edit.end.offset);
    if start_idx == end_idx && end_byte < start_byte {
        return None;
    }

    let old = capture_span(lines, start_idx, end_idx, start_byte, end_byte);

    let merged = {
        let prefix = &lines[start_idx][..start_byte];
        let suffix = &lines[end_idx][end_byte..];
        format!("{prefix}{}{suffix}", edit.new_text)
    };

    let mut replacement: Vec<String> = merged.split('\n').map(String::from).collect();
    if edit.is_insertion() {
        crate::indent::normalize_inserted_declaration(&mut replacement, lines, start_idx, end_idx);
    }

    lines.splice(start_idx..=end_idx, replacement);

    Some(EditRecord {
        line: edit.start.line,
        old,
        new: edit.new_text.clone(),
    })
}

/// The current text of the half-open span, newlines included for
/// multi-line spans.
fn capture_span(
    lines: &[String],
    start_idx: usize,
    end_idx: usize,
    start_byte: usize,
    end_byte: usize,
) -> String {
    if start_idx == end_idx {
        return lines[start_idx][start_byte..end_byte].to_string();
    }
    let mut old = String::new();
    old.push_str(&lines[start_idx][start_byte..]);
    for line in &lines[start_idx + 1..end_idx] {
        old.push('\n');
        old.push_str(line);
    }
    old.push('\n');
    old.push_str(&lines[end_idx][..end_byte]);
    old
}

/// Map a 1-indexed character offset to a byte index, clamped to the line.
fn byte_offset(line: &str, offset: u32) -> usize {
    let chars = offset.saturating_sub(1) as usize;
    line.char_indices()
        .nth(chars)
        .map_or(line.len(), |(byte, _)| byte)
}

//! Per-file change reports produced by edit application.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One applied edit, with the replaced text captured at application time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRecord {
    /// 1-indexed line the edit starts on (in the original file).
    pub line: u32,
    /// The text the span held before the edit.
    pub old: String,
    /// The text spliced in.
    pub new: String,
}

/// All edits applied to a single file, in top-to-bottom document order.
///
/// Application order inside the engine is bottom-to-top; the report is
/// re-sorted for readability. The two orders are independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeReport {
    pub path: PathBuf,
    pub edits: Vec<EditRecord>,
}

impl FileChangeReport {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, mut edits: Vec<EditRecord>) -> Self {
        edits.sort_by_key(|e| e.line);
        Self {
            path: path.into(),
            edits,
        }
    }
}

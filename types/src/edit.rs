//! Position-addressed text edits.
//!
//! Positions use the compiler server's convention: 1-indexed line and
//! 1-indexed character offset within the line. A [`TextEdit`] spans the
//! half-open range `[start, end)` and is addressed against the file's
//! *current* on-disk content, never against previously-applied edits in
//! the same batch.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A 1-indexed location in a text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed character offset within the line.
    pub offset: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, offset: u32) -> Self {
        Self { line, offset }
    }
}

/// A single replacement of the span `[start, end)` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub file: PathBuf,
    pub start: Position,
    pub end: Position,
    pub new_text: String,
}

impl TextEdit {
    #[must_use]
    pub fn new(
        file: impl Into<PathBuf>,
        start: Position,
        end: Position,
        new_text: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            start,
            end,
            new_text: new_text.into(),
        }
    }

    /// Whether the edit inserts text without replacing anything.
    #[must_use]
    pub fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    /// Whether the span stays within a single line.
    #[must_use]
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

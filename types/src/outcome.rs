//! Operation results surfaced to callers.

use serde::{Deserialize, Serialize};

use crate::report::FileChangeReport;

/// What a discovery pass learned about the workspace before an operation.
///
/// Both flags are advisory: the operation proceeds either way and the
/// flags only contribute warning text to the final message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryStatus {
    /// The server had finished indexing the project when the operation ran.
    pub project_fully_loaded: bool,
    /// The related-file scan hit its timeout before finishing.
    pub scan_timed_out: bool,
}

impl DiscoveryStatus {
    /// Advisory warning lines for an otherwise successful result.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.project_fully_loaded {
            out.push(
                "Warning: project indexing had not finished; references in files the server \
                 has not seen may have been missed."
                    .to_string(),
            );
        }
        if self.scan_timed_out {
            out.push(
                "Warning: the related-file scan timed out; cross-file references may be \
                 incomplete."
                    .to_string(),
            );
        }
        out
    }
}

/// Preview details returned when the caller asked not to persist edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInfo {
    pub files_affected: usize,
    pub estimated_time: String,
    /// The command to run again without preview to apply the edits.
    pub command: String,
}

/// The result of a refactoring operation.
///
/// Every public operation resolves to one of these — failures are values
/// carrying actionable text, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactorOutcome {
    pub success: bool,
    pub message: String,
    pub files_changed: Vec<FileChangeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub next_actions: Vec<String>,
}

impl RefactorOutcome {
    #[must_use]
    pub fn success(message: impl Into<String>, files_changed: Vec<FileChangeReport>) -> Self {
        Self {
            success: true,
            message: message.into(),
            files_changed,
            preview: None,
            next_actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            files_changed: Vec::new(),
            preview: None,
            next_actions: Vec::new(),
        }
    }

    /// Append advisory warning lines to the message.
    #[must_use]
    pub fn with_warnings(mut self, warnings: &[String]) -> Self {
        for warning in warnings {
            self.message.push_str("\n\n");
            self.message.push_str(warning);
        }
        self
    }

    #[must_use]
    pub fn with_preview(mut self, preview: PreviewInfo) -> Self {
        self.preview = Some(preview);
        self
    }

    #[must_use]
    pub fn with_next_actions(mut self, next_actions: Vec<String>) -> Self {
        self.next_actions = next_actions;
        self
    }
}

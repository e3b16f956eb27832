//! Wire types for the compiler server protocol.
//!
//! Outgoing requests are `{ seq, type: "request", command, arguments }`.
//! Incoming frames are either responses (`request_seq`, `success`, `body`)
//! or asynchronous events (`event`, `body`). Typed views over the response
//! bodies the client consumes live here, next to the argument builders for
//! each command.

use std::path::Path;

use serde::{Deserialize, Serialize};
use typeshift_types::{Position, TextEdit};

#[derive(Debug, Serialize)]
pub struct Request {
    pub seq: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

impl Request {
    #[must_use]
    pub fn new(seq: u64, command: &'static str, arguments: Option<serde_json::Value>) -> Self {
        Self {
            seq,
            kind: "request",
            command,
            arguments,
        }
    }
}

/// A response frame, matched to its request purely by `request_seq`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerResponse {
    pub request_seq: u64,
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

impl ServerResponse {
    /// Deserialize the body into a typed view.
    pub fn parse_body<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| anyhow::anyhow!("response carried no body"))?;
        serde_json::from_value(body).map_err(Into::into)
    }
}

/// Classification of one incoming frame.
#[derive(Debug)]
pub(crate) enum IncomingFrame {
    Response(ServerResponse),
    Event {
        name: String,
        #[allow(dead_code)]
        body: Option<serde_json::Value>,
    },
}

/// Classify an incoming frame by its `type` tag.
///
/// Events are never matched against pending requests; anything that is
/// neither a response nor an event is dropped by the caller.
pub(crate) fn parse_incoming(frame: &serde_json::Value) -> Option<IncomingFrame> {
    match frame.get("type").and_then(|t| t.as_str()) {
        Some("response") => serde_json::from_value(frame.clone())
            .ok()
            .map(IncomingFrame::Response),
        Some("event") => {
            let name = frame.get("event")?.as_str()?.to_string();
            Some(IncomingFrame::Event {
                name,
                body: frame.get("body").cloned(),
            })
        }
        _ => None,
    }
}

/// The event the load gate waits for.
pub(crate) const PROJECT_LOADING_FINISH: &str = "projectLoadingFinish";

// ── Argument builders ──────────────────────────────────────────────────

fn file_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn open_args(file: &Path, file_content: Option<&str>) -> serde_json::Value {
    match file_content {
        Some(content) => serde_json::json!({
            "file": file_str(file),
            "fileContent": content,
        }),
        None => serde_json::json!({ "file": file_str(file) }),
    }
}

pub fn rename_args(file: &Path, position: Position) -> serde_json::Value {
    serde_json::json!({
        "file": file_str(file),
        "line": position.line,
        "offset": position.offset,
        "findInStrings": false,
        "findInComments": false,
    })
}

pub fn span_args(file: &Path, start: Position, end: Position) -> serde_json::Value {
    serde_json::json!({
        "file": file_str(file),
        "startLine": start.line,
        "startOffset": start.offset,
        "endLine": end.line,
        "endOffset": end.offset,
    })
}

pub fn edits_for_refactor_args(
    file: &Path,
    start: Position,
    end: Position,
    refactor: &str,
    action: &str,
) -> serde_json::Value {
    serde_json::json!({
        "file": file_str(file),
        "startLine": start.line,
        "startOffset": start.offset,
        "endLine": end.line,
        "endOffset": end.offset,
        "refactor": refactor,
        "action": action,
    })
}

pub fn references_args(file: &Path, position: Position) -> serde_json::Value {
    serde_json::json!({
        "file": file_str(file),
        "line": position.line,
        "offset": position.offset,
    })
}

pub fn organize_imports_args(file: &Path) -> serde_json::Value {
    serde_json::json!({
        "scope": {
            "type": "file",
            "args": { "file": file_str(file) },
        },
    })
}

pub fn file_rename_args(old_path: &Path, new_path: &Path) -> serde_json::Value {
    serde_json::json!({
        "oldFilePath": file_str(old_path),
        "newFilePath": file_str(new_path),
    })
}

pub fn project_info_args(file: &Path) -> serde_json::Value {
    serde_json::json!({
        "file": file_str(file),
        "needFileNameList": true,
    })
}

pub fn file_references_args(file: &Path) -> serde_json::Value {
    serde_json::json!({ "file": file_str(file) })
}

// ── Typed response bodies ──────────────────────────────────────────────

/// A `{ line, offset }` location as the server writes it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireLocation {
    pub line: u32,
    pub offset: u32,
}

impl From<WireLocation> for Position {
    fn from(loc: WireLocation) -> Self {
        Position::new(loc.line, loc.offset)
    }
}

/// Body of a `rename` response.
#[derive(Debug, Deserialize)]
pub struct RenameBody {
    pub info: RenameInfo,
    #[serde(default)]
    pub locs: Vec<RenameFileSpans>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameInfo {
    pub can_rename: bool,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub localized_error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameFileSpans {
    pub file: String,
    pub locs: Vec<RenameSpan>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSpan {
    pub start: WireLocation,
    pub end: WireLocation,
    #[serde(default)]
    pub prefix_text: Option<String>,
    #[serde(default)]
    pub suffix_text: Option<String>,
}

impl RenameSpan {
    /// The replacement text for this span when renaming to `new_name`.
    ///
    /// Shorthand-property and namespace-import sites carry prefix/suffix
    /// text that must be preserved around the new identifier.
    #[must_use]
    pub fn replacement(&self, new_name: &str) -> String {
        format!(
            "{}{new_name}{}",
            self.prefix_text.as_deref().unwrap_or(""),
            self.suffix_text.as_deref().unwrap_or(""),
        )
    }
}

impl RenameFileSpans {
    /// Convert this file's spans into an edit batch.
    #[must_use]
    pub fn to_edits(&self, new_name: &str) -> Vec<TextEdit> {
        self.locs
            .iter()
            .map(|span| {
                TextEdit::new(
                    &self.file,
                    span.start.into(),
                    span.end.into(),
                    span.replacement(new_name),
                )
            })
            .collect()
    }
}

/// One file's worth of edits in a code-edit response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCodeEdits {
    pub file_name: String,
    pub text_changes: Vec<CodeEdit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEdit {
    pub start: WireLocation,
    pub end: WireLocation,
    pub new_text: String,
}

impl FileCodeEdits {
    #[must_use]
    pub fn to_edits(&self) -> Vec<TextEdit> {
        self.text_changes
            .iter()
            .map(|change| {
                TextEdit::new(
                    &self.file_name,
                    change.start.into(),
                    change.end.into(),
                    change.new_text.clone(),
                )
            })
            .collect()
    }
}

/// Body of a `getEditsForRefactor` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactorEditsBody {
    #[serde(default)]
    pub edits: Vec<FileCodeEdits>,
    #[serde(default)]
    pub rename_location: Option<WireLocation>,
    #[serde(default)]
    pub rename_filename: Option<String>,
}

/// One entry of a `getApplicableRefactors` response body.
#[derive(Debug, Deserialize)]
pub struct ApplicableRefactor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: Vec<RefactorAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactorAction {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub not_applicable_reason: Option<String>,
}

impl RefactorAction {
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        self.not_applicable_reason.is_none()
    }
}

/// Body of a `references` or `fileReferences` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencesBody {
    #[serde(default)]
    pub refs: Vec<ReferenceEntry>,
    #[serde(default)]
    pub symbol_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    pub file: String,
    pub start: WireLocation,
    pub end: WireLocation,
    #[serde(default)]
    pub line_text: Option<String>,
    #[serde(default)]
    pub is_definition: bool,
    #[serde(default)]
    pub is_write_access: bool,
}

/// Body of a `projectInfo` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfoBody {
    #[serde(default)]
    pub config_file_name: Option<String>,
    #[serde(default)]
    pub file_names: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::new(3, "rename", Some(serde_json::json!({"file": "a.ts"})));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["seq"], 3);
        assert_eq!(json["type"], "request");
        assert_eq!(json["command"], "rename");
        assert_eq!(json["arguments"]["file"], "a.ts");
    }

    #[test]
    fn test_request_omits_missing_arguments() {
        let req = Request::new(1, "exit", None);
        let json = serde_json::to_value(&req).unwrap();
        assert!(
            json.get("arguments").is_none(),
            "arguments must be omitted, not null"
        );
    }

    #[test]
    fn test_parse_incoming_response() {
        let frame = serde_json::json!({
            "seq": 10, "type": "response", "command": "rename",
            "request_seq": 4, "success": true, "body": {"info": {"canRename": true}}
        });
        match parse_incoming(&frame) {
            Some(IncomingFrame::Response(resp)) => {
                assert_eq!(resp.request_seq, 4);
                assert!(resp.success);
                assert!(resp.body.is_some());
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_incoming_event() {
        let frame = serde_json::json!({
            "seq": 1, "type": "event", "event": "projectLoadingFinish", "body": {}
        });
        match parse_incoming(&frame) {
            Some(IncomingFrame::Event { name, .. }) => {
                assert_eq!(name, PROJECT_LOADING_FINISH);
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_incoming_rejects_unknown_type() {
        assert!(parse_incoming(&serde_json::json!({"type": "request"})).is_none());
        assert!(parse_incoming(&serde_json::json!({"random": true})).is_none());
    }

    #[test]
    fn test_rename_body_deserialization() {
        let body = serde_json::json!({
            "info": { "canRename": true, "displayName": "processData" },
            "locs": [{
                "file": "src/a.ts",
                "locs": [
                    { "start": { "line": 1, "offset": 10 }, "end": { "line": 1, "offset": 21 } },
                    { "start": { "line": 8, "offset": 3 }, "end": { "line": 8, "offset": 14 },
                      "prefixText": "processData: " }
                ]
            }]
        });
        let parsed: RenameBody = serde_json::from_value(body).unwrap();
        assert!(parsed.info.can_rename);
        assert_eq!(parsed.locs.len(), 1);

        let edits = parsed.locs[0].to_edits("handleData");
        assert_eq!(edits[0].new_text, "handleData");
        assert_eq!(edits[1].new_text, "processData: handleData");
    }

    #[test]
    fn test_rename_body_cannot_rename() {
        let body = serde_json::json!({
            "info": {
                "canRename": false,
                "localizedErrorMessage": "You cannot rename this element."
            },
            "locs": []
        });
        let parsed: RenameBody = serde_json::from_value(body).unwrap();
        assert!(!parsed.info.can_rename);
        assert_eq!(
            parsed.info.localized_error_message.as_deref(),
            Some("You cannot rename this element.")
        );
    }

    #[test]
    fn test_refactor_edits_body_deserialization() {
        let body = serde_json::json!({
            "edits": [{
                "fileName": "src/a.ts",
                "textChanges": [{
                    "start": { "line": 2, "offset": 1 },
                    "end": { "line": 2, "offset": 1 },
                    "newText": "const newLocal = 3.14159;\n"
                }]
            }],
            "renameLocation": { "line": 2, "offset": 7 },
            "renameFilename": "src/a.ts"
        });
        let parsed: RefactorEditsBody = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.edits.len(), 1);
        let edits = parsed.edits[0].to_edits();
        assert_eq!(edits[0].file, std::path::PathBuf::from("src/a.ts"));
        assert!(edits[0].new_text.contains("newLocal"));
        assert_eq!(parsed.rename_location.unwrap().offset, 7);
    }

    #[test]
    fn test_applicable_refactors_deserialization() {
        let body = serde_json::json!([{
            "name": "Extract Symbol",
            "description": "Extract function",
            "actions": [
                { "name": "function_scope_0", "description": "Extract to inner function" },
                { "name": "constant_scope_0", "description": "Extract to constant",
                  "notApplicableReason": "selection is not an expression" }
            ]
        }]);
        let parsed: Vec<ApplicableRefactor> = serde_json::from_value(body).unwrap();
        assert_eq!(parsed[0].name, "Extract Symbol");
        assert!(parsed[0].actions[0].is_applicable());
        assert!(!parsed[0].actions[1].is_applicable());
    }

    #[test]
    fn test_references_body_deserialization() {
        let body = serde_json::json!({
            "refs": [{
                "file": "src/b.ts",
                "start": { "line": 3, "offset": 10 },
                "end": { "line": 3, "offset": 21 },
                "lineText": "import { processData } from './a';",
                "isDefinition": false,
                "isWriteAccess": false
            }],
            "symbolName": "processData"
        });
        let parsed: ReferencesBody = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.refs.len(), 1);
        assert_eq!(parsed.symbol_name.as_deref(), Some("processData"));
        assert!(!parsed.refs[0].is_definition);
    }

    #[test]
    fn test_organize_imports_args_shape() {
        let args = organize_imports_args(std::path::Path::new("src/a.ts"));
        assert_eq!(args["scope"]["type"], "file");
        assert_eq!(args["scope"]["args"]["file"], "src/a.ts");
    }

    #[test]
    fn test_open_args_with_content_override() {
        let args = open_args(std::path::Path::new("a.ts"), Some("const x = 1;"));
        assert_eq!(args["fileContent"], "const x = 1;");

        let args = open_args(std::path::Path::new("a.ts"), None);
        assert!(args.get("fileContent").is_none());
    }

    #[test]
    fn test_project_info_args_requests_file_list() {
        let args = project_info_args(std::path::Path::new("a.ts"));
        assert_eq!(args["needFileNameList"], true);
    }
}

//! Internal LSP message serde types for JSON-RPC communication.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fu_types::{Diagnostic, DocumentId, Range};

pub(crate) const PARSE_ERROR: i64 = -32700;
pub(crate) const INVALID_REQUEST: i64 = -32600;
pub(crate) const METHOD_NOT_FOUND: i64 = -32601;
pub(crate) const SERVER_NOT_INITIALIZED: i64 = -32002;

/// Full document sync: every change carries the whole text.
const TEXT_DOCUMENT_SYNC_FULL: u8 = 1;

/// LSP `DiagnosticSeverity.Error`.
const SEVERITY_ERROR: u8 = 1;

pub(crate) enum Incoming {
    Request {
        id: Value,
        method: String,
        params: Option<Value>,
    },
    Notification {
        method: String,
        params: Option<Value>,
    },
    /// A response to something we never send; ignored.
    Response,
}

pub(crate) fn parse_incoming(frame: &Value) -> Option<Incoming> {
    let id = frame.get("id");
    let method = frame
        .get("method")
        .and_then(Value::as_str)
        .map(String::from);
    let params = frame.get("params").cloned();

    match (id, method) {
        (Some(id), Some(method)) => Some(Incoming::Request {
            id: id.clone(),
            method,
            params,
        }),
        (None, Some(method)) => Some(Incoming::Notification { method, params }),
        (Some(_), None) if frame.get("result").is_some() || frame.get("error").is_some() => {
            Some(Incoming::Response)
        }
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    pub fn new(method: &'static str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// Successful response. `result` is always present, `null` included.
pub(crate) fn success_response(id: Value, result: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub(crate) fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into()
        }
    })
}

pub(crate) fn initialize_result(name: &str, version: &str) -> Value {
    serde_json::json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                "change": TEXT_DOCUMENT_SYNC_FULL
            }
        },
        "serverInfo": {
            "name": name,
            "version": version
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextDocumentItem {
    pub uri: String,
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidOpenParams {
    pub text_document: TextDocumentItem,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionedTextDocumentIdentifier {
    pub uri: String,
    pub version: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentChange {
    /// Present only for incremental changes, which we do not advertise.
    #[serde(default)]
    pub range: Option<Value>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidChangeParams {
    pub text_document: VersionedTextDocumentIdentifier,
    pub content_changes: Vec<ContentChange>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextDocumentIdentifier {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidCloseParams {
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Serialize)]
pub(crate) struct PublishDiagnosticsParams<'a> {
    pub uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    pub diagnostics: Vec<LspDiagnostic<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LspDiagnostic<'a> {
    pub range: Range,
    pub severity: u8,
    pub source: &'a str,
    pub message: &'a str,
}

impl<'a> LspDiagnostic<'a> {
    pub fn from_diagnostic(diagnostic: &'a Diagnostic, source: &'a str) -> Self {
        Self {
            range: diagnostic.range(),
            severity: SEVERITY_ERROR,
            source,
            message: diagnostic.message(),
        }
    }
}

pub(crate) fn publish_diagnostics_params<'a>(
    id: &'a DocumentId,
    version: Option<i32>,
    diagnostics: &'a [Diagnostic],
    source: &'a str,
) -> PublishDiagnosticsParams<'a> {
    PublishDiagnosticsParams {
        uri: id.as_str(),
        version,
        diagnostics: diagnostics
            .iter()
            .map(|d| LspDiagnostic::from_diagnostic(d, source))
            .collect(),
    }
}

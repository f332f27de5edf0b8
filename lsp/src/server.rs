//! Stdio language server: turns document lifecycle notifications into bridge
//! events and publishes whatever the store records.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};

use fu_frontend::FrontEnd;
use fu_types::{DocumentId, TextDocument};

use crate::bridge::DiagnosticsBridge;
use crate::codec::{FrameReader, FrameWriter};
use crate::protocol::{
    self, DidChangeParams, DidCloseParams, DidOpenParams, Incoming, Notification,
};
use crate::types::{DiagnosticsConfig, EditorEvent};

const SERVER_NAME: &str = "fu-ls";

/// How a [`LanguageServer::serve`] session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerExit {
    /// `exit` after a successful `shutdown`.
    Clean,
    /// `exit` without a preceding `shutdown`.
    WithoutShutdown,
    /// The client closed the stream.
    Disconnected,
}

impl ServerExit {
    /// Process exit code for this outcome.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::WithoutShutdown | Self::Disconnected => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingInitialize,
    Running,
    ShutdownRequested,
}

struct OpenDocument {
    document: TextDocument,
    version: i32,
}

pub struct LanguageServer<F: FrontEnd> {
    bridge: DiagnosticsBridge<F>,
    source: String,
    documents: HashMap<DocumentId, OpenDocument>,
    phase: Phase,
}

impl<F: FrontEnd> LanguageServer<F> {
    pub fn new(front_end: F, config: &DiagnosticsConfig) -> Self {
        Self {
            bridge: DiagnosticsBridge::new(front_end, config.language_id.clone()),
            source: config.source.clone(),
            documents: HashMap::new(),
            phase: Phase::AwaitingInitialize,
        }
    }

    #[must_use]
    pub fn bridge(&self) -> &DiagnosticsBridge<F> {
        &self.bridge
    }

    /// Number of documents currently open in the client.
    #[must_use]
    pub fn open_documents(&self) -> usize {
        self.documents.len()
    }

    /// Run the session until `exit` or end of input.
    ///
    /// Malformed JSON bodies are answered with a parse error and skipped.
    /// Framing and transport failures end the session with an error.
    pub async fn serve<R, W>(&mut self, reader: R, writer: W) -> Result<ServerExit>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = FrameReader::new(reader);
        let mut writer = FrameWriter::new(writer);

        loop {
            let frame = match reader.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Client closed the connection");
                    return Ok(ServerExit::Disconnected);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Discarding malformed message: {e}");
                    let response =
                        protocol::error_response(Value::Null, protocol::PARSE_ERROR, e.to_string());
                    writer
                        .write_frame(&response)
                        .await
                        .context("Failed to write parse error")?;
                    continue;
                }
                Err(e) => return Err(e).context("Failed to read client message"),
            };

            match protocol::parse_incoming(&frame) {
                Some(Incoming::Request { id, method, params }) => {
                    let response = self.handle_request(id, &method, params.as_ref());
                    writer
                        .write_frame(&response)
                        .await
                        .with_context(|| format!("Failed to answer {method}"))?;
                }
                Some(Incoming::Notification { method, .. }) if method == "exit" => {
                    let exit = if self.phase == Phase::ShutdownRequested {
                        ServerExit::Clean
                    } else {
                        tracing::warn!("Exit received without shutdown");
                        ServerExit::WithoutShutdown
                    };
                    return Ok(exit);
                }
                Some(Incoming::Notification { method, params }) => {
                    self.handle_notification(&method, params);
                }
                Some(Incoming::Response) => tracing::trace!("Ignoring client response"),
                None => tracing::debug!("Ignoring message that is neither request nor notification"),
            }

            self.publish_changes(&mut writer).await?;
        }
    }

    fn handle_request(&mut self, id: Value, method: &str, params: Option<&Value>) -> Value {
        match (self.phase, method) {
            (Phase::AwaitingInitialize, "initialize") => {
                let client = params
                    .and_then(|p| p.pointer("/clientInfo/name"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                tracing::info!(client, "Session initialized");
                self.phase = Phase::Running;
                protocol::success_response(
                    id,
                    protocol::initialize_result(SERVER_NAME, env!("CARGO_PKG_VERSION")),
                )
            }
            (Phase::AwaitingInitialize, _) => protocol::error_response(
                id,
                protocol::SERVER_NOT_INITIALIZED,
                "Server not initialized",
            ),
            (Phase::ShutdownRequested, _) => protocol::error_response(
                id,
                protocol::INVALID_REQUEST,
                "Server is shutting down",
            ),
            (Phase::Running, "initialize") => {
                protocol::error_response(id, protocol::INVALID_REQUEST, "Already initialized")
            }
            (Phase::Running, "shutdown") => {
                tracing::info!("Shutdown requested");
                self.phase = Phase::ShutdownRequested;
                protocol::success_response(id, Value::Null)
            }
            (Phase::Running, _) => {
                tracing::debug!(method, "Unsupported request");
                protocol::error_response(
                    id,
                    protocol::METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                )
            }
        }
    }

    fn handle_notification(&mut self, method: &str, params: Option<Value>) {
        if self.phase == Phase::AwaitingInitialize {
            tracing::debug!(method, "Dropping notification before initialize");
            return;
        }
        match method {
            "textDocument/didOpen" => {
                if let Some(params) = parse_params(method, params) {
                    self.did_open(params);
                }
            }
            "textDocument/didChange" => {
                if let Some(params) = parse_params(method, params) {
                    self.did_change(params);
                }
            }
            "textDocument/didClose" => {
                if let Some(params) = parse_params(method, params) {
                    self.did_close(params);
                }
            }
            "initialized" => tracing::debug!("Client confirmed initialization"),
            _ => tracing::trace!(method, "Ignoring notification"),
        }
    }

    fn did_open(&mut self, params: DidOpenParams) {
        let item = params.text_document;
        let id = DocumentId::new(item.uri);
        let document = TextDocument::new(id.clone(), item.language_id, item.text);
        tracing::debug!(document = %id, language = document.language_id(), "Document opened");

        self.bridge
            .handle_event(EditorEvent::ActiveEditorChanged(Some(&document)));
        self.documents.insert(
            id,
            OpenDocument {
                document,
                version: item.version,
            },
        );
    }

    fn did_change(&mut self, params: DidChangeParams) {
        let id = DocumentId::new(params.text_document.uri);
        let Some(open) = self.documents.get_mut(&id) else {
            tracing::warn!(document = %id, "Change for a document that is not open");
            return;
        };
        if params.content_changes.iter().any(|c| c.range.is_some()) {
            tracing::warn!(document = %id, "Ignoring incremental change; only full sync is supported");
            return;
        }
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        open.document.set_text(change.text);
        open.version = params.text_document.version;
        self.bridge
            .handle_event(EditorEvent::DocumentChanged(&open.document));
    }

    fn did_close(&mut self, params: DidCloseParams) {
        let id = DocumentId::new(params.text_document.uri);
        if self.documents.remove(&id).is_some() {
            tracing::debug!(document = %id, "Document closed; diagnostics kept");
        }
    }

    async fn publish_changes<W: AsyncWrite + Unpin>(
        &mut self,
        writer: &mut FrameWriter<W>,
    ) -> Result<()> {
        let changes = self.bridge.store_mut().drain_changes();
        for (id, diagnostics) in changes {
            let version = self.documents.get(&id).map(|open| open.version);
            let params =
                protocol::publish_diagnostics_params(&id, version, &diagnostics, &self.source);
            let params = serde_json::to_value(&params)
                .context("Failed to serialize publishDiagnostics params")?;
            let notification = Notification::new("textDocument/publishDiagnostics", Some(params));
            let frame = serde_json::to_value(&notification)
                .context("Failed to serialize publishDiagnostics")?;
            writer
                .write_frame(&frame)
                .await
                .with_context(|| format!("Failed to publish diagnostics for {id}"))?;
        }
        Ok(())
    }
}

fn parse_params<T: DeserializeOwned>(method: &str, params: Option<Value>) -> Option<T> {
    let Some(params) = params else {
        tracing::warn!(method, "Notification without params");
        return None;
    };
    match serde_json::from_value(params) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(method, "Invalid params: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::test_support::ScriptedFrontEnd;

    const URI: &str = "file:///w/a.fu";

    fn scripted() -> ScriptedFrontEnd {
        ScriptedFrontEnd::new()
            .on("x=1", vec![(1, 1, 1, 2, "unexpected token")])
            .on("y=", vec![(1, 3, 1, 4, "expected expression")])
    }

    async fn encode(messages: &[Value]) -> Vec<u8> {
        let mut writer = FrameWriter::new(Vec::new());
        for msg in messages {
            writer.write_frame(msg).await.unwrap();
        }
        writer.into_inner()
    }

    async fn decode(bytes: &[u8]) -> Vec<Value> {
        let mut reader = FrameReader::new(bytes);
        let mut out = Vec::new();
        while let Some(frame) = reader.read_frame().await.unwrap() {
            out.push(frame);
        }
        out
    }

    fn request(id: u64, method: &str) -> Value {
        serde_json::json!({"jsonrpc": "2.0", "id": id, "method": method, "params": {}})
    }

    fn notify(method: &str, params: Value) -> Value {
        serde_json::json!({"jsonrpc": "2.0", "method": method, "params": params})
    }

    fn did_open(text: &str) -> Value {
        notify(
            "textDocument/didOpen",
            serde_json::json!({
                "textDocument": {"uri": URI, "languageId": "fu", "version": 1, "text": text}
            }),
        )
    }

    fn did_change(version: i32, text: &str) -> Value {
        notify(
            "textDocument/didChange",
            serde_json::json!({
                "textDocument": {"uri": URI, "version": version},
                "contentChanges": [{"text": text}]
            }),
        )
    }

    fn exit() -> Value {
        serde_json::json!({"jsonrpc": "2.0", "method": "exit"})
    }

    async fn run(messages: &[Value]) -> (ServerExit, Vec<Value>, LanguageServer<ScriptedFrontEnd>) {
        let input = encode(messages).await;
        let mut output = Vec::new();
        let mut server = LanguageServer::new(scripted(), &DiagnosticsConfig::default());
        let exit = server.serve(input.as_slice(), &mut output).await.unwrap();
        (exit, decode(&output).await, server)
    }

    fn publishes(frames: &[Value]) -> Vec<&Value> {
        frames
            .iter()
            .filter(|f| f["method"] == "textDocument/publishDiagnostics")
            .collect()
    }

    #[tokio::test]
    async fn test_full_session_publishes_on_open_and_change() {
        let (exit, frames, server) = run(&[
            request(1, "initialize"),
            notify("initialized", serde_json::json!({})),
            did_open("x=1"),
            did_change(2, "x = 1;"),
            request(2, "shutdown"),
            exit(),
        ])
        .await;

        assert_eq!(exit, ServerExit::Clean);
        assert_eq!(exit.exit_code(), 0);
        assert_eq!(frames[0]["id"], 1);
        assert_eq!(frames[0]["result"]["serverInfo"]["name"], "fu-ls");

        let published = publishes(&frames);
        assert_eq!(published.len(), 2);
        let first = &published[0]["params"];
        assert_eq!(first["uri"], URI);
        assert_eq!(first["version"], 1);
        assert_eq!(first["diagnostics"][0]["message"], "unexpected token");
        assert_eq!(first["diagnostics"][0]["severity"], 1);
        assert_eq!(first["diagnostics"][0]["source"], "fu");
        assert_eq!(first["diagnostics"][0]["range"]["start"]["character"], 0);

        let second = &published[1]["params"];
        assert_eq!(second["version"], 2);
        assert_eq!(second["diagnostics"], serde_json::json!([]));

        let shutdown = frames.last().unwrap();
        assert_eq!(shutdown["id"], 2);
        assert!(shutdown["result"].is_null());
        assert!(server.bridge().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_request_before_initialize_rejected() {
        let (exit, frames, _) = run(&[request(1, "shutdown"), did_open("x=1")]).await;
        assert_eq!(exit, ServerExit::Disconnected);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["error"]["code"], protocol::SERVER_NOT_INITIALIZED);
    }

    #[tokio::test]
    async fn test_unknown_method_and_requests_after_shutdown() {
        let (_, frames, _) = run(&[
            request(1, "initialize"),
            request(2, "textDocument/hover"),
            request(3, "shutdown"),
            request(4, "textDocument/hover"),
        ])
        .await;
        assert_eq!(frames[1]["error"]["code"], protocol::METHOD_NOT_FOUND);
        assert_eq!(frames[2]["id"], 3);
        assert_eq!(frames[3]["error"]["code"], protocol::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_exit_without_shutdown() {
        let (exit, _, _) = run(&[request(1, "initialize"), exit()]).await;
        assert_eq!(exit, ServerExit::WithoutShutdown);
        assert_eq!(exit.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_answered_and_skipped() {
        let mut input = b"Content-Length: 5\r\n\r\n{nope".to_vec();
        input.extend(encode(&[request(1, "initialize")]).await);

        let mut output = Vec::new();
        let mut server = LanguageServer::new(scripted(), &DiagnosticsConfig::default());
        let exit = server.serve(input.as_slice(), &mut output).await.unwrap();
        let frames = decode(&output).await;

        assert_eq!(exit, ServerExit::Disconnected);
        assert_eq!(frames[0]["error"]["code"], protocol::PARSE_ERROR);
        assert!(frames[0]["id"].is_null());
        assert_eq!(frames[1]["id"], 1);
    }

    #[tokio::test]
    async fn test_broken_framing_is_an_error() {
        let input = b"Content-Length: nine\r\n\r\n{}".to_vec();
        let mut output = Vec::new();
        let mut server = LanguageServer::new(scripted(), &DiagnosticsConfig::default());
        assert!(server.serve(input.as_slice(), &mut output).await.is_err());
    }

    #[tokio::test]
    async fn test_close_keeps_diagnostics() {
        let close = notify(
            "textDocument/didClose",
            serde_json::json!({"textDocument": {"uri": URI}}),
        );
        let (_, frames, server) = run(&[request(1, "initialize"), did_open("x=1"), close]).await;

        assert_eq!(publishes(&frames).len(), 1);
        assert_eq!(server.open_documents(), 0);
        assert_eq!(server.bridge().snapshot().total_count(), 1);
    }

    #[tokio::test]
    async fn test_incremental_and_unknown_changes_ignored() {
        let incremental = notify(
            "textDocument/didChange",
            serde_json::json!({
                "textDocument": {"uri": URI, "version": 2},
                "contentChanges": [{
                    "range": {"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 1}},
                    "text": "y"
                }]
            }),
        );
        let unknown = notify(
            "textDocument/didChange",
            serde_json::json!({
                "textDocument": {"uri": "file:///w/other.fu", "version": 2},
                "contentChanges": [{"text": "y="}]
            }),
        );
        let (_, frames, server) =
            run(&[request(1, "initialize"), did_open("x=1"), incremental, unknown]).await;

        assert_eq!(publishes(&frames).len(), 1);
        let id = DocumentId::new(URI);
        assert_eq!(server.bridge().diagnostics_for(&id)[0].message(), "unexpected token");
    }

    #[tokio::test]
    async fn test_foreign_language_never_published() {
        let open = notify(
            "textDocument/didOpen",
            serde_json::json!({
                "textDocument": {"uri": "file:///w/n.txt", "languageId": "plaintext", "version": 1, "text": "x=1"}
            }),
        );
        let (_, frames, server) = run(&[request(1, "initialize"), open]).await;
        assert!(publishes(&frames).is_empty());
        assert!(server.bridge().system().is_none());
    }

    #[tokio::test]
    async fn test_notifications_before_initialize_dropped() {
        let (_, frames, server) = run(&[did_open("x=1")]).await;
        assert!(frames.is_empty());
        assert_eq!(server.open_documents(), 0);
    }
}

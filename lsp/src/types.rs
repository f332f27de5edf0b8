//! Public types consumed by the binary and by other hosts.
//!
//! A host constructs [`DiagnosticsConfig`], feeds [`EditorEvent`]s into the
//! bridge, and reads [`DiagnosticsSnapshot`]s for display.

use serde::Deserialize;

use fu_types::{Diagnostic, DocumentId, TextDocument};

fn default_language_id() -> String {
    String::from("fu")
}

fn default_source() -> String {
    String::from("fu")
}

fn default_file_extensions() -> Vec<String> {
    vec![String::from("fu")]
}

/// Configuration for the diagnostics bridge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosticsConfig {
    /// Language tag a document must carry to be parsed. Default: "fu".
    #[serde(default = "default_language_id")]
    pub language_id: String,
    /// Source label attached to published diagnostics. Default: "fu".
    #[serde(default = "default_source")]
    pub source: String,
    /// File extensions treated as `language_id` when reading from disk.
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            language_id: default_language_id(),
            source: default_source(),
            file_extensions: default_file_extensions(),
        }
    }
}

impl DiagnosticsConfig {
    /// Language tag for a file extension, if it is one of ours.
    #[must_use]
    pub fn language_for_extension(&self, extension: &str) -> Option<&str> {
        self.file_extensions
            .iter()
            .any(|ext| ext == extension)
            .then_some(self.language_id.as_str())
    }
}

/// A document lifecycle event from the host editor.
#[derive(Debug, Clone, Copy)]
pub enum EditorEvent<'a> {
    /// Focus moved to another editor (or to none). Also used for the editor
    /// that is focused when the session starts.
    ActiveEditorChanged(Option<&'a TextDocument>),
    /// The text of a document changed.
    DocumentChanged(&'a TextDocument),
}

/// Immutable snapshot of every non-empty diagnostic sequence, sorted by
/// document identity.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    files: Vec<(DocumentId, Vec<Diagnostic>)>,
}

impl DiagnosticsSnapshot {
    pub(crate) fn new(files: Vec<(DocumentId, Vec<Diagnostic>)>) -> Self {
        Self { files }
    }

    #[must_use]
    pub fn files(&self) -> &[(DocumentId, Vec<Diagnostic>)] {
        &self.files
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total diagnostic count across all documents.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.files.iter().map(|(_, items)| items.len()).sum()
    }
}

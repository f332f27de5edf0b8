//! Diagnostic records and the per-refresh batch that accumulates them.

use std::path::Path;

use crate::span::{Range, SourceSpan};

/// A single parse diagnostic.
///
/// Fields are private; a diagnostic is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 0-based range.
    range: Range,
    message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }

    /// Build from a 1-based span as reported by a front-end.
    #[must_use]
    pub fn from_report(span: SourceSpan, message: impl Into<String>) -> Self {
        Self::new(span.to_range(), message)
    }

    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Format as `path:line:col: error: message` (1-indexed for display).
    #[must_use]
    pub fn display_with_path(&self, path: &Path) -> String {
        format!(
            "{}:{}:{}: error: {}",
            path.display(),
            self.range.start.line + 1,
            self.range.start.character + 1,
            self.message,
        )
    }
}

/// Diagnostics collected during one refresh, in emission order.
///
/// A new batch is created for every refresh and moved into the store when the
/// refresh publishes; a batch is never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticBatch {
    items: Vec<Diagnostic>,
}

impl DiagnosticBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl<'a> IntoIterator for &'a DiagnosticBatch {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

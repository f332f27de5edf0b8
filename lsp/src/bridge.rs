//! Diagnostics bridge: re-parses a document on every lifecycle event and
//! republishes its diagnostics.
//!
//! A refresh is one `&mut self` call: the batch is cleared, the parser runs to
//! completion with every sink callback, and the batch is published before the
//! call returns. Refreshes therefore never interleave, and the sequence stored
//! for a document always comes from its latest snapshot.

use fu_frontend::{ErrorSink, FrontEnd, ParseContext, Parser};
use fu_types::{Diagnostic, DiagnosticBatch, DocumentId, SourceSpan, TextDocument};

use crate::diagnostics::DiagnosticsStore;
use crate::types::{DiagnosticsSnapshot, EditorEvent};

/// Adapts sink callbacks into diagnostic records for one batch.
struct BatchSink<'b> {
    batch: &'b mut DiagnosticBatch,
}

impl ErrorSink for BatchSink<'_> {
    fn report(
        &mut self,
        filename: &str,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
        message: &str,
    ) {
        tracing::trace!(
            file = filename,
            line = start_line,
            column = start_column,
            "Parse error reported: {message}"
        );
        let span = SourceSpan::new(start_line, start_column, end_line, end_column);
        self.batch.push(Diagnostic::from_report(span, message));
    }
}

/// Owns the shared system of one editing session and the diagnostics store.
pub struct DiagnosticsBridge<F: FrontEnd> {
    front_end: F,
    language_id: String,
    /// Built on the first refresh, then reused by every parse.
    system: Option<F::System>,
    store: DiagnosticsStore,
}

impl<F: FrontEnd> DiagnosticsBridge<F> {
    pub fn new(front_end: F, language_id: impl Into<String>) -> Self {
        Self {
            front_end,
            language_id: language_id.into(),
            system: None,
            store: DiagnosticsStore::new(),
        }
    }

    #[must_use]
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// The shared system, if a refresh has built it.
    #[must_use]
    pub fn system(&self) -> Option<&F::System> {
        self.system.as_ref()
    }

    #[must_use]
    pub fn store(&self) -> &DiagnosticsStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DiagnosticsStore {
        &mut self.store
    }

    #[must_use]
    pub fn diagnostics_for(&self, id: &DocumentId) -> &[Diagnostic] {
        self.store.diagnostics_for(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.store.snapshot()
    }

    /// Route a host event to [`Self::refresh`].
    pub fn handle_event(&mut self, event: EditorEvent<'_>) {
        match event {
            EditorEvent::ActiveEditorChanged(Some(document))
            | EditorEvent::DocumentChanged(document) => self.refresh(document),
            EditorEvent::ActiveEditorChanged(None) => {}
        }
    }

    /// Re-parse `document` and replace its published diagnostics.
    ///
    /// Documents in another language are left alone, including whatever was
    /// published for them before.
    pub fn refresh(&mut self, document: &TextDocument) {
        if document.language_id() != self.language_id {
            tracing::trace!(
                document = %document.id(),
                language = document.language_id(),
                "Skipping refresh for foreign language"
            );
            return;
        }

        let mut batch = DiagnosticBatch::new();
        let front_end = &self.front_end;
        let system = self.system.get_or_insert_with(|| {
            tracing::debug!("Building shared system");
            front_end.new_system()
        });

        let filename = document.id().file_name();
        let input = document.text().as_bytes();
        {
            let mut sink = BatchSink { batch: &mut batch };
            let context = ParseContext::new(system, front_end.new_program());
            let mut parser = Parser::new(front_end, &mut sink, context);
            parser.parse(&filename, input, input.len());
        }

        tracing::debug!(
            document = %document.id(),
            count = batch.len(),
            "Diagnostics refreshed"
        );
        self.store.publish(document.id().clone(), batch);
    }
}

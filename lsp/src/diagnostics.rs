//! Diagnostics store, the keyed collection rendering reads from.
//!
//! Each identity maps to the sequence from its most recent refresh. A publish
//! always replaces; nothing is ever appended across refreshes.

use std::collections::HashMap;

use fu_types::{Diagnostic, DiagnosticBatch, DocumentId};

use crate::types::DiagnosticsSnapshot;

#[derive(Debug, Default)]
pub struct DiagnosticsStore {
    data: HashMap<DocumentId, Vec<Diagnostic>>,
    /// Identities published since the last drain, in first-publish order.
    changed: Vec<DocumentId>,
}

impl DiagnosticsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sequence for `id` with `batch`.
    ///
    /// An empty batch is stored as an empty sequence so that rendering can
    /// clear what it showed before.
    pub fn publish(&mut self, id: DocumentId, batch: DiagnosticBatch) {
        if !self.changed.contains(&id) {
            self.changed.push(id.clone());
        }
        self.data.insert(id, batch.into_vec());
    }

    /// Sequence last published for `id`, or `None` if it was never refreshed.
    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<&[Diagnostic]> {
        self.data.get(id).map(Vec::as_slice)
    }

    /// Sequence for `id`; empty when nothing was published.
    #[must_use]
    pub fn diagnostics_for(&self, id: &DocumentId) -> &[Diagnostic] {
        self.get(id).unwrap_or(&[])
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let mut files: Vec<(DocumentId, Vec<Diagnostic>)> = self
            .data
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(id, items)| (id.clone(), items.clone()))
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        DiagnosticsSnapshot::new(files)
    }

    /// Take every identity published since the last drain, with its current
    /// sequence.
    pub fn drain_changes(&mut self) -> Vec<(DocumentId, Vec<Diagnostic>)> {
        std::mem::take(&mut self.changed)
            .into_iter()
            .map(|id| {
                let items = self.diagnostics_for(&id).to_vec();
                (id, items)
            })
            .collect()
    }
}

//! Core domain types for fu-ls.
//!
//! This crate contains the document and diagnostic vocabulary shared by the
//! front-end contract, the diagnostics bridge, and the language server.
//! No IO, no async.

mod diagnostic;
mod document;
mod span;

pub use diagnostic::{Diagnostic, DiagnosticBatch};
pub use document::{DocumentId, PathToUriError, TextDocument};
pub use span::{Position, Range, SourceSpan};

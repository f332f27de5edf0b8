//! Diagnostics bridge and stdio language server for Fu source files.
//!
//! The bridge re-parses a document through a [`fu_frontend::FrontEnd`] on every
//! lifecycle event and stores the resulting diagnostics per document. The
//! server speaks LSP over any async byte stream and publishes each refresh.

pub mod codec;
pub mod types;

mod bridge;
mod diagnostics;
pub(crate) mod protocol;
mod server;

pub use bridge::DiagnosticsBridge;
pub use diagnostics::DiagnosticsStore;
pub use server::{LanguageServer, ServerExit};
pub use types::{DiagnosticsConfig, DiagnosticsSnapshot, EditorEvent};

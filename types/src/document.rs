//! Document identity and text snapshots.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
#[error("cannot convert path to file URI: {}", .path.display())]
pub struct PathToUriError {
    path: PathBuf,
}

/// Opaque key for one open document, normally a URI.
///
/// Diagnostics are scoped to exactly one identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Identity for a file on disk. The path must be absolute.
    pub fn from_path(path: &Path) -> Result<Self, PathToUriError> {
        Url::from_file_path(path)
            .map(|url| Self(url.into()))
            .map_err(|()| PathToUriError {
                path: path.to_path_buf(),
            })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system path for `file:` identities.
    #[must_use]
    pub fn to_file_path(&self) -> Option<PathBuf> {
        Url::parse(&self.0)
            .ok()
            .and_then(|url| url.to_file_path().ok())
    }

    /// Name handed to the front-end: the path for `file:` identities, the raw
    /// identity otherwise.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.to_file_path()
            .map_or_else(|| self.0.clone(), |path| path.display().to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One snapshot of a document: identity, language tag, and full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    id: DocumentId,
    language_id: String,
    text: String,
}

impl TextDocument {
    #[must_use]
    pub fn new(id: DocumentId, language_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            language_id: language_id.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    #[must_use]
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text with a newer snapshot.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

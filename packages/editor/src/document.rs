//! # Documents
//!
//! The document being edited and the wire shapes the document service
//! returns for it.
//!
//! An [`EditableDocument`] is fetched once when a session starts and is
//! never mutated afterwards: the working copy lives in
//! [`SessionState`](crate::SessionState), and publishing produces a new,
//! separately identified document rather than changing this one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque document identity assigned by the document service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle status reported by the document service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Generating,
    Completed,
    Failed,
    /// Any status this client does not know about
    #[serde(untagged)]
    Other(String),
}

impl DocumentStatus {
    /// Published documents are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Draft => f.write_str("DRAFT"),
            DocumentStatus::Generating => f.write_str("GENERATING"),
            DocumentStatus::Completed => f.write_str("COMPLETED"),
            DocumentStatus::Failed => f.write_str("FAILED"),
            DocumentStatus::Other(status) => f.write_str(status),
        }
    }
}

/// Document as returned by `GET /documents/{id}` and by publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub document_id: DocumentId,
    pub document_type: String,
    pub version: String,
    pub status: DocumentStatus,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of `GET /documents/{id}/content`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub content: String,
}

/// The document a session edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableDocument {
    pub document_id: DocumentId,

    /// Full serialized markup, the authoritative rendered form
    pub content: String,

    /// Display-only
    pub document_type: String,

    /// Display-only; not used for conflict detection
    pub version: String,
}

impl EditableDocument {
    pub fn new(document_id: impl Into<DocumentId>, content: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            content: content.into(),
            document_type: String::new(),
            version: String::new(),
        }
    }

    pub fn with_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = document_type.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Build from a fetched document, using `content` when the response
    /// carried none inline
    pub fn from_response(response: DocumentResponse, content: Option<String>) -> Self {
        Self {
            content: response.content.or(content).unwrap_or_default(),
            document_id: response.document_id,
            document_type: response.document_type,
            version: response.version,
        }
    }
}

//! # Publishing
//!
//! Publish copies a draft into a new, independently identified document in
//! a terminal status. The draft keeps its id and content; the two records
//! are linked only through `original_document_id`.

use crate::document::{DocumentId, DocumentResponse, DocumentStatus};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::state::SaveTicket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Attempts at minting an id that differs from the draft's before giving up
const MAX_ID_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub published_at: DateTime<Utc>,
    pub published_by: DocumentId,
    pub original_document_id: DocumentId,
}

/// Body of `POST /documents/{id}/publish`.
///
/// Built once per publish and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub new_document_id: DocumentId,
    pub content: String,
    pub status: DocumentStatus,
    pub document_metadata: PublishMetadata,
}

/// What the caller learns about the newly published document
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedDocument {
    pub document_id: DocumentId,
    pub original_document_id: DocumentId,
    pub status: DocumentStatus,
    pub version: String,
    pub published_at: DateTime<Utc>,
}

impl PublishedDocument {
    pub fn from_response(record: &PublishRecord, response: DocumentResponse) -> Self {
        Self {
            document_id: response.document_id,
            original_document_id: record.document_metadata.original_document_id.clone(),
            status: response.status,
            version: response.version,
            published_at: record.document_metadata.published_at,
        }
    }
}

#[derive(Clone)]
pub struct PublishCoordinator {
    ids: Arc<dyn IdGenerator>,
}

impl Default for PublishCoordinator {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator))
    }
}

impl PublishCoordinator {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Mint an id that is not the draft's
    pub fn mint_id(&self, draft: &DocumentId) -> Option<DocumentId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.next_id();
            if &candidate != draft {
                return Some(candidate);
            }
            warn!(document_id = %draft, "Generated id collided with the draft, regenerating");
        }
        None
    }

    pub fn prepare(&self, ticket: &SaveTicket) -> Option<PublishRecord> {
        self.prepare_at(ticket, Utc::now())
    }

    pub fn prepare_at(&self, ticket: &SaveTicket, now: DateTime<Utc>) -> Option<PublishRecord> {
        let new_document_id = self.mint_id(&ticket.document_id)?;

        Some(PublishRecord {
            new_document_id,
            content: ticket.content.clone(),
            status: DocumentStatus::Completed,
            document_metadata: PublishMetadata {
                published_at: now,
                published_by: ticket.document_id.clone(),
                original_document_id: ticket.document_id.clone(),
            },
        })
    }
}

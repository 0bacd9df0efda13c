//! # Document API
//!
//! The persistence contract the session talks to. `lexdraft-client`
//! implements it over HTTP; [`MemoryDocumentApi`] implements it in-process
//! for offline use and tests.

use crate::document::{DocumentContent, DocumentId, DocumentResponse, DocumentStatus, EditableDocument};
use crate::errors::{ApiError, PaymentOption};
use crate::publish::PublishRecord;
use crate::settings::DocumentSettings;
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Body of `PUT /documents/{id}/content`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftUpdate {
    pub content: String,
    pub settings: DocumentSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    Pdf,
    Docx,
    Html,
}

impl DownloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadFormat::Pdf => "pdf",
            DownloadFormat::Docx => "docx",
            DownloadFormat::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DownloadFormat::Pdf => "application/pdf",
            DownloadFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DownloadFormat::Html => "text/html; charset=utf-8",
        }
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(DownloadFormat::Pdf),
            "docx" => Ok(DownloadFormat::Docx),
            "html" => Ok(DownloadFormat::Html),
            other => Err(format!("unknown download format: {}", other)),
        }
    }
}

/// A downloaded rendition of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub format: DownloadFormat,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn file_name(&self, id: &DocumentId) -> String {
        format!("{}.{}", id, self.format)
    }
}

#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// `GET /documents/{id}`
    async fn fetch_document(&self, id: &DocumentId) -> Result<DocumentResponse, ApiError>;

    /// `GET /documents/{id}/content`
    async fn fetch_content(&self, id: &DocumentId) -> Result<DocumentContent, ApiError>;

    /// `PUT /documents/{id}/content`; replaces the draft in place
    async fn update_content(&self, id: &DocumentId, update: &DraftUpdate) -> Result<(), ApiError>;

    /// `POST /documents/{id}/publish`; returns the new document
    async fn publish(
        &self,
        id: &DocumentId,
        record: &PublishRecord,
    ) -> Result<DocumentResponse, ApiError>;

    /// `GET /documents/{id}/download?format=...`
    async fn download(&self, id: &DocumentId, format: DownloadFormat) -> Result<Download, ApiError>;
}

/// A document as [`MemoryDocumentApi`] stores it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub metadata: DocumentResponse,
    pub content: String,
    pub settings: Option<DocumentSettings>,
}

/// Calls received, per operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch_document: usize,
    pub fetch_content: usize,
    pub update_content: usize,
    pub publish: usize,
    pub download: usize,
}

#[derive(Default)]
struct Store {
    documents: HashMap<DocumentId, StoredDocument>,
    failures: VecDeque<ApiError>,
    gated: HashSet<DocumentId>,
    calls: CallCounts,
    publish_records: Vec<PublishRecord>,
}

/// In-process [`DocumentApi`] with optional latency and injected failures
#[derive(Default)]
pub struct MemoryDocumentApi {
    store: Mutex<Store>,
    latency: Option<Duration>,
    writes_in_flight: AtomicUsize,
    max_writes_in_flight: AtomicUsize,
}

impl MemoryDocumentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `document` as a draft
    pub fn insert(&self, document: EditableDocument) {
        let metadata = DocumentResponse {
            document_id: document.document_id.clone(),
            document_type: document.document_type,
            version: document.version,
            status: DocumentStatus::Draft,
            generated_at: Utc::now(),
            content: None,
        };
        self.store().documents.insert(
            document.document_id,
            StoredDocument {
                metadata,
                content: document.content,
                settings: None,
            },
        );
    }

    pub fn document(&self, id: &DocumentId) -> Option<StoredDocument> {
        self.store().documents.get(id).cloned()
    }

    pub fn calls(&self) -> CallCounts {
        self.store().calls
    }

    /// Publish records received, in order
    pub fn publish_records(&self) -> Vec<PublishRecord> {
        self.store().publish_records.clone()
    }

    /// The next call fails with `error`; queued failures apply in order
    pub fn fail_next(&self, error: ApiError) {
        self.store().failures.push_back(error);
    }

    /// Downloads of `id` answer with payment required
    pub fn require_payment(&self, id: impl Into<DocumentId>) {
        self.store().gated.insert(id.into());
    }

    /// Highest number of saves and publishes observed running at once
    pub fn max_concurrent_writes(&self) -> usize {
        self.max_writes_in_flight.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn write<T>(&self, apply: impl FnOnce(&mut Store) -> Result<T, ApiError>) -> Result<T, ApiError> {
        let running = self.writes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_writes_in_flight.fetch_max(running, Ordering::SeqCst);

        self.delay().await;
        let result = {
            let mut store = self.store();
            match store.failures.pop_front() {
                Some(error) => Err(error),
                None => apply(&mut *store),
            }
        };

        self.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn read<T>(&self, apply: impl FnOnce(&mut Store) -> Result<T, ApiError>) -> Result<T, ApiError> {
        self.delay().await;
        let mut store = self.store();
        match store.failures.pop_front() {
            Some(error) => Err(error),
            None => apply(&mut *store),
        }
    }
}

/// What the service would receive: `value` after a JSON round trip
fn over_the_wire<T: Serialize + DeserializeOwned>(value: &T) -> Result<T, ApiError> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|error| ApiError::Decode(error.to_string()))
}

fn not_found(id: &DocumentId) -> ApiError {
    ApiError::NotFound(id.to_string())
}

#[async_trait]
impl DocumentApi for MemoryDocumentApi {
    async fn fetch_document(&self, id: &DocumentId) -> Result<DocumentResponse, ApiError> {
        self.store().calls.fetch_document += 1;
        self.read(|store| {
            store
                .documents
                .get(id)
                .map(|stored| stored.metadata.clone())
                .ok_or_else(|| not_found(id))
        })
        .await
    }

    async fn fetch_content(&self, id: &DocumentId) -> Result<DocumentContent, ApiError> {
        self.store().calls.fetch_content += 1;
        self.read(|store| {
            store
                .documents
                .get(id)
                .map(|stored| DocumentContent {
                    content: stored.content.clone(),
                })
                .ok_or_else(|| not_found(id))
        })
        .await
    }

    async fn update_content(&self, id: &DocumentId, update: &DraftUpdate) -> Result<(), ApiError> {
        self.store().calls.update_content += 1;
        let update = over_the_wire(update)?;
        self.write(|store| {
            let stored = store.documents.get_mut(id).ok_or_else(|| not_found(id))?;
            debug!(document_id = %id, bytes = update.content.len(), "Stored draft");
            stored.content = update.content;
            stored.settings = Some(update.settings);
            Ok(())
        })
        .await
    }

    async fn publish(
        &self,
        id: &DocumentId,
        record: &PublishRecord,
    ) -> Result<DocumentResponse, ApiError> {
        self.store().calls.publish += 1;
        let record = over_the_wire(record)?;
        self.write(|store| {
            let original = store.documents.get(id).ok_or_else(|| not_found(id))?;
            if store.documents.contains_key(&record.new_document_id) {
                return Err(ApiError::Status {
                    status: 409,
                    message: format!("Document {} already exists", record.new_document_id),
                });
            }

            let metadata = DocumentResponse {
                document_id: record.new_document_id.clone(),
                document_type: original.metadata.document_type.clone(),
                version: original.metadata.version.clone(),
                status: record.status.clone(),
                generated_at: record.document_metadata.published_at,
                content: None,
            };
            let published = StoredDocument {
                metadata: metadata.clone(),
                content: record.content.clone(),
                settings: original.settings.clone(),
            };

            store.documents.insert(record.new_document_id.clone(), published);
            store.publish_records.push(record.clone());
            Ok(metadata)
        })
        .await
    }

    async fn download(&self, id: &DocumentId, format: DownloadFormat) -> Result<Download, ApiError> {
        self.store().calls.download += 1;
        self.read(|store| {
            let stored = store.documents.get(id).ok_or_else(|| not_found(id))?;
            if store.gated.contains(id) {
                return Err(ApiError::PaymentRequired {
                    reason: "payment_required".to_string(),
                    message: "Payment is required to download this document".to_string(),
                    payment_options: vec![PaymentOption {
                        kind: "single_document".to_string(),
                        label: Some("Single document".to_string()),
                        price: Some(9.99),
                        currency: Some("USD".to_string()),
                    }],
                });
            }

            Ok(Download {
                format,
                content_type: Some(format.content_type().to_string()),
                bytes: stored.content.clone().into_bytes(),
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::PublishCoordinator;
    use crate::ids::SequentialIds;
    use crate::state::SessionState;
    use std::sync::Arc;

    fn api() -> MemoryDocumentApi {
        let api = MemoryDocumentApi::new();
        api.insert(EditableDocument::new("doc-1", "<p>Draft</p>").with_type("nda"));
        api
    }

    #[tokio::test]
    async fn test_fetch_missing_document() {
        let api = api();
        let result = api.fetch_document(&DocumentId::new("nope")).await;
        assert_eq!(result, Err(ApiError::NotFound("nope".into())));
        assert_eq!(api.calls().fetch_document, 1);
    }

    #[tokio::test]
    async fn test_update_replaces_draft_in_place() {
        let api = api();
        let id = DocumentId::new("doc-1");
        let update = DraftUpdate {
            content: "<p>Edited</p>".into(),
            settings: DocumentSettings::default(),
        };

        api.update_content(&id, &update).await.unwrap();

        let content = api.fetch_content(&id).await.unwrap();
        assert_eq!(content.content, "<p>Edited</p>");
        assert_eq!(api.document(&id).unwrap().metadata.status, DocumentStatus::Draft);
    }

    #[tokio::test]
    async fn test_publish_creates_separate_record() {
        let api = api();
        let id = DocumentId::new("doc-1");
        let mut state = SessionState::new(EditableDocument::new("doc-1", "<p>Final</p>"));
        let ticket = state.begin_publish().unwrap();
        let record = PublishCoordinator::new(Arc::new(SequentialIds::starting_at("doc", 2)))
            .prepare(&ticket)
            .unwrap();

        let response = api.publish(&id, &record).await.unwrap();

        assert_eq!(response.document_id.as_str(), "doc-2");
        assert_eq!(response.status, DocumentStatus::Completed);
        assert_eq!(response.document_type, "nda");
        assert_eq!(api.document(&id).unwrap().content, "<p>Draft</p>");
        assert_eq!(api.document(&response.document_id).unwrap().content, "<p>Final</p>");

        // Same id again conflicts
        assert!(matches!(
            api.publish(&id, &record).await,
            Err(ApiError::Status { status: 409, .. })
        ));
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let api = api();
        let id = DocumentId::new("doc-1");
        api.fail_next(ApiError::Network("connection reset".into()));

        assert!(api.fetch_document(&id).await.is_err());
        assert!(api.fetch_document(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_gated_download() {
        let api = api();
        let id = DocumentId::new("doc-1");

        let download = api.download(&id, DownloadFormat::Html).await.unwrap();
        assert_eq!(download.bytes, b"<p>Draft</p>");
        assert_eq!(download.file_name(&id), "doc-1.html");

        api.require_payment("doc-1");
        match api.download(&id, DownloadFormat::Pdf).await {
            Err(ApiError::PaymentRequired { payment_options, .. }) => {
                assert_eq!(payment_options[0].kind, "single_document")
            }
            other => panic!("expected payment required, got {:?}", other),
        }
    }

    #[test]
    fn test_download_format_parsing() {
        assert_eq!("PDF".parse::<DownloadFormat>(), Ok(DownloadFormat::Pdf));
        assert!("rtf".parse::<DownloadFormat>().is_err());
    }
}

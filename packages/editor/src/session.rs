//! # Editor Session
//!
//! Ties one document's [`SessionState`] to a [`DocumentApi`].
//!
//! ```text
//! surface change ──▶ session debouncer (300 ms) ──▶ SessionState::on_content_changed
//!
//! save()    ─ flush ─▶ begin_save    ─▶ PUT content  ─▶ commit_save | abort
//! publish() ─ flush ─▶ begin_publish ─▶ POST publish ─▶ commit_publish | abort
//! discard() ─────────▶ SessionState::discard (never calls the API)
//! ```
//!
//! State sits behind a `std::sync::Mutex` that is never held across an
//! `.await`. The `Saving` phase is what keeps saves and publishes from
//! overlapping. Failures are reported through the [`Notifier`] and come
//! back as typed outcomes; nothing here panics on a failed call.
//!
//! The session must be created inside a tokio runtime: its debouncer is a
//! spawned task.

use crate::api::{DocumentApi, Download, DownloadFormat, DraftUpdate};
use crate::config::EditorConfig;
use crate::debounce::{spawn_debouncer_with, DebounceHandle};
use crate::document::{DocumentId, EditableDocument};
use crate::errors::{ApiError, EditorError};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::publish::{PublishCoordinator, PublishedDocument};
use crate::settings::{Controls, DocumentSettings, LogoUpload, SettingsPanel, SettingsPatch, SettingsSink};
use crate::state::{Busy, SessionPhase, SessionState};
use crate::surface::ContentChange;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct SessionOptions {
    pub config: EditorConfig,
    pub notifier: Arc<dyn Notifier>,
    pub ids: Arc<dyn IdGenerator>,
    pub settings: DocumentSettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            config: EditorConfig::default(),
            notifier: Arc::new(TracingNotifier),
            ids: Arc::new(UuidGenerator),
            settings: DocumentSettings::default(),
        }
    }
}

impl SessionOptions {
    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Settings the document was loaded with
    pub fn with_settings(mut self, settings: DocumentSettings) -> Self {
        self.settings = settings;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    /// Another save or publish was in flight; nothing was sent
    AlreadySaving,
    /// Not dirty; nothing was sent
    Unchanged,
    Failed(ApiError),
    /// The session closed before the call finished; its result was dropped
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published(PublishedDocument),
    AlreadySaving,
    Failed(EditorError),
    Closed,
}

/// Point-in-time view of the session for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub document_id: DocumentId,
    pub phase: SessionPhase,
    pub content: String,
    pub settings: DocumentSettings,
    pub advisory_visible: bool,
    pub controls: Controls,
}

pub struct EditorSession {
    api: Arc<dyn DocumentApi>,
    state: Arc<Mutex<SessionState>>,
    publisher: PublishCoordinator,
    panel: SettingsPanel,
    notifier: Arc<dyn Notifier>,
    changes: DebounceHandle<(u64, String)>,

    /// Bumped by discard and rebind so queued changes from before are dropped
    epoch: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EditorSession {
    pub fn new(api: Arc<dyn DocumentApi>, document: EditableDocument, options: SessionOptions) -> Self {
        let SessionOptions {
            config,
            notifier,
            ids,
            settings,
        } = options;

        let state = SessionState::with_settings(document, settings)
            .with_policy(config.dirty_policy)
            .with_notifier(notifier.clone());
        let state = Arc::new(Mutex::new(state));
        let epoch = Arc::new(AtomicU64::new(0));
        let closed = Arc::new(AtomicBool::new(false));

        let changes = {
            let state = state.clone();
            let epoch = epoch.clone();
            let closed = closed.clone();
            spawn_debouncer_with(config.session_debounce(), move |(sent_in, content): (u64, String)| {
                if closed.load(Ordering::SeqCst) {
                    return;
                }
                let mut state = lock(&state);
                if sent_in != epoch.load(Ordering::SeqCst) {
                    debug!("Dropping content change queued before a discard");
                    return;
                }
                state.on_content_changed(content);
            })
        };

        Self {
            api,
            state,
            publisher: PublishCoordinator::new(ids),
            panel: SettingsPanel::new(config.max_logo_bytes, notifier.clone()),
            notifier,
            changes,
            epoch,
            closed,
        }
    }

    /// Fetch a document and open a session on it
    #[instrument(skip(api, options), fields(document_id = %id))]
    pub async fn load(
        api: Arc<dyn DocumentApi>,
        id: &DocumentId,
        options: SessionOptions,
    ) -> Result<Self, EditorError> {
        let fetched = async {
            let response = api.fetch_document(id).await?;
            let content = match response.content {
                Some(_) => None,
                None => Some(api.fetch_content(id).await?.content),
            };
            Ok::<_, ApiError>(EditableDocument::from_response(response, content))
        }
        .await;

        match fetched {
            Ok(document) => {
                info!(document_type = %document.document_type, bytes = document.content.len(), "Loaded document");
                Ok(Self::new(api, document, options))
            }
            Err(error) => {
                options
                    .notifier
                    .notify(Notification::error(format!("Failed to load document: {}", error)));
                Err(error.into())
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn document_id(&self) -> DocumentId {
        self.state().document_id().clone()
    }

    pub fn document(&self) -> EditableDocument {
        self.state().document().clone()
    }

    pub fn editor_content(&self) -> String {
        self.state().editor_content().to_string()
    }

    pub fn settings(&self) -> DocumentSettings {
        self.state().settings().clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.state().is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.state().is_saving()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase()
    }

    pub fn controls(&self) -> Controls {
        Controls::for_state(&self.state())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        snapshot_of(&self.state())
    }

    /// The panel, bound to this session's logo limit and notifier
    pub fn panel(&self) -> SettingsPanel {
        self.panel.clone()
    }

    /// Queue a content change; it reaches the state after the quiet period
    pub fn content_changed(&self, content: impl Into<String>) {
        if self.is_closed() {
            return;
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.changes.notify((epoch, content.into()));
    }

    /// Queue a change emitted by the content surface
    pub fn on_surface_change(&self, change: ContentChange) {
        debug!(draft = %change.draft, "Surface change");
        self.content_changed(change.content);
    }

    /// Apply a queued change now instead of after the quiet period
    pub async fn flush(&self) {
        self.changes.flush().await;
    }

    pub fn dismiss_advisory(&self) {
        self.state().dismiss_advisory();
    }

    /// Upload a cover page logo through the panel's size check
    pub fn upload_logo(&mut self, logo: LogoUpload) -> Result<(), EditorError> {
        let panel = self.panel.clone();
        panel.upload_logo(self, logo)?;
        Ok(())
    }

    /// Persist the working copy in place.
    ///
    /// A no-op while another save or publish is in flight, or when there is
    /// nothing to save. On failure the session stays dirty.
    #[instrument(skip(self), fields(document_id = %self.document_id()))]
    pub async fn save(&self) -> SaveOutcome {
        if self.is_closed() {
            return SaveOutcome::Closed;
        }
        self.flush().await;

        let begun = self.state().begin_save();
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(Busy::AlreadySaving) => {
                debug!("Save skipped, already saving");
                return SaveOutcome::AlreadySaving;
            }
            Err(Busy::NothingToSave) => return SaveOutcome::Unchanged,
        };

        let update = DraftUpdate {
            content: ticket.content.clone(),
            settings: ticket.settings.clone(),
        };
        let result = self.api.update_content(&ticket.document_id, &update).await;

        if self.is_closed() {
            debug!("Session closed during save, ignoring result");
            return SaveOutcome::Closed;
        }

        match result {
            Ok(()) => {
                self.state().commit_save(ticket);
                info!(bytes = update.content.len(), "Saved document");
                self.notifier
                    .notify(Notification::success("Document saved successfully"));
                SaveOutcome::Saved
            }
            Err(error) => {
                self.state().abort(ticket);
                warn!(%error, "Save failed");
                self.notifier
                    .notify(Notification::error(format!("Failed to save document: {}", error)));
                SaveOutcome::Failed(error)
            }
        }
    }

    /// Roll back to the content and settings present at load.
    ///
    /// Returns the restored content for the surface to re-render, or `None`
    /// while a save or publish is in flight. Changes still queued in the
    /// debouncer are dropped.
    pub fn discard(&self) -> Option<String> {
        let mut state = self.state();
        if state.is_saving() {
            return None;
        }

        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.changes.cancel();
        let restored = state.discard().map(str::to_string);
        debug!(document_id = %state.document_id(), "Discarded changes");
        restored
    }

    /// Publish the working copy as a new, completed document.
    ///
    /// The draft keeps its id and content; the caller learns the new id
    /// from the outcome.
    #[instrument(skip(self), fields(document_id = %self.document_id()))]
    pub async fn publish(&self) -> PublishOutcome {
        if self.is_closed() {
            return PublishOutcome::Closed;
        }
        self.flush().await;

        let begun = self.state().begin_publish();
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(_) => {
                debug!("Publish skipped, already saving");
                return PublishOutcome::AlreadySaving;
            }
        };

        let Some(record) = self.publisher.prepare(&ticket) else {
            let error = EditorError::IdentityUnavailable(ticket.document_id.to_string());
            self.state().abort(ticket);
            self.notifier
                .notify(Notification::error(format!("Failed to publish document: {}", error)));
            return PublishOutcome::Failed(error);
        };

        let result = self.api.publish(&ticket.document_id, &record).await;

        if self.is_closed() {
            debug!("Session closed during publish, ignoring result");
            return PublishOutcome::Closed;
        }

        match result {
            Ok(response) => {
                self.state().commit_publish(ticket);
                let published = PublishedDocument::from_response(&record, response);
                info!(new_document_id = %published.document_id, "Published document");
                self.notifier
                    .notify(Notification::success("Document published successfully"));
                PublishOutcome::Published(published)
            }
            Err(error) => {
                self.state().abort(ticket);
                warn!(%error, "Publish failed");
                self.notifier
                    .notify(Notification::error(format!("Failed to publish document: {}", error)));
                PublishOutcome::Failed(error.into())
            }
        }
    }

    /// Download a rendition of the document as last persisted
    #[instrument(skip(self), fields(document_id = %self.document_id()))]
    pub async fn download(&self, format: DownloadFormat) -> Result<Download, EditorError> {
        let id = self.document_id();
        match self.api.download(&id, format).await {
            Ok(download) => Ok(download),
            Err(error) => {
                let message = match &error {
                    ApiError::PaymentRequired { message, .. } => message.clone(),
                    other => format!("Failed to download document: {}", other),
                };
                self.notifier.notify(Notification::warning(message));
                Err(error.into())
            }
        }
    }

    /// Continue on another document, e.g. the one just published
    pub fn rebind(&self, document: EditableDocument, settings: DocumentSettings) {
        let mut state = self.state();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.changes.cancel();
        state.rebind(document, settings);
    }

    /// Stop the session: pending changes are dropped and results of calls
    /// still in flight are ignored
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.changes.cancel();
            debug!("Session closed");
        }
    }
}

impl SettingsSink for EditorSession {
    fn on_settings_changed(&mut self, patch: SettingsPatch) {
        if self.is_closed() {
            return;
        }
        self.state().on_settings_changed(patch);
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn snapshot_of(state: &SessionState) -> SessionSnapshot {
    SessionSnapshot {
        document_id: state.document_id().clone(),
        phase: state.phase(),
        content: state.editor_content().to_string(),
        settings: state.settings().clone(),
        advisory_visible: state.advisory_visible(),
        controls: Controls::for_state(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryDocumentApi;
    use crate::notify::{NotificationLevel, RecordingNotifier};
    use std::time::Duration;

    fn setup() -> (Arc<MemoryDocumentApi>, EditorSession, Arc<RecordingNotifier>) {
        let api = Arc::new(MemoryDocumentApi::new());
        api.insert(EditableDocument::new("doc-1", "<p>Original</p>"));
        let notifier = Arc::new(RecordingNotifier::new());
        let session = EditorSession::new(
            api.clone(),
            EditableDocument::new("doc-1", "<p>Original</p>"),
            SessionOptions::default().with_notifier(notifier.clone()),
        );
        (api, session, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_arrives_after_quiet_period() {
        let (_api, session, _) = setup();

        session.content_changed("<p>Edited</p>");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!session.is_dirty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(session.is_dirty());
        assert_eq!(session.editor_content(), "<p>Edited</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_flushes_pending_change() {
        let (api, session, notifier) = setup();

        session.content_changed("<p>Edited</p>");
        assert_eq!(session.save().await, SaveOutcome::Saved);

        let id = DocumentId::new("doc-1");
        assert_eq!(api.document(&id).unwrap().content, "<p>Edited</p>");
        assert!(!session.is_dirty());
        assert_eq!(
            notifier.messages(NotificationLevel::Success),
            vec!["Document saved successfully"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_save_sends_nothing() {
        let (api, session, _) = setup();
        assert_eq!(session.save().await, SaveOutcome::Unchanged);
        assert_eq!(api.calls().update_content, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_drops_queued_change() {
        let (_api, session, _) = setup();

        session.content_changed("<p>Edited</p>");
        assert_eq!(session.discard().as_deref(), Some("<p>Original</p>"));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!session.is_dirty());
        assert_eq!(session.editor_content(), "<p>Original</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_session_ignores_changes() {
        let (_api, session, _) = setup();

        session.content_changed("<p>Edited</p>");
        session.close();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!session.is_dirty());
        assert_eq!(session.save().await, SaveOutcome::Closed);
    }

    #[tokio::test]
    async fn test_load_fetches_content_separately() {
        let api = Arc::new(MemoryDocumentApi::new());
        api.insert(EditableDocument::new("doc-1", "<p>Stored</p>").with_version("v3"));

        let session = EditorSession::load(api.clone(), &DocumentId::new("doc-1"), SessionOptions::default())
            .await
            .unwrap();

        assert_eq!(session.editor_content(), "<p>Stored</p>");
        assert_eq!(session.document().version, "v3");
        assert_eq!(api.calls().fetch_content, 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_notified() {
        let api = Arc::new(MemoryDocumentApi::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let result = EditorSession::load(
            api,
            &DocumentId::new("missing"),
            SessionOptions::default().with_notifier(notifier.clone()),
        )
        .await;

        assert!(matches!(result, Err(EditorError::Api(ApiError::NotFound(_)))));
        assert_eq!(notifier.messages(NotificationLevel::Error).len(), 1);
    }
}

//! # Session State
//!
//! The dirty/saving state machine for one editing session.
//!
//! ```text
//!            change                 save/publish begins
//!   Clean ───────────▶ Dirty ─────────────────────────▶ Saving
//!     ▲                  ▲                                 │
//!     │                  └──────────── failure ────────────┤
//!     └─────────────────────────────── success ────────────┘
//! ```
//!
//! `is_saving` is a cooperative lock: every operation that persists or
//! rolls back checks it first, so at most one save or publish is in flight
//! and discard cannot run underneath one. Content changes are still
//! accepted while saving; a change that arrives mid-save keeps the session
//! dirty after the save commits.

use crate::config::DirtyPolicy;
use crate::notify::{Notification, Notifier};
use crate::settings::{DocumentSettings, LogoUpload, SettingsPatch, SettingsSink};
use crate::{DocumentId, EditableDocument};
use std::sync::Arc;
use tracing::debug;

pub const PREVIEW_ADVISORY: &str = "Switch to preview to see your changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Clean,
    Dirty,
    Saving,
}

/// Why a save or publish could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Busy {
    AlreadySaving,
    NothingToSave,
}

/// What a save or publish captured when it started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub document_id: DocumentId,
    pub content: String,
    pub settings: DocumentSettings,
    pub version: String,
    revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    content: String,
    settings: DocumentSettings,
}

pub struct SessionState {
    document: EditableDocument,
    editor_content: String,
    settings: DocumentSettings,
    initial_settings: DocumentSettings,
    committed: Snapshot,
    is_dirty: bool,
    is_saving: bool,
    revision: u64,
    advisory_visible: bool,
    policy: DirtyPolicy,
    notifier: Option<Arc<dyn Notifier>>,
}

impl SessionState {
    pub fn new(document: EditableDocument) -> Self {
        Self::with_settings(document, DocumentSettings::default())
    }

    pub fn with_settings(document: EditableDocument, settings: DocumentSettings) -> Self {
        let initial_settings = DocumentSettings {
            cover_page_logo: None,
            ..settings
        };
        let committed = Snapshot {
            content: document.content.clone(),
            settings: initial_settings.clone(),
        };

        Self {
            editor_content: document.content.clone(),
            settings: initial_settings.clone(),
            initial_settings,
            committed,
            document,
            is_dirty: false,
            is_saving: false,
            revision: 0,
            advisory_visible: false,
            policy: DirtyPolicy::default(),
            notifier: None,
        }
    }

    pub fn with_policy(mut self, policy: DirtyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Where the preview advisory is raised
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn document(&self) -> &EditableDocument {
        &self.document
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document.document_id
    }

    pub fn editor_content(&self) -> &str {
        &self.editor_content
    }

    pub fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn advisory_visible(&self) -> bool {
        self.advisory_visible
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_saving {
            SessionPhase::Saving
        } else if self.is_dirty {
            SessionPhase::Dirty
        } else {
            SessionPhase::Clean
        }
    }

    /// Whether the Save and Discard controls are enabled
    pub fn can_save(&self) -> bool {
        self.is_dirty && !self.is_saving
    }

    fn differs_from_committed(&self) -> bool {
        self.editor_content != self.committed.content || self.settings != self.committed.settings
    }

    fn recompute_dirty(&mut self) {
        self.is_dirty = match self.policy {
            DirtyPolicy::Always => true,
            DirtyPolicy::Structural => self.differs_from_committed(),
        };
    }

    pub fn on_content_changed(&mut self, content: impl Into<String>) {
        self.editor_content = content.into();
        self.revision += 1;
        self.recompute_dirty();
        debug!(document_id = %self.document.document_id, revision = self.revision, dirty = self.is_dirty, "Content changed");
    }

    pub fn on_settings_changed(&mut self, patch: SettingsPatch) {
        if patch.is_empty() {
            return;
        }

        let affects_preview = patch.affects_preview();
        self.settings.apply(patch);
        self.revision += 1;
        self.recompute_dirty();

        if affects_preview && !self.advisory_visible {
            self.advisory_visible = true;
            if let Some(notifier) = &self.notifier {
                notifier.notify(Notification::info(PREVIEW_ADVISORY));
            }
        }
    }

    pub fn dismiss_advisory(&mut self) {
        self.advisory_visible = false;
    }

    fn begin(&mut self, require_dirty: bool) -> Result<SaveTicket, Busy> {
        if self.is_saving {
            return Err(Busy::AlreadySaving);
        }
        if require_dirty && !self.is_dirty {
            return Err(Busy::NothingToSave);
        }

        self.is_saving = true;
        Ok(SaveTicket {
            document_id: self.document.document_id.clone(),
            content: self.editor_content.clone(),
            settings: self.settings.clone(),
            version: self.document.version.clone(),
            revision: self.revision,
        })
    }

    /// Enter `Saving` for an in-place content update
    pub fn begin_save(&mut self) -> Result<SaveTicket, Busy> {
        self.begin(true)
    }

    /// Enter `Saving` for a publish; an unchanged draft may be published
    pub fn begin_publish(&mut self) -> Result<SaveTicket, Busy> {
        self.begin(false)
    }

    fn commit(&mut self, ticket: SaveTicket) {
        self.is_saving = false;
        let changed_since = self.revision != ticket.revision;
        self.committed = Snapshot {
            content: ticket.content,
            settings: ticket.settings,
        };
        self.is_dirty = match self.policy {
            DirtyPolicy::Always => changed_since,
            DirtyPolicy::Structural => self.differs_from_committed(),
        };
    }

    pub fn commit_save(&mut self, ticket: SaveTicket) {
        self.commit(ticket);
        self.dismiss_advisory();
    }

    pub fn commit_publish(&mut self, ticket: SaveTicket) {
        self.commit(ticket);
    }

    /// Leave `Saving` after a failed call; dirty state is untouched
    pub fn abort(&mut self, _ticket: SaveTicket) {
        self.is_saving = false;
    }

    /// Roll back to the content and settings present at load.
    ///
    /// Returns the restored content, or `None` while a save is in flight.
    pub fn discard(&mut self) -> Option<&str> {
        if self.is_saving {
            return None;
        }

        self.editor_content = self.document.content.clone();
        self.settings = self.initial_settings.clone();
        self.committed = Snapshot {
            content: self.editor_content.clone(),
            settings: self.settings.clone(),
        };
        self.revision += 1;
        self.is_dirty = false;
        self.dismiss_advisory();
        Some(&self.editor_content)
    }

    /// Start over on a different document, e.g. after navigating to a
    /// freshly published one
    pub fn rebind(&mut self, document: EditableDocument, settings: DocumentSettings) {
        let policy = self.policy;
        let notifier = self.notifier.take();
        *self = SessionState::with_settings(document, settings).with_policy(policy);
        self.notifier = notifier;
    }
}

impl SettingsSink for SessionState {
    fn on_settings_changed(&mut self, patch: SettingsPatch) {
        SessionState::on_settings_changed(self, patch);
    }

    fn on_logo_upload(&mut self, logo: LogoUpload) {
        SessionState::on_settings_changed(
            self,
            SettingsPatch {
                cover_page_logo: Some(Some(logo)),
                ..SettingsPatch::default()
            },
        );
    }
}

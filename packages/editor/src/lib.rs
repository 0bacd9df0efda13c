//! # lexdraft Editor
//!
//! Editable document sessions for generated legal documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ surface: markup in a frame, click-to-edit   │
//! │  - 100 ms debounce, selection kept as       │
//! │    text offsets across re-serialization     │
//! └─────────────────────────────────────────────┘
//!                     ↓ ContentChange
//! ┌─────────────────────────────────────────────┐
//! │ session: async driver                       │
//! │  - 300 ms debounce into SessionState        │
//! │  - save / discard / publish                 │
//! └─────────────────────────────────────────────┘
//!          ↓                         ↓
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │ state: Clean/Dirty/  │  │ api: DocumentApi     │
//! │ Saving               │  │ (HTTP or in-memory)  │
//! └──────────────────────┘  └──────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Saving is the lock**: at most one save or publish is in flight
//! 2. **Failures never corrupt the draft**: a failed save leaves it dirty
//! 3. **Publish copies**: it creates a new document and leaves the draft alone
//! 4. **Serialized markup is the document**: there is no separate model
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lexdraft_editor::{EditorSession, MemoryDocumentApi, SessionOptions, DocumentId};
//!
//! let api = Arc::new(MemoryDocumentApi::new());
//! let session = EditorSession::load(api, &DocumentId::new("doc-1"), SessionOptions::default()).await?;
//!
//! session.content_changed("<p>Revised clause</p>");
//! session.save().await;
//!
//! if let PublishOutcome::Published(doc) = session.publish().await {
//!     println!("published as {}", doc.document_id);
//! }
//! ```

mod api;
mod config;
mod debounce;
mod document;
mod errors;
mod ids;
mod notify;
mod publish;
mod session;
mod settings;
mod state;
mod style;
mod surface;

pub use api::{CallCounts, DocumentApi, Download, DownloadFormat, DraftUpdate, MemoryDocumentApi, StoredDocument};
pub use config::{DirtyPolicy, EditorConfig};
pub use debounce::{spawn_debouncer, spawn_debouncer_with, DebounceHandle, Debouncer};
pub use document::{DocumentContent, DocumentId, DocumentResponse, DocumentStatus, EditableDocument};
pub use errors::{ApiError, EditorError, PaymentOption, ValidationError};
pub use ids::{DraftToken, IdGenerator, SequentialIds, UuidGenerator};
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use publish::{PublishCoordinator, PublishMetadata, PublishRecord, PublishedDocument};
pub use session::{EditorSession, PublishOutcome, SaveOutcome, SessionOptions, SessionSnapshot};
pub use settings::{
    watermark_hint, Controls, DocumentSettings, LogoUpload, SettingsPanel, SettingsPatch,
    SettingsSink, WATERMARK_MAX_CHARS, WATERMARK_MAX_WORDS,
};
pub use state::{Busy, SaveTicket, SessionPhase, SessionState, PREVIEW_ADVISORY};
pub use style::{generate_editor_css, SurfaceStyle, EDITOR_STYLE_ATTR};
pub use surface::{
    ContentChange, ContentSurface, EventOutcome, Frame, HistoryEntry, KeyEvent, Listener,
    SurfaceError, SurfaceOptions,
};

// Re-export the DOM types surface callers work with
pub use lexdraft_dom::{Dom, NodeId, Position, Range, TextRange};

//! # Document Settings
//!
//! Cover page and watermark options, plus the panel that collects them.
//!
//! The panel holds no settings of its own. Every change is turned into a
//! [`SettingsPatch`] and handed to a [`SettingsSink`] (the session), which
//! owns dirty tracking and the preview advisory.

use crate::notify::{Notification, Notifier};
use crate::{SessionState, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Advisory limits for watermark text; longer text is still accepted
pub const WATERMARK_MAX_CHARS: usize = 30;
pub const WATERMARK_MAX_WORDS: usize = 5;

/// An uploaded cover page logo.
///
/// On the wire the image travels base64-encoded in `data`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoUpload {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "data", with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

impl LogoUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for LogoUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSettings {
    pub has_cover_page: bool,
    pub cover_page_text: String,
    pub has_watermark: bool,
    pub watermark_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_page_logo: Option<LogoUpload>,
}

impl DocumentSettings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(value) = patch.has_cover_page {
            self.has_cover_page = value;
        }
        if let Some(value) = patch.cover_page_text {
            self.cover_page_text = value;
        }
        if let Some(value) = patch.has_watermark {
            self.has_watermark = value;
        }
        if let Some(value) = patch.watermark_text {
            self.watermark_text = value;
        }
        if let Some(value) = patch.cover_page_logo {
            self.cover_page_logo = value;
        }
    }
}

/// Partial update to [`DocumentSettings`]; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub has_cover_page: Option<bool>,
    pub cover_page_text: Option<String>,
    pub has_watermark: Option<bool>,
    pub watermark_text: Option<String>,

    /// `Some(None)` removes the logo
    pub cover_page_logo: Option<Option<LogoUpload>>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }

    /// Whether the patch changes what the cover page or watermark preview shows
    pub fn affects_preview(&self) -> bool {
        self.has_cover_page.is_some()
            || self.cover_page_text.is_some()
            || self.has_watermark.is_some()
            || self.watermark_text.is_some()
            || self.cover_page_logo.is_some()
    }
}

/// Receiver of settings changes collected by the panel
pub trait SettingsSink {
    fn on_settings_changed(&mut self, patch: SettingsPatch);

    fn on_logo_upload(&mut self, logo: LogoUpload) {
        self.on_settings_changed(SettingsPatch {
            cover_page_logo: Some(Some(logo)),
            ..SettingsPatch::default()
        });
    }
}

/// Hint shown under the watermark field when the text is long
pub fn watermark_hint(text: &str) -> Option<&'static str> {
    let too_long = text.chars().count() > WATERMARK_MAX_CHARS;
    let too_many_words = text.split_whitespace().count() > WATERMARK_MAX_WORDS;
    (too_long || too_many_words).then_some("Keep the watermark short (maximum 5 words)")
}

/// Enabled state of the Save and Discard buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub save_enabled: bool,
    pub discard_enabled: bool,
    pub save_label: &'static str,
}

impl Controls {
    pub fn for_state(state: &SessionState) -> Self {
        let idle_and_dirty = state.is_dirty() && !state.is_saving();
        Self {
            save_enabled: idle_and_dirty,
            discard_enabled: idle_and_dirty,
            save_label: if state.is_saving() { "Saving..." } else { "Save" },
        }
    }
}

#[derive(Clone)]
pub struct SettingsPanel {
    max_logo_bytes: usize,
    notifier: Arc<dyn Notifier>,
}

impl SettingsPanel {
    pub fn new(max_logo_bytes: usize, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            max_logo_bytes,
            notifier,
        }
    }

    pub fn set_cover_page(&self, sink: &mut impl SettingsSink, enabled: bool) {
        sink.on_settings_changed(SettingsPatch {
            has_cover_page: Some(enabled),
            ..SettingsPatch::default()
        });
    }

    pub fn set_cover_page_text(&self, sink: &mut impl SettingsSink, text: impl Into<String>) {
        sink.on_settings_changed(SettingsPatch {
            cover_page_text: Some(text.into()),
            ..SettingsPatch::default()
        });
    }

    pub fn set_watermark(&self, sink: &mut impl SettingsSink, enabled: bool) {
        sink.on_settings_changed(SettingsPatch {
            has_watermark: Some(enabled),
            ..SettingsPatch::default()
        });
    }

    pub fn set_watermark_text(&self, sink: &mut impl SettingsSink, text: impl Into<String>) {
        sink.on_settings_changed(SettingsPatch {
            watermark_text: Some(text.into()),
            ..SettingsPatch::default()
        });
    }

    /// Forward a logo to the session unless it exceeds the size limit.
    ///
    /// Only the size is checked; content type and dimensions are not.
    pub fn upload_logo(
        &self,
        sink: &mut impl SettingsSink,
        logo: LogoUpload,
    ) -> Result<(), ValidationError> {
        if logo.size() > self.max_logo_bytes {
            let error = ValidationError::LogoTooLarge {
                size: logo.size(),
                limit: self.max_logo_bytes,
            };
            self.notifier.notify(Notification::error(error.to_string()));
            return Err(error);
        }

        sink.on_logo_upload(logo);
        Ok(())
    }

    pub fn remove_logo(&self, sink: &mut impl SettingsSink) {
        sink.on_settings_changed(SettingsPatch {
            cover_page_logo: Some(None),
            ..SettingsPatch::default()
        });
    }

    pub fn controls(&self, state: &SessionState) -> Controls {
        Controls::for_state(state)
    }
}

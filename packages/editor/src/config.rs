use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How `is_dirty` reacts to a content change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DirtyPolicy {
    /// Every debounced change marks the session dirty
    #[default]
    Always,

    /// Dirty only while content or settings differ from the last save, so
    /// typing and then undoing back to the saved text leaves it clean
    Structural,
}

/// Editor tuning, read from the `editor` block of `lexdraft.config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Quiet period before the surface re-serializes after typing
    #[serde(default = "default_surface_debounce_ms")]
    pub surface_debounce_ms: u64,

    /// Quiet period before a content change reaches the session
    #[serde(default = "default_session_debounce_ms")]
    pub session_debounce_ms: u64,

    /// Largest accepted cover page logo, in bytes
    #[serde(default = "default_max_logo_bytes")]
    pub max_logo_bytes: usize,

    #[serde(default)]
    pub dirty_policy: DirtyPolicy,

    /// Elements that never become editable on click
    #[serde(default = "default_locked_selector")]
    pub locked_selector: String,
}

fn default_surface_debounce_ms() -> u64 {
    100
}

fn default_session_debounce_ms() -> u64 {
    300
}

fn default_max_logo_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_locked_selector() -> String {
    ".section-title, h1, h2".to_string()
}

impl EditorConfig {
    pub fn surface_debounce(&self) -> Duration {
        Duration::from_millis(self.surface_debounce_ms)
    }

    pub fn session_debounce(&self) -> Duration {
        Duration::from_millis(self.session_debounce_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            surface_debounce_ms: default_surface_debounce_ms(),
            session_debounce_ms: default_session_debounce_ms(),
            max_logo_bytes: default_max_logo_bytes(),
            dirty_policy: DirtyPolicy::default(),
            locked_selector: default_locked_selector(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{ "sessionDebounceMs": 500, "dirtyPolicy": "structural" }"#;
        let config: EditorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.session_debounce(), Duration::from_millis(500));
        assert_eq!(config.surface_debounce(), Duration::from_millis(100));
        assert_eq!(config.dirty_policy, DirtyPolicy::Structural);
        assert_eq!(config.max_logo_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.dirty_policy, DirtyPolicy::Always);
        assert_eq!(config.locked_selector, ".section-title, h1, h2");
    }
}

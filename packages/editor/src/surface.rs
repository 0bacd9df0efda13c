//! # Content Surface
//!
//! Hosts a document's markup inside an isolated [`Frame`] and makes its
//! elements editable one at a time, on first click.
//!
//! ## Event flow
//!
//! ```text
//! click ──▶ grant contenteditable on target (unless locked)
//! input ──▶ debouncer.notify
//!              │ quiet period elapses (poll)
//!              ▼
//!          capture selection ─▶ re-serialize ─▶ changed? ─▶ history entry + ContentChange
//!              │
//!              └──────────── next animation frame ──▶ restore selection
//! keydown ─▶ Ctrl+Enter: default prevented
//! ```
//!
//! The host drives time explicitly: it passes `now` to every event and
//! calls [`ContentSurface::poll`] and [`ContentSurface::animation_frame`]
//! from its loop. Change detection re-serializes the whole document, which
//! is why the selection is carried across as text offsets.

use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::ids::DraftToken;
use crate::style::{generate_editor_css, SurfaceStyle, EDITOR_STYLE_ATTR};
use lexdraft_dom::{
    inner_html_filtered, serialize_filtered, Attribute, Dom, DomError, Element, NodeId,
    Position, Range, SerializeFilter, Selector, TextRange,
};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Surface is not initialized")]
    NotInitialized,

    #[error("No caret in the document")]
    NoCaret,

    #[error("Caret is not inside an editable region")]
    NotEditable,

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// The embedded browsing context a surface renders into.
///
/// Its document may be unreachable (still loading, or cross-origin); the
/// surface then stays inert until a later render cycle finds it ready.
#[derive(Debug, Default)]
pub struct Frame {
    blocked: bool,
    document: Option<Dom>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame whose document cannot be accessed yet
    pub fn inaccessible() -> Self {
        Self {
            blocked: true,
            document: None,
        }
    }

    pub fn set_accessible(&mut self, accessible: bool) {
        self.blocked = !accessible;
    }

    pub fn is_accessible(&self) -> bool {
        !self.blocked
    }

    fn content_document(&mut self) -> Option<&mut Dom> {
        if self.blocked {
            return None;
        }
        Some(self.document.get_or_insert_with(Dom::new))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    Click,
    Input,
    KeyDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOutcome {
    pub default_prevented: bool,
}

/// A re-serialized document that differs from the last one emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub content: String,
    pub draft: DraftToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
    pub draft: DraftToken,
}

#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    pub quiet_period: Duration,
    pub locked_selector: String,
    pub style: SurfaceStyle,

    /// Path the draft history entries extend, e.g. `/documents/doc-1`
    pub location: String,
}

impl SurfaceOptions {
    pub fn from_config(config: &EditorConfig, location: impl Into<String>) -> Self {
        Self {
            quiet_period: config.surface_debounce(),
            locked_selector: config.locked_selector.clone(),
            style: SurfaceStyle::default(),
            location: location.into(),
        }
    }
}

#[derive(Debug)]
enum FrameTask {
    RestoreSelection { range: TextRange, epoch: u64 },
}

/// Leaves surface artifacts out of serialized content
struct SurfaceFilter<'a> {
    granted: &'a HashSet<NodeId>,
}

impl SerializeFilter for SurfaceFilter<'_> {
    fn skip_node(&self, dom: &Dom, node: NodeId) -> bool {
        dom.tag(node) == Some("style") && dom.attr(node, EDITOR_STYLE_ATTR).is_some()
    }

    fn skip_attribute(&self, _dom: &Dom, node: NodeId, name: &str) -> bool {
        name == "contenteditable" && self.granted.contains(&node)
    }
}

fn is_fragment(content: &str) -> bool {
    let lower = content.to_ascii_lowercase();
    !(lower.contains("<html") || lower.contains("<body"))
}

fn serialize_content(dom: &Dom, fragment: bool, granted: &HashSet<NodeId>) -> String {
    let filter = SurfaceFilter { granted };
    match (fragment, dom.body()) {
        (true, Some(body)) => {
            // Leading metadata of a fragment was adopted into the head
            let mut content = dom
                .head()
                .map(|head| inner_html_filtered(dom, head, &filter))
                .unwrap_or_default();
            content.push_str(&inner_html_filtered(dom, body, &filter));
            content
        }
        _ => serialize_filtered(dom, dom.root(), &filter),
    }
}

pub struct ContentSurface {
    frame: Frame,
    options: SurfaceOptions,
    locked: Selector,
    css: String,
    initialized: bool,
    torn_down: bool,
    fragment: bool,
    listeners: Vec<Listener>,
    granted: HashSet<NodeId>,
    focused: Option<NodeId>,
    selection: Option<Range>,
    selection_epoch: u64,
    debouncer: Debouncer<()>,
    frame_tasks: Vec<FrameTask>,
    last_emitted: String,
    history: Vec<HistoryEntry>,
}

impl ContentSurface {
    pub fn new(frame: Frame, options: SurfaceOptions) -> Result<Self, DomError> {
        let locked = Selector::parse(&options.locked_selector)?;
        let css = generate_editor_css(&options.style);

        Ok(Self {
            frame,
            locked,
            css,
            debouncer: Debouncer::new(options.quiet_period),
            options,
            initialized: false,
            torn_down: false,
            fragment: true,
            listeners: Vec::new(),
            granted: HashSet::new(),
            focused: None,
            selection: None,
            selection_epoch: 0,
            frame_tasks: Vec::new(),
            last_emitted: String::new(),
            history: Vec::new(),
        })
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// Render `content` into the frame, once per surface.
    ///
    /// Returns `false`, leaving the surface inert, when the frame's document
    /// is not accessible; a later [`render`](Self::render) retries.
    pub fn initialize(&mut self, content: &str) -> bool {
        if self.initialized || self.torn_down {
            return self.initialized;
        }

        let Some(dom) = self.frame.content_document() else {
            debug!("Frame document not accessible; surface stays inert");
            return false;
        };

        *dom = Dom::parse(content);
        inject_style(dom, &self.css);

        self.fragment = is_fragment(content);
        self.listeners = vec![Listener::Click, Listener::Input, Listener::KeyDown];
        self.initialized = true;
        self.last_emitted = self.serialize().unwrap_or_default();
        debug!(fragment = self.fragment, "Surface initialized");
        true
    }

    /// Render cycle: initialize if that has not happened yet, otherwise
    /// apply `content` as an external update
    pub fn render(&mut self, content: &str) -> bool {
        if self.initialized {
            self.set_content(content)
        } else {
            self.initialize(content)
        }
    }

    pub fn document(&self) -> Option<&Dom> {
        if !self.initialized {
            return None;
        }
        self.frame.document.as_ref()
    }

    /// Live content without surface artifacts
    pub fn serialize(&self) -> Option<String> {
        let dom = self.frame.document.as_ref()?;
        Some(serialize_content(dom, self.fragment, &self.granted))
    }

    fn has_listener(&self, listener: Listener) -> bool {
        self.listeners.contains(&listener)
    }

    /// Whether `node` sits inside a region with `contenteditable="true"`
    pub fn is_editable(&self, node: NodeId) -> bool {
        let Some(dom) = self.document() else {
            return false;
        };
        if !dom.contains(node) {
            return false;
        }
        std::iter::once(node)
            .chain(dom.ancestors(node))
            .find_map(|candidate| dom.attr(candidate, "contenteditable"))
            .map(|value| value.is_empty() || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Elements currently carrying `contenteditable="true"`
    pub fn editable_regions(&self) -> Vec<NodeId> {
        let Some(dom) = self.document() else {
            return Vec::new();
        };
        dom.descendants(dom.root())
            .filter(|&node| {
                dom.attr(node, "contenteditable")
                    .map(|value| value.is_empty() || value.eq_ignore_ascii_case("true"))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn selection(&self) -> Option<Range> {
        self.selection
    }

    /// Current selection as offsets into the body text
    pub fn selection_offsets(&self) -> Option<TextRange> {
        let dom = self.document()?;
        let body = dom.body()?;
        dom.capture_range(body, self.selection.as_ref()?)
    }

    /// Place the selection, as a pointer or arrow keys would
    pub fn select(&mut self, range: Range) {
        self.selection = Some(range);
        self.selection_epoch += 1;
    }

    /// Place a caret at a text offset within the body
    pub fn select_offset(&mut self, offset: usize) -> Result<(), SurfaceError> {
        let dom = self.document().ok_or(SurfaceError::NotInitialized)?;
        let body = dom.body().ok_or(SurfaceError::NoCaret)?;
        let position = dom.position_at(body, offset).ok_or(SurfaceError::NoCaret)?;
        self.select(Range::collapsed(position));
        Ok(())
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Click on `target`.
    ///
    /// A target that is not yet editable and is not locked (by default
    /// `.section-title, h1, h2`, or inside one) becomes editable and takes
    /// focus with the caret at its end.
    pub fn click(&mut self, target: NodeId, _now: Instant) -> EventOutcome {
        if !self.has_listener(Listener::Click) {
            return EventOutcome::default();
        }

        let Some(dom) = self.frame.document.as_ref() else {
            return EventOutcome::default();
        };
        if !dom.contains(target) {
            return EventOutcome::default();
        }

        // Clicks on text land on the containing element
        let target = if dom.is_text(target) {
            match dom.parent(target) {
                Some(parent) => parent,
                None => return EventOutcome::default(),
            }
        } else {
            target
        };

        if self.is_editable(target) {
            self.focused = Some(target);
            return EventOutcome::default();
        }

        let Some(dom) = self.frame.document.as_mut() else {
            return EventOutcome::default();
        };

        let structural = matches!(dom.tag(target), Some("html" | "head" | "body") | None);
        let author_locked = dom.attr(target, "contenteditable") == Some("false");
        if structural || author_locked || self.locked.closest(dom, target).is_some() {
            trace!(?target, "Click on locked element");
            return EventOutcome::default();
        }

        dom.set_attr(target, "contenteditable", "true");
        self.granted.insert(target);
        self.focused = Some(target);

        let inside = self
            .selection
            .map(|range| dom.is_inclusive_ancestor(target, range.focus.node))
            .unwrap_or(false);
        if !inside {
            let caret = match dom.text_nodes(target).last() {
                Some(&text) => Position::new(text, dom.text(text).map(|t| t.chars().count()).unwrap_or(0)),
                None => Position::new(target, dom.children(target).len()),
            };
            self.select(Range::collapsed(caret));
        }

        debug!(?target, "Granted editability");
        EventOutcome::default()
    }

    pub fn key_down(&mut self, event: &KeyEvent, _now: Instant) -> EventOutcome {
        if !self.has_listener(Listener::KeyDown) {
            return EventOutcome::default();
        }

        // Reserved for submit-on-shortcut
        let default_prevented = event.ctrl && event.key == "Enter";
        EventOutcome { default_prevented }
    }

    fn caret(&self) -> Result<Position, SurfaceError> {
        if !self.initialized {
            return Err(SurfaceError::NotInitialized);
        }
        let caret = self.selection.ok_or(SurfaceError::NoCaret)?.focus;
        if !self.is_editable(caret.node) {
            return Err(SurfaceError::NotEditable);
        }
        Ok(caret)
    }

    /// Type `text` at the caret, then dispatch `input`
    pub fn type_text(&mut self, text: &str, now: Instant) -> Result<(), SurfaceError> {
        let caret = self.caret()?;
        let dom = self.frame.document.as_mut().ok_or(SurfaceError::NotInitialized)?;
        let caret = dom.insert_text(caret, text)?;
        self.select(Range::collapsed(caret));
        self.input(now);
        Ok(())
    }

    /// Delete the character before the caret, then dispatch `input`
    pub fn delete_backward(&mut self, now: Instant) -> Result<(), SurfaceError> {
        let caret = self.caret()?;
        let dom = self.frame.document.as_mut().ok_or(SurfaceError::NotInitialized)?;
        let caret = dom.delete_backward(caret)?;
        self.select(Range::collapsed(caret));
        self.input(now);
        Ok(())
    }

    /// The `input` listener: restart the quiet period
    pub fn input(&mut self, now: Instant) {
        if self.has_listener(Listener::Input) {
            self.debouncer.notify((), now);
        }
    }

    /// When the next [`poll`](Self::poll) has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Run debounced work that is due.
    ///
    /// Returns the new content when the re-serialized document differs from
    /// what was last emitted.
    pub fn poll(&mut self, now: Instant) -> Option<ContentChange> {
        self.debouncer.poll(now)?;

        let captured = self.selection_offsets();
        let content = self.serialize()?;

        if let Some(range) = captured {
            self.frame_tasks.push(FrameTask::RestoreSelection {
                range,
                epoch: self.selection_epoch,
            });
        }

        if content == self.last_emitted {
            trace!("Debounced input produced no change");
            return None;
        }

        let draft = DraftToken::mint();
        self.history.push(HistoryEntry {
            url: format!("{}?draft={}", self.options.location, draft),
            draft: draft.clone(),
        });
        self.last_emitted = content.clone();
        debug!(draft = %draft, bytes = content.len(), "Content changed");

        Some(ContentChange { content, draft })
    }

    /// Run work scheduled for the next animation frame
    pub fn animation_frame(&mut self) {
        for task in std::mem::take(&mut self.frame_tasks) {
            match task {
                FrameTask::RestoreSelection { range, epoch } => self.restore_selection(range, epoch),
            }
        }
    }

    fn restore_selection(&mut self, range: TextRange, epoch: u64) {
        // The user moved the caret in the meantime; theirs wins
        if self.selection.is_some() && epoch != self.selection_epoch {
            return;
        }

        let restored = self.document().and_then(|dom| {
            let body = dom.body()?;
            dom.resolve_range(body, range)
        });

        match restored {
            Some(restored) => self.selection = Some(restored),
            None => debug!("Selection restore skipped"),
        }
    }

    /// Apply content that changed outside the surface (e.g. after discard).
    ///
    /// The document is only rebuilt when `content` differs from the live
    /// serialization; the selection is carried across the rebuild and
    /// restored on the next animation frame. Returns whether a rebuild
    /// happened (or, before initialization, whether initialization did).
    pub fn set_content(&mut self, content: &str) -> bool {
        if !self.initialized {
            return self.initialize(content);
        }

        let fragment = is_fragment(content);
        let incoming = serialize_content(&Dom::parse(content), fragment, &HashSet::new());
        if fragment == self.fragment && self.serialize().as_deref() == Some(incoming.as_str()) {
            return false;
        }

        let captured = self.selection_offsets();
        let Some(dom) = self.frame.content_document() else {
            return false;
        };

        *dom = Dom::parse(content);
        inject_style(dom, &self.css);

        // Node ids from the old tree are meaningless now
        self.granted.clear();
        self.focused = None;
        self.selection = None;
        self.fragment = fragment;
        self.debouncer.cancel();
        self.last_emitted = incoming;

        if let Some(range) = captured {
            self.frame_tasks.push(FrameTask::RestoreSelection {
                range,
                epoch: self.selection_epoch,
            });
        }

        debug!("Surface re-rendered from external content");
        true
    }

    /// Detach listeners and drop pending debounce and frame work
    pub fn teardown(&mut self) {
        self.debouncer.cancel();
        self.frame_tasks.clear();
        self.listeners.clear();
        self.torn_down = true;
    }
}

fn inject_style(dom: &mut Dom, css: &str) {
    let Some(head) = dom.head() else {
        return;
    };
    let style = dom.create_element(Element {
        tag: "style".to_string(),
        attributes: vec![Attribute::new(EDITOR_STYLE_ATTR, "")],
    });
    let text = dom.create_text(css);
    dom.append_child(style, text);
    dom.append_child(head, style);
}

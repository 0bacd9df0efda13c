//! # lexdraft DOM
//!
//! A small, dependency-light document object model that plays the role of
//! the embedded browsing context documents are edited in.
//!
//! ```text
//! markup ──tokenizer──▶ tokens ──parser──▶ Dom ──serializer──▶ markup
//!                                           │
//!                                           ├─ selector: `.section-title, h1`
//!                                           └─ selection: carets ⇄ text offsets
//! ```
//!
//! The parser is tolerant rather than spec-complete: it covers the markup
//! that generated documents contain and always produces a
//! `html > (head, body)` skeleton, the way a browser does when markup is
//! written into a frame.

mod error;
mod node;
mod parser;
mod selection;
mod selector;
mod serializer;
mod tokenizer;

pub use error::DomError;
pub use node::{
    is_raw_text, is_void, Attribute, Descendants, Dom, Element, NodeData, NodeId,
    RAW_TEXT_ELEMENTS, VOID_ELEMENTS,
};
pub use parser::decode_entities;
pub use selection::{Position, Range, TextRange};
pub use selector::Selector;
pub use serializer::{
    inner_html, inner_html_filtered, outer_html, serialize, serialize_filtered, NoFilter,
    SerializeFilter,
};
pub use tokenizer::{ContentToken, TagToken};

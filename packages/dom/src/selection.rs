//! # Carets and Selections
//!
//! A [`Position`] follows DOM boundary-point semantics: inside a text node
//! the offset counts characters, inside an element it is a child index.
//!
//! Node ids do not survive a re-parse, so selections that must outlive a
//! content replacement are converted to a [`TextRange`]: character offsets
//! into the concatenated text of a scope element (usually `body`). Mapping
//! back resolves against whatever tree is current at that point.

use crate::error::DomError;
use crate::node::{is_void, Dom, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub anchor: Position,
    pub focus: Position,
}

impl Range {
    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Tree-independent selection: character offsets into a scope's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub anchor: usize,
    pub focus: usize,
}

impl TextRange {
    pub fn caret(offset: usize) -> Self {
        Self {
            anchor: offset,
            focus: offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn byte_index(text: &str, chars: usize) -> Option<usize> {
    if chars == char_len(text) {
        return Some(text.len());
    }
    text.char_indices().nth(chars).map(|(index, _)| index)
}

impl Dom {
    /// Logical character offset of `position` within the text of `scope`
    pub fn text_offset(&self, scope: NodeId, position: Position) -> Option<usize> {
        if !self.contains(position.node) || !self.is_inclusive_ancestor(scope, position.node) {
            return None;
        }

        let counted: HashSet<NodeId> = self.text_nodes(scope).into_iter().collect();
        let order: Vec<NodeId> = self.descendants(scope).collect();

        let boundary = if let Some(text) = self.text(position.node) {
            if position.offset > char_len(text) {
                return None;
            }
            let index = order.iter().position(|&node| node == position.node)?;
            let before = self.count_before(&order[..index], &counted);
            let within = if counted.contains(&position.node) {
                position.offset
            } else {
                0
            };
            return Some(before + within);
        } else {
            let children = self.children(position.node);
            if position.offset > children.len() {
                return None;
            }
            match children.get(position.offset) {
                Some(&child) => order.iter().position(|&node| node == child)?,
                None => {
                    let element = order.iter().position(|&node| node == position.node)?;
                    element + self.descendants(position.node).count()
                }
            }
        };

        Some(self.count_before(&order[..boundary], &counted))
    }

    fn count_before(&self, nodes: &[NodeId], counted: &HashSet<NodeId>) -> usize {
        nodes
            .iter()
            .filter(|node| counted.contains(node))
            .filter_map(|&node| self.text(node))
            .map(char_len)
            .sum()
    }

    /// Resolve a logical offset to a caret position inside `scope`.
    ///
    /// At a boundary between two text nodes the end of the earlier node
    /// wins. Offsets past the end clamp to the end of the last text node.
    pub fn position_at(&self, scope: NodeId, offset: usize) -> Option<Position> {
        let texts = self.text_nodes(scope);
        let mut consumed = 0;

        for &node in &texts {
            let len = self.text(node).map(char_len).unwrap_or(0);
            if offset <= consumed + len {
                return Some(Position::new(node, offset - consumed));
            }
            consumed += len;
        }

        match texts.last() {
            Some(&last) => {
                let len = self.text(last).map(char_len).unwrap_or(0);
                Some(Position::new(last, len))
            }
            None if self.is_element(scope) => Some(Position::new(scope, 0)),
            None => None,
        }
    }

    /// Convert a live range into a tree-independent one
    pub fn capture_range(&self, scope: NodeId, range: &Range) -> Option<TextRange> {
        Some(TextRange {
            anchor: self.text_offset(scope, range.anchor)?,
            focus: self.text_offset(scope, range.focus)?,
        })
    }

    /// Map a captured range back onto the current tree
    pub fn resolve_range(&self, scope: NodeId, range: TextRange) -> Option<Range> {
        Some(Range {
            anchor: self.position_at(scope, range.anchor)?,
            focus: self.position_at(scope, range.focus)?,
        })
    }

    /// Insert text at a caret, returning the caret after the inserted text
    pub fn insert_text(&mut self, at: Position, text: &str) -> Result<Position, DomError> {
        if !self.contains(at.node) || !self.is_connected(at.node) {
            return Err(DomError::Disconnected(at.node));
        }

        if let Some(existing) = self.text(at.node) {
            let index = byte_index(existing, at.offset).ok_or(DomError::OffsetOutOfRange {
                node: at.node,
                offset: at.offset,
            })?;
            let mut updated = existing.to_string();
            updated.insert_str(index, text);
            self.set_text(at.node, updated);
            return Ok(Position::new(at.node, at.offset + char_len(text)));
        }

        match self.tag(at.node) {
            Some(tag) if !is_void(tag) => {}
            _ => return Err(DomError::NotEditable(at.node)),
        }

        let children = self.children(at.node);
        if at.offset > children.len() {
            return Err(DomError::OffsetOutOfRange {
                node: at.node,
                offset: at.offset,
            });
        }

        // Typing right after a text node extends it
        if at.offset > 0 {
            let previous = children[at.offset - 1];
            if let Some(existing) = self.text(previous) {
                let end = char_len(existing);
                return self.insert_text(Position::new(previous, end), text);
            }
        }

        let node = self.create_text(text);
        self.insert_child(at.node, at.offset, node);
        Ok(Position::new(node, char_len(text)))
    }

    /// Delete the character before a caret within its text run.
    ///
    /// At the start of a text node the previous text sibling is used; at the
    /// start of a block nothing happens.
    pub fn delete_backward(&mut self, at: Position) -> Result<Position, DomError> {
        if !self.contains(at.node) || !self.is_connected(at.node) {
            return Err(DomError::Disconnected(at.node));
        }

        let Some(existing) = self.text(at.node) else {
            return Ok(at);
        };

        if at.offset == 0 {
            let previous = self.index_in_parent(at.node).and_then(|index| {
                let parent = self.parent(at.node)?;
                index
                    .checked_sub(1)
                    .map(|prev| self.children(parent)[prev])
            });
            return match previous {
                Some(previous) if self.is_text(previous) => {
                    let len = self.text(previous).map(char_len).unwrap_or(0);
                    self.delete_backward(Position::new(previous, len))
                }
                _ => Ok(at),
            };
        }

        let end = byte_index(existing, at.offset).ok_or(DomError::OffsetOutOfRange {
            node: at.node,
            offset: at.offset,
        })?;
        let start = byte_index(existing, at.offset - 1).unwrap_or(0);
        let mut updated = existing.to_string();
        updated.replace_range(start..end, "");
        self.set_text(at.node, updated);
        Ok(Position::new(at.node, at.offset - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_round_trip() {
        let dom = Dom::parse("<p>Hello <b>big</b> world</p>");
        let body = dom.body().unwrap();

        // "Hello big world": offset 8 is inside "big"
        let position = dom.position_at(body, 8).unwrap();
        assert_eq!(dom.text(position.node), Some("big"));
        assert_eq!(position.offset, 2);
        assert_eq!(dom.text_offset(body, position), Some(8));
    }

    #[test]
    fn test_offsets_in_long_document() {
        let markup: String = (0..2000).map(|i| format!("<p>Clause {:04}</p>", i)).collect();
        let dom = Dom::parse(&markup);
        let body = dom.body().unwrap();

        // Each paragraph contributes "Clause NNNN", 11 characters
        let offset = 1999 * 11 + 7;
        let position = dom.position_at(body, offset).unwrap();
        assert_eq!(dom.text(position.node), Some("Clause 1999"));
        assert_eq!(position.offset, 7);
        assert_eq!(dom.text_offset(body, position), Some(offset));
    }

    #[test]
    fn test_boundary_prefers_earlier_node() {
        let dom = Dom::parse("<p>ab</p><p>cd</p>");
        let body = dom.body().unwrap();
        let position = dom.position_at(body, 2).unwrap();
        assert_eq!(dom.text(position.node), Some("ab"));
        assert_eq!(position.offset, 2);
    }

    #[test]
    fn test_element_boundary_offset() {
        let dom = Dom::parse("<p>ab<br>cd</p>");
        let body = dom.body().unwrap();
        let p = dom.find_tag(body, "p").unwrap();

        assert_eq!(dom.text_offset(body, Position::new(p, 0)), Some(0));
        assert_eq!(dom.text_offset(body, Position::new(p, 2)), Some(2));
        assert_eq!(dom.text_offset(body, Position::new(p, 3)), Some(4));
    }

    #[test]
    fn test_clamps_past_end() {
        let dom = Dom::parse("<p>abc</p>");
        let body = dom.body().unwrap();
        let position = dom.position_at(body, 99).unwrap();
        assert_eq!(position.offset, 3);
    }

    #[test]
    fn test_insert_and_delete() {
        let mut dom = Dom::parse("<p>Hllo</p>");
        let body = dom.body().unwrap();
        let caret = dom.position_at(body, 1).unwrap();

        let caret = dom.insert_text(caret, "e").unwrap();
        assert_eq!(dom.text_content(body), "Hello");
        assert_eq!(dom.text_offset(body, caret), Some(2));

        let caret = dom.delete_backward(caret).unwrap();
        assert_eq!(dom.text_content(body), "Hllo");
        assert_eq!(dom.text_offset(body, caret), Some(1));
    }

    #[test]
    fn test_insert_into_empty_element() {
        let mut dom = Dom::parse("<p></p>");
        let p = dom.find_tag(dom.root(), "p").unwrap();
        let caret = dom.insert_text(Position::new(p, 0), "x").unwrap();
        assert_eq!(dom.text_content(p), "x");
        assert_eq!(caret.offset, 1);
    }

    #[test]
    fn test_multibyte_offsets() {
        let mut dom = Dom::parse("<p>héllo</p>");
        let body = dom.body().unwrap();
        let caret = dom.position_at(body, 2).unwrap();
        dom.insert_text(caret, "·").unwrap();
        assert_eq!(dom.text_content(body), "hé·llo");
    }

    #[test]
    fn test_capture_and_resolve_across_reparse() {
        let dom = Dom::parse("<p>one</p><p>two</p>");
        let body = dom.body().unwrap();
        let range = dom.resolve_range(body, TextRange::caret(5)).unwrap();
        let captured = dom.capture_range(body, &range).unwrap();

        let reparsed = Dom::parse("<p>one</p><p>two</p>");
        let restored = reparsed
            .resolve_range(reparsed.body().unwrap(), captured)
            .unwrap();
        assert_eq!(reparsed.text(restored.focus.node), Some("two"));
        assert_eq!(restored.focus.offset, 2);
    }
}

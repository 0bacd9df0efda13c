//! # Document Tree
//!
//! Arena-backed DOM. Every node lives in one `Vec` owned by [`Dom`] and is
//! addressed by a [`NodeId`]. Detaching a node unlinks it from its parent
//! but keeps it in the arena, so ids held elsewhere never dangle; they just
//! stop being [connected](Dom::is_connected).

use serde::{Deserialize, Serialize};

/// Index of a node inside its [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,

    /// Attributes in source order
    pub attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|value| value.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are emitted verbatim.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Empty document containing only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse markup into a document with `html`, `head` and `body` present
    pub fn parse(source: &str) -> Self {
        crate::parser::parse(source)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Set an attribute, replacing the first existing one with that name
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(element) = self.element_mut(id) {
            match element.attributes.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => element.attributes.push(Attribute::new(name, value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let element = self.element_mut(id)?;
        let index = element.attributes.iter().position(|a| a.name == name)?;
        Some(element.attributes.remove(index).value)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        if let NodeData::Text(text) = &mut self.nodes[id.0].data {
            *text = value.into();
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    pub fn create_doctype(&mut self, declaration: impl Into<String>) -> NodeId {
        self.push(NodeData::Doctype(declaration.into()))
    }

    /// Unlink a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Position of `id` among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Ancestors from the parent upwards
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// Pre-order traversal of `id` and everything below it
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            stack: vec![id],
        }
    }

    pub fn find(&self, from: NodeId, predicate: impl Fn(&Dom, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(from).find(|&node| predicate(self, node))
    }

    pub fn find_tag(&self, from: NodeId, tag: &str) -> Option<NodeId> {
        self.find(from, |dom, node| dom.tag(node) == Some(tag))
    }

    pub fn html(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&node| self.tag(node) == Some("html"))
    }

    pub fn head(&self) -> Option<NodeId> {
        let html = self.html()?;
        self.children(html)
            .iter()
            .copied()
            .find(|&node| self.tag(node) == Some("head"))
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.html()?;
        self.children(html)
            .iter()
            .copied()
            .find(|&node| self.tag(node) == Some("body"))
    }

    /// Concatenated text of every text node below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Text nodes below `scope` in document order, skipping `script`/`style` bodies
    pub fn text_nodes(&self, scope: NodeId) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|&node| {
                self.is_text(node)
                    && !self
                        .parent(node)
                        .and_then(|parent| self.tag(parent))
                        .map(is_raw_text)
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|node| node == ancestor)
    }
}

pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(node).iter().rev().copied());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tree() {
        let mut dom = Dom::new();
        let root = dom.root();
        let div = dom.create_element(Element::new("div"));
        let text = dom.create_text("hello");
        dom.append_child(root, div);
        dom.append_child(div, text);

        assert_eq!(dom.parent(text), Some(div));
        assert_eq!(dom.text_content(root), "hello");
        assert!(dom.is_connected(text));

        dom.detach(div);
        assert!(!dom.is_connected(text));
        assert_eq!(dom.text_content(div), "hello");
    }

    #[test]
    fn test_attributes() {
        let mut dom = Dom::new();
        let p = dom.create_element(Element::new("p"));

        dom.set_attr(p, "class", "lead intro");
        assert!(dom.element(p).unwrap().has_class("intro"));

        dom.set_attr(p, "class", "other");
        assert_eq!(dom.attr(p, "class"), Some("other"));
        assert_eq!(dom.element(p).unwrap().attributes.len(), 1);

        assert_eq!(dom.remove_attr(p, "class"), Some("other".to_string()));
        assert_eq!(dom.attr(p, "class"), None);
    }

    #[test]
    fn test_descendants_preorder() {
        let dom = Dom::parse("<div><p>a</p><p>b</p></div>");
        let body = dom.body().unwrap();
        let tags: Vec<_> = dom
            .descendants(body)
            .filter_map(|node| dom.tag(node))
            .collect();
        assert_eq!(tags, vec!["body", "div", "p", "p"]);
    }
}

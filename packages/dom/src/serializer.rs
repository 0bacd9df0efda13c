//! Markup serialization.
//!
//! Output follows the browser `outerHTML` conventions: attributes in source
//! order, no closing tag for void elements, raw `script`/`style` bodies,
//! and `&nbsp;` for non-breaking spaces.

use crate::node::{is_raw_text, is_void, Dom, NodeData, NodeId};

/// Lets callers leave nodes or attributes out of the output.
pub trait SerializeFilter {
    fn skip_node(&self, _dom: &Dom, _node: NodeId) -> bool {
        false
    }

    fn skip_attribute(&self, _dom: &Dom, _node: NodeId, _name: &str) -> bool {
        false
    }
}

/// Serializes everything
pub struct NoFilter;

impl SerializeFilter for NoFilter {}

struct Serializer<'a, F: SerializeFilter> {
    dom: &'a Dom,
    filter: &'a F,
    buffer: String,
}

impl<'a, F: SerializeFilter> Serializer<'a, F> {
    fn new(dom: &'a Dom, filter: &'a F) -> Self {
        Self {
            dom,
            filter,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn node(&mut self, node: NodeId) {
        if self.filter.skip_node(self.dom, node) {
            return;
        }

        match self.dom.data(node) {
            NodeData::Document => self.children(node),
            NodeData::Doctype(declaration) => {
                self.add("<!");
                self.add(declaration);
                self.add(">");
            }
            NodeData::Comment(text) => {
                self.add("<!--");
                self.add(text);
                self.add("-->");
            }
            NodeData::Text(text) => {
                let raw = self
                    .dom
                    .parent(node)
                    .and_then(|parent| self.dom.tag(parent))
                    .map(is_raw_text)
                    .unwrap_or(false);
                if raw {
                    self.add(text);
                } else {
                    let escaped = escape_text(text);
                    self.add(&escaped);
                }
            }
            NodeData::Element(element) => {
                self.add("<");
                self.add(&element.tag);
                for attribute in &element.attributes {
                    if self.filter.skip_attribute(self.dom, node, &attribute.name) {
                        continue;
                    }
                    self.add(" ");
                    self.add(&attribute.name);
                    self.add("=\"");
                    let escaped = escape_attribute(&attribute.value);
                    self.add(&escaped);
                    self.add("\"");
                }
                self.add(">");

                if is_void(&element.tag) {
                    return;
                }

                self.children(node);
                self.add("</");
                self.add(&element.tag);
                self.add(">");
            }
        }
    }

    fn children(&mut self, node: NodeId) {
        for &child in self.dom.children(node) {
            self.node(child);
        }
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Serialize the whole document, doctype included
pub fn serialize(dom: &Dom) -> String {
    serialize_filtered(dom, dom.root(), &NoFilter)
}

/// Serialize `node` and its subtree (`outerHTML`)
pub fn outer_html(dom: &Dom, node: NodeId) -> String {
    serialize_filtered(dom, node, &NoFilter)
}

/// Serialize the children of `node` (`innerHTML`)
pub fn inner_html(dom: &Dom, node: NodeId) -> String {
    inner_html_filtered(dom, node, &NoFilter)
}

pub fn serialize_filtered<F: SerializeFilter>(dom: &Dom, node: NodeId, filter: &F) -> String {
    let mut serializer = Serializer::new(dom, filter);
    serializer.node(node);
    serializer.buffer
}

pub fn inner_html_filtered<F: SerializeFilter>(dom: &Dom, node: NodeId, filter: &F) -> String {
    let mut serializer = Serializer::new(dom, filter);
    serializer.children(node);
    serializer.buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_serialization() {
        let dom = Dom::parse("<p>Hello</p>");
        assert_eq!(
            serialize(&dom),
            "<html><head></head><body><p>Hello</p></body></html>"
        );
        assert_eq!(inner_html(&dom, dom.body().unwrap()), "<p>Hello</p>");
    }

    #[test]
    fn test_document_round_trip_is_stable() {
        let source = r#"<!DOCTYPE html><html lang="en"><head><style>p > b {}</style></head><body><p class="a">x &amp; y<br>z&nbsp;</p><!-- c --></body></html>"#;
        let first = serialize(&Dom::parse(source));
        assert_eq!(first, source);
        assert_eq!(serialize(&Dom::parse(&first)), first);
    }

    #[test]
    fn test_attribute_escaping() {
        let mut dom = Dom::parse("<p>x</p>");
        let p = dom.find_tag(dom.root(), "p").unwrap();
        dom.set_attr(p, "title", "say \"hi\" & go");
        assert_eq!(
            outer_html(&dom, p),
            r#"<p title="say &quot;hi&quot; &amp; go">x</p>"#
        );
    }

    struct SkipComments;

    impl SerializeFilter for SkipComments {
        fn skip_node(&self, dom: &Dom, node: NodeId) -> bool {
            matches!(dom.data(node), NodeData::Comment(_))
        }
    }

    #[test]
    fn test_filter() {
        let dom = Dom::parse("<p>a<!-- hidden -->b</p>");
        let body = dom.body().unwrap();
        assert_eq!(inner_html_filtered(&dom, body, &SkipComments), "<p>ab</p>");
    }
}

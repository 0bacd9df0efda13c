//! Tolerant HTML tree builder.
//!
//! Handles what editable documents contain in practice: nested elements,
//! void elements, comments, a doctype, entities, and `style`/`script`
//! bodies. Unmatched closing tags are dropped and unclosed elements are
//! closed at end of input. The result always has `html`, `head` and `body`.

use crate::node::{is_raw_text, is_void, Attribute, Dom, Element, NodeId};
use crate::tokenizer::{read_attribute_value, ContentToken, TagToken};
use logos::{Lexer, Logos};
use std::borrow::Cow;

/// Elements the builder moves into a freshly created `head`.
const HEAD_ELEMENTS: &[&str] = &["base", "link", "meta", "style", "title"];

pub fn parse(source: &str) -> Dom {
    let mut builder = TreeBuilder::new();
    let mut lex = ContentToken::lexer(source);

    while let Some(token) = lex.next() {
        match token {
            Ok(ContentToken::Text(text)) | Ok(ContentToken::StrayAngle(text)) => {
                builder.text(&decode_entities(text));
            }
            Ok(ContentToken::Comment(comment)) => builder.comment(comment),
            Ok(ContentToken::Declaration(declaration)) => builder.doctype(declaration),
            Ok(ContentToken::TagClose(name)) => builder.close(&name.to_ascii_lowercase()),
            Ok(ContentToken::TagOpen(name)) => {
                let mut tag_lex = lex.morph::<TagToken>();
                let (attributes, self_closing) = read_attributes(&mut tag_lex);
                lex = tag_lex.morph();

                let tag = name.to_ascii_lowercase();
                builder.open(&tag, attributes, self_closing);

                if is_raw_text(&tag) && !self_closing {
                    let rest = lex.remainder();
                    let end = find_closing_tag(rest, &tag).unwrap_or(rest.len());
                    if end > 0 {
                        builder.text(&rest[..end]);
                    }
                    lex.bump(end);
                }
            }
            Err(()) => {}
        }
    }

    builder.finish()
}

fn read_attributes<'src>(lex: &mut Lexer<'src, TagToken<'src>>) -> (Vec<Attribute>, bool) {
    let mut attributes: Vec<Attribute> = Vec::new();

    while let Some(token) = lex.next() {
        match token {
            Ok(TagToken::Name(name)) => {
                attributes.push(Attribute::new(name.to_ascii_lowercase(), ""));
            }
            Ok(TagToken::Equals) => {
                let value = read_attribute_value(lex);
                if let Some(last) = attributes.last_mut() {
                    last.value = decode_entities(value).into_owned();
                }
            }
            Ok(TagToken::End) => return (attributes, false),
            Ok(TagToken::SelfClose) => return (attributes, true),
            Ok(TagToken::Slash) | Err(()) => {}
        }
    }

    (attributes, false)
}

fn find_closing_tag(rest: &str, tag: &str) -> Option<usize> {
    let needle = format!("</{}", tag);
    rest.to_ascii_lowercase().find(&needle)
}

/// Decode character references. Unknown named references are left as-is.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        match candidate.find(';').filter(|&semi| semi <= 10) {
            Some(semi) => match decode_reference(&candidate[1..semi]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &candidate[semi + 1..];
                }
                None => {
                    out.push('&');
                    rest = &candidate[1..];
                }
            },
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(reference: &str) -> Option<char> {
    match reference {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = reference.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

struct TreeBuilder {
    dom: Dom,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let dom = Dom::new();
        let root = dom.root();
        Self {
            dom,
            open: vec![root],
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or_else(|| self.dom.root())
    }

    fn text(&mut self, text: &str) {
        let parent = self.current();

        // Merge with a preceding text sibling so offsets stay contiguous
        if let Some(&last) = self.dom.children(parent).last() {
            if let Some(existing) = self.dom.text(last) {
                let merged = format!("{}{}", existing, text);
                self.dom.set_text(last, merged);
                return;
            }
        }

        let node = self.dom.create_text(text);
        self.dom.append_child(parent, node);
    }

    fn comment(&mut self, text: &str) {
        let node = self.dom.create_comment(text);
        let parent = self.current();
        self.dom.append_child(parent, node);
    }

    fn doctype(&mut self, declaration: &str) {
        let node = self.dom.create_doctype(declaration);
        let root = self.dom.root();
        self.dom.append_child(root, node);
    }

    fn open(&mut self, tag: &str, attributes: Vec<Attribute>, self_closing: bool) {
        // <p> cannot contain another <p>
        if tag == "p" && self.dom.tag(self.current()) == Some("p") {
            self.open.pop();
        }

        let node = self.dom.create_element(Element {
            tag: tag.to_string(),
            attributes,
        });
        let parent = self.current();
        self.dom.append_child(parent, node);

        if !self_closing && !is_void(tag) {
            self.open.push(node);
        }
    }

    fn close(&mut self, tag: &str) {
        // Trailing content after </body> or </html> still belongs to the body
        if tag == "body" || tag == "html" {
            return;
        }

        let matching = self
            .open
            .iter()
            .rposition(|&node| self.dom.tag(node) == Some(tag));

        if let Some(index) = matching {
            self.open.truncate(index);
        }
    }

    fn finish(mut self) -> Dom {
        self.ensure_structure();
        self.dom
    }

    /// Guarantee `document > html > (head, body)` the way browsers do
    fn ensure_structure(&mut self) {
        let root = self.dom.root();

        let html = match self.dom.html() {
            Some(html) => html,
            None => {
                let html = self.dom.create_element(Element::new("html"));
                let adopt: Vec<NodeId> = self
                    .dom
                    .children(root)
                    .iter()
                    .copied()
                    .filter(|&node| !matches!(self.dom.data(node), crate::NodeData::Doctype(_)))
                    .collect();
                self.dom.append_child(root, html);
                for node in adopt {
                    self.dom.append_child(html, node);
                }
                html
            }
        };

        let head = match self.dom.head() {
            Some(head) => head,
            None => {
                let head = self.dom.create_element(Element::new("head"));
                self.dom.insert_child(html, 0, head);

                // Leading metadata belongs in the new head
                let leading: Vec<NodeId> = self
                    .dom
                    .children(html)
                    .iter()
                    .copied()
                    .skip(1)
                    .take_while(|&node| {
                        self.dom.tag(node).map(|tag| HEAD_ELEMENTS.contains(&tag)).unwrap_or(false)
                            || self
                                .dom
                                .text(node)
                                .map(|text| text.trim().is_empty())
                                .unwrap_or(false)
                    })
                    .collect();
                for node in leading {
                    if self.dom.is_element(node) {
                        self.dom.append_child(head, node);
                    } else {
                        self.dom.detach(node);
                    }
                }
                head
            }
        };

        if self.dom.body().is_none() {
            let body = self.dom.create_element(Element::new("body"));
            let adopt: Vec<NodeId> = self
                .dom
                .children(html)
                .iter()
                .copied()
                .filter(|&node| node != head)
                .collect();
            self.dom.append_child(html, body);
            for node in adopt {
                self.dom.append_child(body, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_gets_document_structure() {
        let dom = parse("<p>Hello</p>");
        let body = dom.body().expect("body");
        assert!(dom.head().is_some());

        let p = dom.children(body)[0];
        assert_eq!(dom.tag(p), Some("p"));
        assert_eq!(dom.text_content(p), "Hello");
    }

    #[test]
    fn test_full_document() {
        let dom = parse(
            "<!DOCTYPE html><html><head><title>T</title></head><body><h1>A</h1></body></html>",
        );
        assert_eq!(dom.text_content(dom.head().unwrap()), "T");
        assert_eq!(dom.text_content(dom.body().unwrap()), "A");
    }

    #[test]
    fn test_void_and_self_closing() {
        let dom = parse("<p>a<br>b<img src=x.png/>c</p>");
        let body = dom.body().unwrap();
        let p = dom.children(body)[0];
        assert_eq!(dom.children(p).len(), 5);
        assert_eq!(dom.text_content(p), "abc");
    }

    #[test]
    fn test_unmatched_close_is_ignored() {
        let dom = parse("<div>a</span>b</div>");
        let body = dom.body().unwrap();
        assert_eq!(dom.children(body).len(), 1);
        assert_eq!(dom.text_content(body), "ab");
    }

    #[test]
    fn test_style_body_is_raw() {
        let dom = parse("<style>p > a { color: red }</style><p>x</p>");
        let head = dom.head().unwrap();
        let style = dom.children(head)[0];
        assert_eq!(dom.text_content(style), "p > a { color: red }");
        assert_eq!(dom.text_content(dom.body().unwrap()), "x");
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&unknown; & x"), "&unknown; & x");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn test_attributes_parsed() {
        let dom = parse(r#"<div class="section-title" data-id=7 hidden>x</div>"#);
        let div = dom.find_tag(dom.root(), "div").unwrap();
        assert_eq!(dom.attr(div, "class"), Some("section-title"));
        assert_eq!(dom.attr(div, "data-id"), Some("7"));
        assert_eq!(dom.attr(div, "hidden"), Some(""));
    }
}

//! Simple CSS selectors: comma-separated compounds of a tag name, `#id`,
//! `.class` and `[attr]` / `[attr=value]` parts. Combinators are not
//! supported.

use crate::error::DomError;
use crate::node::{Dom, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        let Some(element) = dom.element(node) else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if tag != "*" && *tag != element.tag {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }

        self.attributes.iter().all(|(name, value)| match value {
            Some(value) => element.attr(name) == Some(value.as_str()),
            None => element.attr(name).is_some(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let compounds = source
            .split(',')
            .map(|part| parse_compound(part.trim(), source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { compounds })
    }

    /// Whether any compound in the list matches the element
    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.compounds.iter().any(|compound| compound.matches(dom, node))
    }

    /// Nearest inclusive ancestor matching the selector
    pub fn closest(&self, dom: &Dom, node: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(dom.ancestors(node))
            .find(|&candidate| self.matches(dom, candidate))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(part: &str, source: &str) -> Result<Compound, DomError> {
    let invalid = || DomError::InvalidSelector(source.to_string());

    if part.is_empty() || part.contains(char::is_whitespace) {
        return Err(invalid());
    }

    let mut compound = Compound::default();
    let mut rest = part;

    let tag_len = rest
        .find(|c: char| !(is_ident_char(c) || c == '*'))
        .unwrap_or(rest.len());
    if tag_len > 0 {
        compound.tag = Some(rest[..tag_len].to_ascii_lowercase());
        rest = &rest[tag_len..];
    }

    while let Some(marker) = rest.chars().next() {
        match marker {
            '.' | '#' => {
                let body = &rest[1..];
                let len = body.find(|c: char| !is_ident_char(c)).unwrap_or(body.len());
                if len == 0 {
                    return Err(invalid());
                }
                let name = body[..len].to_string();
                if marker == '.' {
                    compound.classes.push(name);
                } else {
                    compound.id = Some(name);
                }
                rest = &body[len..];
            }
            '[' => {
                let end = rest.find(']').ok_or_else(invalid)?;
                let inner = &rest[1..end];
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => (
                        name,
                        Some(value.trim_matches(|c: char| c == '"' || c == '\'').to_string()),
                    ),
                    None => (inner, None),
                };
                if name.is_empty() {
                    return Err(invalid());
                }
                compound.attributes.push((name.to_ascii_lowercase(), value));
                rest = &rest[end + 1..];
            }
            _ => return Err(invalid()),
        }
    }

    Ok(compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_list() {
        let dom = Dom::parse(
            r#"<h1>T</h1><div class="section-title x">S</div><p id="a" contenteditable="true">P</p>"#,
        );
        let selector = Selector::parse(".section-title, h1, h2").unwrap();

        let h1 = dom.find_tag(dom.root(), "h1").unwrap();
        let div = dom.find_tag(dom.root(), "div").unwrap();
        let p = dom.find_tag(dom.root(), "p").unwrap();

        assert!(selector.matches(&dom, h1));
        assert!(selector.matches(&dom, div));
        assert!(!selector.matches(&dom, p));

        assert!(Selector::parse("p#a").unwrap().matches(&dom, p));
        assert!(Selector::parse("[contenteditable=true]").unwrap().matches(&dom, p));
        assert!(Selector::parse("[contenteditable]").unwrap().matches(&dom, p));
    }

    #[test]
    fn test_closest() {
        let dom = Dom::parse(r#"<div class="section-title"><b>x</b></div>"#);
        let b = dom.find_tag(dom.root(), "b").unwrap();
        let div = dom.find_tag(dom.root(), "div").unwrap();
        let selector = Selector::parse(".section-title").unwrap();
        assert_eq!(selector.closest(&dom, b), Some(div));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse("div p").is_err());
        assert!(Selector::parse("a,").is_err());
        assert!(Selector::parse(".").is_err());
        assert!(Selector::parse("[x").is_err());
    }
}

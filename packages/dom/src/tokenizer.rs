use logos::{Lexer, Logos};
use std::fmt;

/// Tokens recognised between tags: markup boundaries and character data.
///
/// Attribute lists are lexed by [`TagToken`]; the parser morphs into that
/// lexer after every [`ContentToken::TagOpen`] and back once the tag ends.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum ContentToken<'src> {
    // `<!DOCTYPE html>` and friends; comments start with `-` and never match
    #[regex(r"<![a-zA-Z][^>]*>", |lex| { let s = lex.slice(); &s[2..s.len() - 1] })]
    Declaration(&'src str),

    #[token("<!--", comment_body)]
    Comment(&'src str),

    #[regex(r"<[a-zA-Z][a-zA-Z0-9:-]*", |lex| &lex.slice()[1..])]
    TagOpen(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:-]*[ \t\r\n]*>", close_tag_name)]
    TagClose(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    /// A `<` that does not start any markup; kept as character data
    #[token("<", |lex| lex.slice())]
    StrayAngle(&'src str),
}

/// Tokens inside an open tag, after the tag name.
///
/// Attribute values are not tokens: after [`TagToken::Equals`] the parser
/// reads the value straight from the remainder, because unquoted values may
/// contain characters (`/`, `=`) that are delimiters elsewhere in a tag.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TagToken<'src> {
    #[regex(r#"[^ \t\r\n\f"'<>/=]+"#, |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Equals,

    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[token("/")]
    Slash,
}

fn comment_body<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> &'src str {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            &rest[..end]
        }
        None => {
            // Unterminated comment swallows the rest of the input, as browsers do
            lex.bump(rest.len());
            rest
        }
    }
}

fn close_tag_name<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> &'src str {
    let slice = lex.slice();
    slice[2..slice.len() - 1].trim_end()
}

/// Read an attribute value following `=` directly from the lexer remainder.
pub(crate) fn read_attribute_value<'src>(lex: &mut Lexer<'src, TagToken<'src>>) -> &'src str {
    let rest = lex.remainder();
    let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let skipped = rest.len() - trimmed.len();

    let (value, consumed) = match trimmed.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let body = &trimmed[1..];
            match body.find(quote) {
                Some(end) => (&body[..end], end + 2),
                None => (body, trimmed.len()),
            }
        }
        _ => {
            let end = trimmed
                .find(|c: char| c.is_ascii_whitespace() || c == '>')
                .unwrap_or(trimmed.len());
            (&trimmed[..end], end)
        }
    };

    lex.bump(skipped + consumed);
    value
}

impl<'src> fmt::Display for ContentToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentToken::Declaration(d) => write!(f, "declaration <!{}>", d),
            ContentToken::Comment(_) => write!(f, "comment"),
            ContentToken::TagOpen(name) => write!(f, "<{}", name),
            ContentToken::TagClose(name) => write!(f, "</{}>", name),
            ContentToken::Text(_) => write!(f, "text"),
            ContentToken::StrayAngle(_) => write!(f, "<"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_tokens(source: &str) -> Vec<ContentToken<'_>> {
        ContentToken::lexer(source).filter_map(Result::ok).collect()
    }

    #[test]
    fn test_content_tokens() {
        let tokens = content_tokens("<!DOCTYPE html><p>Hi<!-- note --></p>");
        assert_eq!(
            tokens,
            vec![
                ContentToken::Declaration("DOCTYPE html"),
                ContentToken::TagOpen("p"),
                ContentToken::Text(">Hi"),
                ContentToken::Comment(" note "),
                ContentToken::TagClose("p"),
            ]
        );
    }

    #[test]
    fn test_stray_angle_is_text() {
        let tokens = content_tokens("a < b");
        assert_eq!(
            tokens,
            vec![
                ContentToken::Text("a "),
                ContentToken::StrayAngle("<"),
                ContentToken::Text(" b"),
            ]
        );
    }

    #[test]
    fn test_attribute_values() {
        let mut lex = TagToken::lexer(r#" class="a b" href=/x/y data-x='1'>"#);

        assert_eq!(lex.next(), Some(Ok(TagToken::Name("class"))));
        assert_eq!(lex.next(), Some(Ok(TagToken::Equals)));
        assert_eq!(read_attribute_value(&mut lex), "a b");

        assert_eq!(lex.next(), Some(Ok(TagToken::Name("href"))));
        assert_eq!(lex.next(), Some(Ok(TagToken::Equals)));
        assert_eq!(read_attribute_value(&mut lex), "/x/y");

        assert_eq!(lex.next(), Some(Ok(TagToken::Name("data-x"))));
        assert_eq!(lex.next(), Some(Ok(TagToken::Equals)));
        assert_eq!(read_attribute_value(&mut lex), "1");

        assert_eq!(lex.next(), Some(Ok(TagToken::End)));
    }
}

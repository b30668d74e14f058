//! Up-conversion (fragment -> tokens) and down-conversion (tokens -> fragment)

use super::token::Token;
use super::{MarkupError, MarkupResult};

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Up-convert a markup fragment into word and tag tokens.
///
/// Whitespace is normalised first. A tag is always a single atom, even when
/// it carries attributes with spaces in them; comments, CDATA sections and
/// processing instructions are opaque atoms as well.
pub fn tokenize(fragment: &str) -> MarkupResult<Vec<Token>> {
    let text = normalize_whitespace(fragment);
    let mut tokens = Vec::new();
    let mut space_before = false;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        if rest.starts_with('<') {
            let len = tag_len(rest).ok_or(MarkupError::UnterminatedTag { offset: pos })?;
            tokens.push(Token::tag(&rest[..len], space_before));
            space_before = false;
            pos += len;
        } else if rest.starts_with(' ') {
            space_before = true;
            pos += 1;
        } else {
            let len = rest.find(['<', ' ']).unwrap_or(rest.len());
            tokens.push(Token::word(&rest[..len], space_before));
            space_before = false;
            pos += len;
        }
    }

    Ok(tokens)
}

/// Down-convert tokens back into markup.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        push_raw(&mut out, token, &token.raw);
    }
    out
}

/// Append `raw` for `token`, restoring the separating space if it had one.
pub(crate) fn push_raw(out: &mut String, token: &Token, raw: &str) {
    if token.space_before && !out.is_empty() {
        out.push(' ');
    }
    out.push_str(raw);
}

/// Byte length of the tag atom at the start of `text`, including `>`.
fn tag_len(text: &str) -> Option<usize> {
    for (open, close) in [("<!--", "-->"), ("<![CDATA[", "]]>"), ("<?", "?>")] {
        if text.starts_with(open) {
            return text[open.len()..]
                .find(close)
                .map(|at| open.len() + at + close.len());
        }
    }

    let mut quote: Option<u8> = None;
    for (i, byte) in text.bytes().enumerate().skip(1) {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(byte),
            (None, b'>') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}

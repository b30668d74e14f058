//! Keyword-in-context windows for reviewers

use super::Span;
use crate::markup::Token;

/// Plain-text window around `span`: the span's words plus whole words on
/// either side until at least `radius` characters of context are collected.
/// Tags are dropped.
pub fn keyword_in_context(tokens: &[Token], span: &Span, radius: usize) -> String {
    let mut start = span.start;
    let mut seen = 0;
    while start > 0 && seen < radius {
        start -= 1;
        if tokens[start].is_word() {
            seen += tokens[start].raw.chars().count() + 1;
        }
    }

    let mut end = span.end;
    seen = 0;
    while end < tokens.len() && seen < radius {
        if tokens[end].is_word() {
            seen += tokens[end].raw.chars().count() + 1;
        }
        end += 1;
    }

    let mut out = String::new();
    let mut pending_space = false;
    for token in &tokens[start..end] {
        pending_space |= token.space_before;
        if token.is_word() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&token.raw);
            pending_space = false;
        }
    }
    out
}

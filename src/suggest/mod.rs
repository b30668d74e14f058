//! Suggestion engine
//!
//! Wraps a located span in a semantic tag and down-converts the result back
//! to markup. Tags already inside the span are kept verbatim as content of
//! the new element. Re-wrapping is prevented by the locator's banned-tag
//! guard, which [`SuggestionEngine`] extends with the target tag itself.

mod attributes;

pub use attributes::Attributes;

use crate::config::{Category, NerConfig, TagTable};
use crate::locate::{locate, LocateError, Span};
use crate::markup::{push_raw, tokenize, MarkupError, Token};
use thiserror::Error;

/// Errors from proposing a suggestion for a fragment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestError {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Locate(#[from] LocateError),
}

/// Render `tokens` with `span` wrapped in `<tag attributes>...</tag>`.
pub fn suggest(tokens: &[Token], span: &Span, tag: &str, attributes: &Attributes) -> String {
    let mut out = String::new();
    for token in &tokens[..span.start] {
        push_raw(&mut out, token, &token.raw);
    }

    let last = span.end - 1;
    for (i, token) in tokens.iter().enumerate().take(span.end).skip(span.start) {
        let lead = if i == span.start { span.lead } else { 0 };
        let trail = if i == last { span.trail } else { 0 };
        let raw = &token.raw;
        let inner = &raw[lead..raw.len() - trail];

        if i == span.start {
            push_raw(&mut out, token, &raw[..lead]);
            out.push('<');
            out.push_str(tag);
            out.push_str(&attributes.render());
            out.push('>');
            out.push_str(inner);
        } else {
            push_raw(&mut out, token, inner);
        }

        if i == last {
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
            out.push_str(&raw[raw.len() - trail..]);
        }
    }

    for token in &tokens[span.end..] {
        push_raw(&mut out, token, &token.raw);
    }
    out
}

/// Tokenize, locate and wrap in one step, using a shared tag table and
/// banned list.
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    tags: TagTable,
    banned: Vec<String>,
}

impl SuggestionEngine {
    pub fn new(tags: TagTable, banned: Vec<String>) -> Self {
        Self { tags, banned }
    }

    pub fn from_config(config: &NerConfig) -> Self {
        Self::new(config.tags.clone(), config.banned.clone())
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    pub fn banned(&self) -> &[String] {
        &self.banned
    }

    /// Configured banned names plus the category's own tag.
    pub fn banned_for(&self, category: Category) -> Vec<String> {
        let tag = self.tags.tag_for(category);
        let mut banned = self.banned.clone();
        if !banned.iter().any(|b| b == tag) {
            banned.push(tag.to_string());
        }
        banned
    }

    /// Locate `entity` for wrapping as `category`.
    pub fn locate(
        &self,
        tokens: &[Token],
        entity: &str,
        category: Category,
    ) -> Result<Span, LocateError> {
        locate(entity, tokens, &self.banned_for(category))
    }

    /// Render `tokens` with `span` wrapped in the category's tag.
    pub fn wrap(
        &self,
        tokens: &[Token],
        span: &Span,
        category: Category,
        attributes: &Attributes,
    ) -> String {
        suggest(tokens, span, self.tags.tag_for(category), attributes)
    }

    /// Machine suggestion: wrap `entity` with the category's tag and no
    /// attributes.
    pub fn propose(
        &self,
        fragment: &str,
        entity: &str,
        category: Category,
    ) -> Result<String, SuggestError> {
        self.apply(fragment, entity, category, &Attributes::new())
    }

    /// Wrap `entity` with the category's tag and the given attributes.
    pub fn apply(
        &self,
        fragment: &str,
        entity: &str,
        category: Category,
        attributes: &Attributes,
    ) -> Result<String, SuggestError> {
        let tokens = tokenize(fragment)?;
        let span = self.locate(&tokens, entity, category)?;
        Ok(self.wrap(&tokens, &span, category, attributes))
    }
}

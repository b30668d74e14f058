//! Entity locator
//!
//! Finds the minimal token span covering a plain-text entity inside an
//! up-converted fragment. Existing inline markup may sit between the words
//! of the entity. The matcher walks the token sequence directly; nothing is
//! compiled from the entity text, so punctuation or markup characters in a
//! name cannot produce a broken pattern.
//!
//! Only the leftmost occurrence is located. Repeated mentions of the same
//! name in one fragment are not enumerated separately.

mod kwic;

pub use kwic::keyword_in_context;

use crate::markup::{TagKind, Token};
use std::borrow::Cow;
use serde::Serialize;
use thiserror::Error;

/// Why an entity could not be turned into a span.
///
/// None of these abort a batch; callers branch on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LocateError {
    #[error("entity not found")]
    NotFound,

    #[error("already encoded in <{tag}>")]
    AlreadyEncoded { tag: String },

    #[error("unusable entity text: {reason}")]
    Pattern { reason: String },

    #[error("entity crosses an element boundary")]
    CrossesElement,
}

/// A located entity: tokens `start..end`, minus `lead` bytes at the front of
/// the first token and `trail` bytes at the back of the last one.
///
/// `lead` and `trail` only ever trim word tokens; they are zero whenever the
/// span begins or ends on a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub lead: usize,
    pub trail: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Locate `entity` in `tokens`, refusing matches already wrapped in one of
/// the `banned` tag names.
pub fn locate(entity: &str, tokens: &[Token], banned: &[String]) -> Result<Span, LocateError> {
    let words = entity_words(entity)?;
    let span = find_leftmost(&words, tokens).ok_or(LocateError::NotFound)?;

    if let Some(tag) = is_banned(tokens, &span, banned) {
        return Err(LocateError::AlreadyEncoded { tag });
    }

    balance(tokens, span).ok_or(LocateError::CrossesElement)
}

/// The banned tag enclosing or inside `span`, if any.
///
/// Checks the elements still open where the span begins as well as every
/// tag atom within the span. Names compare without namespace prefix.
pub fn is_banned(tokens: &[Token], span: &Span, banned: &[String]) -> Option<String> {
    let open = open_elements(&tokens[..span.start]);
    if let Some(name) = open.into_iter().rev().find(|name| is_listed(banned, name)) {
        return Some(name);
    }

    tokens[span.start..span.end]
        .iter()
        .filter_map(|t| t.tag_kind().and_then(TagKind::local_name))
        .find(|name| is_listed(banned, name))
        .map(str::to_string)
}

fn is_listed(banned: &[String], name: &str) -> bool {
    banned.iter().any(|b| b == name)
}

fn entity_words(entity: &str) -> Result<Vec<String>, LocateError> {
    let words: Vec<String> = entity.split_whitespace().map(str::to_string).collect();

    if words.is_empty() {
        return Err(LocateError::Pattern {
            reason: "entity text is empty".into(),
        });
    }
    if !words.iter().any(|w| w.chars().any(char::is_alphanumeric)) {
        return Err(LocateError::Pattern {
            reason: format!("'{}' has no word characters", entity.trim()),
        });
    }
    Ok(words)
}

fn find_leftmost(words: &[String], tokens: &[Token]) -> Option<Span> {
    let positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_word())
        .map(|(i, _)| i)
        .collect();

    if positions.len() < words.len() {
        return None;
    }

    (0..=positions.len() - words.len()).find_map(|k| {
        let candidate = &positions[k..k + words.len()];
        match_words(words, tokens, candidate)
    })
}

/// Match entity words against the word tokens at `at`.
///
/// Words compare as character data, with entity and character references
/// in the tokens resolved; `lead` and `trail` are raw byte counts.
fn match_words(words: &[String], tokens: &[Token], at: &[usize]) -> Option<Span> {
    let first = Decoded::new(&tokens[at[0]].raw);
    let last_index = at[at.len() - 1];

    if words.len() == 1 {
        let word = &words[0];
        let text = first.text.as_str();
        let (lead, trail) = text.match_indices(word.as_str()).find_map(|(offset, _)| {
            let end = offset + word.len();
            (prefix_ok(&text[..offset]) && suffix_ok(&text[end..]))
                .then(|| (first.raw_offset(offset), first.raw_len - first.raw_offset(end)))
        })?;
        return Some(Span {
            start: at[0],
            end: at[0] + 1,
            lead,
            trail,
        });
    }

    let last = Decoded::new(&tokens[last_index].raw);
    let head = &words[0];
    let tail = &words[words.len() - 1];
    let lead = first.text.strip_suffix(head.as_str()).filter(|p| prefix_ok(p))?.len();
    let trail = last.text.strip_prefix(tail.as_str()).filter(|s| suffix_ok(s))?;
    let lead = first.raw_offset(lead);
    let trail = last.raw_len - last.raw_offset(last.text.len() - trail.len());
    let interior_matches = words[1..words.len() - 1]
        .iter()
        .zip(&at[1..at.len() - 1])
        .all(|(word, &i)| Decoded::new(&tokens[i].raw).text == *word);

    interior_matches.then_some(Span {
        start: at[0],
        end: last_index + 1,
        lead,
        trail,
    })
}

/// A word token's character data, with a map back to raw byte offsets.
struct Decoded {
    text: String,
    /// Raw offset of each decoded byte, plus one entry for the end.
    raw_at: Vec<usize>,
    raw_len: usize,
}

impl Decoded {
    fn new(raw: &str) -> Self {
        let mut text = String::with_capacity(raw.len());
        let mut raw_at = Vec::with_capacity(raw.len() + 1);
        let mut pos = 0;

        while pos < raw.len() {
            let rest = &raw[pos..];
            let reference = rest
                .starts_with('&')
                .then(|| rest.find(';'))
                .flatten()
                .map(|semi| &rest[..=semi]);
            let (piece, used): (Cow<'_, str>, usize) = match reference
                .and_then(|r| quick_xml::escape::unescape(r).ok().map(|c| (c, r.len())))
            {
                Some(resolved) => resolved,
                None => {
                    let len = rest.chars().next().map_or(1, char::len_utf8);
                    (Cow::Borrowed(&rest[..len]), len)
                }
            };
            raw_at.extend(std::iter::repeat(pos).take(piece.len()));
            text.push_str(&piece);
            pos += used;
        }
        raw_at.push(raw.len());

        Self {
            text,
            raw_at,
            raw_len: raw.len(),
        }
    }

    /// Raw byte offset of decoded offset `at`, which must be a char boundary.
    fn raw_offset(&self, at: usize) -> usize {
        self.raw_at[at]
    }
}

/// Leading text glued to the first word may only end in punctuation.
fn prefix_ok(prefix: &str) -> bool {
    prefix.chars().last().map_or(true, |c| !c.is_alphanumeric())
}

/// Trailing text glued to the last word may only start with punctuation.
fn suffix_ok(suffix: &str) -> bool {
    suffix.chars().next().map_or(true, |c| !c.is_alphanumeric())
}

/// Local names of the elements still open after `tokens`.
fn open_elements(tokens: &[Token]) -> Vec<String> {
    let mut open: Vec<String> = Vec::new();
    for kind in tokens.iter().filter_map(Token::tag_kind) {
        match kind {
            TagKind::Start(_) => open.extend(kind.local_name().map(str::to_string)),
            TagKind::End(_) => {
                if let Some(name) = kind.local_name() {
                    if let Some(at) = open.iter().rposition(|o| o == name) {
                        open.truncate(at);
                    }
                }
            }
            TagKind::Empty(_) | TagKind::Other => {}
        }
    }
    open
}

/// Grow `span` over adjacent tag atoms until its tags are balanced.
///
/// An end tag inside the span whose start tag precedes it pulls the start
/// back over that tag; a start tag whose end tag follows pushes the end
/// forward. Only tag atoms are absorbed, never words. Returns `None` when
/// the span cannot be balanced that way.
fn balance(tokens: &[Token], mut span: Span) -> Option<Span> {
    let mut open: Vec<&str> = Vec::new();
    let mut unmatched_ends: Vec<&str> = Vec::new();
    for kind in tokens[span.start..span.end].iter().filter_map(Token::tag_kind) {
        match kind {
            TagKind::Start(name) => open.push(name.as_str()),
            TagKind::End(name) => {
                if open.last() == Some(&name.as_str()) {
                    open.pop();
                } else if open.is_empty() {
                    unmatched_ends.push(name.as_str());
                } else {
                    return None;
                }
            }
            TagKind::Empty(_) | TagKind::Other => {}
        }
    }

    let mut needed = unmatched_ends.into_iter().peekable();
    while let Some(&name) = needed.peek() {
        let prev = span.start.checked_sub(1)?;
        match tokens[prev].tag_kind()? {
            TagKind::Start(start) if start == name => {
                needed.next();
            }
            TagKind::Empty(_) | TagKind::Other => {}
            _ => return None,
        }
        span.start = prev;
        span.lead = 0;
    }

    while let Some(&name) = open.last() {
        let next = span.end;
        match tokens.get(next)?.tag_kind()? {
            TagKind::End(end) if end == name => {
                open.pop();
            }
            TagKind::Empty(_) | TagKind::Other => {}
            _ => return None,
        }
        span.end = next + 1;
        span.trail = 0;
    }

    Some(span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tokenize;

    fn banned(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn covered(tokens: &[Token], span: &Span) -> String {
        crate::markup::render(&tokens[span.start..span.end])
    }

    #[test]
    fn finds_single_word_with_trailing_punctuation() {
        let tokens = tokenize("Mr. Abel lived in Boston.").unwrap();
        let span = locate("Boston", &tokens, &[]).unwrap();
        assert_eq!(span, Span { start: 4, end: 5, lead: 0, trail: 1 });
    }

    #[test]
    fn leading_quote_is_left_outside() {
        let tokens = tokenize("<p>He said “Quincy” twice</p>").unwrap();
        let span = locate("Quincy", &tokens, &[]).unwrap();
        assert_eq!(span.lead, "“".len());
        assert_eq!(span.trail, "”".len());
    }

    #[test]
    fn does_not_match_inside_longer_word() {
        let tokens = tokenize("<p>McAbel and Abel</p>").unwrap();
        let span = locate("Abel", &tokens, &[]).unwrap();
        assert_eq!(tokens[span.start].raw, "Abel");

        let tokens = tokenize("<p>Bostonian ways</p>").unwrap();
        assert_eq!(locate("Boston", &tokens, &[]), Err(LocateError::NotFound));
    }

    #[test]
    fn possessive_suffix_is_trimmed() {
        let tokens = tokenize("<p>Boston's harbour</p>").unwrap();
        let span = locate("Boston", &tokens, &[]).unwrap();
        assert_eq!(span.trail, 2);
    }

    #[test]
    fn multi_word_entity_across_inline_markup() {
        let tokens = tokenize("<p>Saw John <hi rend=\"i\">Quincy</hi> Adams today.</p>").unwrap();
        let span = locate("John Quincy Adams", &tokens, &[]).unwrap();
        assert_eq!(
            covered(&tokens, &span),
            "John <hi rend=\"i\">Quincy</hi> Adams"
        );
    }

    #[test]
    fn escaped_markup_matches_plain_entity_text() {
        let tokens = tokenize("<p>Shares in AT&amp;T rose</p>").unwrap();
        let span = locate("AT&T", &tokens, &[]).unwrap();
        assert_eq!(tokens[span.start].raw, "AT&amp;T");
    }

    #[test]
    fn character_references_match_their_characters() {
        let tokens = tokenize("<p>Saw O&#8217;Brien today.</p>").unwrap();
        let span = locate("O\u{2019}Brien", &tokens, &[]).unwrap();
        assert_eq!(tokens[span.start].raw, "O&#8217;Brien");
        assert_eq!((span.lead, span.trail), (0, 0));

        let tokens = tokenize("<p>the &#x201C;Adams&#x201D; house</p>").unwrap();
        let span = locate("Adams", &tokens, &[]).unwrap();
        assert_eq!(span.lead, "&#x201C;".len());
        assert_eq!(span.trail, "&#x201D;".len());
    }

    #[test]
    fn predefined_entities_in_names_and_suffixes() {
        let tokens = tokenize("<p>Met O&apos;Neill at Boston&apos;s wharf</p>").unwrap();
        let span = locate("O'Neill", &tokens, &[]).unwrap();
        assert_eq!(tokens[span.start].raw, "O&apos;Neill");

        let span = locate("Boston", &tokens, &[]).unwrap();
        assert_eq!(span.trail, "&apos;s".len());

        let tokens = tokenize("<p>Rode with John &quot;Jack&quot; Smith</p>").unwrap();
        let span = locate("John \"Jack\" Smith", &tokens, &[]).unwrap();
        assert_eq!(span.len(), 3);
    }

    #[test]
    fn unresolvable_ampersand_is_kept_literally() {
        let tokens = tokenize("<p>Abel &c. left</p>").unwrap();
        let span = locate("Abel", &tokens, &[]).unwrap();
        assert_eq!(span.start, 1);
        assert_eq!(Decoded::new("&c.").text, "&c.");
        assert_eq!(Decoded::new("a&bogus;b").text, "a&bogus;b");
    }

    #[test]
    fn leftmost_occurrence_only() {
        let tokens = tokenize("<p>Abel met Abel</p>").unwrap();
        let span = locate("Abel", &tokens, &[]).unwrap();
        assert_eq!(span.start, 1);
    }

    #[test]
    fn already_encoded_by_enclosing_element() {
        let tokens = tokenize("<p>Mr. <persRef ref=\"abel\">Abel</persRef> lived here.</p>").unwrap();
        assert_eq!(
            locate("Abel", &tokens, &banned(&["persRef"])),
            Err(LocateError::AlreadyEncoded { tag: "persRef".into() })
        );
    }

    #[test]
    fn already_encoded_by_tag_inside_span() {
        let tokens = tokenize("<p>Mrs <persRef>Abel</persRef> Smith</p>").unwrap();
        assert_eq!(
            locate("Mrs Abel Smith", &tokens, &banned(&["persRef"])),
            Err(LocateError::AlreadyEncoded { tag: "persRef".into() })
        );
    }

    #[test]
    fn unbanned_enclosing_element_is_fine() {
        let tokens = tokenize("<p><hi>Abel</hi> left</p>").unwrap();
        let span = locate("Abel", &tokens, &banned(&["persRef"])).unwrap();
        assert_eq!(covered(&tokens, &span), "Abel");
    }

    #[test]
    fn closed_banned_element_before_span_does_not_count() {
        let tokens = tokenize("<p><persRef>Abel</persRef> saw Boston</p>").unwrap();
        assert!(locate("Boston", &tokens, &banned(&["persRef"])).is_ok());
    }

    #[test]
    fn span_absorbs_tags_needed_for_balance() {
        let tokens = tokenize("<p><hi>John Quincy</hi> Adams</p>").unwrap();
        let span = locate("Quincy Adams", &tokens, &[]);
        assert_eq!(span, Err(LocateError::CrossesElement));

        let tokens = tokenize("<p><hi>John</hi> Adams</p>").unwrap();
        let span = locate("John Adams", &tokens, &[]).unwrap();
        assert_eq!(covered(&tokens, &span), "<hi>John</hi> Adams");
        assert_eq!(span.lead, 0);

        let tokens = tokenize("<p>John <hi>Adams</hi></p>").unwrap();
        let span = locate("John Adams", &tokens, &[]).unwrap();
        assert_eq!(covered(&tokens, &span), "John <hi>Adams</hi>");
        assert_eq!(span.trail, 0);
    }

    #[test]
    fn pattern_errors() {
        let tokens = tokenize("<p>text</p>").unwrap();
        assert!(matches!(
            locate("   ", &tokens, &[]),
            Err(LocateError::Pattern { .. })
        ));
        assert!(matches!(
            locate("(*)", &tokens, &[]),
            Err(LocateError::Pattern { .. })
        ));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let tokens = tokenize("<p>Ask Mr. (Jr.) Smith? yes</p>").unwrap();
        let span = locate("(Jr.) Smith?", &tokens, &[]).unwrap();
        assert_eq!(covered(&tokens, &span), "(Jr.) Smith?");
    }

    #[test]
    fn not_found() {
        let tokens = tokenize("<p>nobody here</p>").unwrap();
        assert_eq!(locate("Abel", &tokens, &[]), Err(LocateError::NotFound));
    }
}

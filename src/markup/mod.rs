//! Markup up-conversion and down-conversion
//!
//! A fragment of TEI markup is turned into a flat sequence of atomic tokens,
//! each either a word or a whole tag. Matching then happens over tokens, so a
//! candidate entity can never straddle half of a tag. [`render`] is the
//! inverse and reproduces the fragment up to whitespace normalisation.
//!
//! This module also owns the well-formedness check used before and after a
//! revision, and the escaping helpers shared by the header writer and the
//! suggestion engine.

mod token;
mod tokenize;
mod wellformed;

pub use token::{TagKind, Token, TokenKind};
pub use tokenize::{normalize_whitespace, render, tokenize};
pub(crate) use token::local_name;
pub(crate) use tokenize::push_raw;
pub(crate) use wellformed::qualified_name;
pub use wellformed::{check_fragment, check_well_formed, escape_attribute, escape_text};

use thiserror::Error;

/// Errors raised while reading markup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },

    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("end tag </{found}> at byte {offset} does not close <{expected}>")]
    MismatchedEnd {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("end tag </{found}> at byte {offset} has no open element")]
    UnexpectedEnd { found: String, offset: usize },

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("document has no root element")]
    NoRoot,

    #[error("second root element at byte {offset}")]
    MultipleRoots { offset: usize },

    #[error("text outside the root element at byte {offset}")]
    TextOutsideRoot { offset: usize },

    #[error("markup outside the fragment element at byte {offset}")]
    OutsideFragment { offset: usize },
}

/// Result type for markup operations
pub type MarkupResult<T> = Result<T, MarkupError>;

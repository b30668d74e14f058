//! nerhelper: human-in-the-loop named-entity tagging for TEI-XML
//!
//! Candidate entities are detected in a document's text, offered to a
//! reviewer as a table of suggestions, and the accepted ones are written
//! back into the markup as semantic tags.
//!
//! # Core Concepts
//!
//! - **Fragments**: children of `div[@type="docbody"]`, each addressed by a
//!   stable location path and sequence index
//! - **Tokens**: a fragment split into words and whole tags, so an entity can
//!   be matched across inline markup without ever splitting a tag
//! - **Decisions**: reviewer accept/reject rows, replayed per fragment in
//!   arrival order
//!
//! # Example
//!
//! ```
//! use nerhelper::{Category, SuggestionEngine, TagTable};
//!
//! let engine = SuggestionEngine::new(TagTable::default(), vec!["persRef".into()]);
//! let out = engine
//!     .propose("<p>Mr. Abel lived in Boston.</p>", "Boston", Category::Gpe)
//!     .unwrap();
//! assert_eq!(out, "<p>Mr. Abel lived in <placeName>Boston</placeName>.</p>");
//! ```

pub mod config;
pub mod detect;
pub mod document;
pub mod locate;
pub mod markup;
pub mod pipeline;
pub mod revise;
pub mod suggest;
pub mod table;

pub use config::{Category, ConfigError, ContainerConfig, NerConfig, ProvenanceConfig, TagTable};
pub use detect::{
    DetectionReport, Detector, EntityRecognizer, GazetteerRecognizer, Mention, RecognizedEntity,
    RecognizerRegistry,
};
pub use document::{Document, Fragment, FragmentKey, ProvenanceRecord};
pub use locate::{keyword_in_context, locate, LocateError, Span};
pub use markup::{check_well_formed, render, tokenize, MarkupError, MarkupResult, Token};
pub use pipeline::{BatchReport, Pipeline, PipelineError};
pub use revise::{
    admit, Decision, Outcome, Policy, PolicyViolation, Reconciler, ReviseError, ReviseResult,
    RevisedFragment,
};
pub use suggest::{suggest, Attributes, SuggestError, SuggestionEngine};
pub use table::{read_rows, write_rows, SuggestionRow, TableError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

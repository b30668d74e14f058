//! Entity detection
//!
//! Recognisers read a fragment's plain text and name candidate entities.
//! The [`Detector`] places each candidate back into the fragment's markup
//! with the locator and turns it into a suggestion row for review.
//! Candidates that are already tagged are dropped; candidates that cannot be
//! placed are kept on the report with the reason.
//!
//! Statistical recognisers plug in through [`EntityRecognizer`]. The
//! built-in [`GazetteerRecognizer`] matches fixed name lists from the
//! configuration.

mod detector;
mod gazetteer;
mod traits;

pub use detector::{DetectionReport, Detector, Mention, SkippedMention};
pub use gazetteer::GazetteerRecognizer;
pub use traits::{EntityRecognizer, RecognizedEntity, RecognizerRegistry};

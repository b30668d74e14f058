//! Revision reconciler
//!
//! Reviewer decisions arrive as a flat list. They are grouped by the
//! fragment they address and replayed in arrival order, each group starting
//! from the fragment's original markup:
//!
//! ```text
//!            accept (span found)
//! Pristine ----------------------> Revised --+
//!   |  ^                              ^      | accept / reject
//!   +--+ reject, skipped accept       +------+
//! ```
//!
//! An accept whose entity is already wrapped is a no-op, so replaying the
//! same decision list twice never nests tags. Final assembly splices every
//! changed fragment back into the document body, stamps the TEI header and
//! re-checks well-formedness before anything is returned.

mod assemble;
mod decision;
mod reconcile;

pub use decision::{admit, Decision, Outcome, Policy, PolicyViolation};
pub use reconcile::{GroupState, Reconciler, RevisedFragment};

use crate::document::{Document, FragmentKey, ProvenanceRecord};
use crate::markup::MarkupError;
use thiserror::Error;

/// Errors that abort revision of a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviseError {
    #[error("conflict at {location_path} #{sequence_index}: {reason}")]
    Conflict {
        location_path: String,
        sequence_index: usize,
        reason: String,
    },

    #[error("revised document is not well-formed: {0}")]
    Malformed(MarkupError),

    #[error(transparent)]
    Markup(#[from] MarkupError),
}

impl ReviseError {
    pub(crate) fn conflict(key: &FragmentKey, reason: impl Into<String>) -> Self {
        ReviseError::Conflict {
            location_path: key.location_path.clone(),
            sequence_index: key.sequence_index,
            reason: reason.into(),
        }
    }
}

/// Result type for revision
pub type ReviseResult<T> = Result<T, ReviseError>;

impl Reconciler {
    /// Reconcile `decisions` against the document's fragments and assemble
    /// the output in one step.
    pub fn revise(
        &self,
        document: &mut Document,
        decisions: &[Decision],
        record: ProvenanceRecord,
    ) -> ReviseResult<String> {
        let revised = self.reconcile(&document.fragments, decisions)?;
        self.assemble(document, &revised, record)
    }
}

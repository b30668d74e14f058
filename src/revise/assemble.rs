use super::{Reconciler, ReviseError, ReviseResult, RevisedFragment};
use crate::document::{insert_into_header, Document, ProvenanceRecord};
use crate::markup::check_well_formed;
use tracing::{debug, info, warn};

impl Reconciler {
    /// Splice revised fragments into the document and stamp its header.
    ///
    /// The document is only modified when the whole result is well-formed.
    /// Returns the complete output text, prolog included.
    pub fn assemble(
        &self,
        document: &mut Document,
        revised: &[RevisedFragment],
        record: ProvenanceRecord,
    ) -> ReviseResult<String> {
        let mut changed: Vec<(&RevisedFragment, std::ops::Range<usize>)> = Vec::new();
        for fragment in revised.iter().filter(|r| r.is_changed()) {
            let range = document
                .fragment(&fragment.key)
                .map(|f| f.range.clone())
                .ok_or_else(|| ReviseError::conflict(&fragment.key, "no fragment at this location"))?;
            changed.push((fragment, range));
        }
        changed.sort_by(|a, b| b.1.start.cmp(&a.1.start));

        let mut body = document.body.clone();
        for (fragment, range) in changed {
            let at = if body.get(range.clone()) == Some(fragment.original.as_str()) {
                range.start
            } else {
                debug!(key = %fragment.key, "recorded range is stale, searching body");
                resolve(&body, fragment)?
            };
            body.replace_range(at..at + fragment.original.len(), &fragment.revised);
        }

        match insert_into_header(&body, &record)? {
            Some(stamped) => body = stamped,
            None => warn!(
                document = %document.name,
                "no teiHeader, provenance kept in memory only"
            ),
        }

        check_well_formed(&body).map_err(ReviseError::Malformed)?;

        document.replace_body(body, &self.container)?;
        document.provenance.push(record);
        info!(
            document = %document.name,
            fragments = revised.iter().filter(|r| r.is_changed()).count(),
            "assembled revision"
        );
        Ok(document.to_markup())
    }
}

/// Unique position of a fragment's original text in `body`.
fn resolve(body: &str, fragment: &RevisedFragment) -> ReviseResult<usize> {
    let mut found = body.match_indices(fragment.original.as_str()).map(|(at, _)| at);
    match (found.next(), found.next()) {
        (Some(at), None) => Ok(at),
        (None, _) => Err(ReviseError::conflict(
            &fragment.key,
            "original text no longer present",
        )),
        (Some(_), Some(_)) => Err(ReviseError::conflict(
            &fragment.key,
            "original text occurs more than once",
        )),
    }
}

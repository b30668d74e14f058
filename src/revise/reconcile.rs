use super::{Decision, Outcome, ReviseError, ReviseResult};
use crate::config::{ContainerConfig, NerConfig};
use crate::document::{Fragment, FragmentKey};
use crate::locate::LocateError;
use crate::markup::{check_fragment, tokenize};
use crate::suggest::{Attributes, SuggestionEngine};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Per-fragment state while its decisions are replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupState {
    Pristine,
    Revised,
}

/// Final text of one fragment after all of its decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisedFragment {
    pub key: FragmentKey,
    pub original: String,
    pub revised: String,
    pub state: GroupState,
    /// Accepted decisions that wrapped an entity
    pub applied: usize,
    /// Accepted decisions that had nothing to do or could not be placed
    pub skipped: usize,
}

impl RevisedFragment {
    pub fn is_changed(&self) -> bool {
        self.original != self.revised
    }
}

/// Replays reviewer decisions onto document fragments
#[derive(Debug, Clone)]
pub struct Reconciler {
    engine: SuggestionEngine,
    human_type: String,
    pub(super) container: ContainerConfig,
}

impl Reconciler {
    pub fn new(config: &NerConfig) -> Self {
        Self {
            engine: SuggestionEngine::from_config(config),
            human_type: config.provenance.human_type.clone(),
            container: config.container.clone(),
        }
    }

    /// Group `decisions` by fragment and run each group in arrival order.
    ///
    /// Only fragments with at least one decision appear in the result,
    /// ordered by sequence index.
    pub fn reconcile(
        &self,
        fragments: &[Fragment],
        decisions: &[Decision],
    ) -> ReviseResult<Vec<RevisedFragment>> {
        let mut groups: HashMap<&FragmentKey, Vec<&Decision>> = HashMap::new();
        for decision in decisions {
            if !fragments.iter().any(|f| f.key == decision.key) {
                return Err(ReviseError::conflict(
                    &decision.key,
                    "no fragment at this location",
                ));
            }
            groups.entry(&decision.key).or_default().push(decision);
        }

        let mut ordered: Vec<&Fragment> = fragments
            .iter()
            .filter(|f| groups.contains_key(&f.key))
            .collect();
        ordered.sort_by_key(|f| f.key.sequence_index);

        ordered
            .into_iter()
            .map(|fragment| self.replay(fragment, &groups[&fragment.key]))
            .collect()
    }

    fn replay(&self, fragment: &Fragment, group: &[&Decision]) -> ReviseResult<RevisedFragment> {
        let mut revised = RevisedFragment {
            key: fragment.key.clone(),
            original: fragment.markup.clone(),
            revised: fragment.markup.clone(),
            state: GroupState::Pristine,
            applied: 0,
            skipped: 0,
        };

        for decision in group {
            let category = match decision.outcome {
                Outcome::Accept(category) => category,
                Outcome::Reject => {
                    debug!(key = %fragment.key, entity = %decision.entity, "rejected");
                    continue;
                }
            };

            let tokens = tokenize(&revised.revised)?;
            match self.engine.locate(&tokens, &decision.entity, category) {
                Ok(span) => {
                    let attributes = Attributes::human(decision.reference(), &self.human_type);
                    revised.revised = self.engine.wrap(&tokens, &span, category, &attributes);
                    revised.state = GroupState::Revised;
                    revised.applied += 1;
                }
                Err(LocateError::AlreadyEncoded { tag }) => {
                    debug!(key = %fragment.key, entity = %decision.entity, %tag, "already encoded");
                    revised.skipped += 1;
                }
                Err(e) => {
                    warn!(key = %fragment.key, entity = %decision.entity, "skipping decision: {}", e);
                    revised.skipped += 1;
                }
            }
        }

        if revised.state == GroupState::Revised {
            check_fragment(&revised.revised).map_err(ReviseError::Malformed)?;
        }
        Ok(revised)
    }
}

//! Human decisions and the policy gate in front of the reconciler

use crate::config::{Category, NerConfig};
use crate::document::FragmentKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// What the reviewer decided for one suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "category", rename_all = "lowercase")]
pub enum Outcome {
    /// Wrap the entity with the tag of this category
    Accept(Category),
    Reject,
}

/// One row of reviewer input, in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub key: FragmentKey,
    pub entity: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

impl Decision {
    pub fn accept(key: FragmentKey, entity: impl Into<String>, category: Category) -> Self {
        Self {
            key,
            entity: entity.into(),
            outcome: Outcome::Accept(category),
            reference_id: None,
        }
    }

    pub fn reject(key: FragmentKey, entity: impl Into<String>) -> Self {
        Self {
            key,
            entity: entity.into(),
            outcome: Outcome::Reject,
            reference_id: None,
        }
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn category(&self) -> Option<Category> {
        match self.outcome {
            Outcome::Accept(category) => Some(category),
            Outcome::Reject => None,
        }
    }

    /// Reference id with surrounding whitespace removed, if non-blank
    pub fn reference(&self) -> Option<&str> {
        self.reference_id
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// An accepted decision the policy refuses to apply
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("accepted {category} `{entity}` at {key} has no reference id")]
pub struct PolicyViolation {
    pub key: FragmentKey,
    pub entity: String,
    pub category: Category,
}

/// Categories whose accepted decisions must carry a reference id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    require_reference: Vec<Category>,
}

impl Policy {
    pub fn new(require_reference: Vec<Category>) -> Self {
        Self { require_reference }
    }

    pub fn from_config(config: &NerConfig) -> Self {
        Self::new(config.require_reference.clone())
    }

    pub fn check(&self, decision: &Decision) -> Result<(), PolicyViolation> {
        match decision.outcome {
            Outcome::Accept(category)
                if self.require_reference.contains(&category) && decision.reference().is_none() =>
            {
                Err(PolicyViolation {
                    key: decision.key.clone(),
                    entity: decision.entity.clone(),
                    category,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Split decisions into those the reconciler may apply and the violations.
///
/// Arrival order is kept in both halves.
pub fn admit(
    decisions: impl IntoIterator<Item = Decision>,
    policy: &Policy,
) -> (Vec<Decision>, Vec<PolicyViolation>) {
    let mut admitted = Vec::new();
    let mut violations = Vec::new();
    for decision in decisions {
        match policy.check(&decision) {
            Ok(()) => admitted.push(decision),
            Err(violation) => {
                warn!("{}", violation);
                violations.push(violation);
            }
        }
    }
    (admitted, violations)
}

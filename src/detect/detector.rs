use super::{GazetteerRecognizer, RecognizerRegistry};
use crate::config::{Category, NerConfig};
use crate::document::{Document, Fragment, FragmentKey};
use crate::locate::{keyword_in_context, LocateError};
use crate::markup::{tokenize, MarkupResult};
use crate::suggest::{Attributes, SuggestionEngine};
use crate::table::SuggestionRow;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// A recognised entity occurrence within a fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Mention {
    pub key: FragmentKey,
    pub text: String,
    pub category: Category,
}

/// A mention that could not be turned into a suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMention {
    pub key: FragmentKey,
    pub entity: String,
    pub category: Category,
    pub reason: LocateError,
}

/// Everything a detection pass produced for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    pub document: String,
    pub rows: Vec<SuggestionRow>,
    pub skipped: Vec<SkippedMention>,
    /// Mentions dropped because they are already tagged
    pub already_encoded: usize,
}

/// Runs recognisers over each fragment and turns mentions into suggestion rows
pub struct Detector {
    registry: RecognizerRegistry,
    engine: SuggestionEngine,
    categories: Vec<Category>,
    radius: usize,
}

impl Detector {
    pub fn new(registry: RecognizerRegistry, config: &NerConfig) -> Self {
        Self {
            registry,
            engine: SuggestionEngine::from_config(config),
            categories: config.categories.clone(),
            radius: config.kwic_radius,
        }
    }

    /// Detector backed by the configured gazetteer.
    pub fn from_config(config: &NerConfig) -> Self {
        let mut registry = RecognizerRegistry::new();
        registry.register(GazetteerRecognizer::new(&config.gazetteer));
        Self::new(registry, config)
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Distinct mentions of the selected categories, in recogniser order.
    pub fn mentions(&self, fragment: &Fragment) -> Vec<Mention> {
        let mut seen = HashSet::new();
        let mut mentions = Vec::new();
        for recognizer in self.registry.recognizers_for(&self.categories) {
            for entity in recognizer.recognize(&fragment.text) {
                if !self.categories.contains(&entity.category) {
                    continue;
                }
                let mention = Mention {
                    key: fragment.key.clone(),
                    text: entity.text,
                    category: entity.category,
                };
                if seen.insert(mention.clone()) {
                    mentions.push(mention);
                }
            }
        }
        mentions
    }

    pub fn detect(&self, document: &Document) -> MarkupResult<DetectionReport> {
        let mut report = DetectionReport {
            document: document.name.clone(),
            ..DetectionReport::default()
        };

        for fragment in &document.fragments {
            let mentions = self.mentions(fragment);
            if mentions.is_empty() {
                continue;
            }
            let tokens = tokenize(&fragment.markup)?;

            for mention in mentions {
                match self.engine.locate(&tokens, &mention.text, mention.category) {
                    Ok(span) => report.rows.push(SuggestionRow {
                        accept: false,
                        entity: mention.text,
                        keyword_in_context: keyword_in_context(&tokens, &span, self.radius),
                        category: Some(mention.category),
                        reference_id: None,
                        previous_encoding: fragment.markup.clone(),
                        new_encoding: self.engine.wrap(
                            &tokens,
                            &span,
                            mention.category,
                            &Attributes::new(),
                        ),
                        location_path: fragment.key.location_path.clone(),
                        sequence_index: fragment.key.sequence_index,
                        file: document.name.clone(),
                    }),
                    Err(LocateError::AlreadyEncoded { tag }) => {
                        debug!(key = %fragment.key, entity = %mention.text, %tag, "already encoded");
                        report.already_encoded += 1;
                    }
                    Err(reason) => {
                        debug!(key = %fragment.key, entity = %mention.text, "not suggested: {}", reason);
                        report.skipped.push(SkippedMention {
                            key: mention.key,
                            entity: mention.text,
                            category: mention.category,
                            reason,
                        });
                    }
                }
            }
        }

        info!(
            document = %report.document,
            suggestions = report.rows.len(),
            skipped = report.skipped.len(),
            already_encoded = report.already_encoded,
            "detection finished"
        );
        Ok(report)
    }
}

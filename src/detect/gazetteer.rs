use super::{EntityRecognizer, RecognizedEntity};
use crate::config::Category;
use std::collections::BTreeMap;

/// Recognises names from fixed per-category lists.
///
/// Matches are case-sensitive and must fall on word boundaries. Where two
/// names overlap, the one starting first wins, then the longer one.
#[derive(Debug, Clone, Default)]
pub struct GazetteerRecognizer {
    entries: Vec<(Category, String)>,
}

impl GazetteerRecognizer {
    pub fn new(lists: &BTreeMap<Category, Vec<String>>) -> Self {
        let entries = lists
            .iter()
            .flat_map(|(category, names)| {
                names
                    .iter()
                    .map(|n| n.trim())
                    .filter(|n| !n.is_empty())
                    .map(move |n| (*category, n.to_string()))
            })
            .collect();
        Self { entries }
    }

    pub fn with(mut self, category: Category, name: impl Into<String>) -> Self {
        self.entries.push((category, name.into()));
        self
    }
}

fn on_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

impl EntityRecognizer for GazetteerRecognizer {
    fn id(&self) -> &str {
        "gazetteer"
    }

    fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.entries.iter().map(|(c, _)| *c).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    fn recognize(&self, text: &str) -> Vec<RecognizedEntity> {
        let mut hits: Vec<(usize, usize, Category)> = Vec::new();
        for (category, name) in &self.entries {
            for (start, _) in text.match_indices(name.as_str()) {
                let end = start + name.len();
                if on_boundary(text, start, end) {
                    hits.push((start, end, *category));
                }
            }
        }
        hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut found = Vec::new();
        let mut covered = 0;
        for (start, end, category) in hits {
            if start < covered {
                continue;
            }
            covered = end;
            found.push(RecognizedEntity::new(&text[start..end], category));
        }
        found
    }
}

//! Recogniser trait and registry

use crate::config::Category;
use serde::Serialize;

/// A candidate entity found in plain text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognizedEntity {
    pub text: String,
    pub category: Category,
}

impl RecognizedEntity {
    pub fn new(text: impl Into<String>, category: Category) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

/// Source of entity candidates for a fragment's plain text.
///
/// # Example
///
/// ```ignore
/// struct Capitals;
///
/// impl EntityRecognizer for Capitals {
///     fn id(&self) -> &str { "capitals" }
///     fn categories(&self) -> Vec<Category> { vec![Category::Gpe] }
///     fn recognize(&self, text: &str) -> Vec<RecognizedEntity> {
///         text.split_whitespace()
///             .filter(|w| w == &"Boston")
///             .map(|w| RecognizedEntity::new(w, Category::Gpe))
///             .collect()
///     }
/// }
/// ```
pub trait EntityRecognizer: Send + Sync {
    /// Unique identifier for this recogniser
    fn id(&self) -> &str;

    /// Categories this recogniser can produce
    fn categories(&self) -> Vec<Category>;

    /// Order among recognisers (lower runs first). Default 100.
    fn priority(&self) -> u32 {
        100
    }

    /// Candidates in `text`, in order of appearance
    fn recognize(&self, text: &str) -> Vec<RecognizedEntity>;

    fn produces(&self, category: Category) -> bool {
        self.categories().contains(&category)
    }
}

/// Registry of available recognisers
pub struct RecognizerRegistry {
    recognizers: Vec<Box<dyn EntityRecognizer>>,
}

impl Default for RecognizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RecognizerRegistry {
    pub fn new() -> Self {
        Self {
            recognizers: Vec::new(),
        }
    }

    pub fn register<R: EntityRecognizer + 'static>(&mut self, recognizer: R) {
        self.recognizers.push(Box::new(recognizer));
    }

    /// All recognisers sorted by priority
    pub fn recognizers(&self) -> Vec<&dyn EntityRecognizer> {
        let mut recognizers: Vec<_> = self.recognizers.iter().map(|r| r.as_ref()).collect();
        recognizers.sort_by_key(|r| r.priority());
        recognizers
    }

    /// Recognisers producing at least one of `categories`
    pub fn recognizers_for(&self, categories: &[Category]) -> Vec<&dyn EntityRecognizer> {
        self.recognizers()
            .into_iter()
            .filter(|r| categories.iter().any(|c| r.produces(*c)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }
}

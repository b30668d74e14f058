use crate::markup::escape_attribute;

/// Ordered attribute list for a new tag.
///
/// Empty for machine suggestions; `ref` and `type` for human-confirmed
/// edits, so the provenance of every tag stays visible in the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes for a human-confirmed edit. A blank reference is omitted.
    pub fn human(reference_id: Option<&str>, type_value: &str) -> Self {
        let mut attributes = Self::new();
        if let Some(reference) = reference_id.map(str::trim).filter(|r| !r.is_empty()) {
            attributes = attributes.with("ref", reference);
        }
        attributes.with("type", type_value)
    }

    /// Add or replace an attribute, keeping first-insertion order.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// ` key="value"` pairs, values escaped, with a leading space per pair.
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!(" {}=\"{}\"", k, escape_attribute(v)))
            .collect()
    }
}

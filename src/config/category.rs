//! Entity categories and the category -> tag table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Entity label set, named after the recogniser labels used in the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// A person's name
    Person,
    /// Non-GPE locations, mountain ranges, bodies of water
    Loc,
    /// Countries, cities, states
    Gpe,
    /// Buildings, airports, highways, bridges
    Fac,
    /// Companies, agencies, institutions
    Org,
    /// Nationalities, religious or political groups
    Norp,
    /// Named hurricanes, battles, wars, sports events
    Event,
    /// Titles of books, songs
    WorkOfArt,
    /// Named documents made into laws
    Law,
    /// Absolute or relative dates or periods
    Date,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Person,
        Category::Loc,
        Category::Gpe,
        Category::Fac,
        Category::Org,
        Category::Norp,
        Category::Event,
        Category::WorkOfArt,
        Category::Law,
        Category::Date,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Person => "PERSON",
            Category::Loc => "LOC",
            Category::Gpe => "GPE",
            Category::Fac => "FAC",
            Category::Org => "ORG",
            Category::Norp => "NORP",
            Category::Event => "EVENT",
            Category::WorkOfArt => "WORK_OF_ART",
            Category::Law => "LAW",
            Category::Date => "DATE",
        }
    }

    /// Tag used when no table overrides it
    pub fn default_tag(&self) -> &'static str {
        match self {
            Category::Person => "persRef",
            Category::Loc | Category::Gpe | Category::Fac => "placeName",
            Category::Org => "orgName",
            Category::Norp | Category::Event | Category::WorkOfArt | Category::Law => "name",
            Category::Date => "date",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Maps each category to exactly one target tag name.
///
/// Passed explicitly to every component that wraps or checks entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagTable(BTreeMap<Category, String>);

impl TagTable {
    /// Table containing only the given entries; missing categories fall
    /// back to [`Category::default_tag`].
    pub fn from_entries(entries: impl IntoIterator<Item = (Category, String)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn tag_for(&self, category: Category) -> &str {
        self.0
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.default_tag())
    }

    pub fn set(&mut self, category: Category, tag: impl Into<String>) {
        self.0.insert(category, tag.into());
    }

    /// Distinct tag names the table can produce
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Category::ALL.iter().map(|c| self.tag_for(*c)).collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::from_entries(
            Category::ALL
                .into_iter()
                .map(|c| (c, c.default_tag().to_string())),
        )
    }
}

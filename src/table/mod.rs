//! Decision table
//!
//! The CSV file passed between the detection run and the revision run. One
//! row per suggestion; the reviewer fills in `accept`, may change
//! `category`, and may add a `reference_id`.

use crate::config::Category;
use crate::document::FragmentKey;
use crate::revise::{Decision, Outcome};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TableResult<T> = Result<T, TableError>;

/// One suggestion, and after review, one decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRow {
    #[serde(serialize_with = "write_accept", deserialize_with = "read_accept")]
    pub accept: bool,
    pub entity: String,
    #[serde(default)]
    pub keyword_in_context: String,
    #[serde(
        default,
        serialize_with = "write_category",
        deserialize_with = "read_category"
    )]
    pub category: Option<Category>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub previous_encoding: String,
    #[serde(default)]
    pub new_encoding: String,
    pub location_path: String,
    pub sequence_index: usize,
    #[serde(default)]
    pub file: String,
}

impl SuggestionRow {
    pub fn key(&self) -> FragmentKey {
        FragmentKey::new(self.location_path.clone(), self.sequence_index)
    }

    /// Accepted with a category means wrap; anything else is a reject.
    pub fn to_decision(&self) -> Decision {
        let outcome = match (self.accept, self.category) {
            (true, Some(category)) => Outcome::Accept(category),
            _ => Outcome::Reject,
        };
        Decision {
            key: self.key(),
            entity: self.entity.clone(),
            outcome,
            reference_id: self.reference_id.clone(),
        }
    }
}

fn read_accept<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    ))
}

fn write_accept<S: Serializer>(accept: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *accept { "y" } else { "" })
}

fn read_category<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Category>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(serde::de::Error::custom)
}

fn write_category<S: Serializer>(
    category: &Option<Category>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(category.map(|c| c.label()).unwrap_or_default())
}

pub fn read_rows<R: Read>(reader: R) -> TableResult<Vec<SuggestionRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn write_rows<W: Write>(writer: W, rows: &[SuggestionRow]) -> TableResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_rows_from_path(path: &Path) -> TableResult<Vec<SuggestionRow>> {
    read_rows(std::fs::File::open(path)?)
}

pub fn write_rows_to_path(path: &Path, rows: &[SuggestionRow]) -> TableResult<()> {
    write_rows(std::fs::File::create(path)?, rows)
}

//! Common test utilities for nerhelper integration tests
//!
//! TEI fixtures and a configuration with a small gazetteer. Each test
//! binary uses a different subset of these helpers.

#![allow(dead_code, unused_imports)]

pub mod tei;

pub use tei::{diary, write_fixture, TeiBuilder, PROLOG};

use chrono::{DateTime, TimeZone, Utc};
use nerhelper::{Category, NerConfig};

/// Default configuration plus gazetteer entries for the diary fixture
pub fn config() -> NerConfig {
    let mut config = NerConfig::default();
    config
        .gazetteer
        .insert(Category::Person, vec!["Abel".into(), "Mrs. Adams".into()]);
    config
        .gazetteer
        .insert(Category::Gpe, vec!["Boston".into(), "Quincy".into()]);
    config
}

/// Fixed timestamp so revised output is reproducible
pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()
}

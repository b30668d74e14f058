//! Runtime configuration
//!
//! Everything that varies between projects lives here: which categories to
//! look for, the category -> tag table, which tags count as "already
//! encoded", which accepted categories require a reference identifier, how
//! fragments are selected from a document, and how provenance is signed.
//! Loaded from YAML; every field has a default.

mod category;

pub use category::{Category, TagTable};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Which elements hold the fragments to tag.
///
/// Fragments are the direct children of every `<{tag} type="{type_value}">`
/// found under the document's `<body>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub tag: String,
    #[serde(rename = "type")]
    pub type_value: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            tag: "div".into(),
            type_value: "docbody".into(),
        }
    }
}

/// Identity written into the document header on revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// `who` of the `<change>` entry (without the leading `#`)
    pub actor: String,
    /// `ident` of the `<application>` entry
    pub tool: String,
    pub version: String,
    pub note: String,
    /// `type` attribute placed on human-confirmed tags
    pub human_type: String,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            actor: "nerHelper".into(),
            tool: "nerHelper".into(),
            version: crate::VERSION.into(),
            note: "Entities added by nerHelper application.".into(),
            human_type: "human-added".into(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Categories offered to the recogniser
    pub categories: Vec<Category>,
    pub tags: TagTable,
    /// Tag names that mark an entity as already encoded
    pub banned: Vec<String>,
    /// Accepted categories that must carry a reference identifier
    pub require_reference: Vec<Category>,
    pub container: ContainerConfig,
    pub provenance: ProvenanceConfig,
    /// Characters of context on each side of a mention
    pub kwic_radius: usize,
    /// Known names per category for the gazetteer recogniser
    pub gazetteer: BTreeMap<Category, Vec<String>>,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            categories: vec![Category::Person, Category::Loc, Category::Gpe],
            tags: TagTable::default(),
            banned: vec!["persRef".into(), "date".into()],
            require_reference: vec![Category::Person],
            container: ContainerConfig::default(),
            provenance: ProvenanceConfig::default(),
            kwic_radius: 30,
            gazetteer: BTreeMap::new(),
        }
    }
}

impl NerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Load `explicit` if given, else the user config file if it exists,
    /// else the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading user config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn requires_reference(&self, category: Category) -> bool {
        self.require_reference.contains(&category)
    }
}

/// `~/.config/nerhelper/config.yaml` (platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nerhelper").join("config.yaml"))
}

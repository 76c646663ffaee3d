//! Grader configuration
//!
//! Every field is optional. A config that only adds a table looks like:
//!
//! ```json
//! {
//!   "leniency": "strict",
//!   "policy": "fuzzy",
//!   "matchScope": "column",
//!   "catalog": { "comments": ["id", "post_id", "body"] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::grading::scoring::ComparePolicy;
use crate::sql::{EngineOptions, Leniency, MatchScope};
use crate::storage::catalog::Catalog;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Catalog table '{0}' has no columns")]
    EmptyCatalogTable(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraderConfig {
    pub leniency: Leniency,
    pub policy: ComparePolicy,
    pub match_scope: MatchScope,
    /// Extra tables merged over the classroom catalog.
    pub catalog: BTreeMap<String, Vec<String>>,
}

impl GraderConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GraderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.catalog.iter().find(|(_, columns)| columns.is_empty()) {
            Some((table, _)) => Err(ConfigError::EmptyCatalogTable(table.clone())),
            None => Ok(()),
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            leniency: self.leniency,
            match_scope: self.match_scope,
        }
    }

    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::classroom();
        catalog.extend(&self.catalog);
        catalog
    }
}

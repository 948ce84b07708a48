//! Canned responses per stage.
//!
//! A table always carries a default entry, so selection is total: any label,
//! known or not, yields a non-empty reply.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ResponseTableError, StartupError};
use crate::stage::StageId;

/// Response table as written in the responses file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResponseTableConfig {
    #[serde(default)]
    pub responses: HashMap<String, Vec<String>>,
    pub default: String,
}

/// The responses file: one table per stage.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResponseTablesFile {
    pub crisis: ResponseTableConfig,
    pub flow: ResponseTableConfig,
    pub empathy: ResponseTableConfig,
}

#[derive(Debug, Clone)]
pub struct ResponseTable {
    name: String,
    responses: HashMap<String, Vec<String>>,
    default: String,
}

impl ResponseTable {
    pub fn new(
        name: impl Into<String>,
        config: ResponseTableConfig,
    ) -> Result<Self, ResponseTableError> {
        let name = name.into();
        if config.default.trim().is_empty() {
            return Err(ResponseTableError::BlankDefault { table: name });
        }
        for (label, candidates) in &config.responses {
            if candidates.is_empty() {
                return Err(ResponseTableError::EmptyCandidates {
                    table: name,
                    label: label.clone(),
                });
            }
            if candidates.iter().any(|c| c.trim().is_empty()) {
                return Err(ResponseTableError::BlankCandidate {
                    table: name,
                    label: label.clone(),
                });
            }
        }
        Ok(Self {
            name,
            responses: config.responses,
            default: config.default,
        })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.responses.contains_key(label)
    }

    pub fn candidates(&self, label: &str) -> Option<&[String]> {
        self.responses.get(label).map(Vec::as_slice)
    }

    pub fn default_response(&self) -> &str {
        &self.default
    }

    /// Picks a response for `label`, uniformly among its candidates, or the
    /// default entry when the label has none.
    pub fn select(&self, label: &str) -> &str {
        self.select_with(label, &mut rand::thread_rng())
    }

    pub fn select_with<R: Rng + ?Sized>(&self, label: &str, rng: &mut R) -> &str {
        match self.responses.get(label).and_then(|c| c.choose(rng)) {
            Some(response) => response,
            None => {
                log::debug!(
                    "No '{}' response for label '{}', using default",
                    self.name,
                    label
                );
                &self.default
            }
        }
    }
}

/// The three stage tables, addressed by stage.
#[derive(Debug, Clone)]
pub struct ResponseSelector {
    crisis: ResponseTable,
    flow: ResponseTable,
    empathy: ResponseTable,
}

impl ResponseSelector {
    pub fn new(crisis: ResponseTable, flow: ResponseTable, empathy: ResponseTable) -> Self {
        Self {
            crisis,
            flow,
            empathy,
        }
    }

    pub fn from_config(file: ResponseTablesFile) -> Result<Self, ResponseTableError> {
        Ok(Self::new(
            ResponseTable::new("crisis", file.crisis)?,
            ResponseTable::new("flow", file.flow)?,
            ResponseTable::new("empathy", file.empathy)?,
        ))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StartupError> {
        let path_ref = path.as_ref();
        let content =
            std::fs::read_to_string(path_ref).map_err(|source| StartupError::ResponsesIo {
                path: path_ref.to_path_buf(),
                source,
            })?;
        let file: ResponseTablesFile =
            serde_json::from_str(&content).map_err(|source| StartupError::ResponsesParse {
                path: path_ref.to_path_buf(),
                source,
            })?;
        let selector = Self::from_config(file)?;
        log::info!("Loaded response tables from {:?}", path_ref);
        Ok(selector)
    }

    pub fn table(&self, stage: StageId) -> &ResponseTable {
        match stage {
            StageId::Crisis => &self.crisis,
            StageId::Flow => &self.flow,
            StageId::Empathy => &self.empathy,
        }
    }

    pub fn select(&self, stage: StageId, label: &str) -> &str {
        self.table(stage).select(label)
    }
}

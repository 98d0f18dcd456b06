//! Analysis configuration.
//!
//! Loaded from TOML; every field is optional and falls back to [`Default`]:
//!
//! ```toml
//! system_size = 10
//! loss_mode = "structural"
//! candidate = "ABCDEFG"
//! present = "ABC"
//! future = "AB"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::engine::alphabet::Alphabet;
use crate::engine::errors::ExecError;
use crate::engine::loss::LossMode;

/// Number of nodes in the reference system (`A`..`J`).
pub const DEFAULT_SYSTEM_SIZE: usize = 10;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub system_size: usize,
    pub loss_mode: LossMode,
    /// Node subset to marginalize onto; the full alphabet when absent.
    pub candidate: Option<String>,
    pub present: Option<String>,
    pub future: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            system_size: DEFAULT_SYSTEM_SIZE,
            loss_mode: LossMode::default(),
            candidate: None,
            present: None,
            future: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ExecError> {
        let config: AnalysisConfig = toml::from_str(source)
            .map_err(|e| ExecError::ValidationError(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExecError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ExecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn alphabet(&self) -> Result<Alphabet, ExecError> {
        Alphabet::new(self.system_size)
    }

    /// Checks the system size and that every node string fits the alphabet.
    pub fn validate(&self) -> Result<(), ExecError> {
        let alphabet = self.alphabet()?;
        for nodes in [&self.candidate, &self.present, &self.future]
            .into_iter()
            .flatten()
        {
            alphabet.node_set(nodes)?;
        }
        Ok(())
    }

    /// Candidate node string, defaulting to the whole alphabet.
    pub fn candidate_nodes(&self) -> Result<String, ExecError> {
        match &self.candidate {
            Some(c) => Ok(c.clone()),
            None => Ok(self.alphabet()?.to_string()),
        }
    }
}

//! Boundary-level defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use concord_common::{Error, Result};

/// Defaults applied when a caller leaves a request parameter unset.
///
/// Every field is optional in the JSON form; missing fields take the
/// values of [`ConcordConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcordConfig {
    /// Total number of context tokens around a KWIC hit.
    pub max_context: usize,
    /// KWIC page size.
    pub kwic_limit: usize,
    /// Largest page size a caller may request; pages are allocated up front.
    pub max_kwic_limit: usize,
    /// Fixed seed for result set shuffling; `None` draws a fresh seed per shuffle.
    pub shuffle_seed: Option<u64>,
    /// Collocation window as `[fromw, tow]`.
    pub coll_window: [i64; 2],
    pub coll_max_items: usize,
    /// Separator between reference fields and between references and text.
    pub ref_separator: String,
}

impl Default for ConcordConfig {
    fn default() -> Self {
        ConcordConfig {
            max_context: 10,
            kwic_limit: 20,
            max_kwic_limit: 10_000,
            shuffle_seed: None,
            coll_window: [-5, 5],
            coll_max_items: 50,
            ref_separator: "\t".to_string(),
        }
    }
}

impl ConcordConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<ConcordConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        let config = Self::from_json(&text)
            .map_err(|e| Error::invalid_format(path.display().to_string(), e.to_string()))?;
        tracing::debug!(config = %path.display(), "boundary configuration loaded");
        Ok(config)
    }

    pub fn from_json(text: &str) -> std::result::Result<ConcordConfig, serde_json::Error> {
        serde_json::from_str(text)
    }
}

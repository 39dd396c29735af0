//! Ttsizes command implementation

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::commands::{open_corpus, print_json};

pub fn run(corpus: &Path, structure: &str, attr: &str) -> Result<()> {
    let corpus = open_corpus(corpus)?;
    let sizes = corpus
        .attr_value_sizes(structure, attr)
        .with_context(|| format!("Failed to aggregate {structure}.{attr}"))?;
    let report: BTreeMap<&str, u64> = sizes.iter().collect();
    print_json(&report)
}

//! Subc command implementation

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use concord::{Corpus, Subcorpus};

use crate::commands::{open_corpus, print_json};

#[derive(Serialize)]
struct SubcSummary {
    name: String,
    path: String,
    ranges: usize,
    search_size: u64,
}

pub fn run(corpus: &Path, structure: &str, attr: &str, values: &[String], output: &Path) -> Result<()> {
    let corpus = open_corpus(corpus)?;
    let subc = create(&corpus, structure, attr, values, output)?;
    print_json(&SubcSummary {
        name: subc.name().to_string(),
        path: output.display().to_string(),
        ranges: subc.ranges().len(),
        search_size: subc.search_size(),
    })
}

fn create(
    corpus: &Corpus,
    structure: &str,
    attr: &str,
    values: &[String],
    output: &Path,
) -> Result<Subcorpus> {
    let name = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let values: Vec<&str> = values.iter().map(String::as_str).collect();
    let subc = Subcorpus::from_struct_attr(corpus.reader(), name, structure, attr, &values)?;
    if subc.is_empty() {
        tracing::warn!(structure, attr, "no instance matches; the sub-corpus is empty");
    }
    subc.save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(subc)
}

//! Region command implementation

use std::path::Path;

use anyhow::Result;

use crate::commands::{open_corpus, print_json};

pub fn run(corpus: &Path, from: u64, to: u64, attrs: &[String], structs: &[String]) -> Result<()> {
    let corpus = open_corpus(corpus)?;
    let tokens = corpus.region(from, to, attrs, structs)?;
    print_json(&tokens)
}

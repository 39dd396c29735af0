//! Command implementations for concord-cmd.
//!
//! Every command builds a serializable report and prints it to stdout as
//! pretty JSON.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use concord::{Concordance, Corpus, Subcorpus};

use crate::QueryArgs;

pub mod colls;
pub mod conc;
pub mod freqs;
pub mod info;
pub mod kwic;
pub mod region;
pub mod subc;
pub mod ttsizes;

pub fn open_corpus(path: &Path) -> Result<Corpus> {
    Corpus::open(path).with_context(|| format!("Failed to open corpus {}", path.display()))
}

pub fn open_subcorpus(path: Option<&Path>) -> Result<Option<Arc<Subcorpus>>> {
    path.map(|p| {
        Subcorpus::open(p)
            .map(Arc::new)
            .with_context(|| format!("Failed to read sub-corpus {}", p.display()))
    })
    .transpose()
}

/// Opens the corpus and evaluates the query of `args`.
pub fn concordance(args: &QueryArgs) -> Result<Concordance> {
    let corpus = open_corpus(&args.corpus)?;
    let subcorpus = open_subcorpus(args.subc.as_deref())?;
    Concordance::new(&corpus, &args.query, subcorpus)
        .with_context(|| format!("Failed to evaluate query {}", args.query))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

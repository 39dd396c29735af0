//! Freqs command implementation

use anyhow::{Context, Result};
use serde::Serialize;

use concord::freqs::freq_dist;

use crate::QueryArgs;
use crate::commands::{concordance, print_json};

#[derive(Serialize)]
struct FreqRow {
    value: String,
    freq: u64,
    norm: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ipm: Option<f64>,
}

#[derive(Serialize)]
struct FreqReport {
    conc_size: u64,
    corpus_size: u64,
    search_size: u64,
    rows: Vec<FreqRow>,
}

pub fn run(args: &QueryArgs, fcrit: &str, flimit: u64) -> Result<()> {
    let conc = concordance(args)?;
    let freqs = freq_dist(&conc, fcrit, flimit)
        .with_context(|| format!("Failed to compute frequencies by '{fcrit}'"))?;
    let rows = (0..freqs.len())
        .map(|i| FreqRow {
            value: freqs.words[i].clone(),
            freq: freqs.freqs[i],
            norm: freqs.norms[i],
            ipm: freqs.ipm(i),
        })
        .collect();
    print_json(&FreqReport {
        conc_size: freqs.conc_size,
        corpus_size: freqs.corpus_size,
        search_size: freqs.search_size,
        rows,
    })
}

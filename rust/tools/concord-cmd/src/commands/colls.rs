//! Colls command implementation

use anyhow::{Context, Result};

use concord::colls::{self, CollArgs, CollMeasure};
use concord::{Collocations, ConcordConfig, Concordance};

use crate::QueryArgs;
use crate::commands::{concordance, print_json};

pub struct CollsOpts {
    pub attr: String,
    pub measure: String,
    pub sort: Option<String>,
    pub min_freq: u64,
    pub min_bgr: u64,
    pub from_w: Option<i64>,
    pub to_w: Option<i64>,
    pub max_items: Option<usize>,
}

pub fn run(args: &QueryArgs, opts: &CollsOpts, config: &ConcordConfig) -> Result<()> {
    let conc = concordance(args)?;
    print_json(&compute(&conc, opts, config)?)
}

fn compute(conc: &Concordance, opts: &CollsOpts, config: &ConcordConfig) -> Result<Collocations> {
    let measure: CollMeasure = opts.measure.parse()?;
    let sort = match &opts.sort {
        Some(s) => s.parse()?,
        None => measure,
    };
    let mut args = CollArgs::new(opts.attr.as_str(), config);
    args.measure = measure;
    args.sort = sort;
    args.min_freq = opts.min_freq;
    args.min_bgr = opts.min_bgr;
    if let Some(w) = opts.from_w {
        args.from_w = w;
    }
    if let Some(w) = opts.to_w {
        args.to_w = w;
    }
    if let Some(n) = opts.max_items {
        args.max_items = n;
    }
    colls::collocations(conc, &args).with_context(|| format!("Failed to compute collocations of {}", opts.attr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord::Corpus;
    use concord_testkit::TestCorpus;

    fn opts() -> CollsOpts {
        CollsOpts {
            attr: "word".into(),
            measure: "absFreq".into(),
            sort: None,
            min_freq: 1,
            min_bgr: 1,
            from_w: Some(-1),
            to_w: Some(-1),
            max_items: Some(2),
        }
    }

    #[test]
    fn test_compute() {
        let tc = TestCorpus::sample().unwrap();
        let corpus = Corpus::open(tc.registry_path()).unwrap();
        let conc = Concordance::new(&corpus, r#"[tag="NNS?"]"#, None).unwrap();
        let result = compute(&conc, &opts(), &ConcordConfig::default()).unwrap();
        let words: Vec<&str> = result.items.iter().map(|i| i.word.as_str()).collect();
        assert_eq!(words, vec!["A", "Big"]);

        let mut bad = opts();
        bad.measure = "q".into();
        assert!(compute(&conc, &bad, &ConcordConfig::default()).is_err());
    }
}

use std::sync::Arc;

use concord::colls::{self, CollArgs, CollMeasure};
use concord::freqs::freq_dist;
use concord::kwic::{KwicArgs, conc_examples};
use concord::{ConcordConfig, Concordance, Corpus, Subcorpus};
use concord_common::ErrorCode;
use concord_testkit::{TestCorpus, data_gen};

fn needle_query() -> String {
    format!(r#"[word="{}"]"#, data_gen::NEEDLE)
}

#[test]
fn test_kwic_page_is_padded_to_limit() -> anyhow::Result<()> {
    let tc = data_gen::corpus_with_hits(1_000_000, 10)?;
    let corpus = Corpus::open(tc.registry_path())?;
    assert_eq!(corpus.size(), 1_000_000);

    let mut args = KwicArgs::new(needle_query(), &ConcordConfig::default());
    args.limit = 20;
    args.from_line = 0;
    let page = conc_examples(&corpus, None, &args)?;
    assert_eq!(page.conc_size, 10);
    assert_eq!(page.lines.len(), 20);
    assert!(page.lines[..10].iter().all(|l| l.contains(data_gen::NEEDLE)));
    assert!(page.lines[10..].iter().all(String::is_empty));

    args.from_line = 15;
    let err = conc_examples(&corpus, None, &args).unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfRange);
    assert_ne!(err.code(), ErrorCode::Generic);
    Ok(())
}

#[test]
fn test_colls_capped_by_max_items() -> anyhow::Result<()> {
    let tc = data_gen::node_with_collocates(50)?;
    let corpus = Corpus::open(tc.registry_path())?;
    let conc = Concordance::new(&corpus, r#"[word="node"]"#, None)?;

    let mut args = CollArgs::new("word", &ConcordConfig::default());
    args.from_w = 1;
    args.to_w = 1;
    args.max_items = 100;
    assert_eq!(colls::collocations(&conc, &args)?.items.len(), 50);

    args.max_items = 5;
    let result = colls::collocations(&conc, &args)?;
    let words: Vec<&str> = result.items.iter().map(|i| i.word.as_str()).collect();
    assert_eq!(words, vec!["c0", "c1", "c10", "c11", "c12"]);
    assert_eq!(result.conc_size, 50);
    Ok(())
}

#[test]
fn test_sort_function_orders_items() -> anyhow::Result<()> {
    let mut b = TestCorpus::builder();
    // "big" follows the node twice but is frequent elsewhere, "rare" once and only there
    b.sentence("node big node big node rare big big big big");
    let tc = b.build()?;
    let corpus = Corpus::open(tc.registry_path())?;
    let conc = Concordance::new(&corpus, r#"[word="node"]"#, None)?;

    let mut args = CollArgs::new("word", &ConcordConfig::default());
    args.from_w = 1;
    args.to_w = 1;
    args.sort = CollMeasure::AbsFreq;
    let by_freq = colls::collocations(&conc, &args)?;
    assert_eq!(by_freq.items[0].word, "big");

    args.sort = CollMeasure::MutualInfo;
    args.measure = CollMeasure::MutualInfo;
    let by_mi = colls::collocations(&conc, &args)?;
    assert_eq!(by_mi.items[0].word, "rare");
    assert!(by_mi.items[0].score > by_mi.items[1].score);
    Ok(())
}

#[test]
fn test_normalization_regimes() -> anyhow::Result<()> {
    let tc = data_gen::corpus_with_hits(30_000, 30)?;
    let corpus = Corpus::open(tc.registry_path())?;
    let query = needle_query();

    let full = Concordance::new(&corpus, &query, None)?;
    let full_freqs = freq_dist(&full, "word 0", 1)?;
    assert_eq!(full_freqs.search_size, 30_000);
    assert_eq!(full_freqs.norms, vec![30]);

    let subc = Subcorpus::from_struct_attr(corpus.reader(), "doc0", "doc", "id", &["doc0"])?;
    assert_eq!(subc.search_size(), 10_000);
    let restricted = Concordance::new(&corpus, &query, Some(Arc::new(subc)))?;
    let sub_freqs = freq_dist(&restricted, "word 0", 1)?;
    assert_eq!(sub_freqs.search_size, 10_000);
    assert_eq!(sub_freqs.corpus_size, 30_000);
    assert_eq!(sub_freqs.freqs, vec![10]);
    assert_eq!(sub_freqs.norms, vec![10]);

    let args = CollArgs::new("word", &ConcordConfig::default());
    assert_eq!(colls::collocations(&full, &args)?.search_size, 30_000);
    assert_eq!(colls::collocations(&restricted, &args)?.search_size, 10_000);
    Ok(())
}

#[test]
fn test_reopening_is_idempotent() -> anyhow::Result<()> {
    let tc = data_gen::corpus_with_hits(5_000, 40)?;
    let first = Corpus::open(tc.registry_path())?;
    let second = Corpus::open(tc.registry_path())?;

    let a = Concordance::new(&first, r#"[tag="F"] [word="needle"]"#, None)?;
    let b = Concordance::new(&second, r#"[tag="F"] [word="needle"]"#, None)?;
    assert_eq!(a.size(), b.size());
    assert_eq!(a.arf(), b.arf());

    let fa = freq_dist(&a, "word 0", 1)?;
    let fb = freq_dist(&b, "word 0", 1)?;
    assert_eq!(fa, fb);
    assert_eq!(fa.words.len(), fa.freqs.len());
    assert_eq!(fa.words.len(), fa.norms.len());
    assert!(fa.freqs.windows(2).all(|w| w[0] >= w[1]));
    Ok(())
}

#[test]
fn test_subcorpus_file_roundtrip() -> anyhow::Result<()> {
    let tc = data_gen::corpus_with_hits(20_000, 20)?;
    let corpus = Corpus::open(tc.registry_path())?;
    let subc = Subcorpus::from_struct_attr(corpus.reader(), "second", "doc", "id", &["doc1"])?;
    let path = tc.dir().join("second.subc");
    subc.save(&path)?;

    let reopened = Arc::new(Subcorpus::open(&path)?);
    let conc = Concordance::new(&corpus, &needle_query(), Some(reopened))?;
    let size = conc.conc_size();
    assert_eq!(size.conc_size, 10);
    assert_eq!(size.search_size, 10_000);
    assert!((size.arf - 10.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_unmatched_restriction_has_no_hits() -> anyhow::Result<()> {
    let tc = data_gen::corpus_with_hits(30_000, 30)?;
    let corpus = Corpus::open(tc.registry_path())?;
    let query = needle_query();

    let none = Subcorpus::from_struct_attr(corpus.reader(), "none", "doc", "id", &["doc9"])?;
    assert!(none.is_empty());
    let conc = Concordance::new(&corpus, &query, Some(Arc::new(none)))?;
    let size = conc.conc_size();
    assert_eq!(size.conc_size, 0);
    assert_eq!(size.search_size, 0);
    assert_eq!(size.corpus_size, 30_000);
    assert!(freq_dist(&conc, "word 0", 1)?.words.is_empty());

    let path = tc.dir().join("comments.subc");
    std::fs::write(&path, "# nothing selected

")?;
    let conc = Concordance::new(&corpus, &query, Some(Arc::new(Subcorpus::open(&path)?)))?;
    assert_eq!(conc.size(), 0);
    assert_eq!(conc.search_size(), 0);
    Ok(())
}

#[test]
fn test_value_sizes() -> anyhow::Result<()> {
    let tc = data_gen::corpus_with_hits(25_000, 1)?;
    let corpus = Corpus::open(tc.registry_path())?;
    let sizes = corpus.attr_value_sizes("doc", "id")?;
    assert_eq!(sizes.len(), 3);
    assert_eq!(sizes.get("doc0"), Some(10_000));
    assert_eq!(sizes.get("doc2"), Some(5_000));
    assert_eq!(sizes.total(), 25_000);
    Ok(())
}

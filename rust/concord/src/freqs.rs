//! Frequency distributions over result sets.
//!
//! A criterion is a whitespace separated list of `attr[/flags] ctx` items:
//!
//! - `attr` is a positional attribute (`lemma`) or a structural attribute
//!   (`doc.genre`);
//! - flag `i` folds case;
//! - `ctx` is an offset `N` or an offset range `N~M`, optionally followed by
//!   an anchor: `<K` counts from the first token of item `K`, `>K` from its
//!   last token. Item `0` is the hit itself, `K > 0` the collocate matched by
//!   collocation filter `K`. Without an anchor offsets count from the hit
//!   start.
//!
//! `lemma/i 0~0>0 tag -1<0` groups hits by the lower-cased lemma of their
//! last token and the tag of the token preceding them. Values of a multi-token
//! item are space-joined and items are tab-joined.

use std::str::FromStr;

use ahash::AHashMap;
use serde::Serialize;

use concord_common::{Error, Result};
use concord_engine::collation::Folding;
use concord_engine::{CorpusReader, Pos, PosAttrReader, StructAttrReader, StructReader, ranges};

use crate::collections::{IntVector, StrVector};
use crate::conc::{Concordance, Hit};
use crate::subcorp::Subcorpus;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Pos(String),
    Struct { structure: String, attr: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Anchor {
    First(usize),
    Last(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CritItem {
    source: Source,
    folding: Folding,
    from: i64,
    to: i64,
    anchor: Anchor,
}

/// A parsed frequency criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqCriterion {
    items: Vec<CritItem>,
}

impl FromStr for FreqCriterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() || parts.len() % 2 != 0 {
            return Err(Error::invalid_arg(
                "fcrit",
                format!("expected 'attr ctx' pairs, got '{s}'"),
            ));
        }
        let items = parts
            .chunks(2)
            .map(|pair| parse_item(pair[0], pair[1]))
            .collect::<Result<_>>()?;
        Ok(FreqCriterion { items })
    }
}

fn parse_item(attr: &str, ctx: &str) -> Result<CritItem> {
    let (name, flags) = attr.split_once('/').unwrap_or((attr, ""));
    let mut folding = Folding::Preserve;
    for flag in flags.chars() {
        match flag {
            'i' => folding = Folding::Insensitive,
            other => {
                return Err(Error::invalid_arg(
                    "fcrit",
                    format!("unsupported flag '{other}' in '{attr}'"),
                ));
            }
        }
    }
    let source = match name.split_once('.') {
        Some((structure, attr)) => Source::Struct {
            structure: structure.to_string(),
            attr: attr.to_string(),
        },
        None => Source::Pos(name.to_string()),
    };

    let bad_ctx = || Error::invalid_arg("fcrit", format!("malformed context '{ctx}'"));
    let (offsets, anchor) = match ctx.find(['<', '>']) {
        Some(idx) => {
            let item: usize = ctx[idx + 1..].parse().map_err(|_| bad_ctx())?;
            let anchor = if ctx.as_bytes()[idx] == b'<' {
                Anchor::First(item)
            } else {
                Anchor::Last(item)
            };
            (&ctx[..idx], anchor)
        }
        None => (ctx, Anchor::First(0)),
    };
    let (from, to) = match offsets.split_once('~') {
        Some((a, b)) => (a, b),
        None => (offsets, offsets),
    };
    let from: i64 = from.parse().map_err(|_| bad_ctx())?;
    let to: i64 = to.parse().map_err(|_| bad_ctx())?;
    if from > to {
        return Err(bad_ctx());
    }
    Ok(CritItem {
        source,
        folding,
        from,
        to,
        anchor,
    })
}

/// A frequency distribution: three parallel sequences plus the sizes used
/// for normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Freqs {
    pub words: Vec<String>,
    pub freqs: Vec<u64>,
    /// Occurrences of each value in the searched space. Only single-token,
    /// single-item criteria have one; others report 0.
    pub norms: Vec<u64>,
    pub conc_size: u64,
    pub corpus_size: u64,
    pub search_size: u64,
}

impl Freqs {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Instances per million of the searched space carrying the value.
    pub fn ipm(&self, index: usize) -> Option<f64> {
        let freq = *self.freqs.get(index)?;
        let norm = *self.norms.get(index)?;
        (norm > 0).then(|| freq as f64 / norm as f64 * 1_000_000.0)
    }

    pub fn into_vectors(self) -> (StrVector, IntVector, IntVector) {
        (self.words.into(), self.freqs.into(), self.norms.into())
    }
}

enum Resolved<'c> {
    Pos(&'c dyn PosAttrReader),
    Struct(&'c dyn StructReader, &'c dyn StructAttrReader),
}

impl<'c> Resolved<'c> {
    fn new(reader: &'c dyn CorpusReader, source: &Source) -> Result<Resolved<'c>> {
        Ok(match source {
            Source::Pos(name) => Resolved::Pos(reader.attr(name)?),
            Source::Struct { structure, attr } => {
                let st = reader.structure(structure)?;
                Resolved::Struct(st, st.attr(attr)?)
            }
        })
    }

    /// Value id and string at `pos`; positions outside any instance of a
    /// structure map to `u32::MAX` and an empty string.
    fn value_at(&self, pos: Pos) -> (u32, &'c str) {
        match *self {
            Resolved::Pos(attr) => match attr.pos2id(pos) {
                Some(id) => (id, attr.id2str(id)),
                None => (u32::MAX, ""),
            },
            Resolved::Struct(st, attr) => match st.num_at_pos(pos).and_then(|n| attr.num2id(n)) {
                Some(id) => (id, attr.id2str(id)),
                None => (u32::MAX, ""),
            },
        }
    }

    fn id_range(&self) -> u32 {
        match *self {
            Resolved::Pos(attr) => attr.id_range(),
            Resolved::Struct(_, attr) => attr.id_range(),
        }
    }

    fn id2str(&self, id: u32) -> &'c str {
        match *self {
            Resolved::Pos(attr) => attr.id2str(id),
            Resolved::Struct(_, attr) => attr.id2str(id),
        }
    }

    /// Positions of the searched space carrying value `id`.
    fn occurrences(&self, id: u32, subcorpus: Option<&Subcorpus>) -> u64 {
        match *self {
            Resolved::Pos(attr) => match subcorpus {
                Some(subc) => subc.count_in(attr.id2poss(id)),
                None => attr.freq(id),
            },
            Resolved::Struct(st, attr) => attr
                .id2nums(id)
                .iter()
                .filter_map(|&num| st.range(num))
                .map(|r| match subcorpus {
                    Some(subc) => subc.overlap(r),
                    None => r.end - r.start,
                })
                .sum(),
        }
    }
}

struct Group {
    count: u64,
    ids: Vec<u32>,
}

/// Computes the frequency distribution of `conc` by `criterion`, keeping
/// values occurring at least `flimit` times.
///
/// Values are ordered by descending count; ties follow the value ids of the
/// criterion items (the engine's enumeration order).
pub fn freq_dist(conc: &Concordance, criterion: &str, flimit: u64) -> Result<Freqs> {
    let crit: FreqCriterion = criterion.parse()?;
    let reader = conc.corpus().reader();
    let resolved = crit
        .items
        .iter()
        .map(|item| Resolved::new(reader, &item.source))
        .collect::<Result<Vec<_>>>()?;
    let size = reader.size();

    let mut groups: AHashMap<String, Group> = AHashMap::new();
    'hits: for hit in conc.hits() {
        let mut key = String::new();
        let mut ids = Vec::with_capacity(crit.items.len());
        for (i, (item, attr)) in crit.items.iter().zip(&resolved).enumerate() {
            let Some(anchor) = anchor_pos(hit, item.anchor) else {
                continue 'hits;
            };
            if i > 0 {
                key.push('\t');
            }
            let mut first_token = true;
            for pos in ranges::offset_window(anchor, item.from, item.to, size) {
                let (id, value) = attr.value_at(pos);
                if !first_token {
                    key.push(' ');
                }
                first_token = false;
                key.push_str(&item.folding.apply(value));
                ids.push(id);
            }
        }
        match groups.get_mut(&key) {
            Some(group) => {
                group.count += 1;
                if ids < group.ids {
                    group.ids = ids;
                }
            }
            None => {
                groups.insert(key, Group { count: 1, ids });
            }
        }
    }

    let mut rows: Vec<(String, Group)> = groups
        .into_iter()
        .filter(|(_, g)| g.count >= flimit)
        .collect();
    rows.sort_by(|a, b| {
        b.1.count
            .cmp(&a.1.count)
            .then_with(|| a.1.ids.cmp(&b.1.ids))
            .then_with(|| a.0.cmp(&b.0))
    });

    let norm_source = match crit.items.as_slice() {
        [item] if item.from == item.to => Some((item, &resolved[0])),
        _ => None,
    };
    let folded_ids = match norm_source {
        Some((item, attr)) if item.folding != Folding::Preserve => {
            let mut by_value: AHashMap<String, Vec<u32>> = AHashMap::new();
            for id in 0..attr.id_range() {
                by_value
                    .entry(item.folding.apply(attr.id2str(id)).into_owned())
                    .or_default()
                    .push(id);
            }
            Some(by_value)
        }
        _ => None,
    };

    let subcorpus = conc.subcorpus();
    let mut freqs = Freqs {
        words: Vec::with_capacity(rows.len()),
        freqs: Vec::with_capacity(rows.len()),
        norms: Vec::with_capacity(rows.len()),
        conc_size: conc.size(),
        corpus_size: conc.corpus_size(),
        search_size: conc.search_size(),
    };
    for (word, group) in rows {
        let norm = match (norm_source, &folded_ids) {
            (Some((_, attr)), Some(by_value)) => by_value
                .get(&word)
                .map(|ids| ids.iter().map(|&id| attr.occurrences(id, subcorpus)).sum::<u64>())
                .unwrap_or(0),
            (Some((_, attr)), None) => match group.ids.first() {
                Some(&id) if id != u32::MAX => attr.occurrences(id, subcorpus),
                _ => 0,
            },
            _ => 0,
        };
        freqs.words.push(word);
        freqs.freqs.push(group.count);
        freqs.norms.push(norm);
    }
    tracing::debug!(
        criterion,
        values = freqs.len(),
        conc_size = freqs.conc_size,
        "frequency distribution computed"
    );
    Ok(freqs)
}

fn anchor_pos(hit: &Hit, anchor: Anchor) -> Option<Pos> {
    let range = match anchor {
        Anchor::First(0) | Anchor::Last(0) => hit.range(),
        Anchor::First(n) | Anchor::Last(n) => hit.coll(n)?,
    };
    match anchor {
        Anchor::First(_) => Some(range.start),
        Anchor::Last(_) => range.end.checked_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::corpus::Corpus;
    use concord_testkit::TestCorpus;

    fn open() -> (TestCorpus, Corpus) {
        let tc = TestCorpus::sample().unwrap();
        let corp = Corpus::open(tc.registry_path()).unwrap();
        (tc, corp)
    }

    #[test]
    fn test_parse_criterion() {
        let crit: FreqCriterion = "lemma/i 0~0>0 doc.genre -1<2".parse().unwrap();
        assert_eq!(crit.items.len(), 2);
        assert_eq!(crit.items[0].folding, Folding::Insensitive);
        assert_eq!(crit.items[0].anchor, Anchor::Last(0));
        assert_eq!(
            crit.items[1].source,
            Source::Struct {
                structure: "doc".into(),
                attr: "genre".into()
            }
        );
        assert_eq!((crit.items[1].from, crit.items[1].to), (-1, -1));
        assert_eq!(crit.items[1].anchor, Anchor::First(2));

        for bad in ["", "word", "word x", "word 2~1", "word/q 0", "word 0<x"] {
            assert!(bad.parse::<FreqCriterion>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_word_distribution() {
        let (_tc, corp) = open();
        let conc = Concordance::new(&corp, r#"[tag="NNS?"]"#, None).unwrap();
        let freqs = freq_dist(&conc, "word 0", 1).unwrap();
        assert_eq!(freqs.words, vec!["cat", "mat", "dogs"]);
        assert_eq!(freqs.freqs, vec![2, 1, 1]);
        assert_eq!(freqs.norms, vec![2, 1, 1]);
        assert_eq!(freqs.conc_size, 4);
        assert_eq!(freqs.search_size, 14);
        assert_eq!(freqs.ipm(0), Some(1_000_000.0));
    }

    #[test]
    fn test_left_context_and_floor() {
        let (_tc, corp) = open();
        let conc = Concordance::new(&corp, r#"[tag="NNS?"]"#, None).unwrap();
        let freqs = freq_dist(&conc, "tag -1", 1).unwrap();
        assert_eq!(freqs.words, vec!["DT", "JJ"]);
        assert_eq!(freqs.freqs, vec![3, 1]);
        assert_eq!(freqs.norms, vec![3, 1]);

        let freqs = freq_dist(&conc, "tag -1", 2).unwrap();
        assert_eq!(freqs.words, vec!["DT"]);
    }

    #[test]
    fn test_offsets_beyond_corpus() {
        let (_tc, corp) = open();
        let conc = Concordance::new(&corp, r#"[lemma="cat"]"#, None).unwrap();
        let freqs = freq_dist(&conc, "word 9223372036854775807", 1).unwrap();
        assert_eq!(freqs.words, vec![""]);
        assert_eq!(freqs.freqs, vec![2]);
        assert_eq!(freqs.norms, vec![0]);

        let whole = "The cat sat on the mat . A cat barked . Big dogs .";
        for crit in [
            "word -1000000000~1000000000",
            "word -9223372036854775808~9223372036854775807>0",
        ] {
            let freqs = freq_dist(&conc, crit, 1).unwrap();
            assert_eq!(freqs.words, vec![whole], "{crit}");
            assert_eq!(freqs.freqs, vec![2]);
        }
    }

    #[test]
    fn test_case_folding() {
        let (_tc, corp) = open();
        let conc = Concordance::new(&corp, r#"[lemma="cat"]"#, None).unwrap();
        let freqs = freq_dist(&conc, "word/i -1", 1).unwrap();
        assert_eq!(freqs.words, vec!["the", "a"]);
        assert_eq!(freqs.norms, vec![2, 1]);
    }

    #[test]
    fn test_struct_attr_and_multi_item() {
        let (_tc, corp) = open();
        let conc = Concordance::new(&corp, "[]", None).unwrap();
        let freqs = freq_dist(&conc, "doc.genre 0", 1).unwrap();
        assert_eq!(freqs.words, vec!["news", "fiction"]);
        assert_eq!(freqs.freqs, vec![7, 7]);
        assert_eq!(freqs.norms, vec![7, 7]);

        let conc = Concordance::new(&corp, r#"[lemma="cat"]"#, None).unwrap();
        let freqs = freq_dist(&conc, "word 0 tag 1", 1).unwrap();
        assert_eq!(freqs.words, vec!["cat\tVBD"]);
        assert_eq!(freqs.freqs, vec![2]);
        assert_eq!(freqs.norms, vec![0]);

        let freqs = freq_dist(&conc, "word 0~1", 1).unwrap();
        assert_eq!(freqs.words, vec!["cat sat", "cat barked"]);
        assert_eq!(freqs.ipm(0), None);
    }

    #[test]
    fn test_coll_anchor() {
        let (_tc, corp) = open();
        let mut conc = Concordance::new(&corp, r#"[tag="NN"]"#, None).unwrap();
        conc.add_coll_filter(r#"[tag="DT"]"#, -2, -1, true).unwrap();
        let freqs = freq_dist(&conc, "lemma 0<1", 1).unwrap();
        assert_eq!(freqs.words, vec!["the", "a"]);
        assert_eq!(freqs.freqs, vec![2, 1]);
    }

    #[test]
    fn test_subcorpus_norms() {
        let (_tc, corp) = open();
        let full = Concordance::new(&corp, r#"[lemma="cat"]"#, None).unwrap();
        let freqs = freq_dist(&full, "word 0", 1).unwrap();
        assert_eq!((freqs.norms[0], freqs.search_size), (2, 14));

        let subc = Arc::new(Subcorpus::from_ranges("fiction", vec![7..14]));
        let restricted = Concordance::new(&corp, r#"[lemma="cat"]"#, Some(subc)).unwrap();
        let freqs = freq_dist(&restricted, "word 0", 1).unwrap();
        assert_eq!(freqs.freqs, vec![1]);
        assert_eq!((freqs.norms[0], freqs.search_size), (1, 7));
        assert_eq!(freqs.corpus_size, 14);
    }

    #[test]
    fn test_unknown_attribute() {
        let (_tc, corp) = open();
        let conc = Concordance::new(&corp, "[]", None).unwrap();
        assert!(freq_dist(&conc, "pos 0", 1).is_err());
        assert!(freq_dist(&conc, "doc.title 0", 1).is_err());
    }
}

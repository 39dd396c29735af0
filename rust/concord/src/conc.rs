//! Result sets (concordances).

use std::ops::Range;
use std::sync::{Arc, OnceLock};

use serde::Serialize;

use concord_common::{Error, Result};
use concord_engine::Pos;

use crate::corpus::Corpus;
use crate::subcorp::Subcorpus;

/// One visible hit with the collocate ranges matched by positive filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    range: Range<Pos>,
    colls: Vec<(usize, Range<Pos>)>,
}

impl Hit {
    fn new(range: Range<Pos>) -> Hit {
        Hit {
            range,
            colls: Vec::new(),
        }
    }

    pub fn range(&self) -> Range<Pos> {
        self.range.clone()
    }

    pub fn start(&self) -> Pos {
        self.range.start
    }

    pub fn end(&self) -> Pos {
        self.range.end
    }

    /// Collocate range matched by the positive filter `number`.
    pub fn coll(&self, number: usize) -> Option<Range<Pos>> {
        self.colls
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, r)| r.clone())
    }

    pub fn colls(&self) -> impl Iterator<Item = Range<Pos>> + '_ {
        self.colls.iter().map(|(_, r)| r.clone())
    }
}

/// A collocation filter layered on a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollFilter {
    pub number: usize,
    pub query: String,
    pub lctx: i64,
    pub rctx: i64,
    pub positive: bool,
    pub removed: bool,
}

/// Sizes reported together with a result set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConcSize {
    pub conc_size: u64,
    pub corpus_size: u64,
    /// Size of the searched space: the sub-corpus size when one is active,
    /// the corpus size otherwise.
    pub search_size: u64,
    pub arf: f64,
}

/// Hits of one query over a corpus, optionally restricted to a sub-corpus.
///
/// The full hit list is materialized on construction. Collocation filters
/// narrow the visible hits; negating or removing a filter recomputes them
/// from the unfiltered hits, then re-applies the current shuffle.
pub struct Concordance {
    corpus: Corpus,
    subcorpus: Option<Arc<Subcorpus>>,
    query: String,
    base: Vec<Range<Pos>>,
    filters: Vec<CollFilter>,
    coll_hits: Vec<Vec<Range<Pos>>>,
    hits: Vec<Hit>,
    shuffle_seed: Option<u64>,
    arf: OnceLock<f64>,
}

impl Concordance {
    /// Evaluates `query` and synchronizes the result set.
    pub fn new(
        corpus: &Corpus,
        query: &str,
        subcorpus: Option<Arc<Subcorpus>>,
    ) -> Result<Concordance> {
        if let Some(subc) = &subcorpus {
            subc.check_bounds(corpus.size())?;
        }
        let base = corpus.evaluate(query, subcorpus.as_deref())?;
        tracing::debug!(
            corpus = corpus.name(),
            query,
            subcorpus = subcorpus.as_ref().map(|s| s.name()),
            hits = base.len(),
            "concordance created"
        );
        let hits = base.iter().cloned().map(Hit::new).collect();
        Ok(Concordance {
            corpus: corpus.clone(),
            subcorpus,
            query: query.to_string(),
            base,
            filters: Vec::new(),
            coll_hits: Vec::new(),
            hits,
            shuffle_seed: None,
            arf: OnceLock::new(),
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn subcorpus(&self) -> Option<&Subcorpus> {
        self.subcorpus.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of visible hits.
    pub fn size(&self) -> u64 {
        self.hits.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn corpus_size(&self) -> u64 {
        self.corpus.size()
    }

    pub fn search_size(&self) -> u64 {
        match &self.subcorpus {
            Some(subc) => subc.search_size(),
            None => self.corpus.size(),
        }
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn hit(&self, index: usize) -> Option<&Hit> {
        self.hits.get(index)
    }

    /// Randomizes the order of the visible hits; returns the seed used.
    pub fn shuffle(&mut self, seed: Option<u64>) -> u64 {
        let seed = seed.unwrap_or_else(|| fastrand::u64(..));
        self.shuffle_seed = Some(seed);
        shuffle_hits(&mut self.hits, seed);
        seed
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle_seed.is_some()
    }

    /// Average reduced frequency of the visible hits, computed on first use.
    ///
    /// With a sub-corpus the hit positions are measured within the
    /// sub-corpus' own contiguous numbering.
    pub fn arf(&self) -> f64 {
        *self.arf.get_or_init(|| {
            let mut starts: Vec<Pos> = match &self.subcorpus {
                Some(subc) => self
                    .hits
                    .iter()
                    .filter_map(|h| subc.offset_of(h.start()))
                    .collect(),
                None => self.hits.iter().map(Hit::start).collect(),
            };
            starts.sort_unstable();
            arf(&starts, self.search_size())
        })
    }

    pub fn conc_size(&self) -> ConcSize {
        ConcSize {
            conc_size: self.size(),
            corpus_size: self.corpus_size(),
            search_size: self.search_size(),
            arf: self.arf(),
        }
    }

    /// Filters that have not been removed.
    pub fn coll_filters(&self) -> impl Iterator<Item = &CollFilter> {
        self.filters.iter().filter(|f| !f.removed)
    }

    /// Keeps hits with (`positive`) or without a match of `query` inside the
    /// window `[start + lctx, end - 1 + rctx]`; returns the 1-based filter
    /// number.
    pub fn add_coll_filter(
        &mut self,
        query: &str,
        lctx: i64,
        rctx: i64,
        positive: bool,
    ) -> Result<usize> {
        let coll_hits = self.corpus.evaluate(query, None)?;
        let filter = CollFilter {
            number: self.filters.len() + 1,
            query: query.to_string(),
            lctx,
            rctx,
            positive,
            removed: false,
        };
        let before = self.hits.len();
        let hits = std::mem::take(&mut self.hits);
        self.hits = apply_filter(&filter, &coll_hits, hits, self.corpus.size());
        tracing::debug!(
            filter = filter.number,
            query,
            positive,
            before,
            after = self.hits.len(),
            "collocation filter applied"
        );
        let number = filter.number;
        self.filters.push(filter);
        self.coll_hits.push(coll_hits);
        self.arf = OnceLock::new();
        Ok(number)
    }

    /// Turns a positive filter into a negative one and vice versa.
    pub fn negate_coll_filter(&mut self, number: usize) -> Result<()> {
        let filter = self.active_filter_mut(number)?;
        filter.positive = !filter.positive;
        self.rederive();
        Ok(())
    }

    pub fn remove_coll_filter(&mut self, number: usize) -> Result<()> {
        self.active_filter_mut(number)?.removed = true;
        self.rederive();
        Ok(())
    }

    fn active_filter_mut(&mut self, number: usize) -> Result<&mut CollFilter> {
        self.filters
            .iter_mut()
            .find(|f| f.number == number && !f.removed)
            .ok_or_else(|| Error::not_found("collocation filter", number.to_string()))
    }

    fn rederive(&mut self) {
        let size = self.corpus.size();
        let mut hits: Vec<Hit> = self.base.iter().cloned().map(Hit::new).collect();
        for (filter, coll_hits) in self.filters.iter().zip(&self.coll_hits) {
            if !filter.removed {
                hits = apply_filter(filter, coll_hits, hits, size);
            }
        }
        if let Some(seed) = self.shuffle_seed {
            shuffle_hits(&mut hits, seed);
        }
        self.hits = hits;
        self.arf = OnceLock::new();
    }
}

fn shuffle_hits(hits: &mut [Hit], seed: u64) {
    let mut rng = fastrand::Rng::with_seed(seed);
    rng.shuffle(hits);
}

fn apply_filter(
    filter: &CollFilter,
    coll_hits: &[Range<Pos>],
    hits: Vec<Hit>,
    corpus_size: u64,
) -> Vec<Hit> {
    hits.into_iter()
        .filter_map(|mut hit| {
            let found = find_in_window(coll_hits, &hit.range, filter.lctx, filter.rctx, corpus_size);
            match (found, filter.positive) {
                (Some(coll), true) => {
                    hit.colls.push((filter.number, coll));
                    Some(hit)
                }
                (None, false) => Some(hit),
                _ => None,
            }
        })
        .collect()
}

/// First collocate hit lying completely inside the window around `hit`.
fn find_in_window(
    coll_hits: &[Range<Pos>],
    hit: &Range<Pos>,
    lctx: i64,
    rctx: i64,
    corpus_size: u64,
) -> Option<Range<Pos>> {
    if corpus_size == 0 {
        return None;
    }
    let beg = (hit.start as i64).saturating_add(lctx).max(0);
    let end = (hit.end as i64 - 1)
        .saturating_add(rctx)
        .min(corpus_size as i64 - 1);
    if end < beg {
        return None;
    }
    let (beg, end) = (beg as Pos, end as Pos);
    let first = coll_hits.partition_point(|r| r.start < beg);
    coll_hits[first..]
        .iter()
        .take_while(|r| r.start <= end)
        .find(|r| r.end - 1 <= end)
        .cloned()
}

/// Average reduced frequency of ascending `positions` in a space of `size`
/// tokens.
///
/// With `f` positions the space is cut into `f` segments of length
/// `v = size / f`; every gap between consecutive positions (the last one
/// wrapping around to the first) contributes `min(gap, v)`, and the sum is
/// divided by `v`. Evenly spread positions give `f`, clustered ones give
/// values close to 1.
pub fn arf(positions: &[Pos], size: u64) -> f64 {
    let (Some(&first), Some(&last)) = (positions.first(), positions.last()) else {
        return 0.0;
    };
    if size == 0 {
        return 0.0;
    }
    let v = size as f64 / positions.len() as f64;
    let mut sum: f64 = positions
        .windows(2)
        .map(|w| ((w[1] - w[0]) as f64).min(v))
        .sum();
    sum += ((first + size - last) as f64).min(v);
    sum / v
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_testkit::TestCorpus;

    fn open() -> (TestCorpus, Corpus) {
        let tc = TestCorpus::sample().unwrap();
        let corp = Corpus::open(tc.registry_path()).unwrap();
        (tc, corp)
    }

    #[test]
    fn test_arf() {
        let spread: Vec<Pos> = (0..10).map(|i| i * 10).collect();
        assert!((arf(&spread, 100) - 10.0).abs() < 1e-9);
        let clustered: Vec<Pos> = (0..10).collect();
        assert!((arf(&clustered, 100) - 1.9).abs() < 1e-9);
        assert!((arf(&[42], 100) - 1.0).abs() < 1e-9);
        assert_eq!(arf(&[], 100), 0.0);
    }

    #[test]
    fn test_sizes() {
        let (_tc, corp) = open();
        let conc = Concordance::new(&corp, r#"[lemma="cat"]"#, None).unwrap();
        let size = conc.conc_size();
        assert_eq!(size.conc_size, 2);
        assert_eq!(size.corpus_size, 14);
        assert_eq!(size.search_size, 14);
        assert!(size.arf > 1.0 && size.arf <= 2.0);
    }

    #[test]
    fn test_subcorpus_restriction() {
        let (_tc, corp) = open();
        let subc = Arc::new(Subcorpus::from_ranges("fiction", vec![7..14]));
        let conc = Concordance::new(&corp, r#"[lemma="cat"]"#, Some(subc)).unwrap();
        assert_eq!(conc.size(), 1);
        assert_eq!(conc.search_size(), 7);
        assert_eq!(conc.corpus_size(), 14);
        assert_eq!(conc.hit(0).unwrap().range(), 8..9);

        let empty = Arc::new(Subcorpus::from_ranges("none", Vec::new()));
        let conc = Concordance::new(&corp, r#"[lemma="cat"]"#, Some(empty)).unwrap();
        assert_eq!(conc.size(), 0);
        assert_eq!(conc.search_size(), 0);
        assert_eq!(conc.arf(), 0.0);

        let beyond = Arc::new(Subcorpus::from_ranges("beyond", vec![10..20]));
        assert!(Concordance::new(&corp, "[]", Some(beyond)).is_err());
    }

    #[test]
    fn test_shuffle_is_reproducible() {
        let (_tc, corp) = open();
        let mut a = Concordance::new(&corp, "[]", None).unwrap();
        let mut b = Concordance::new(&corp, "[]", None).unwrap();
        a.shuffle(Some(7));
        b.shuffle(Some(7));
        assert_eq!(a.hits(), b.hits());
        let mut starts: Vec<Pos> = a.hits().iter().map(Hit::start).collect();
        starts.sort_unstable();
        assert_eq!(starts, (0..14).collect::<Vec<_>>());
        assert!(a.is_shuffled());
    }

    #[test]
    fn test_coll_filters() {
        let (_tc, corp) = open();
        let mut conc = Concordance::new(&corp, r#"[tag="NNS?"]"#, None).unwrap();
        assert_eq!(conc.size(), 4);

        // cat/mat/cat/dogs; keep those preceded by a determiner
        let first = conc.add_coll_filter(r#"[tag="DT"]"#, -1, -1, true).unwrap();
        assert_eq!(first, 1);
        let starts: Vec<Pos> = conc.hits().iter().map(Hit::start).collect();
        assert_eq!(starts, vec![1, 5, 8]);
        assert_eq!(conc.hit(0).unwrap().coll(1), Some(0..1));

        conc.negate_coll_filter(1).unwrap();
        let starts: Vec<Pos> = conc.hits().iter().map(Hit::start).collect();
        assert_eq!(starts, vec![12]);

        let second = conc.add_coll_filter(r#"[word="\."]"#, 1, 1, true).unwrap();
        assert_eq!(second, 2);
        assert_eq!(conc.size(), 1);

        conc.remove_coll_filter(1).unwrap();
        let starts: Vec<Pos> = conc.hits().iter().map(Hit::start).collect();
        assert_eq!(starts, vec![5, 12]);
        assert!(conc.remove_coll_filter(1).is_err());

        let third = conc.add_coll_filter(r#"[]"#, 0, 0, true).unwrap();
        assert_eq!(third, 3);
        assert_eq!(conc.coll_filters().count(), 2);
        assert!(conc.negate_coll_filter(9).is_err());
    }

    #[test]
    fn test_query_error_propagates() {
        let (_tc, corp) = open();
        let err = Concordance::new(&corp, "[lemma=", None).err().unwrap();
        assert!(err.to_string().contains("[lemma="));
        assert!(Concordance::new(&corp, "[pos=\"x\"]", None).is_err());
    }
}

//! Collocation statistics.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ahash::AHashMap;
use serde::Serialize;

use concord_common::{Error, Result, verify_arg};
use concord_engine::ranges;

use crate::conc::Concordance;
use crate::config::ConcordConfig;
use crate::corpus::Corpus;
use crate::subcorp::Subcorpus;

/// Association measures, identified by single-character codes or names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CollMeasure {
    AbsFreq,
    LogLikelihood,
    LogDice,
    MinSensitivity,
    MutualInfo,
    MutualInfo3,
    MutualInfoLogF,
    RelFreq,
    TScore,
}

impl CollMeasure {
    pub const ALL: [CollMeasure; 9] = [
        CollMeasure::AbsFreq,
        CollMeasure::LogLikelihood,
        CollMeasure::LogDice,
        CollMeasure::MinSensitivity,
        CollMeasure::MutualInfo,
        CollMeasure::MutualInfo3,
        CollMeasure::MutualInfoLogF,
        CollMeasure::RelFreq,
        CollMeasure::TScore,
    ];

    pub const fn code(self) -> char {
        match self {
            CollMeasure::AbsFreq => 'f',
            CollMeasure::LogLikelihood => 'l',
            CollMeasure::LogDice => 'd',
            CollMeasure::MinSensitivity => 's',
            CollMeasure::MutualInfo => 'm',
            CollMeasure::MutualInfo3 => '3',
            CollMeasure::MutualInfoLogF => 'p',
            CollMeasure::RelFreq => 'r',
            CollMeasure::TScore => 't',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CollMeasure::AbsFreq => "absFreq",
            CollMeasure::LogLikelihood => "logLikelihood",
            CollMeasure::LogDice => "logDice",
            CollMeasure::MinSensitivity => "minSensitivity",
            CollMeasure::MutualInfo => "mutualInfo",
            CollMeasure::MutualInfo3 => "mutualInfo3",
            CollMeasure::MutualInfoLogF => "mutualInfoLogF",
            CollMeasure::RelFreq => "relFreq",
            CollMeasure::TScore => "tScore",
        }
    }

    pub fn from_code(code: char) -> Result<CollMeasure> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == code)
            .ok_or_else(|| Error::invalid_arg("measure", format!("unknown measure code '{code}'")))
    }

    /// Score of a collocate.
    ///
    /// `f_a` is the result set size, `f_b` the collocate frequency in the
    /// searched space, `f_ab` the number of co-occurrences and `n` the size
    /// of the searched space.
    pub fn eval(self, f_a: u64, f_b: u64, f_ab: u64, n: u64) -> f64 {
        let (f_a, f_b, f_ab, n) = (f_a as f64, f_b as f64, f_ab as f64, n as f64);
        let mi = || (f_ab * n / (f_a * f_b)).log2();
        match self {
            CollMeasure::AbsFreq => f_ab,
            CollMeasure::LogLikelihood => {
                2.0 * (xlx(f_ab) + xlx(f_a - f_ab) + xlx(f_b - f_ab)
                    + xlx(n - f_a - f_b + f_ab)
                    - xlx(f_a)
                    - xlx(f_b)
                    - xlx(n - f_a)
                    - xlx(n - f_b)
                    + xlx(n))
            }
            CollMeasure::LogDice => 14.0 + (2.0 * f_ab / (f_a + f_b)).log2(),
            CollMeasure::MinSensitivity => (f_ab / f_b).min(f_ab / f_a),
            CollMeasure::MutualInfo => mi(),
            CollMeasure::MutualInfo3 => (f_ab.powi(3) * n / (f_a * f_b)).log2(),
            CollMeasure::MutualInfoLogF => mi() * (f_ab + 1.0).ln(),
            CollMeasure::RelFreq => f_ab / f_b * 100.0,
            CollMeasure::TScore => (f_ab - f_a * f_b / n) / f_ab.sqrt(),
        }
    }
}

fn xlx(x: f64) -> f64 {
    if x <= 0.0 { 0.0 } else { x * x.ln() }
}

impl FromStr for CollMeasure {
    type Err = Error;

    /// Accepts either the single-character code or the name.
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return CollMeasure::from_code(c);
        }
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::invalid_arg("measure", format!("unknown measure '{s}'")))
    }
}

impl fmt::Display for CollMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct CollArgs {
    pub attr: String,
    /// Score reported for every item.
    pub measure: CollMeasure,
    /// Measure items are ranked by.
    pub sort: CollMeasure,
    /// Minimum frequency of the collocate in the searched space.
    pub min_freq: u64,
    /// Minimum number of co-occurrences.
    pub min_bgr: u64,
    pub from_w: i64,
    pub to_w: i64,
    pub max_items: usize,
}

impl CollArgs {
    pub fn new(attr: impl Into<String>, config: &ConcordConfig) -> CollArgs {
        CollArgs {
            attr: attr.into(),
            measure: CollMeasure::LogDice,
            sort: CollMeasure::LogDice,
            min_freq: 1,
            min_bgr: 1,
            from_w: config.coll_window[0],
            to_w: config.coll_window[1],
            max_items: config.coll_max_items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollItem {
    pub word: String,
    pub score: f64,
    pub freq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collocations {
    pub items: Vec<CollItem>,
    pub conc_size: u64,
    pub corpus_size: u64,
    pub search_size: u64,
}

#[derive(Debug, Clone)]
struct Candidate {
    word: String,
    f_ab: u64,
    f_b: u64,
}

/// Ranked collocates of a result set, read through a cursor.
///
/// The cursor starts at the best item. [`CollocItems::next_item`] returns the
/// item under the cursor and then advances, so draining with `has_next` /
/// `next_item` yields every item exactly once, best first.
#[derive(Debug, Clone)]
pub struct CollocItems {
    items: Vec<Candidate>,
    pos: usize,
    f_a: u64,
    n: u64,
}

impl CollocItems {
    /// Counts the values of `attr` at offsets `from_w..=to_w` around every
    /// hit (negative offsets from the first hit token, positive from the last
    /// one, the hit itself excluded), applies both floors, ranks by `sort`
    /// and keeps the best `max_items`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conc: &Concordance,
        attr: &str,
        sort: CollMeasure,
        min_freq: u64,
        min_bgr: u64,
        from_w: i64,
        to_w: i64,
        max_items: usize,
    ) -> Result<CollocItems> {
        verify_arg!(from_w, from_w <= to_w);
        let reader = conc.corpus().reader();
        let pattr = reader.attr(attr)?;
        let subcorpus = conc.subcorpus();
        let size = reader.size();

        let mut counts: AHashMap<u32, u64> = AHashMap::new();
        for hit in conc.hits() {
            let left = ranges::offset_window(hit.start(), from_w, to_w.min(-1), size);
            let right =
                ranges::offset_window(hit.end().saturating_sub(1), from_w.max(1), to_w, size);
            for pos in left.chain(right) {
                if subcorpus.is_some_and(|s| !s.contains_pos(pos)) {
                    continue;
                }
                if let Some(id) = pattr.pos2id(pos) {
                    *counts.entry(id).or_default() += 1;
                }
            }
        }

        let f_a = conc.size();
        let n = conc.search_size();
        let mut items: Vec<Candidate> = counts
            .into_iter()
            .filter(|&(_, f_ab)| f_ab >= min_bgr)
            .filter_map(|(id, f_ab)| {
                let f_b = match subcorpus {
                    Some(subc) => subc.count_in(pattr.id2poss(id)),
                    None => pattr.freq(id),
                };
                (f_b >= min_freq).then(|| Candidate {
                    word: pattr.id2str(id).to_string(),
                    f_ab,
                    f_b,
                })
            })
            .collect();
        items.sort_by(|a, b| {
            let sa = sort.eval(f_a, a.f_b, a.f_ab, n);
            let sb = sort.eval(f_a, b.f_b, b.f_ab, n);
            sb.total_cmp(&sa)
                .then_with(|| b.f_ab.cmp(&a.f_ab))
                .then_with(|| a.word.cmp(&b.word))
        });
        items.truncate(max_items);
        tracing::debug!(
            attr,
            sort = %sort,
            items = items.len(),
            conc_size = f_a,
            "collocations ranked"
        );
        Ok(CollocItems {
            items,
            pos: 0,
            f_a,
            n,
        })
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.items.len()
    }

    /// Past the last item.
    pub fn eos(&self) -> bool {
        !self.has_next()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reads the item under the cursor, scored by `measure`, then advances.
    pub fn next_item(&mut self, measure: CollMeasure) -> Option<CollItem> {
        let c = self.items.get(self.pos)?;
        let item = CollItem {
            word: c.word.clone(),
            score: measure.eval(self.f_a, c.f_b, c.f_ab, self.n),
            freq: c.f_ab,
        };
        self.pos += 1;
        Some(item)
    }
}

/// Collocations of a result set.
pub fn collocations(conc: &Concordance, args: &CollArgs) -> Result<Collocations> {
    let mut cursor = CollocItems::new(
        conc,
        &args.attr,
        args.sort,
        args.min_freq,
        args.min_bgr,
        args.from_w,
        args.to_w,
        args.max_items,
    )?;
    let mut items = Vec::with_capacity(cursor.len());
    while items.len() < args.max_items {
        match cursor.next_item(args.measure) {
            Some(item) => items.push(item),
            None => break,
        }
    }
    Ok(Collocations {
        items,
        conc_size: conc.size(),
        corpus_size: conc.corpus_size(),
        search_size: conc.search_size(),
    })
}

/// Evaluates `query` and computes its collocations in one call.
pub fn query_collocations(
    corpus: &Corpus,
    query: &str,
    subcorpus: Option<Arc<Subcorpus>>,
    args: &CollArgs,
) -> Result<Collocations> {
    let conc = Concordance::new(corpus, query, subcorpus)?;
    collocations(&conc, args)
}

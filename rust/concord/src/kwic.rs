//! Keyword-in-context rendering.
//!
//! A token is rendered as the value of the first requested attribute followed
//! by `/value` for each further attribute (`dogs/dog/NNS`). Requested
//! structures appear as separate `<s>` / `</s>` marker tokens; a structure
//! given as `doc.id` renders its opening tag with that attribute
//! (`<doc id="d1">`).

use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;

use concord_common::{Error, Result};
use concord_engine::{CorpusReader, Pos, PosAttrReader, StructAttrReader, StructReader};

use crate::conc::{Concordance, Hit};
use crate::config::ConcordConfig;
use crate::corpus::Corpus;
use crate::subcorp::Subcorpus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KwicToken {
    pub text: String,
    /// Part of a collocate matched by a positive collocation filter.
    pub coll: bool,
}

/// One rendered result set entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KwicLine {
    pub refs: Vec<String>,
    pub left: Vec<KwicToken>,
    pub kwic: Vec<KwicToken>,
    pub right: Vec<KwicToken>,
}

impl KwicLine {
    /// `refs` joined by `separator`, then `separator`, then all tokens
    /// space-joined. Without refs the line is just the tokens.
    pub fn render(&self, separator: &str) -> String {
        let text = self
            .left
            .iter()
            .chain(&self.kwic)
            .chain(&self.right)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if self.refs.is_empty() {
            text
        } else {
            format!("{}{separator}{text}", self.refs.join(separator))
        }
    }
}

/// Secondary pattern that hits must have in their neighborhood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollQuery {
    pub query: String,
    pub lctx: i64,
    pub rctx: i64,
}

#[derive(Debug, Clone)]
pub struct KwicArgs {
    pub query: String,
    pub coll_query: Option<CollQuery>,
    /// Positional attributes per token; empty means the default attribute.
    pub attrs: Vec<String>,
    pub structs: Vec<String>,
    /// `struct.attr` values of the enclosing instance, or `#` for the hit position.
    pub refs: Vec<String>,
    pub ref_separator: String,
    pub from_line: u64,
    pub limit: usize,
    /// Upper bound on `limit`.
    pub max_limit: usize,
    /// Total context tokens, split between both sides.
    pub max_context: usize,
    /// Structure that bounds the context (typically `s` or `p`).
    pub view_context_struct: Option<String>,
    pub shuffle_seed: Option<u64>,
}

impl KwicArgs {
    pub fn new(query: impl Into<String>, config: &ConcordConfig) -> KwicArgs {
        KwicArgs {
            query: query.into(),
            coll_query: None,
            attrs: Vec::new(),
            structs: Vec::new(),
            refs: Vec::new(),
            ref_separator: config.ref_separator.clone(),
            from_line: 0,
            limit: config.kwic_limit,
            max_limit: config.max_kwic_limit,
            max_context: config.max_context,
            view_context_struct: None,
            shuffle_seed: config.shuffle_seed,
        }
    }
}

/// A page of rendered lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KwicPage {
    pub lines: Vec<String>,
    pub conc_size: u64,
}

/// Evaluates the query, shuffles the result set and renders one page.
///
/// On success the page holds exactly `limit` lines, padded with empty
/// strings, unless the result set is empty and `from_line` is zero: that
/// case yields an empty page. A `from_line` beyond the result set size is
/// an out-of-range error.
pub fn conc_examples(
    corpus: &Corpus,
    subcorpus: Option<Arc<Subcorpus>>,
    args: &KwicArgs,
) -> Result<KwicPage> {
    if args.limit > args.max_limit {
        return Err(Error::invalid_arg(
            "limit",
            format!("{} exceeds the page size bound {}", args.limit, args.max_limit),
        ));
    }
    let mut conc = Concordance::new(corpus, &args.query, subcorpus)?;
    if let Some(cq) = &args.coll_query {
        conc.add_coll_filter(&cq.query, cq.lctx, cq.rctx, true)?;
    }
    if conc.is_empty() && args.from_line == 0 {
        return Ok(KwicPage {
            lines: Vec::new(),
            conc_size: 0,
        });
    }
    if args.from_line > conc.size() {
        return Err(Error::out_of_range(args.from_line, conc.size()));
    }
    conc.shuffle(args.shuffle_seed);
    let mut lines: Vec<String> = kwic_lines(&conc, args)?
        .iter()
        .map(|line| line.render(&args.ref_separator))
        .collect();
    lines.resize(args.limit, String::new());
    Ok(KwicPage {
        lines,
        conc_size: conc.size(),
    })
}

/// Renders up to `limit` entries of `conc` starting at `from_line`, in the
/// result set's current order.
pub fn kwic_lines(conc: &Concordance, args: &KwicArgs) -> Result<Vec<KwicLine>> {
    if args.from_line > conc.size() {
        return Err(Error::out_of_range(args.from_line, conc.size()));
    }
    let reader = conc.corpus().reader();
    let renderer = TokenRenderer::new(reader, &args.attrs, &args.structs)?;
    let bound = match &args.view_context_struct {
        Some(name) if !name.is_empty() => Some(reader.structure(name)?),
        _ => None,
    };
    let refs = args
        .refs
        .iter()
        .map(|spec| RefField::new(reader, spec))
        .collect::<Result<Vec<_>>>()?;

    conc.hits()
        .iter()
        .skip(args.from_line as usize)
        .take(args.limit)
        .map(|hit| {
            let (left_start, right_end) =
                context_window(hit, args.max_context, bound, reader.size());
            let colls: Vec<Range<Pos>> = hit.colls().collect();
            Ok(KwicLine {
                refs: refs.iter().map(|r| r.value(hit)).collect(),
                left: renderer.render_marked(left_start..hit.start(), &colls),
                kwic: renderer.render_marked(hit.range(), &colls),
                right: renderer.render_marked(hit.end()..right_end, &colls),
            })
        })
        .collect()
}

/// Context bounds `(left_start, right_end)` around a hit.
///
/// The budget is split `floor(b/2)` left and `ceil(b/2)` right. With a
/// bounding structure each side additionally stops at the edge of the
/// instance containing the hit start; hits outside any instance fall back
/// to the plain split.
fn context_window(
    hit: &Hit,
    budget: usize,
    bound: Option<&dyn StructReader>,
    corpus_size: u64,
) -> (Pos, Pos) {
    let left = (budget / 2) as u64;
    let right = budget as u64 - left;
    let mut left_start = hit.start().saturating_sub(left);
    let mut right_end = hit.end().saturating_add(right).min(corpus_size);
    if let Some(st) = bound {
        if let Some(r) = st.num_at_pos(hit.start()).and_then(|num| st.range(num)) {
            left_start = left_start.max(r.start);
            right_end = right_end.min(r.end.max(hit.end()));
        }
    }
    (left_start, right_end)
}

struct RefField<'c> {
    source: RefSource<'c>,
}

enum RefSource<'c> {
    Position,
    StructAttr(&'c dyn StructReader, &'c dyn StructAttrReader),
}

impl<'c> RefField<'c> {
    fn new(reader: &'c dyn CorpusReader, spec: &str) -> Result<RefField<'c>> {
        if spec == "#" {
            return Ok(RefField {
                source: RefSource::Position,
            });
        }
        let (st_name, attr_name) = spec
            .split_once('.')
            .ok_or_else(|| Error::invalid_arg("refs", format!("expected struct.attr, got '{spec}'")))?;
        let st = reader.structure(st_name)?;
        let attr = st.attr(attr_name)?;
        Ok(RefField {
            source: RefSource::StructAttr(st, attr),
        })
    }

    fn value(&self, hit: &Hit) -> String {
        match self.source {
            RefSource::Position => format!("#{}", hit.start()),
            RefSource::StructAttr(st, attr) => st
                .num_at_pos(hit.start())
                .and_then(|num| attr.num2id(num))
                .map(|id| attr.id2str(id).to_string())
                .unwrap_or_default(),
        }
    }
}

struct StructMarker<'c> {
    st: &'c dyn StructReader,
    attrs: Vec<&'c dyn StructAttrReader>,
}

/// Renders corpus positions as KWIC tokens.
pub(crate) struct TokenRenderer<'c> {
    attrs: Vec<&'c dyn PosAttrReader>,
    structs: Vec<StructMarker<'c>>,
}

impl<'c> TokenRenderer<'c> {
    pub(crate) fn new(
        reader: &'c dyn CorpusReader,
        attrs: &[String],
        structs: &[String],
    ) -> Result<TokenRenderer<'c>> {
        let attrs = if attrs.is_empty() {
            vec![reader.attr(reader.default_attr())?]
        } else {
            attrs
                .iter()
                .map(|a| reader.attr(a))
                .collect::<Result<Vec<_>>>()?
        };
        let mut markers: Vec<StructMarker<'c>> = Vec::new();
        for spec in structs {
            let (st_name, attr_name) = match spec.split_once('.') {
                Some((s, a)) => (s, Some(a)),
                None => (spec.as_str(), None),
            };
            let st = reader.structure(st_name)?;
            let idx = match markers.iter().position(|m| m.st.name() == st_name) {
                Some(idx) => idx,
                None => {
                    markers.push(StructMarker {
                        st,
                        attrs: Vec::new(),
                    });
                    markers.len() - 1
                }
            };
            if let Some(attr_name) = attr_name {
                markers[idx].attrs.push(st.attr(attr_name)?);
            }
        }
        Ok(TokenRenderer {
            attrs,
            structs: markers,
        })
    }

    pub(crate) fn render(&self, range: Range<Pos>) -> Vec<String> {
        self.render_marked(range, &[])
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    fn render_marked(&self, range: Range<Pos>, colls: &[Range<Pos>]) -> Vec<KwicToken> {
        let mut out = Vec::new();
        for pos in range {
            for m in &self.structs {
                if let Some((num, r)) = instance_at(m.st, pos) {
                    if r.start == pos {
                        out.push(plain(open_tag(m, num)));
                    }
                }
            }
            let mut text = String::new();
            for (i, attr) in self.attrs.iter().enumerate() {
                if i > 0 {
                    text.push('/');
                }
                text.push_str(attr.pos2str(pos));
            }
            out.push(KwicToken {
                text,
                coll: colls.iter().any(|c| c.contains(&pos)),
            });
            for m in self.structs.iter().rev() {
                if let Some((_, r)) = instance_at(m.st, pos) {
                    if r.end == pos + 1 {
                        out.push(plain(format!("</{}>", m.st.name())));
                    }
                }
            }
        }
        out
    }
}

fn instance_at(st: &dyn StructReader, pos: Pos) -> Option<(usize, Range<Pos>)> {
    let num = st.num_at_pos(pos)?;
    Some((num, st.range(num)?))
}

fn open_tag(m: &StructMarker<'_>, num: usize) -> String {
    let mut tag = format!("<{}", m.st.name());
    for attr in &m.attrs {
        let value = attr.num2id(num).map(|id| attr.id2str(id)).unwrap_or("");
        tag.push_str(&format!(" {}=\"{value}\"", attr.name()));
    }
    tag.push('>');
    tag
}

fn plain(text: String) -> KwicToken {
    KwicToken { text, coll: false }
}

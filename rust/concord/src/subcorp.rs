//! Sub-corpora: restrictions of a corpus to a set of token ranges.
//!
//! On disk a sub-corpus is a text file with one `start<TAB>end` half-open
//! range per line.

use std::ops::Range;
use std::path::Path;

use concord_common::{Error, Result};
use concord_engine::{CorpusReader, Pos, ranges};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcorpus {
    name: String,
    ranges: Vec<Range<Pos>>,
    // Number of covered positions before each range.
    offsets: Vec<u64>,
    search_size: u64,
}

impl Subcorpus {
    /// Creates a sub-corpus from arbitrary ranges; they are sorted and merged.
    pub fn from_ranges(name: impl Into<String>, ranges: Vec<Range<Pos>>) -> Subcorpus {
        let ranges = ranges::normalize(ranges);
        let mut offsets = Vec::with_capacity(ranges.len());
        let mut covered = 0;
        for r in &ranges {
            offsets.push(covered);
            covered += r.end - r.start;
        }
        Subcorpus {
            name: name.into(),
            ranges,
            offsets,
            search_size: covered,
        }
    }

    /// All instances of `structure` whose `attr` value is one of `values`.
    pub fn from_struct_attr(
        corpus: &dyn CorpusReader,
        name: impl Into<String>,
        structure: &str,
        attr: &str,
        values: &[&str],
    ) -> Result<Subcorpus> {
        let st = corpus.structure(structure)?;
        let sattr = st.attr(attr)?;
        let mut spans = Vec::new();
        for value in values {
            let Some(id) = sattr.str2id(value) else {
                tracing::debug!(structure, attr, value, "value not present in corpus");
                continue;
            };
            spans.extend(sattr.id2nums(id).iter().filter_map(|&num| st.range(num)));
        }
        Ok(Subcorpus::from_ranges(name, spans))
    }

    /// Reads a sub-corpus file; the name is the file stem.
    pub fn open(path: impl AsRef<Path>) -> Result<Subcorpus> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let subc = Self::parse(name, &text)?;
        tracing::debug!(
            subcorpus = %path.display(),
            ranges = subc.ranges.len(),
            search_size = subc.search_size,
            "sub-corpus opened"
        );
        Ok(subc)
    }

    pub fn parse(name: impl Into<String>, text: &str) -> Result<Subcorpus> {
        let mut spans = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let element = || format!("subcorpus line {}", line_no + 1);
            let (start, end) = line
                .split_once('\t')
                .ok_or_else(|| Error::invalid_format(element(), "expected start<TAB>end"))?;
            let start: Pos = start
                .trim()
                .parse()
                .map_err(|_| Error::invalid_format(element(), format!("bad start '{start}'")))?;
            let end: Pos = end
                .trim()
                .parse()
                .map_err(|_| Error::invalid_format(element(), format!("bad end '{end}'")))?;
            if end < start {
                return Err(Error::invalid_format(element(), "end precedes start"));
            }
            spans.push(start..end);
        }
        Ok(Subcorpus::from_ranges(name, spans))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text: String = self
            .ranges
            .iter()
            .map(|r| format!("{}\t{}\n", r.start, r.end))
            .collect();
        std::fs::write(path, text).map_err(|e| Error::io(path.display().to_string(), e))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ranges(&self) -> &[Range<Pos>] {
        &self.ranges
    }

    /// Number of token positions covered.
    pub fn search_size(&self) -> u64 {
        self.search_size
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains_pos(&self, pos: Pos) -> bool {
        ranges::find_containing(&self.ranges, pos).is_some()
    }

    /// Whether the hit lies inside a single range.
    pub fn contains(&self, hit: &Range<Pos>) -> bool {
        ranges::contains_range(&self.ranges, hit)
    }

    /// Position in the sub-corpus' own contiguous numbering.
    pub fn offset_of(&self, pos: Pos) -> Option<u64> {
        let idx = ranges::find_containing(&self.ranges, pos)?;
        Some(self.offsets[idx] + (pos - self.ranges[idx].start))
    }

    /// Counts the members of an ascending position list that fall inside.
    pub fn count_in(&self, positions: &[Pos]) -> u64 {
        self.ranges
            .iter()
            .map(|r| {
                let lo = positions.partition_point(|&p| p < r.start);
                let hi = positions.partition_point(|&p| p < r.end);
                (hi - lo) as u64
            })
            .sum()
    }

    /// Number of tokens of `span` inside the sub-corpus.
    pub fn overlap(&self, span: Range<Pos>) -> u64 {
        ranges::intersect_ranges(self.ranges.iter().cloned(), std::iter::once(span))
            .map(|r| r.end - r.start)
            .sum()
    }

    /// Rejects ranges reaching past the end of a corpus.
    pub fn check_bounds(&self, corpus_size: u64) -> Result<()> {
        match self.ranges.last() {
            Some(last) if last.end > corpus_size => Err(Error::invalid_arg(
                "subcorpus",
                format!(
                    "{} ends at {} beyond corpus size {corpus_size}",
                    self.name, last.end
                ),
            )),
            _ => Ok(()),
        }
    }
}

//! Helpers for ordered lists of token ranges.
//!
//! Sub-corpus restrictions, structure instances and hit lists are all
//! sequences of half-open `Range<Pos>`. The functions here assume, unless
//! stated otherwise, that a list is sorted by `start` and non-overlapping.

use std::ops::Range;

use crate::Pos;

/// Sorts the ranges and merges overlapping or adjacent ones; empty ranges
/// are dropped.
pub fn normalize(mut ranges: Vec<Range<Pos>>) -> Vec<Range<Pos>> {
    ranges.retain(|r| r.start < r.end);
    ranges.sort_unstable_by_key(|r| r.start);
    let mut merged: Vec<Range<Pos>> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => merged.push(r),
        }
    }
    merged
}

/// Total number of positions covered.
pub fn covered_len(ranges: &[Range<Pos>]) -> u64 {
    ranges.iter().map(|r| r.end - r.start).sum()
}

/// Index of the range containing `pos`.
pub fn find_containing(ranges: &[Range<Pos>], pos: Pos) -> Option<usize> {
    let idx = ranges.partition_point(|r| r.end <= pos);
    match ranges.get(idx) {
        Some(r) if r.start <= pos => Some(idx),
        _ => None,
    }
}

/// Whether `inner` lies completely inside a single range of the list.
pub fn contains_range(ranges: &[Range<Pos>], inner: &Range<Pos>) -> bool {
    match find_containing(ranges, inner.start) {
        Some(idx) => inner.end <= ranges[idx].end,
        None => false,
    }
}

/// Positions `anchor + from ..= anchor + to` clipped to `0..size`.
///
/// The sum is computed in `i128`, so arbitrary offsets neither overflow nor
/// widen the result beyond the corpus.
pub fn offset_window(anchor: Pos, from: i64, to: i64, size: u64) -> Range<Pos> {
    let lo = (i128::from(anchor) + i128::from(from)).max(0);
    let hi = (i128::from(anchor) + i128::from(to) + 1).min(i128::from(size));
    if lo < hi { lo as Pos..hi as Pos } else { 0..0 }
}

/// Creates an iterator that yields the set-intersection of two ordered,
/// non-overlapping streams of ranges.
///
/// Only overlapping portions are produced, in ascending order, never empty.
/// This is a streaming O(len(a) + len(b)) merge holding one range per side.
pub fn intersect_ranges<L, R>(a: L, b: R) -> IntersectionRanges<L::IntoIter, R::IntoIter>
where
    L: IntoIterator<Item = Range<Pos>>,
    R: IntoIterator<Item = Range<Pos>>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    let cur_a = a.next();
    let cur_b = b.next();
    IntersectionRanges { a, b, cur_a, cur_b }
}

pub struct IntersectionRanges<I, J>
where
    I: Iterator<Item = Range<Pos>>,
    J: Iterator<Item = Range<Pos>>,
{
    a: I,
    b: J,
    cur_a: Option<Range<Pos>>,
    cur_b: Option<Range<Pos>>,
}

impl<I, J> Iterator for IntersectionRanges<I, J>
where
    I: Iterator<Item = Range<Pos>>,
    J: Iterator<Item = Range<Pos>>,
{
    type Item = Range<Pos>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (ra, rb) = match (&self.cur_a, &self.cur_b) {
                (Some(ra), Some(rb)) => (ra.clone(), rb.clone()),
                _ => return None,
            };
            let start = ra.start.max(rb.start);
            let end = ra.end.min(rb.end);
            // Advance whichever side finishes first; both on a tie.
            if ra.end <= rb.end {
                self.cur_a = self.a.next();
            }
            if rb.end <= ra.end {
                self.cur_b = self.b.next();
            }
            if start < end {
                return Some(start..end);
            }
        }
    }
}

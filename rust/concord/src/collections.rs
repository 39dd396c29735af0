//! Collections handed across the boundary.
//!
//! Each shape is a distinct type so that a string sequence can never be
//! released or indexed as an integer sequence. Map traversal goes through a
//! separate [`ValueSizeIter`] that shares the map, so several traversals of
//! one map can run side by side.

use std::sync::Arc;

/// A sequence of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrVector(Vec<String>);

impl StrVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for StrVector {
    fn from(values: Vec<String>) -> Self {
        StrVector(values)
    }
}

impl FromIterator<String> for StrVector {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        StrVector(iter.into_iter().collect())
    }
}

/// A sequence of counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntVector(Vec<u64>);

impl IntVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u64> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }
}

impl From<Vec<u64>> for IntVector {
    fn from(values: Vec<u64>) -> Self {
        IntVector(values)
    }
}

impl FromIterator<u64> for IntVector {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        IntVector(iter.into_iter().collect())
    }
}

/// Value to token count mapping, ordered by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSizeMap {
    entries: Vec<(String, u64)>,
}

impl ValueSizeMap {
    /// Builds the map from unordered entries; counts of repeated keys are summed.
    pub fn from_entries(mut entries: Vec<(String, u64)>) -> ValueSizeMap {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let mut merged: Vec<(String, u64)> = Vec::with_capacity(entries.len());
        for (key, count) in entries {
            match merged.last_mut() {
                Some(last) if last.0 == key => last.1 += count,
                _ => merged.push((key, count)),
            }
        }
        ValueSizeMap { entries: merged }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| self.entries[idx].1)
    }

    pub fn entry_at(&self, index: usize) -> Option<(&str, u64)> {
        self.entries.get(index).map(|(k, v)| (k.as_str(), *v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all sizes.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }
}

/// External cursor over a shared [`ValueSizeMap`].
///
/// Reading past the end yields `None`, never an error.
#[derive(Debug, Clone)]
pub struct ValueSizeIter {
    map: Arc<ValueSizeMap>,
    pos: usize,
}

impl ValueSizeIter {
    pub fn new(map: Arc<ValueSizeMap>) -> ValueSizeIter {
        ValueSizeIter { map, pos: 0 }
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.map.len()
    }

    /// Current entry without advancing.
    pub fn peek(&self) -> Option<(&str, u64)> {
        self.map.entry_at(self.pos)
    }
}

impl Iterator for ValueSizeIter {
    type Item = (String, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.map.entry_at(self.pos)?;
        let item = (key.to_string(), value);
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.map.len().saturating_sub(self.pos);
        (rest, Some(rest))
    }
}

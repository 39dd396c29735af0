//! Corpus handles.

use std::ops::Range;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ahash::AHashMap;

use concord_common::{Error, Result, verify_arg};
use concord_engine::{CorpusReader, MemCorpus, PatternEvaluator, Pos, QueryEvaluator};

use crate::collections::{StrVector, ValueSizeMap};
use crate::kwic::TokenRenderer;
use crate::subcorp::Subcorpus;
use crate::ttsizes;

/// An opened, read-only corpus.
///
/// Cloning is cheap and yields another handle to the same corpus; result
/// sets keep such a clone, so a corpus stays alive as long as anything
/// derived from it.
#[derive(Clone)]
pub struct Corpus {
    inner: Arc<CorpusInner>,
}

struct CorpusInner {
    path: String,
    reader: Arc<dyn CorpusReader>,
    evaluator: Arc<dyn QueryEvaluator>,
    value_sizes: Mutex<AHashMap<(String, String), Arc<ValueSizeMap>>>,
}

impl Corpus {
    /// Opens the corpus described by the registry file at `path` with the
    /// in-memory engine.
    pub fn open(path: impl AsRef<Path>) -> Result<Corpus> {
        let path = path.as_ref();
        let reader = MemCorpus::open(path)?;
        tracing::debug!(
            corpus = %path.display(),
            size = reader.size(),
            "corpus opened"
        );
        Ok(Corpus::from_parts(
            path.display().to_string(),
            Arc::new(reader),
            Arc::new(PatternEvaluator),
        ))
    }

    /// Wraps an arbitrary engine.
    pub fn from_parts(
        path: impl Into<String>,
        reader: Arc<dyn CorpusReader>,
        evaluator: Arc<dyn QueryEvaluator>,
    ) -> Corpus {
        Corpus {
            inner: Arc::new(CorpusInner {
                path: path.into(),
                reader,
                evaluator,
                value_sizes: Mutex::new(AHashMap::new()),
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn name(&self) -> &str {
        self.inner.reader.name()
    }

    pub fn reader(&self) -> &dyn CorpusReader {
        self.inner.reader.as_ref()
    }

    pub fn size(&self) -> u64 {
        self.inner.reader.size()
    }

    pub fn conf(&self, prop: &str) -> Result<String> {
        self.inner.reader.conf(prop)
    }

    /// Number of distinct values of a positional attribute.
    pub fn posattr_size(&self, name: &str) -> Result<u64> {
        Ok(self.inner.reader.attr(name)?.id_range() as u64)
    }

    /// Number of instances of a structure.
    pub fn struct_size(&self, name: &str) -> Result<u64> {
        Ok(self.inner.reader.structure(name)?.size() as u64)
    }

    pub fn attributes(&self) -> StrVector {
        self.inner
            .reader
            .attr_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn structures(&self) -> StrVector {
        self.inner
            .reader
            .struct_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Evaluates a query, keeping only hits inside `subcorpus` when given.
    pub fn evaluate(&self, query: &str, subcorpus: Option<&Subcorpus>) -> Result<Vec<Range<Pos>>> {
        let mut hits = self.inner.evaluator.evaluate(self.reader(), query)?;
        if let Some(subc) = subcorpus {
            hits.retain(|hit| subc.contains(hit));
        }
        Ok(hits)
    }

    /// Renders the tokens of `from..to` the way KWIC lines render them.
    pub fn region(
        &self,
        from: Pos,
        to: Pos,
        attrs: &[String],
        structs: &[String],
    ) -> Result<Vec<String>> {
        let to = to.min(self.size());
        verify_arg!(from, from <= to);
        let renderer = TokenRenderer::new(self.reader(), attrs, structs)?;
        Ok(renderer.render(from..to))
    }

    /// Value sizes of a structural attribute, computed once per corpus handle.
    pub fn attr_value_sizes(&self, structure: &str, attr: &str) -> Result<Arc<ValueSizeMap>> {
        let key = (structure.to_string(), attr.to_string());
        if let Some(map) = self.cache()?.get(&key) {
            return Ok(map.clone());
        }
        let map = Arc::new(ttsizes::attr_value_sizes(self.reader(), structure, attr)?);
        self.cache()?.insert(key, map.clone());
        Ok(map)
    }

    fn cache(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, AHashMap<(String, String), Arc<ValueSizeMap>>>> {
        self.inner
            .value_sizes
            .lock()
            .map_err(|_| Error::invalid_operation("attribute value size cache"))
    }
}

impl std::fmt::Debug for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus")
            .field("path", &self.inner.path)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_testkit::TestCorpus;

    fn corpus() -> (TestCorpus, Corpus) {
        let tc = TestCorpus::sample().unwrap();
        let corp = Corpus::open(tc.registry_path()).unwrap();
        (tc, corp)
    }

    #[test]
    fn test_info() {
        let (_tc, corp) = corpus();
        assert_eq!(corp.size(), 14);
        assert_eq!(corp.conf("ATTRLIST").unwrap(), "word,lemma,tag");
        assert_eq!(corp.attributes().as_slice(), &["word", "lemma", "tag"]);
        assert_eq!(corp.structures().as_slice(), &["doc", "s"]);
        assert_eq!(corp.struct_size("doc").unwrap(), 2);
        assert_eq!(corp.struct_size("s").unwrap(), 3);
        assert!(corp.posattr_size("tag").unwrap() > 0);
        assert!(corp.posattr_size("pos").is_err());
        assert!(corp.conf("NOSUCHKEY").is_err());
    }

    #[test]
    fn test_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Corpus::open(dir.path().join("nothing")).unwrap_err();
        assert!(err.to_string().contains("nothing"));
    }

    #[test]
    fn test_region() {
        let (_tc, corp) = corpus();
        let tokens = corp.region(0, 3, &[], &["s".to_string()]).unwrap();
        assert_eq!(tokens, vec!["<s>", "The", "cat", "sat"]);
        let tokens = corp
            .region(12, 100, &["word".to_string(), "tag".to_string()], &[])
            .unwrap();
        assert_eq!(tokens, vec!["dogs/NNS", "./."]);
        assert!(corp.region(5, 2, &[], &[]).is_err());
    }

    #[test]
    fn test_value_sizes_cached() {
        let (_tc, corp) = corpus();
        let first = corp.attr_value_sizes("doc", "genre").unwrap();
        let second = corp.attr_value_sizes("doc", "genre").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.total(), corp.size());
    }
}

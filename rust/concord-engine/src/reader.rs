//! Read-only views of an indexed corpus.
//!
//! All readers are `Send + Sync`: a corpus is opened read-only and may be shared
//! by independently constructed result sets on different threads.

use std::ops::Range;

use concord_common::Result;

use crate::Pos;

/// A positional attribute (per-token annotation such as `word`, `lemma`, `tag`).
///
/// Values are interned: every distinct string has a numeric id in
/// `0..id_range()`. Ids follow the engine's internal enumeration order, which
/// callers use as the tie-break when two values are otherwise equal.
pub trait PosAttrReader: Send + Sync {
    fn name(&self) -> &str;

    /// Number of distinct values.
    fn id_range(&self) -> u32;

    /// Value id at the given corpus position, `None` past the end of the corpus.
    fn pos2id(&self, pos: Pos) -> Option<u32>;

    /// String value of an id. Unknown ids yield an empty string.
    fn id2str(&self, id: u32) -> &str;

    fn str2id(&self, value: &str) -> Option<u32>;

    /// Number of corpus positions carrying the value.
    fn freq(&self, id: u32) -> u64;

    /// Ascending positions carrying the value.
    fn id2poss(&self, id: u32) -> &[Pos];

    fn pos2str(&self, pos: Pos) -> &str {
        match self.pos2id(pos) {
            Some(id) => self.id2str(id),
            None => "",
        }
    }
}

/// A structure (span annotation such as `doc`, `p` or `s`).
///
/// Instances are numbered `0..size()` in corpus order; their ranges are
/// sorted and never overlap.
pub trait StructReader: Send + Sync {
    fn name(&self) -> &str;

    /// Number of structure instances.
    fn size(&self) -> usize;

    /// Token range covered by the instance `num`.
    fn range(&self, num: usize) -> Option<Range<Pos>>;

    /// Number of the instance containing `pos`, if any.
    fn num_at_pos(&self, pos: Pos) -> Option<usize>;

    fn attr(&self, name: &str) -> Result<&dyn StructAttrReader>;

    fn attr_names(&self) -> Vec<&str>;
}

/// An attribute of a structure (e.g. `doc.genre`); values apply to whole
/// instances rather than to tokens.
pub trait StructAttrReader: Send + Sync {
    fn name(&self) -> &str;

    fn id_range(&self) -> u32;

    /// Value id of the structure instance `num`.
    fn num2id(&self, num: usize) -> Option<u32>;

    fn id2str(&self, id: u32) -> &str;

    fn str2id(&self, value: &str) -> Option<u32>;

    /// Ascending numbers of the instances carrying the value.
    fn id2nums(&self, id: u32) -> &[usize];
}

/// An opened corpus.
pub trait CorpusReader: Send + Sync {
    fn name(&self) -> &str;

    /// Number of token positions.
    fn size(&self) -> u64;

    /// Registry configuration value (`INFO`, `ATTRLIST`, `PATH`, ...).
    fn conf(&self, key: &str) -> Result<String>;

    /// Attribute used for bare `"..."` query terms.
    fn default_attr(&self) -> &str;

    fn attr(&self, name: &str) -> Result<&dyn PosAttrReader>;

    fn structure(&self, name: &str) -> Result<&dyn StructReader>;

    fn attr_names(&self) -> Vec<&str>;

    fn struct_names(&self) -> Vec<&str>;
}

/// Compiles a query string against a corpus and yields hit ranges.
///
/// Ranges are half-open token ranges ordered by start position.
pub trait QueryEvaluator: Send + Sync {
    fn evaluate(&self, corpus: &dyn CorpusReader, query: &str) -> Result<Vec<Range<Pos>>>;
}

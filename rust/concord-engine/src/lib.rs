//! Corpus storage and query evaluation collaborators for the concord boundary layer.
//!
//! The boundary crate never talks to a concrete engine. It consumes the reader
//! traits defined in [`reader`] and a [`QueryEvaluator`]:
//!
//! - [`CorpusReader`] exposes corpus size, registry configuration, positional
//!   attributes and structures.
//! - [`PosAttrReader`], [`StructReader`] and [`StructAttrReader`] give id/string
//!   lookups, frequencies and inverted position lists.
//! - [`QueryEvaluator`] turns a query string into ordered hit ranges.
//!
//! The crate also ships the in-memory backend used by the tools and tests:
//! a registry parser ([`registry`]), a vertical file loader ([`vertical`]),
//! the storage itself ([`mem`]) and a small token-pattern evaluator ([`query`]).

pub mod collation;
pub mod lexicon;
pub mod mem;
pub mod query;
pub mod ranges;
pub mod reader;
pub mod registry;
pub mod vertical;

pub use mem::{MemCorpus, MemCorpusBuilder};
pub use query::PatternEvaluator;
pub use reader::{CorpusReader, PosAttrReader, QueryEvaluator, StructAttrReader, StructReader};
pub use registry::Registry;

/// Corpus position (token index).
pub type Pos = u64;

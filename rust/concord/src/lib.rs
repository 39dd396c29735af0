//! The concord boundary layer.
//!
//! A [`Corpus`] is opened once and shared; every query produces a
//! [`Concordance`] bound to it. Statistics are derived from concordances:
//!
//! - [`freqs::freq_dist`] groups hits by an attribute criterion;
//! - [`colls::collocations`] ranks context words by an association measure;
//! - [`kwic::conc_examples`] renders a padded page of keyword-in-context lines.
//!
//! [`Corpus::attr_value_sizes`] works on corpus structure alone. Results
//! that cross the C boundary are shaped as the types in [`collections`].

pub mod collections;
pub mod colls;
pub mod conc;
pub mod config;
pub mod corpus;
pub mod freqs;
pub mod kwic;
pub mod subcorp;
pub mod ttsizes;

pub use collections::{IntVector, StrVector, ValueSizeIter, ValueSizeMap};
pub use colls::{CollArgs, CollItem, CollMeasure, CollocItems, Collocations};
pub use conc::{ConcSize, Concordance};
pub use config::ConcordConfig;
pub use corpus::Corpus;
pub use freqs::Freqs;
pub use kwic::{KwicArgs, KwicLine, KwicPage};
pub use subcorp::Subcorpus;

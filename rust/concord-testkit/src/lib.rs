//! Test utilities for the concord crates.
//!
//! Corpora are written as a registry file plus a vertical file into a
//! temporary directory that lives as long as the returned [`TestCorpus`].
//!
//! - [`TestCorpus::builder`] assembles a corpus token by token;
//! - [`TestCorpus::sample`] is a small fixed corpus shared by unit tests;
//! - [`data_gen`] produces larger corpora with a controlled number of hits.

pub mod data_gen;

mod corpus;

pub use corpus::{TestCorpus, TestCorpusBuilder};

//! Generated corpora for scenario tests.
//!
//! Generators are deterministic: the same arguments always produce the same
//! vertical file.

use crate::corpus::{TestCorpus, TestCorpusBuilder};

/// Word placed at every hit position by [`corpus_with_hits`].
pub const NEEDLE: &str = "needle";

const FILLER_VOCABULARY: usize = 500;
const SENTENCE_LEN: usize = 25;
const DOC_LEN: usize = 10_000;

/// A corpus of `size` tokens in which [`NEEDLE`] occurs exactly `hits` times,
/// spread evenly. All other tokens are drawn from a fixed filler vocabulary
/// (`w0`, `w1`, ...).
///
/// Attributes: `word`, `tag` (`N` for the needle, `F` for fillers).
/// Structures: `doc` with `id` (one instance per 10 000 tokens) and `s`.
pub fn corpus_with_hits(size: usize, hits: usize) -> anyhow::Result<TestCorpus> {
    anyhow::ensure!(hits <= size, "{hits} hits do not fit into {size} tokens");
    let stride = if hits == 0 { usize::MAX } else { size / hits };
    let mut rng = fastrand::Rng::with_seed(size as u64 ^ (hits as u64) << 32);

    let mut b = TestCorpusBuilder::new();
    b.name("generated")
        .attrs(&["word", "tag"])
        .structure("doc", &["id"])
        .structure("s", &[]);
    let mut placed = 0;
    for pos in 0..size {
        if pos % DOC_LEN == 0 {
            if pos > 0 {
                b.close("s").close("doc");
            }
            let id = format!("doc{}", pos / DOC_LEN);
            b.open("doc", &[("id", id.as_str())]).open("s", &[]);
        } else if pos % SENTENCE_LEN == 0 {
            b.close("s").open("s", &[]);
        }
        if placed < hits && pos % stride == stride / 2 {
            b.token(&[NEEDLE, "N"]);
            placed += 1;
        } else {
            let word = format!("w{}", rng.usize(..FILLER_VOCABULARY));
            b.token(&[word.as_str(), "F"]);
        }
    }
    if size > 0 {
        b.close("s").close("doc");
    }
    b.build()
}

/// `count` occurrences of `node`, each followed by its own collocate
/// (`c0`, `c1`, ...) and a separator token `|`.
pub fn node_with_collocates(count: usize) -> anyhow::Result<TestCorpus> {
    let mut b = TestCorpusBuilder::new();
    b.name("collocates").structure("s", &[]);
    for i in 0..count {
        let coll = format!("c{i}");
        b.open("s", &[])
            .token(&["node"])
            .token(&[coll.as_str()])
            .token(&["|"])
            .close("s");
    }
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_count() {
        let tc = corpus_with_hits(1_000, 10).unwrap();
        assert_eq!(tc.size(), 1_000);
        let vert = std::fs::read_to_string(tc.dir().join("generated.vert")).unwrap();
        let needles = vert
            .lines()
            .filter(|l| l.starts_with(&format!("{NEEDLE}\t")))
            .count();
        assert_eq!(needles, 10);
        assert!(corpus_with_hits(5, 6).is_err());
    }

    #[test]
    fn test_deterministic() {
        let a = corpus_with_hits(300, 3).unwrap();
        let b = corpus_with_hits(300, 3).unwrap();
        let va = std::fs::read_to_string(a.dir().join("generated.vert")).unwrap();
        let vb = std::fs::read_to_string(b.dir().join("generated.vert")).unwrap();
        assert_eq!(va, vb);
    }

    #[test]
    fn test_collocates() {
        let tc = node_with_collocates(50).unwrap();
        assert_eq!(tc.size(), 150);
    }
}

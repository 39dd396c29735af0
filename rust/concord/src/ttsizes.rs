//! Attribute value sizes ("text type" sizes).
//!
//! For a structural attribute such as `doc.genre`, the size of a value is the
//! number of tokens covered by the structure instances carrying it.

use concord_common::Result;
use concord_engine::CorpusReader;

use crate::collections::ValueSizeMap;

/// Computes the value to covered-token-count map of `structure.attr`.
///
/// Each value sums the lengths of the instances carrying it. Instances
/// without the attribute count under the empty value.
pub fn attr_value_sizes(
    corpus: &dyn CorpusReader,
    structure: &str,
    attr: &str,
) -> Result<ValueSizeMap> {
    let st = corpus.structure(structure)?;
    let sattr = st.attr(attr)?;

    let mut entries = Vec::with_capacity(sattr.id_range() as usize);
    for id in 0..sattr.id_range() {
        let size = sattr
            .id2nums(id)
            .iter()
            .filter_map(|&num| st.range(num))
            .map(|r| r.end - r.start)
            .sum();
        entries.push((sattr.id2str(id).to_string(), size));
    }
    tracing::debug!(
        structure,
        attr,
        values = entries.len(),
        "attribute value sizes computed"
    );
    Ok(ValueSizeMap::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_engine::{MemCorpusBuilder, Registry};

    #[test]
    fn test_value_sizes() {
        let reg = Registry::parse(
            "ATTRIBUTE word\nSTRUCTURE doc {\n ATTRIBUTE genre\n}\n",
            "/reg/tt",
        )
        .unwrap();
        let mut b = MemCorpusBuilder::new(reg).unwrap();
        for (genre, len) in [("news", 3), ("fiction", 2), ("news", 4)] {
            b.open_struct("doc", &[("genre", genre)]).unwrap();
            for _ in 0..len {
                b.push_token(&["w"]);
            }
            b.close_struct("doc").unwrap();
        }
        b.push_token(&["outside"]);
        b.open_struct("doc", &[]).unwrap();
        b.push_token(&["untyped"]);
        b.close_struct("doc").unwrap();
        let corp = b.build();

        let sizes = attr_value_sizes(&corp, "doc", "genre").unwrap();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.get(""), Some(1));
        assert_eq!(sizes.total(), 10);
        assert_eq!(sizes.get("news"), Some(7));
        assert_eq!(sizes.get("fiction"), Some(2));
        assert!(attr_value_sizes(&corp, "doc", "title").is_err());
        assert!(attr_value_sizes(&corp, "p", "genre").is_err());
    }
}

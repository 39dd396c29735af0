//! Info command implementation

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use concord::Corpus;

use crate::commands::{open_corpus, print_json};

#[derive(Serialize)]
struct CorpusInfo {
    name: String,
    path: String,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<String>,
    attributes: Vec<AttrInfo>,
    structures: Vec<StructInfo>,
}

#[derive(Serialize)]
struct AttrInfo {
    name: String,
    distinct_values: u64,
}

#[derive(Serialize)]
struct StructInfo {
    name: String,
    instances: u64,
}

pub fn run(corpus: &Path) -> Result<()> {
    let corpus = open_corpus(corpus)?;
    print_json(&collect(&corpus)?)
}

fn collect(corpus: &Corpus) -> Result<CorpusInfo> {
    let attributes = corpus
        .attributes()
        .iter()
        .map(|name| {
            Ok(AttrInfo {
                name: name.to_string(),
                distinct_values: corpus.posattr_size(name)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let structures = corpus
        .structures()
        .iter()
        .map(|name| {
            Ok(StructInfo {
                name: name.to_string(),
                instances: corpus.struct_size(name)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorpusInfo {
        name: corpus.name().to_string(),
        path: corpus.path().to_string(),
        size: corpus.size(),
        info: corpus.conf("INFO").ok(),
        attributes,
        structures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_testkit::TestCorpus;

    #[test]
    fn test_collect() {
        let tc = TestCorpus::sample().unwrap();
        let corpus = open_corpus(tc.registry_path()).unwrap();
        let info = collect(&corpus).unwrap();
        assert_eq!(info.name, "sample");
        assert_eq!(info.size, 14);
        assert_eq!(info.info.as_deref(), Some("Generated test corpus"));
        let names: Vec<&str> = info.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["word", "lemma", "tag"]);
        assert_eq!(info.structures[1].name, "s");
        assert_eq!(info.structures[1].instances, 3);
    }
}

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A corpus written to a temporary directory.
///
/// The directory is removed when the value is dropped, so keep it alive for
/// as long as the corpus is open.
pub struct TestCorpus {
    dir: TempDir,
    registry: PathBuf,
    size: u64,
}

impl TestCorpus {
    pub fn builder() -> TestCorpusBuilder {
        TestCorpusBuilder::new()
    }

    /// Two documents, three sentences, fourteen tokens:
    ///
    /// ```text
    /// <doc id="d1" genre="news">     The cat sat on the mat .
    /// <doc id="d2" genre="fiction">  A cat barked .  |  Big dogs .
    /// ```
    ///
    /// Attributes are `word`, `lemma` and `tag`.
    pub fn sample() -> anyhow::Result<TestCorpus> {
        let mut b = TestCorpus::builder();
        b.name("sample")
            .attrs(&["word", "lemma", "tag"])
            .structure("doc", &["id", "genre"])
            .structure("s", &[]);
        b.open("doc", &[("id", "d1"), ("genre", "news")]);
        b.sentence("The/the/DT cat/cat/NN sat/sit/VBD on/on/IN the/the/DT mat/mat/NN ././.");
        b.close("doc");
        b.open("doc", &[("id", "d2"), ("genre", "fiction")]);
        b.sentence("A/a/DT cat/cat/NN barked/bark/VBD ././.");
        b.sentence("Big/big/JJ dogs/dog/NNS ././.");
        b.close("doc");
        b.build()
    }

    /// Path of the registry file; pass it to `Corpus::open`.
    pub fn registry_path(&self) -> &Path {
        &self.registry
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Number of tokens written.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Collects registry declarations and vertical content.
///
/// Tokens are given either as attribute value slices ([`token`](Self::token))
/// or as whitespace separated `value/value/...` items
/// ([`sentence`](Self::sentence), which also wraps them in `<s>`).
#[derive(Debug, Clone)]
pub struct TestCorpusBuilder {
    name: String,
    attrs: Vec<String>,
    structs: Vec<(String, Vec<String>)>,
    vertical: String,
    size: u64,
}

impl Default for TestCorpusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCorpusBuilder {
    pub fn new() -> TestCorpusBuilder {
        TestCorpusBuilder {
            name: "testcorp".to_string(),
            attrs: vec!["word".to_string()],
            structs: Vec::new(),
            vertical: String::new(),
            size: 0,
        }
    }

    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    pub fn attrs(&mut self, attrs: &[&str]) -> &mut Self {
        self.attrs = attrs.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn structure(&mut self, name: &str, attrs: &[&str]) -> &mut Self {
        self.structs.push((
            name.to_string(),
            attrs.iter().map(|a| a.to_string()).collect(),
        ));
        self
    }

    pub fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.vertical.push('<');
        self.vertical.push_str(name);
        for (k, v) in attrs {
            self.vertical.push_str(&format!(" {k}=\"{v}\""));
        }
        self.vertical.push_str(">\n");
        self
    }

    pub fn close(&mut self, name: &str) -> &mut Self {
        self.vertical.push_str(&format!("</{name}>\n"));
        self
    }

    pub fn token(&mut self, values: &[&str]) -> &mut Self {
        self.vertical.push_str(&values.join("\t"));
        self.vertical.push('\n');
        self.size += 1;
        self
    }

    /// Appends `<s>`, the tokens of `text` and `</s>`.
    pub fn sentence(&mut self, text: &str) -> &mut Self {
        self.open("s", &[]);
        for item in text.split_whitespace() {
            let values: Vec<&str> = item.split('/').collect();
            self.token(&values);
        }
        self.close("s")
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn registry_text(&self) -> String {
        let mut reg = String::new();
        reg.push_str(&format!("NAME \"{}\"\n", self.name));
        reg.push_str(&format!("VERTICAL \"{}.vert\"\n", self.name));
        reg.push_str("INFO \"Generated test corpus\"\n");
        reg.push_str("ENCODING \"UTF-8\"\n");
        for attr in &self.attrs {
            reg.push_str(&format!("ATTRIBUTE {attr}\n"));
        }
        for (name, attrs) in &self.structs {
            if attrs.is_empty() {
                reg.push_str(&format!("STRUCTURE {name}\n"));
            } else {
                reg.push_str(&format!("STRUCTURE {name} {{\n"));
                for attr in attrs {
                    reg.push_str(&format!("    ATTRIBUTE {attr}\n"));
                }
                reg.push_str("}\n");
            }
        }
        reg
    }

    /// Writes the registry and vertical files into a fresh temporary directory.
    pub fn build(&self) -> anyhow::Result<TestCorpus> {
        let dir = tempfile::tempdir()?;
        let registry = dir.path().join(&self.name);
        std::fs::write(&registry, self.registry_text())?;
        std::fs::write(
            dir.path().join(format!("{}.vert", self.name)),
            &self.vertical,
        )?;
        Ok(TestCorpus {
            dir,
            registry,
            size: self.size,
        })
    }
}

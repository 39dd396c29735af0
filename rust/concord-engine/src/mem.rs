//! In-memory corpus storage.
//!
//! [`MemCorpus`] keeps every positional attribute as an id column with an
//! inverted index and every structure as a sorted list of instance ranges.
//! It is built either by the vertical loader or directly through
//! [`MemCorpusBuilder`].

use std::ops::Range;
use std::path::Path;

use concord_common::{Error, Result, verify_data};

use crate::lexicon::Lexicon;
use crate::reader::{CorpusReader, PosAttrReader, StructAttrReader, StructReader};
use crate::registry::Registry;
use crate::{Pos, ranges};

pub struct MemPosAttr {
    name: String,
    lexicon: Lexicon,
    ids: Vec<u32>,
    index: Vec<Vec<Pos>>,
}

impl PosAttrReader for MemPosAttr {
    fn name(&self) -> &str {
        &self.name
    }

    fn id_range(&self) -> u32 {
        self.lexicon.len()
    }

    fn pos2id(&self, pos: Pos) -> Option<u32> {
        self.ids.get(pos as usize).copied()
    }

    fn id2str(&self, id: u32) -> &str {
        self.lexicon.get(id).unwrap_or("")
    }

    fn str2id(&self, value: &str) -> Option<u32> {
        self.lexicon.find(value)
    }

    fn freq(&self, id: u32) -> u64 {
        self.index.get(id as usize).map_or(0, |p| p.len() as u64)
    }

    fn id2poss(&self, id: u32) -> &[Pos] {
        self.index.get(id as usize).map_or(&[], Vec::as_slice)
    }
}

pub struct MemStructAttr {
    name: String,
    lexicon: Lexicon,
    ids: Vec<u32>,
    index: Vec<Vec<usize>>,
}

impl StructAttrReader for MemStructAttr {
    fn name(&self) -> &str {
        &self.name
    }

    fn id_range(&self) -> u32 {
        self.lexicon.len()
    }

    fn num2id(&self, num: usize) -> Option<u32> {
        self.ids.get(num).copied()
    }

    fn id2str(&self, id: u32) -> &str {
        self.lexicon.get(id).unwrap_or("")
    }

    fn str2id(&self, value: &str) -> Option<u32> {
        self.lexicon.find(value)
    }

    fn id2nums(&self, id: u32) -> &[usize] {
        self.index.get(id as usize).map_or(&[], Vec::as_slice)
    }
}

pub struct MemStructure {
    name: String,
    ranges: Vec<Range<Pos>>,
    attrs: Vec<MemStructAttr>,
}

impl StructReader for MemStructure {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.ranges.len()
    }

    fn range(&self, num: usize) -> Option<Range<Pos>> {
        self.ranges.get(num).cloned()
    }

    fn num_at_pos(&self, pos: Pos) -> Option<usize> {
        ranges::find_containing(&self.ranges, pos)
    }

    fn attr(&self, name: &str) -> Result<&dyn StructAttrReader> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a as &dyn StructAttrReader)
            .ok_or_else(|| Error::not_found("structural attribute", format!("{}.{name}", self.name)))
    }

    fn attr_names(&self) -> Vec<&str> {
        self.attrs.iter().map(|a| a.name.as_str()).collect()
    }
}

/// A fully loaded corpus.
pub struct MemCorpus {
    name: String,
    registry: Registry,
    size: u64,
    attrs: Vec<MemPosAttr>,
    structs: Vec<MemStructure>,
}

impl MemCorpus {
    /// Opens a corpus from its registry file, loading the vertical file the
    /// registry's `VERTICAL` entry points to.
    pub fn open(registry_path: impl AsRef<Path>) -> Result<MemCorpus> {
        let registry = Registry::load(registry_path)?;
        let vertical = registry.resolve_path("VERTICAL")?;
        crate::vertical::load(registry, &vertical)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl CorpusReader for MemCorpus {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn conf(&self, key: &str) -> Result<String> {
        self.registry.get(key)
    }

    fn default_attr(&self) -> &str {
        self.registry.default_attr()
    }

    fn attr(&self, name: &str) -> Result<&dyn PosAttrReader> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a as &dyn PosAttrReader)
            .ok_or_else(|| Error::not_found("attribute", name))
    }

    fn structure(&self, name: &str) -> Result<&dyn StructReader> {
        self.structs
            .iter()
            .find(|s| s.name == name)
            .map(|s| s as &dyn StructReader)
            .ok_or_else(|| Error::not_found("structure", name))
    }

    fn attr_names(&self) -> Vec<&str> {
        self.attrs.iter().map(|a| a.name.as_str()).collect()
    }

    fn struct_names(&self) -> Vec<&str> {
        self.structs.iter().map(|s| s.name.as_str()).collect()
    }
}

struct OpenStruct {
    start: Pos,
    values: Vec<String>,
}

struct StructBuilder {
    name: String,
    attr_names: Vec<String>,
    ranges: Vec<Range<Pos>>,
    values: Vec<Vec<String>>,
    open: Option<OpenStruct>,
}

/// Incremental builder of a [`MemCorpus`].
///
/// Tokens are appended in corpus order; structures are opened and closed
/// around them. Opening a structure while another instance of the same
/// structure is open closes the previous one first, so instances of one
/// structure never nest.
pub struct MemCorpusBuilder {
    registry: Registry,
    attr_names: Vec<String>,
    lexicons: Vec<Lexicon>,
    columns: Vec<Vec<u32>>,
    structs: Vec<StructBuilder>,
    size: u64,
}

impl MemCorpusBuilder {
    /// Creates a builder for the attributes and structures declared in `registry`.
    pub fn new(registry: Registry) -> Result<MemCorpusBuilder> {
        verify_data!(attributes, !registry.attrs().is_empty());
        let attr_names: Vec<String> = registry.attrs().iter().map(|a| a.name.clone()).collect();
        let structs = registry
            .structs()
            .iter()
            .map(|s| StructBuilder {
                name: s.name.clone(),
                attr_names: s.attrs.iter().map(|a| a.name.clone()).collect(),
                ranges: Vec::new(),
                values: Vec::new(),
                open: None,
            })
            .collect();
        Ok(MemCorpusBuilder {
            lexicons: vec![Lexicon::new(); attr_names.len()],
            columns: vec![Vec::new(); attr_names.len()],
            attr_names,
            structs,
            registry,
            size: 0,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Appends one token. Values are matched to attributes by declaration
    /// order; missing trailing values are stored as empty strings and extra
    /// values are ignored.
    pub fn push_token<S: AsRef<str>>(&mut self, values: &[S]) {
        for (i, (lexicon, column)) in self.lexicons.iter_mut().zip(&mut self.columns).enumerate() {
            let value = values.get(i).map(|v| v.as_ref()).unwrap_or("");
            column.push(lexicon.intern(value));
        }
        self.size += 1;
    }

    pub fn has_structure(&self, name: &str) -> bool {
        self.structs.iter().any(|s| s.name == name)
    }

    /// Opens a structure instance at the current position.
    pub fn open_struct(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let size = self.size;
        let st = self.struct_mut(name)?;
        if st.open.is_some() {
            close(st, size);
        }
        let values = st
            .attr_names
            .iter()
            .map(|attr| {
                attrs
                    .iter()
                    .find(|(k, _)| *k == attr.as_str())
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default()
            })
            .collect();
        st.open = Some(OpenStruct {
            start: size,
            values,
        });
        Ok(())
    }

    /// Closes the open instance of a structure at the current position.
    /// Closing a structure that is not open is reported as a format error.
    pub fn close_struct(&mut self, name: &str) -> Result<()> {
        let size = self.size;
        let st = self.struct_mut(name)?;
        if st.open.is_none() {
            return Err(Error::invalid_format(
                name,
                format!("closing tag without an open instance at position {size}"),
            ));
        }
        close(st, size);
        Ok(())
    }

    fn struct_mut(&mut self, name: &str) -> Result<&mut StructBuilder> {
        self.structs
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::not_found("structure", name))
    }

    pub fn build(mut self) -> MemCorpus {
        let size = self.size;
        for st in &mut self.structs {
            if st.open.is_some() {
                tracing::warn!(structure = %st.name, "unclosed structure closed at corpus end");
                close(st, size);
            }
        }
        let attrs = self
            .attr_names
            .into_iter()
            .zip(self.lexicons)
            .zip(self.columns)
            .map(|((name, lexicon), ids)| {
                let mut index = vec![Vec::new(); lexicon.len() as usize];
                for (pos, &id) in ids.iter().enumerate() {
                    index[id as usize].push(pos as Pos);
                }
                MemPosAttr {
                    name,
                    lexicon,
                    ids,
                    index,
                }
            })
            .collect();
        let structs = self.structs.into_iter().map(finish_struct).collect();
        let name = self.registry.name();
        tracing::debug!(corpus = %name, size, "in-memory corpus built");
        MemCorpus {
            name,
            registry: self.registry,
            size,
            attrs,
            structs,
        }
    }
}

fn close(st: &mut StructBuilder, end: Pos) {
    if let Some(open) = st.open.take() {
        if open.start < end {
            st.ranges.push(open.start..end);
            st.values.push(open.values);
        } else {
            tracing::debug!(structure = %st.name, pos = end, "empty structure instance dropped");
        }
    }
}

fn finish_struct(st: StructBuilder) -> MemStructure {
    let attrs = st
        .attr_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut lexicon = Lexicon::new();
            let mut ids = Vec::with_capacity(st.values.len());
            let mut index: Vec<Vec<usize>> = Vec::new();
            for (num, values) in st.values.iter().enumerate() {
                let id = lexicon.intern(&values[i]);
                if id as usize == index.len() {
                    index.push(Vec::new());
                }
                index[id as usize].push(num);
                ids.push(id);
            }
            MemStructAttr {
                name: name.clone(),
                lexicon,
                ids,
                index,
            }
        })
        .collect();
    MemStructure {
        name: st.name,
        ranges: st.ranges,
        attrs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::parse(
            "ATTRIBUTE word\nATTRIBUTE lemma\nSTRUCTURE doc {\n ATTRIBUTE genre\n}\nSTRUCTURE s\n",
            "/reg/mini",
        )
        .unwrap()
    }

    fn build() -> MemCorpus {
        let mut b = MemCorpusBuilder::new(registry()).unwrap();
        b.open_struct("doc", &[("genre", "news")]).unwrap();
        b.open_struct("s", &[]).unwrap();
        for (w, l) in [("Dogs", "dog"), ("bark", "bark"), (".", ".")] {
            b.push_token(&[w, l]);
        }
        b.close_struct("s").unwrap();
        b.close_struct("doc").unwrap();
        b.open_struct("doc", &[("genre", "fiction")]).unwrap();
        b.open_struct("s", &[]).unwrap();
        b.push_token(&["A", "a"]);
        b.push_token(&["dog", "dog"]);
        b.close_struct("s").unwrap();
        b.close_struct("doc").unwrap();
        b.build()
    }

    #[test]
    fn test_positional_attrs() {
        let corp = build();
        assert_eq!(corp.size(), 5);
        let lemma = corp.attr("lemma").unwrap();
        let dog = lemma.str2id("dog").unwrap();
        assert_eq!(lemma.freq(dog), 2);
        assert_eq!(lemma.id2poss(dog), &[0, 4]);
        assert_eq!(lemma.pos2str(1), "bark");
        assert_eq!(lemma.pos2id(5), None);
        assert_eq!(lemma.id_range(), 4);
        assert!(corp.attr("tag").is_err());
    }

    #[test]
    fn test_structures() {
        let corp = build();
        let doc = corp.structure("doc").unwrap();
        assert_eq!(doc.size(), 2);
        assert_eq!(doc.range(1), Some(3..5));
        assert_eq!(doc.num_at_pos(2), Some(0));
        assert_eq!(doc.num_at_pos(3), Some(1));
        let genre = doc.attr("genre").unwrap();
        assert_eq!(genre.id2str(genre.num2id(1).unwrap()), "fiction");
        assert_eq!(genre.id2nums(genre.str2id("news").unwrap()), &[0]);
        assert!(doc.attr("id").is_err());
        assert_eq!(corp.struct_names(), vec!["doc", "s"]);
    }

    #[test]
    fn test_reopen_closes_previous() {
        let mut b = MemCorpusBuilder::new(registry()).unwrap();
        b.open_struct("s", &[]).unwrap();
        b.push_token(&["a", "a"]);
        b.open_struct("s", &[]).unwrap();
        b.push_token(&["b", "b"]);
        let corp = b.build();
        let s = corp.structure("s").unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(s.range(0), Some(0..1));
        assert_eq!(s.range(1), Some(1..2));
    }

    #[test]
    fn test_close_without_open() {
        let mut b = MemCorpusBuilder::new(registry()).unwrap();
        assert!(b.close_struct("s").is_err());
        assert!(b.open_struct("p", &[]).is_err());
    }
}

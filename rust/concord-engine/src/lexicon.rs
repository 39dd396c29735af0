//! String interning for attribute values.

use ahash::AHashMap;

/// Bidirectional mapping between attribute values and dense numeric ids.
///
/// Ids are assigned in first-intern order, so the enumeration order of a
/// lexicon built from a vertical file follows the first occurrence of each
/// value in the corpus.
#[derive(Debug, Default, Clone)]
pub struct Lexicon {
    values: Vec<String>,
    ids: AHashMap<String, u32>,
}

impl Lexicon {
    pub fn new() -> Lexicon {
        Lexicon::default()
    }

    /// Returns the id of `value`, assigning a new one if it was not seen yet.
    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.values.len() as u32;
        self.values.push(value.to_string());
        self.ids.insert(value.to_string(), id);
        id
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.values.get(id as usize).map(String::as_str)
    }

    pub fn find(&self, value: &str) -> Option<u32> {
        self.ids.get(value).copied()
    }

    pub fn len(&self) -> u32 {
        self.values.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.values
            .iter()
            .enumerate()
            .map(|(id, v)| (id as u32, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_assigns_first_seen_order() {
        let mut lex = Lexicon::new();
        assert_eq!(lex.intern("the"), 0);
        assert_eq!(lex.intern("cat"), 1);
        assert_eq!(lex.intern("the"), 0);
        assert_eq!(lex.len(), 2);
        assert_eq!(lex.get(1), Some("cat"));
        assert_eq!(lex.get(2), None);
        assert_eq!(lex.find("cat"), Some(1));
        assert_eq!(lex.find("dog"), None);
        let all: Vec<_> = lex.iter().collect();
        assert_eq!(all, vec![(0, "the"), (1, "cat")]);
    }
}

//! Corpus registry (configuration) files.
//!
//! A registry describes one corpus:
//!
//! ```text
//! NAME "Susanne sample"
//! PATH "./data"
//! VERTICAL "./susanne.vert"
//! INFO "A small sample corpus"
//! ATTRIBUTE word
//! ATTRIBUTE lemma {
//!     LABEL "lemma"
//! }
//! STRUCTURE doc {
//!     ATTRIBUTE id
//!     ATTRIBUTE genre
//! }
//! STRUCTURE s
//! ```
//!
//! Values are either bare words or double-quoted strings (`\"` and `\\`
//! escapes). `#` starts a comment running to the end of the line.

use std::path::{Path, PathBuf};

use concord_common::{Error, Result};

/// An `ATTRIBUTE` declaration, either positional or structural.
#[derive(Debug, Clone, Default)]
pub struct AttrDef {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

/// A `STRUCTURE` declaration.
#[derive(Debug, Clone, Default)]
pub struct StructDef {
    pub name: String,
    pub attrs: Vec<AttrDef>,
    pub entries: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    path: PathBuf,
    entries: Vec<(String, String)>,
    attrs: Vec<AttrDef>,
    structs: Vec<StructDef>,
}

impl Registry {
    /// Reads and parses the registry file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Registry> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        Registry::parse(&text, path)
    }

    /// Parses registry text; `path` is used for relative path resolution and
    /// as the fallback corpus name.
    pub fn parse(text: &str, path: impl AsRef<Path>) -> Result<Registry> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let mut reg = Registry {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        };
        while let Some(tok) = parser.next() {
            match tok {
                Token::Word(key) if key == "ATTRIBUTE" => {
                    let name = parser.expect_value("ATTRIBUTE")?;
                    let entries = parser.optional_block_entries()?;
                    reg.attrs.push(AttrDef { name, entries });
                }
                Token::Word(key) if key == "STRUCTURE" => {
                    let name = parser.expect_value("STRUCTURE")?;
                    reg.structs.push(parser.struct_body(name)?);
                }
                Token::Word(key) => {
                    let value = parser.expect_value(&key)?;
                    reg.entries.push((key, value));
                }
                other => {
                    return Err(Error::invalid_format(
                        reg.path.display().to_string(),
                        format!("unexpected {other:?} at top level"),
                    ));
                }
            }
        }
        Ok(reg)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Corpus name: `NAME` if present, otherwise the registry file name.
    pub fn name(&self) -> String {
        self.entry("NAME").map(str::to_string).unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    pub fn attrs(&self) -> &[AttrDef] {
        &self.attrs
    }

    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    pub fn default_attr(&self) -> &str {
        self.entry("DEFAULTATTR")
            .or_else(|| self.attrs.first().map(|a| a.name.as_str()))
            .unwrap_or("word")
    }

    fn entry(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Configuration value by key, including the derived `ATTRLIST`,
    /// `STRUCTLIST` and `STRUCTATTRLIST` lists.
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "ATTRLIST" => Ok(join_names(self.attrs.iter().map(|a| a.name.as_str()))),
            "STRUCTLIST" => Ok(join_names(self.structs.iter().map(|s| s.name.as_str()))),
            "STRUCTATTRLIST" => {
                let pairs: Vec<String> = self
                    .structs
                    .iter()
                    .flat_map(|s| s.attrs.iter().map(move |a| format!("{}.{}", s.name, a.name)))
                    .collect();
                Ok(pairs.join(","))
            }
            "NAME" => Ok(self.name()),
            "DEFAULTATTR" => Ok(self.default_attr().to_string()),
            _ => self
                .entry(key)
                .map(str::to_string)
                .ok_or_else(|| Error::not_found("corpus configuration key", key)),
        }
    }

    /// Resolves a path-valued entry relative to the registry file's directory.
    pub fn resolve_path(&self, key: &str) -> Result<PathBuf> {
        let value = self.get(key)?;
        let p = PathBuf::from(&value);
        if p.is_absolute() {
            return Ok(p);
        }
        let base = self.path.parent().unwrap_or_else(|| Path::new("."));
        Ok(base.join(p))
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(",")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    Open,
    Close,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '{' => {
                chars.next();
                tokens.push(Token::Open);
            }
            '}' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => value.push(c),
                    }
                }
                if !closed {
                    return Err(Error::invalid_format("registry", "unterminated string"));
                }
                tokens.push(Token::Quoted(value));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expect_value(&mut self, key: &str) -> Result<String> {
        match self.next() {
            Some(Token::Word(v)) | Some(Token::Quoted(v)) => Ok(v),
            _ => Err(Error::invalid_format(
                "registry",
                format!("missing value for {key}"),
            )),
        }
    }

    fn optional_block_entries(&mut self) -> Result<Vec<(String, String)>> {
        if self.peek() != Some(&Token::Open) {
            return Ok(Vec::new());
        }
        self.next();
        let mut entries = Vec::new();
        loop {
            match self.next() {
                Some(Token::Close) => return Ok(entries),
                Some(Token::Word(key)) => {
                    let value = self.expect_value(&key)?;
                    entries.push((key, value));
                }
                _ => return Err(Error::invalid_format("registry", "unterminated block")),
            }
        }
    }

    fn struct_body(&mut self, name: String) -> Result<StructDef> {
        let mut def = StructDef {
            name,
            ..Default::default()
        };
        if self.peek() != Some(&Token::Open) {
            return Ok(def);
        }
        self.next();
        loop {
            match self.next() {
                Some(Token::Close) => return Ok(def),
                Some(Token::Word(key)) if key == "ATTRIBUTE" => {
                    let name = self.expect_value("ATTRIBUTE")?;
                    let entries = self.optional_block_entries()?;
                    def.attrs.push(AttrDef { name, entries });
                }
                Some(Token::Word(key)) => {
                    let value = self.expect_value(&key)?;
                    def.entries.push((key, value));
                }
                _ => {
                    return Err(Error::invalid_format(
                        "registry",
                        format!("unterminated STRUCTURE {}", def.name),
                    ));
                }
            }
        }
    }
}

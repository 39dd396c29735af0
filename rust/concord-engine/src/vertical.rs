//! Vertical file loader.
//!
//! A vertical file holds one token per line with tab-separated positional
//! attribute values; structure boundaries are XML-like tags on their own
//! lines:
//!
//! ```text
//! <doc id="d1" genre="news">
//! <s>
//! Dogs	dog	NNS
//! bark	bark	VBP
//! </s>
//! </doc>
//! ```
//!
//! Self-closing tags (`<g/>`) and blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use concord_common::{Error, Result};

use crate::mem::{MemCorpus, MemCorpusBuilder};
use crate::registry::Registry;

#[derive(Debug, PartialEq, Eq)]
enum Tag {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Close(String),
    Empty,
}

/// Loads the vertical file at `path` using the layout declared in `registry`.
pub fn load(registry: Registry, path: &Path) -> Result<MemCorpus> {
    let file = File::open(path).map_err(|e| Error::io(path.display().to_string(), e))?;
    tracing::debug!(vertical = %path.display(), "loading vertical file");
    parse(registry, BufReader::new(file))
}

/// Parses vertical data from any buffered reader.
pub fn parse<R: BufRead>(registry: Registry, reader: R) -> Result<MemCorpus> {
    let mut builder = MemCorpusBuilder::new(registry)?;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io(format!("vertical line {}", line_no + 1), e))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('<') && line.trim_end().ends_with('>') {
            match parse_tag(line.trim_end(), line_no + 1)? {
                Tag::Open { name, attrs } => {
                    let attrs: Vec<(&str, &str)> = attrs
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str()))
                        .collect();
                    builder
                        .open_struct(&name, &attrs)
                        .map_err(|e| located(e, line_no + 1))?;
                }
                Tag::Close(name) => {
                    builder
                        .close_struct(&name)
                        .map_err(|e| located(e, line_no + 1))?;
                }
                Tag::Empty => {}
            }
            continue;
        }
        let values: Vec<&str> = line.split('\t').collect();
        builder.push_token(&values);
    }
    Ok(builder.build())
}

fn located(err: Error, line_no: usize) -> Error {
    Error::invalid_format(format!("vertical line {line_no}"), err.to_string())
}

fn parse_tag(line: &str, line_no: usize) -> Result<Tag> {
    let inner = &line[1..line.len() - 1];
    if inner.ends_with('/') {
        return Ok(Tag::Empty);
    }
    if let Some(name) = inner.strip_prefix('/') {
        return Ok(Tag::Close(name.trim().to_string()));
    }
    let name_end = inner
        .find(char::is_whitespace)
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_string();
    if name.is_empty() {
        return Err(Error::invalid_format(
            format!("vertical line {line_no}"),
            "tag without a name",
        ));
    }
    let mut attrs = Vec::new();
    let mut rest = inner[name_end..].trim_start();
    while !rest.is_empty() {
        let eq = rest.find('=').ok_or_else(|| {
            Error::invalid_format(format!("vertical line {line_no}"), "attribute without value")
        })?;
        let key = rest[..eq].trim().to_string();
        let after = rest[eq + 1..].trim_start();
        let value_body = after.strip_prefix('"').ok_or_else(|| {
            Error::invalid_format(format!("vertical line {line_no}"), "unquoted attribute value")
        })?;
        let close = value_body.find('"').ok_or_else(|| {
            Error::invalid_format(format!("vertical line {line_no}"), "unterminated attribute value")
        })?;
        attrs.push((key, value_body[..close].to_string()));
        rest = value_body[close + 1..].trim_start();
    }
    Ok(Tag::Open { name, attrs })
}

//! A small token-pattern query evaluator.
//!
//! The language covers what the boundary layer needs to be exercised:
//!
//! ```text
//! query   := token+ ( "within" "<" NAME "/" ">" )?
//! token   := "[" cond? "]" | STRING
//! cond    := and ( "|" and )*
//! and     := unary ( "&" unary )*
//! unary   := "!" unary | "(" cond ")" | NAME ( "=" | "!=" ) STRING
//! STRING  := '"' regex '"' ( "%c" )?
//! ```
//!
//! A bare `STRING` token compares the corpus default attribute. Regular
//! expressions match whole values; `%c` makes the comparison case-insensitive.
//! `[]` matches any token.

use std::ops::Range;

use regex::{Regex, RegexBuilder};

use concord_common::{Error, Result};

use crate::Pos;
use crate::reader::{CorpusReader, PosAttrReader, QueryEvaluator};

/// The bundled [`QueryEvaluator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternEvaluator;

impl QueryEvaluator for PatternEvaluator {
    fn evaluate(&self, corpus: &dyn CorpusReader, query: &str) -> Result<Vec<Range<Pos>>> {
        let parsed = parse(query)?;
        let tokens = parsed
            .tokens
            .iter()
            .map(|cond| compile(cond, corpus, query))
            .collect::<Result<Vec<_>>>()?;
        let within = match &parsed.within {
            Some(name) => Some(corpus.structure(name)?),
            None => None,
        };

        let size = corpus.size();
        let len = tokens.len() as u64;
        let starts = tokens[0]
            .candidates()
            .unwrap_or_else(|| (0..size).collect());
        let mut hits = Vec::new();
        for start in starts {
            if start + len > size {
                break;
            }
            let matched = tokens
                .iter()
                .enumerate()
                .all(|(i, t)| t.matches(start + i as u64));
            if !matched {
                continue;
            }
            let hit = start..start + len;
            if let Some(st) = within {
                let inside = st
                    .num_at_pos(hit.start)
                    .and_then(|num| st.range(num))
                    .is_some_and(|r| hit.end <= r.end);
                if !inside {
                    continue;
                }
            }
            hits.push(hit);
        }
        tracing::debug!(query, hits = hits.len(), "query evaluated");
        Ok(hits)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Cond {
    Any,
    Cmp {
        attr: Option<String>,
        pattern: String,
        ignore_case: bool,
        negated: bool,
    },
    Not(Box<Cond>),
    And(Vec<Cond>),
    Or(Vec<Cond>),
}

#[derive(Debug, Clone, PartialEq)]
struct TokenQuery {
    tokens: Vec<Cond>,
    within: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    LBracket,
    RBracket,
    LParen,
    RParen,
    And,
    Or,
    Not,
    Eq,
    NotEq,
    Lt,
    Gt,
    Slash,
    Str { value: String, ignore_case: bool },
    Name(String),
}

fn lex(query: &str) -> Result<Vec<Tok>> {
    let err = |msg: &str| Error::query(query, msg);
    let mut toks = Vec::new();
    let mut chars = query.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '[' => toks.push(Tok::LBracket),
            ']' => toks.push(Tok::RBracket),
            '(' => toks.push(Tok::LParen),
            ')' => toks.push(Tok::RParen),
            '&' => toks.push(Tok::And),
            '|' => toks.push(Tok::Or),
            '<' => toks.push(Tok::Lt),
            '>' => toks.push(Tok::Gt),
            '/' => toks.push(Tok::Slash),
            '=' => toks.push(Tok::Eq),
            '!' => {
                if chars.peek() == Some(&'=') {
                    chars.next();
                    toks.push(Tok::NotEq);
                } else {
                    toks.push(Tok::Not);
                }
            }
            '"' => {
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some('"') => value.push('"'),
                            Some(other) => {
                                value.push('\\');
                                value.push(other);
                            }
                            None => return Err(err("dangling escape")),
                        },
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => value.push(c),
                    }
                }
                if !closed {
                    return Err(err("unterminated string"));
                }
                let mut ignore_case = false;
                if chars.peek() == Some(&'%') {
                    chars.next();
                    match chars.next() {
                        Some('c') => ignore_case = true,
                        Some(flag) => return Err(err(&format!("unsupported flag %{flag}"))),
                        None => return Err(err("missing flag after %")),
                    }
                }
                toks.push(Tok::Str { value, ignore_case });
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut name = c.to_string();
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' || n == '.' || n == '-' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(Tok::Name(name));
            }
            other => return Err(err(&format!("unexpected character '{other}'"))),
        }
    }
    Ok(toks)
}

struct Parser<'q> {
    query: &'q str,
    toks: Vec<Tok>,
    pos: usize,
}

fn parse(query: &str) -> Result<TokenQuery> {
    let mut p = Parser {
        query,
        toks: lex(query)?,
        pos: 0,
    };
    let mut tokens = Vec::new();
    let mut within = None;
    while let Some(tok) = p.peek().cloned() {
        match tok {
            Tok::LBracket => {
                p.bump();
                if p.peek() == Some(&Tok::RBracket) {
                    p.bump();
                    tokens.push(Cond::Any);
                } else {
                    let cond = p.or_expr()?;
                    p.expect(&Tok::RBracket)?;
                    tokens.push(cond);
                }
            }
            Tok::Str { value, ignore_case } => {
                p.bump();
                tokens.push(Cond::Cmp {
                    attr: None,
                    pattern: value,
                    ignore_case,
                    negated: false,
                });
            }
            Tok::Name(name) if name == "within" => {
                p.bump();
                p.expect(&Tok::Lt)?;
                let name = p.name()?;
                p.expect(&Tok::Slash)?;
                p.expect(&Tok::Gt)?;
                within = Some(name);
                if p.peek().is_some() {
                    return Err(p.error("unexpected input after within clause"));
                }
            }
            _ => return Err(p.error("expected token specification")),
        }
    }
    if tokens.is_empty() {
        return Err(Error::query(query, "empty query"));
    }
    Ok(TokenQuery { tokens, within })
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn error(&self, msg: &str) -> Error {
        Error::query(self.query, format!("{msg} (token {})", self.pos + 1))
    }

    fn expect(&mut self, tok: &Tok) -> Result<()> {
        if self.peek() == Some(tok) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(&format!("expected {tok:?}")))
        }
    }

    fn name(&mut self) -> Result<String> {
        match self.bump() {
            Some(Tok::Name(n)) => Ok(n),
            _ => Err(self.error("expected a name")),
        }
    }

    fn or_expr(&mut self) -> Result<Cond> {
        let mut items = vec![self.and_expr()?];
        while self.peek() == Some(&Tok::Or) {
            self.bump();
            items.push(self.and_expr()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Cond::Or(items)
        })
    }

    fn and_expr(&mut self) -> Result<Cond> {
        let mut items = vec![self.unary()?];
        while self.peek() == Some(&Tok::And) {
            self.bump();
            items.push(self.unary()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Cond::And(items)
        })
    }

    fn unary(&mut self) -> Result<Cond> {
        match self.bump() {
            Some(Tok::Not) => Ok(Cond::Not(Box::new(self.unary()?))),
            Some(Tok::LParen) => {
                let cond = self.or_expr()?;
                self.expect(&Tok::RParen)?;
                Ok(cond)
            }
            Some(Tok::Name(attr)) => {
                let negated = match self.bump() {
                    Some(Tok::Eq) => false,
                    Some(Tok::NotEq) => true,
                    _ => return Err(self.error("expected '=' or '!='")),
                };
                match self.bump() {
                    Some(Tok::Str { value, ignore_case }) => Ok(Cond::Cmp {
                        attr: Some(attr),
                        pattern: value,
                        ignore_case,
                        negated,
                    }),
                    _ => Err(self.error("expected a quoted value")),
                }
            }
            _ => Err(self.error("expected a condition")),
        }
    }
}

enum Compiled<'c> {
    Any,
    Set {
        attr: &'c dyn PosAttrReader,
        matches: Vec<bool>,
        negated: bool,
    },
    Not(Box<Compiled<'c>>),
    And(Vec<Compiled<'c>>),
    Or(Vec<Compiled<'c>>),
}

fn compile<'c>(cond: &Cond, corpus: &'c dyn CorpusReader, query: &str) -> Result<Compiled<'c>> {
    Ok(match cond {
        Cond::Any => Compiled::Any,
        Cond::Cmp {
            attr,
            pattern,
            ignore_case,
            negated,
        } => {
            let attr = corpus.attr(attr.as_deref().unwrap_or(corpus.default_attr()))?;
            let regex = build_regex(pattern, *ignore_case)
                .map_err(|e| Error::query(query, e.to_string()))?;
            let matches = (0..attr.id_range())
                .map(|id| regex.is_match(attr.id2str(id)))
                .collect();
            Compiled::Set {
                attr,
                matches,
                negated: *negated,
            }
        }
        Cond::Not(inner) => Compiled::Not(Box::new(compile(inner, corpus, query)?)),
        Cond::And(items) => Compiled::And(
            items
                .iter()
                .map(|c| compile(c, corpus, query))
                .collect::<Result<_>>()?,
        ),
        Cond::Or(items) => Compiled::Or(
            items
                .iter()
                .map(|c| compile(c, corpus, query))
                .collect::<Result<_>>()?,
        ),
    })
}

fn build_regex(pattern: &str, ignore_case: bool) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(ignore_case)
        .build()
}

impl Compiled<'_> {
    fn matches(&self, pos: Pos) -> bool {
        match self {
            Compiled::Any => true,
            Compiled::Set {
                attr,
                matches,
                negated,
            } => match attr.pos2id(pos) {
                Some(id) => matches[id as usize] != *negated,
                None => false,
            },
            Compiled::Not(inner) => !inner.matches(pos),
            Compiled::And(items) => items.iter().all(|c| c.matches(pos)),
            Compiled::Or(items) => items.iter().any(|c| c.matches(pos)),
        }
    }

    /// Ascending positions that can possibly match, when they can be read off
    /// the inverted index; `None` means every position is a candidate.
    fn candidates(&self) -> Option<Vec<Pos>> {
        match self {
            Compiled::Set {
                attr,
                matches,
                negated: false,
            } => {
                let mut poss: Vec<Pos> = matches
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| **m)
                    .flat_map(|(id, _)| attr.id2poss(id as u32).iter().copied())
                    .collect();
                poss.sort_unstable();
                Some(poss)
            }
            Compiled::And(items) => items
                .iter()
                .filter_map(Compiled::candidates)
                .min_by_key(Vec::len),
            Compiled::Or(items) => {
                let mut all = Vec::new();
                for item in items {
                    all.extend(item.candidates()?);
                }
                all.sort_unstable();
                all.dedup();
                Some(all)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::{MemCorpus, MemCorpusBuilder};
    use crate::registry::Registry;

    fn corpus() -> MemCorpus {
        let reg = Registry::parse(
            "ATTRIBUTE word\nATTRIBUTE tag\nSTRUCTURE s\n",
            "/reg/q",
        )
        .unwrap();
        let mut b = MemCorpusBuilder::new(reg).unwrap();
        b.open_struct("s", &[]).unwrap();
        for (w, t) in [("The", "DT"), ("big", "JJ"), ("dog", "NN"), ("barks", "VB")] {
            b.push_token(&[w, t]);
        }
        b.close_struct("s").unwrap();
        b.open_struct("s", &[]).unwrap();
        for (w, t) in [("the", "DT"), ("dog", "NN")] {
            b.push_token(&[w, t]);
        }
        b.close_struct("s").unwrap();
        b.build()
    }

    fn eval(q: &str) -> Vec<Range<Pos>> {
        PatternEvaluator.evaluate(&corpus(), q).unwrap()
    }

    #[test]
    fn test_single_token() {
        assert_eq!(eval(r#"[word="dog"]"#), vec![2..3, 5..6]);
        assert_eq!(eval(r#""dog""#), vec![2..3, 5..6]);
        assert_eq!(eval(r#"[word="the"]"#), vec![4..5]);
        assert_eq!(eval(r#"[word="the"%c]"#), vec![0..1, 4..5]);
    }

    #[test]
    fn test_sequences_and_any() {
        assert_eq!(eval(r#"[tag="DT"] [] [tag="NN"]"#), vec![0..3]);
        assert_eq!(eval(r#"[tag="DT"] [tag="NN"]"#), vec![4..6]);
        assert_eq!(eval(r#"[tag="NN"] []"#), vec![2..4]);
    }

    #[test]
    fn test_boolean_conditions() {
        assert_eq!(eval(r#"[tag="NN|JJ" & word!="big"]"#), vec![2..3, 5..6]);
        assert_eq!(eval(r#"[!(tag="DT") & !tag="NN"]"#), vec![1..2, 3..4]);
        assert_eq!(eval(r#"[word="b.*" | tag="DT"]"#), vec![0..1, 1..2, 3..4, 4..5]);
    }

    #[test]
    fn test_within() {
        assert_eq!(eval(r#"[tag="VB"] [] within <s/>"#), Vec::<Range<Pos>>::new());
        assert_eq!(eval(r#"[tag="NN"] [] within <s/>"#), vec![2..4]);
    }

    #[test]
    fn test_errors() {
        let corp = corpus();
        for q in [
            "",
            "[word=\"dog\"",
            "[lemma=\"dog\"]",
            "[word=\"(\"]",
            "[word=dog]",
            "[] within <p/>",
            "[word=\"a\"%x]",
        ] {
            assert!(PatternEvaluator.evaluate(&corp, q).is_err(), "{q}");
        }
    }
}

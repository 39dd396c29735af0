//! Case folding used by case-insensitive frequency criteria and query terms.
//!
//! Folding must be the same wherever two values are compared, otherwise a
//! value counted under one spelling in a distribution would be looked up
//! under another when its normalization base is computed.

use std::borrow::Cow;

use concord_common::{Error, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Folding {
    /// Values are compared as stored.
    #[default]
    Preserve,
    /// Unicode lowercase folding, one code point to one code point.
    Insensitive,
}

impl Folding {
    pub fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self {
            Folding::Preserve => Cow::Borrowed(value),
            Folding::Insensitive => {
                if value.chars().all(|c| to_lower(c) == c) {
                    Cow::Borrowed(value)
                } else {
                    Cow::Owned(value.chars().map(to_lower).collect())
                }
            }
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Folding::Preserve => "case-preserving",
            Folding::Insensitive => "case-insensitive",
        }
    }
}

impl TryFrom<&str> for Folding {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "case-preserving" => Ok(Folding::Preserve),
            "case-insensitive" => Ok(Folding::Insensitive),
            _ => Err(Error::invalid_arg(
                "name",
                format!("Unrecognized folding: {name}"),
            )),
        }
    }
}

/// Converts a character into its lower case variant, ignoring special casing
/// rules that expand a single code point into several (those characters are
/// returned unchanged). Upper Eszett folds into 'ß'.
fn to_lower(c: char) -> char {
    if c == 'ẞ' {
        'ß'
    } else if c.is_uppercase() {
        let mut lowercase = c.to_lowercase();
        match (lowercase.next(), lowercase.next()) {
            (Some(ch), None) => ch,
            _ => c,
        }
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_ascii_and_unicode() {
        let f = Folding::Insensitive;
        assert_eq!(f.apply("Praha"), "praha");
        assert_eq!(f.apply("ŽLUŤOUČKÝ"), "žluťoučký");
        assert_eq!(f.apply("STRAẞE"), "straße");
        assert!(matches!(f.apply("already"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_preserve() {
        assert_eq!(Folding::Preserve.apply("Praha"), "Praha");
    }

    #[test]
    fn test_names() {
        for f in [Folding::Preserve, Folding::Insensitive] {
            assert_eq!(Folding::try_from(f.name()).unwrap(), f);
        }
        assert!(Folding::try_from("binary").is_err());
    }
}

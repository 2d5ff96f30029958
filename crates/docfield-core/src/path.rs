//! Field paths addressing string leaves inside a document.
//!
//! A path is a list of segments. `Key` descends into an object member and
//! `Expand` applies the rest of the path to every element of the list found
//! at that position. The dotted text form is `spec.containers.[].image`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Text token used for [`Segment::Expand`] in dotted paths.
pub const EXPAND_TOKEN: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path `{path}` has more than one `[]` segment")]
    MultipleExpansions { path: String },

    #[error("empty segment at position {position} in `{input}`")]
    EmptySegment { input: String, position: usize },

    #[error("dangling escape at end of `{input}`")]
    DanglingEscape { input: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member access.
    Key(String),
    /// Every element of the list at this position.
    Expand,
}

impl Segment {
    pub fn key(k: impl Into<String>) -> Self {
        Segment::Key(k.into())
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Expand => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Expand => f.write_str(EXPAND_TOKEN),
            Segment::Key(k) => {
                if k == EXPAND_TOKEN {
                    return f.write_str("\\[]");
                }
                for ch in k.chars() {
                    if ch == '.' || ch == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{ch}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Build a path from plain strings, treating `"[]"` as [`Segment::Expand`].
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        Self(
            segments
                .iter()
                .map(|s| match s.as_ref() {
                    EXPAND_TOKEN => Segment::Expand,
                    k => Segment::key(k),
                })
                .collect(),
        )
    }

    /// Parse the dotted form. `\.` and `\\` escape literal characters, and a
    /// segment written `\[]` is the literal key `[]`.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Ok(Self::default());
        }
        let mut segments = Vec::new();
        let mut cur = String::new();
        let mut escaped_bracket = false;
        let mut chars = input.chars();
        let finish = |cur: &mut String, escaped: &mut bool, segments: &mut Vec<Segment>| {
            if cur.is_empty() {
                return Err(PathError::EmptySegment {
                    input: input.to_string(),
                    position: segments.len(),
                });
            }
            let text = std::mem::take(cur);
            let seg = if text == EXPAND_TOKEN && !*escaped {
                Segment::Expand
            } else {
                Segment::Key(text)
            };
            *escaped = false;
            segments.push(seg);
            Ok(())
        };
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some('[') if cur.is_empty() => {
                        escaped_bracket = true;
                        cur.push('[');
                    }
                    Some(c) => cur.push(c),
                    None => {
                        return Err(PathError::DanglingEscape {
                            input: input.to_string(),
                        });
                    }
                },
                '.' => finish(&mut cur, &mut escaped_bracket, &mut segments)?,
                c => cur.push(c),
            }
        }
        finish(&mut cur, &mut escaped_bracket, &mut segments)?;
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Position of the first [`Segment::Expand`], if any.
    pub fn expansion_index(&self) -> Option<usize> {
        self.0.iter().position(|s| *s == Segment::Expand)
    }

    pub fn validate(&self) -> Result<(), PathError> {
        if self.0.iter().filter(|s| **s == Segment::Expand).count() > 1 {
            return Err(PathError::MultipleExpansions {
                path: self.to_string(),
            });
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl From<Vec<Segment>> for FieldPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

/// Joins key segments for error messages and logs.
pub(crate) fn display_keys(keys: &[&str]) -> String {
    keys.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_path_with_expansion() {
        let p: FieldPath = "spec.containers.[].image".parse().unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment::key("spec"),
                Segment::key("containers"),
                Segment::Expand,
                Segment::key("image"),
            ]
        );
        assert_eq!(p.expansion_index(), Some(2));
        assert_eq!(p.to_string(), "spec.containers.[].image");
    }

    #[test]
    fn escaped_bracket_is_a_literal_key() {
        let p = FieldPath::parse(r"a.\[].b\.c").unwrap();
        assert_eq!(
            p.segments(),
            &[Segment::key("a"), Segment::key("[]"), Segment::key("b.c")]
        );
        assert_eq!(p.expansion_index(), None);
        assert_eq!(FieldPath::parse(&p.to_string()).unwrap(), p);
    }

    #[test]
    fn empty_input_is_empty_path() {
        assert!(FieldPath::parse("").unwrap().is_empty());
    }

    #[test]
    fn rejects_empty_segments_and_dangling_escape() {
        assert!(matches!(
            FieldPath::parse("a..b"),
            Err(PathError::EmptySegment { position: 1, .. })
        ));
        assert!(matches!(
            FieldPath::parse("a\\"),
            Err(PathError::DanglingEscape { .. })
        ));
    }

    #[test]
    fn validate_rejects_two_expansions() {
        let p = FieldPath::from_segments(&["a", "[]", "b", "[]"]);
        assert_eq!(
            p.validate(),
            Err(PathError::MultipleExpansions {
                path: "a.[].b.[]".into()
            })
        );
        assert!(FieldPath::from_segments(&["a", "[]"]).validate().is_ok());
    }
}

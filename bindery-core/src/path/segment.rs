//! Field path parsing.
//!
//! Paths use the familiar dotted/bracketed notation: `address.city`,
//! `items[2].qty`, or `items.2.qty`. A dotted segment made only of digits is
//! treated as an index, so both array spellings address the same element.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::PathError;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// An object key.
    Key(String),
    /// An array index. Against an object it is looked up as the decimal key.
    Index(usize),
}

impl Segment {
    /// Build a segment from a dotted component.
    ///
    /// Canonical decimal numbers (`0`, `12`, but not `007`) become indexes.
    fn from_key(key: String) -> Self {
        let canonical = key.bytes().all(|b| b.is_ascii_digit())
            && (key.len() == 1 || !key.starts_with('0'));
        match key.parse::<usize>() {
            Ok(index) if canonical => Segment::Index(index),
            _ => Segment::Key(key),
        }
    }

    /// The segment as an object key.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Segment::Key(key) => Cow::Borrowed(key.as_str()),
            Segment::Index(index) => Cow::Owned(index.to_string()),
        }
    }
}

/// A parsed path into a JSON-like value tree.
///
/// The empty path addresses the root value itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: SmallVec<[Segment; 4]>,
}

impl FieldPath {
    /// The path addressing the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted/bracketed path.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let mut segments: SmallVec<[Segment; 4]> = SmallVec::new();
        if path.is_empty() {
            return Ok(Self { segments });
        }

        let empty_segment = |position: usize| PathError::EmptySegment {
            path: path.to_string(),
            position,
        };
        let malformed = || PathError::MalformedBracket {
            path: path.to_string(),
        };

        let mut current = String::new();
        // A key must follow: set at the start and after every '.'.
        let mut need_key = true;
        let mut after_bracket = false;
        let mut chars = path.char_indices();

        while let Some((position, c)) = chars.next() {
            match c {
                '.' => {
                    if current.is_empty() && !after_bracket {
                        return Err(empty_segment(position));
                    }
                    if !current.is_empty() {
                        segments.push(Segment::from_key(std::mem::take(&mut current)));
                    }
                    need_key = true;
                    after_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(Segment::from_key(std::mem::take(&mut current)));
                    } else if need_key && position != 0 {
                        return Err(empty_segment(position));
                    }

                    let mut digits = String::new();
                    let mut closed = false;
                    for (_, d) in chars.by_ref() {
                        if d == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(d);
                    }
                    if !closed {
                        return Err(malformed());
                    }
                    let index = digits.trim().parse::<usize>().map_err(|_| malformed())?;
                    segments.push(Segment::Index(index));
                    need_key = false;
                    after_bracket = true;
                }
                ']' => return Err(malformed()),
                _ => {
                    if after_bracket {
                        return Err(malformed());
                    }
                    current.push(c);
                    need_key = false;
                }
            }
        }

        if !current.is_empty() {
            segments.push(Segment::from_key(current));
        } else if need_key {
            return Err(empty_segment(path.len()));
        }

        Ok(Self { segments })
    }

    /// The parsed segments, outermost first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The first `len` segments as a path of their own.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments.iter().take(len).cloned().collect(),
        }
    }

    /// Fully qualified `store_key.path` string, used to scope field renders.
    pub fn join(store_key: &str, path: &str) -> String {
        if path.is_empty() {
            store_key.to_string()
        } else {
            format!("{store_key}.{path}")
        }
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
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

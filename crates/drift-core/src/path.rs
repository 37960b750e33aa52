//! Dotted field paths (`"dust.backreaction.AB"`).

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::FrameError;

/// A validated, dotted path into the field tree.
///
/// The empty path is the root group. Every segment is non-empty and
/// contains neither whitespace nor a `.`.
///
/// # Examples
///
/// ```
/// use drift_core::FieldPath;
///
/// let path = FieldPath::parse("dust.v.rad").unwrap();
/// assert_eq!(path.name(), Some("rad"));
/// assert_eq!(path.parent().unwrap().as_str(), "dust.v");
/// assert!(FieldPath::parse("dust..rad").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldPath {
    raw: String,
}

impl FieldPath {
    /// The root path.
    pub fn root() -> Self {
        Self { raw: String::new() }
    }

    /// Parse and validate a dotted path.
    pub fn parse(raw: &str) -> Result<Self, FrameError> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        for segment in raw.split('.') {
            validate_segment(raw, segment)?;
        }
        Ok(Self {
            raw: raw.to_string(),
        })
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.raw.is_empty()
    }

    /// The dotted representation.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path segments from the root downwards.
    pub fn segments(&self) -> SmallVec<[&str; 4]> {
        if self.raw.is_empty() {
            SmallVec::new()
        } else {
            self.raw.split('.').collect()
        }
    }

    /// Last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        if self.raw.is_empty() {
            None
        } else {
            self.raw.rsplit('.').next()
        }
    }

    /// Enclosing path, or `None` for the root.
    pub fn parent(&self) -> Option<FieldPath> {
        if self.raw.is_empty() {
            return None;
        }
        Some(match self.raw.rfind('.') {
            Some(idx) => Self {
                raw: self.raw[..idx].to_string(),
            },
            None => Self::root(),
        })
    }

    /// Append a relative (possibly dotted) path.
    pub fn join(&self, relative: &str) -> Result<FieldPath, FrameError> {
        let rel = FieldPath::parse(relative)?;
        if rel.is_root() {
            return Ok(self.clone());
        }
        if self.is_root() {
            return Ok(rel);
        }
        Ok(Self {
            raw: format!("{}.{}", self.raw, rel.raw),
        })
    }

    /// Whether `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &FieldPath) -> bool {
        if ancestor.is_root() {
            return !self.is_root();
        }
        self.raw.len() > ancestor.raw.len()
            && self.raw.starts_with(&ancestor.raw)
            && self.raw.as_bytes()[ancestor.raw.len()] == b'.'
    }
}

fn validate_segment(raw: &str, segment: &str) -> Result<(), FrameError> {
    if segment.is_empty() {
        return Err(FrameError::InvalidPath {
            path: raw.to_string(),
            reason: "empty segment".into(),
        });
    }
    if segment.chars().any(char::is_whitespace) {
        return Err(FrameError::InvalidPath {
            path: raw.to_string(),
            reason: format!("segment '{segment}' contains whitespace"),
        });
    }
    Ok(())
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.raw)
        }
    }
}

impl FromStr for FieldPath {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

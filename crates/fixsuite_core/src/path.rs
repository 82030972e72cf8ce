//! Canonical, root-relative fixture paths.
//!
//! A [`FixturePath`] is always written with `/` separators, never contains `.` or `..` segments, and never has a
//! leading or trailing separator. The empty path denotes the fixture root itself.
//!
//! ## Notes
//!
//! - Ordering is segment-wise (`a/b` sorts before `a-b/c` because `a` < `a-b`), which matches the order in which the
//!   scanner visits a directory tree sorted by entry name.
//! - Backslashes are accepted on input and normalised to `/`.

use std::cmp::Ordering;
use std::fmt;

/// Separator used in every canonical fixture path.
pub const SEPARATOR: char = '/';

/// Error produced when a string is not a canonical fixture path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path starts with a separator (or a drive prefix).
    Absolute(String),
    /// The path contains an empty segment (`a//b`) or a trailing separator.
    EmptySegment(String),
    /// The path contains a `.` or `..` segment.
    RelativeSegment(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Absolute(p) => write!(f, "fixture path `{p}` must be relative to the fixture root"),
            PathError::EmptySegment(p) => write!(f, "fixture path `{p}` contains an empty segment"),
            PathError::RelativeSegment(p) => write!(f, "fixture path `{p}` contains a `.` or `..` segment"),
        }
    }
}

impl std::error::Error for PathError {}

/// A path relative to the fixture root, e.g. `dynamic/dynamicCall.kt`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct FixturePath(String);

impl FixturePath {
    /// The fixture root (empty path).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse and validate a fixture path.
    ///
    /// ## Errors
    /// - [`PathError`] when the input is absolute, has empty segments, or has `.`/`..` segments.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let normalised = raw.replace('\\', "/");
        if normalised.is_empty() {
            return Ok(Self::root());
        }
        if normalised.starts_with(SEPARATOR) || looks_like_drive(&normalised) {
            return Err(PathError::Absolute(raw.to_string()));
        }
        for segment in normalised.split(SEPARATOR) {
            validate_segment(segment).map_err(|kind| kind(raw.to_string()))?;
        }
        Ok(Self(normalised))
    }

    /// Append one segment (a file or directory name).
    ///
    /// ## Errors
    /// - [`PathError`] when `segment` is empty, `.`/`..`, or contains a separator.
    pub fn join(&self, segment: &str) -> Result<Self, PathError> {
        if segment.contains(SEPARATOR) || segment.contains('\\') {
            return Err(PathError::EmptySegment(format!("{}/{}", self.0, segment)));
        }
        validate_segment(segment).map_err(|kind| kind(format!("{}/{}", self.0, segment)))?;
        if self.is_root() {
            Ok(Self(segment.to_string()))
        } else {
            Ok(Self(format!("{}{}{}", self.0, SEPARATOR, segment)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the path segments (none for the root).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments; zero for the root.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The final segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit(SEPARATOR).next()
        }
    }

    /// The enclosing directory, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Segment-wise prefix test: `a/b` starts with `a`, but `ab/c` does not.
    pub fn starts_with(&self, prefix: &FixturePath) -> bool {
        if prefix.is_root() {
            return true;
        }
        match self.0.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
            None => false,
        }
    }
}

fn looks_like_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn validate_segment(segment: &str) -> Result<(), fn(String) -> PathError> {
    match segment {
        "" => Err(PathError::EmptySegment),
        "." | ".." => Err(PathError::RelativeSegment),
        _ => Ok(()),
    }
}

impl Ord for FixturePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments().cmp(other.segments())
    }
}

impl PartialOrd for FixturePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FixturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FixturePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for FixturePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FixturePath> for String {
    fn from(path: FixturePath) -> Self {
        path.0
    }
}

impl AsRef<str> for FixturePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> FixturePath {
        FixturePath::parse(s).unwrap()
    }

    #[test]
    fn test_parse_canonical() {
        assert_eq!(p("a/b/c.kt").as_str(), "a/b/c.kt");
        assert!(p("").is_root());
    }

    #[test]
    fn test_parse_normalises_backslashes() {
        assert_eq!(p("a\\b.kt").as_str(), "a/b.kt");
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert!(matches!(FixturePath::parse("/a"), Err(PathError::Absolute(_))));
        assert!(matches!(FixturePath::parse("C:/a"), Err(PathError::Absolute(_))));
        assert!(matches!(FixturePath::parse("a//b"), Err(PathError::EmptySegment(_))));
        assert!(matches!(FixturePath::parse("a/"), Err(PathError::EmptySegment(_))));
        assert!(matches!(FixturePath::parse("a/./b"), Err(PathError::RelativeSegment(_))));
        assert!(matches!(FixturePath::parse("../a"), Err(PathError::RelativeSegment(_))));
    }

    #[test]
    fn test_join_and_parent() {
        let dir = FixturePath::root().join("a").unwrap();
        let file = dir.join("x.kt").unwrap();
        assert_eq!(file.as_str(), "a/x.kt");
        assert_eq!(file.parent(), Some(dir.clone()));
        assert_eq!(dir.parent(), Some(FixturePath::root()));
        assert_eq!(FixturePath::root().parent(), None);
        assert!(dir.join("b/c").is_err());
        assert!(dir.join("..").is_err());
    }

    #[test]
    fn test_file_name_and_depth() {
        assert_eq!(p("a/b/x.kt").file_name(), Some("x.kt"));
        assert_eq!(p("a/b/x.kt").depth(), 3);
        assert_eq!(FixturePath::root().file_name(), None);
        assert_eq!(FixturePath::root().depth(), 0);
    }

    #[test]
    fn test_starts_with_is_segment_wise() {
        assert!(p("a/b.kt").starts_with(&p("a")));
        assert!(p("a").starts_with(&p("a")));
        assert!(!p("ab/c.kt").starts_with(&p("a")));
        assert!(p("ab/c.kt").starts_with(&FixturePath::root()));
    }

    #[test]
    fn test_ordering_is_segment_wise() {
        let mut paths = vec![p("a-b/c.kt"), p("a/z.kt"), p("a.kt"), p("a/b/c.kt")];
        paths.sort();
        let ordered: Vec<&str> = paths.iter().map(|p| p.as_str()).collect();
        assert_eq!(ordered, vec!["a/b/c.kt", "a/z.kt", "a-b/c.kt", "a.kt"]);
    }
}

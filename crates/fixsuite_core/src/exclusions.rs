//! Explicit, auditable exclusion lists.
//!
//! An exclusion names fixtures that are intentionally absent from generated coverage, e.g. fixtures reserved for a
//! different backend. Two rule shapes exist:
//!
//! - `a/b.kt` is an **exact** rule: it excludes exactly that fixture path.
//! - `a/legacy/` (trailing `/`) is a **prefix** rule: it excludes everything under the `a/legacy` subtree.
//!
//! ## Notes
//!
//! - Prefix matching is segment-wise: `a/legacy/` does not exclude `a/legacy2/x.kt`.
//! - There is no pattern syntax. Orphans can only be silenced by naming them (or their directory) here.

use std::collections::BTreeSet;
use std::fmt;

use crate::path::{FixturePath, PathError, SEPARATOR};

/// One exclusion entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExclusionRule {
    /// Excludes exactly this fixture.
    Exact(FixturePath),
    /// Excludes every fixture inside this directory (recursively).
    Prefix(FixturePath),
}

impl ExclusionRule {
    /// Parse an entry; a trailing `/` selects prefix semantics.
    ///
    /// ## Errors
    /// - [`PathError`] when the path part is not canonical, or when the entry is empty (which would exclude the
    ///   whole root and hide every orphan).
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim().replace('\\', "/");
        match trimmed.strip_suffix(SEPARATOR) {
            Some(dir) => {
                let path = FixturePath::parse(dir)?;
                if path.is_root() {
                    return Err(PathError::EmptySegment(raw.to_string()));
                }
                Ok(ExclusionRule::Prefix(path))
            }
            None => {
                let path = FixturePath::parse(&trimmed)?;
                if path.is_root() {
                    return Err(PathError::EmptySegment(raw.to_string()));
                }
                Ok(ExclusionRule::Exact(path))
            }
        }
    }

    pub fn covers(&self, path: &FixturePath) -> bool {
        match self {
            ExclusionRule::Exact(exact) => exact == path,
            ExclusionRule::Prefix(dir) => path != dir && path.starts_with(dir),
        }
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionRule::Exact(path) => write!(f, "{path}"),
            ExclusionRule::Prefix(path) => write!(f, "{path}{SEPARATOR}"),
        }
    }
}

/// Immutable-by-convention set of exclusion rules, iterated in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionSet {
    rules: BTreeSet<ExclusionRule>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of entries (see [`ExclusionRule::parse`]).
    pub fn parse_all<I, S>(entries: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for entry in entries {
            set.insert(ExclusionRule::parse(entry.as_ref())?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, rule: ExclusionRule) -> bool {
        self.rules.insert(rule)
    }

    /// Add an exact rule for one fixture.
    pub fn exclude_exact(&mut self, path: FixturePath) -> bool {
        self.insert(ExclusionRule::Exact(path))
    }

    pub fn is_excluded(&self, path: &FixturePath) -> bool {
        self.rules.iter().any(|rule| rule.covers(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExclusionRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Render every rule in its textual form (`a/b.kt`, `a/legacy/`).
    pub fn to_strings(&self) -> Vec<String> {
        self.rules.iter().map(ToString::to_string).collect()
    }
}

impl Extend<ExclusionRule> for ExclusionSet {
    fn extend<T: IntoIterator<Item = ExclusionRule>>(&mut self, iter: T) {
        self.rules.extend(iter);
    }
}

impl FromIterator<ExclusionRule> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = ExclusionRule>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ExclusionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rules.iter().map(ToString::to_string))
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ExclusionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<String>::deserialize(deserializer)?;
        ExclusionSet::parse_all(&entries).map_err(serde::de::Error::custom)
    }
}

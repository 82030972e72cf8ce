//! Deterministic identifiers for generated groups and tests.
//!
//! Fixture names are turned into Rust identifiers in three steps:
//!
//! 1. strip the file extension (tests only),
//! 2. split on every non-identifier character and on camelCase boundaries,
//! 3. join the lowercased words with `_` (`dynamicArrayAccess.kt` → `test_dynamic_array_access`).
//!
//! Siblings share one namespace per group. When a candidate collides with an identifier already taken in that
//! namespace, a counter suffix is appended (`foo`, `foo_2`, `foo_3`, ...). The sibling that is resolved first keeps the
//! bare name, so the outcome depends only on visiting order, never on file contents.
//!
//! ## Notes
//!
//! - Output identifiers are ASCII-only; non-ASCII characters act as separators.
//! - Keywords get a trailing `_`, digit-leading group names get a leading `_`.

use std::collections::BTreeSet;
use std::fmt;

use crate::rust_keywords;

/// Prefix of every generated test function.
pub const TEST_PREFIX: &str = "test_";

/// Name of the per-group completeness test. Reserved in every sibling scope.
pub const ALL_FILES_PRESENT: &str = "all_files_present";

/// Fallback group name when a directory name has no identifier characters.
pub const FALLBACK_GROUP: &str = "group";

/// Fallback stem when a fixture name has no identifier characters.
pub const FALLBACK_TEST_STEM: &str = "fixture";

/// Highest disambiguation counter tried before giving up.
pub const MAX_DISAMBIGUATION: u32 = 9_999;

/// What an identifier names; selects the capitalization convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// A test function (`test_` prefix, extension stripped).
    Test,
    /// A group module (directory name as-is).
    Group,
}

/// The disambiguation counter ran out for one base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollisionExhausted {
    pub base: String,
    pub attempts: u32,
}

impl fmt::Display for NameCollisionExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not find a free identifier for `{}` after {} attempts",
            self.base, self.attempts
        )
    }
}

impl std::error::Error for NameCollisionExhausted {}

/// Strip the final extension from a file name (`a.b.kt` → `a.b`). Dot-files keep their name.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

/// Split text into lowercase words on separators and camelCase boundaries.
///
/// ## Examples
/// ```rust
/// use fixsuite_core::naming::split_words;
/// assert_eq!(split_words("dynamicArrayAccess"), vec!["dynamic", "array", "access"]);
/// assert_eq!(split_words("HTTPServer-kt38765"), vec!["http", "server", "kt38765"]);
/// ```
pub fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for part in text.split(|c: char| !c.is_ascii_alphanumeric()) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();
        for (i, &ch) in chars.iter().enumerate() {
            if i > 0 && ch.is_ascii_uppercase() {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
                let boundary = prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_is_lower);
                if boundary && !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(ch.to_ascii_lowercase());
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

/// Build the bare (not yet disambiguated) identifier for a path segment.
///
/// For [`NameKind::Test`] the segment is a file name and its extension is stripped first; use
/// [`identifier_from_stem`] when the stem is already known (e.g. from a pattern capture group).
pub fn base_identifier(segment: &str, kind: NameKind) -> String {
    match kind {
        NameKind::Test => identifier_from_stem(strip_extension(segment), kind),
        NameKind::Group => identifier_from_stem(segment, kind),
    }
}

/// Build the bare identifier from an extension-free stem.
pub fn identifier_from_stem(stem: &str, kind: NameKind) -> String {
    let words = split_words(stem);
    match kind {
        NameKind::Test => {
            let body = if words.is_empty() {
                FALLBACK_TEST_STEM.to_string()
            } else {
                words.join("_")
            };
            format!("{TEST_PREFIX}{body}")
        }
        NameKind::Group => {
            let mut ident = if words.is_empty() {
                FALLBACK_GROUP.to_string()
            } else {
                words.join("_")
            };
            if ident.starts_with(|c: char| c.is_ascii_digit()) {
                ident.insert(0, '_');
            }
            if rust_keywords::is_keyword(&ident) {
                ident.push('_');
            }
            ident
        }
    }
}

/// Resolve `segment` against the identifiers already taken by its siblings.
///
/// ## Errors
/// - [`NameCollisionExhausted`] when every suffix up to [`MAX_DISAMBIGUATION`] is taken.
pub fn resolve(
    segment: &str,
    kind: NameKind,
    siblings: &BTreeSet<String>,
) -> Result<String, NameCollisionExhausted> {
    disambiguate(base_identifier(segment, kind), siblings)
}

fn disambiguate(base: String, taken: &BTreeSet<String>) -> Result<String, NameCollisionExhausted> {
    if !taken.contains(&base) {
        return Ok(base);
    }
    for counter in 2..=MAX_DISAMBIGUATION {
        let candidate = format!("{base}_{counter}");
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(NameCollisionExhausted {
        base,
        attempts: MAX_DISAMBIGUATION - 1,
    })
}

/// One group's identifier namespace.
///
/// Every resolved identifier is recorded, so resolving the same sequence of segments in the same order always yields
/// the same sequence of identifiers.
#[derive(Debug, Clone)]
pub struct SiblingScope {
    taken: BTreeSet<String>,
}

impl Default for SiblingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl SiblingScope {
    /// A fresh scope with [`ALL_FILES_PRESENT`] already reserved.
    pub fn new() -> Self {
        let mut taken = BTreeSet::new();
        taken.insert(ALL_FILES_PRESENT.to_string());
        Self { taken }
    }

    /// Reserve an identifier so later siblings cannot take it.
    pub fn reserve(&mut self, ident: impl Into<String>) {
        self.taken.insert(ident.into());
    }

    /// Resolve a path segment and record the result.
    pub fn resolve(&mut self, segment: &str, kind: NameKind) -> Result<String, NameCollisionExhausted> {
        self.claim(base_identifier(segment, kind))
    }

    /// Resolve an extension-free stem and record the result.
    pub fn resolve_stem(&mut self, stem: &str, kind: NameKind) -> Result<String, NameCollisionExhausted> {
        self.claim(identifier_from_stem(stem, kind))
    }

    fn claim(&mut self, base: String) -> Result<String, NameCollisionExhausted> {
        let ident = disambiguate(base, &self.taken)?;
        self.taken.insert(ident.clone());
        Ok(ident)
    }

    pub fn contains(&self, ident: &str) -> bool {
        self.taken.contains(ident)
    }
}

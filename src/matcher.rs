//! Fixture filename matching.
//!
//! A [`PathMatcher`] combines one filename pattern with an [`ExclusionSet`]:
//!
//! - the pattern is a regex applied to the **final path segment only**, and is always anchored (a pattern written
//!   without `^`/`$` is wrapped), so a directory named `foo.kt` never makes its children match;
//! - excluded paths never match, even when the pattern does.
//!
//! When the pattern has a first capture group (`^(.+)\.kt$`), the captured text is the fixture's name stem.

use fixsuite_core::{ExclusionSet, FixturePath};
use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;

/// The filename pattern did not compile.
#[derive(Debug, Error, Diagnostic)]
#[error("invalid fixture pattern `{pattern}`")]
#[diagnostic(
    code(fixsuite::pattern::invalid),
    help("patterns are Rust regexes applied to the file name, e.g. `^(.+)\\.kt$`")
)]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Filename pattern plus exclusion predicate.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    regex: Regex,
    exclusions: ExclusionSet,
}

impl PathMatcher {
    /// Compile `pattern` (anchored) with no exclusions.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|source| PatternError {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            exclusions: ExclusionSet::new(),
        })
    }

    /// Replace the exclusion set.
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// The pattern as written by the user (before anchoring).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// `true` iff the final segment matches the pattern and the path is not excluded.
    pub fn matches(&self, path: &FixturePath) -> bool {
        match path.file_name() {
            Some(name) => self.matches_file_name(name) && !self.exclusions.is_excluded(path),
            None => false,
        }
    }

    /// Pattern test on a bare file name, ignoring exclusions.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    /// The text captured by the pattern's first group, if the pattern has one and it participated.
    pub fn name_stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.regex
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

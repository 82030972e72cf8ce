//! Backend identities.
//!
//! A backend identity is a tag selecting which processing/compilation target a generated test exercises
//! (for example `jvm` or `js_ir`). Several suites may share one fixture tree, one per backend.

use std::fmt;

/// Tag naming one execution target.
///
/// Identities compare case-insensitively in backend directives (see [`BackendId::matches`]) but are stored as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BackendId(String);

/// Wildcard accepted in backend directives (`// TARGET_BACKEND: ANY`).
pub const ANY_BACKEND: &str = "ANY";

impl BackendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a directive value names this backend (or is the `ANY` wildcard).
    pub fn matches(&self, directive_value: &str) -> bool {
        let value = directive_value.trim();
        value.eq_ignore_ascii_case(ANY_BACKEND) || value.eq_ignore_ascii_case(&self.0)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_is_case_insensitive() {
        let jvm = BackendId::new("JVM_IR");
        assert!(jvm.matches("jvm_ir"));
        assert!(jvm.matches(" JVM_IR "));
        assert!(!jvm.matches("JS_IR"));
    }

    #[test]
    fn test_any_matches_everything() {
        assert!(BackendId::new("js_ir").matches("ANY"));
        assert!(BackendId::new("wasm").matches("any"));
    }
}

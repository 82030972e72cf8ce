//! Backend directives embedded in fixture headers.
//!
//! Fixtures can restrict or annotate the backends they run on with comment lines:
//!
//! ```text
//! // TARGET_BACKEND: JVM_IR
//! // IGNORE_BACKEND: JS_IR, WASM
//! ```
//!
//! - `TARGET_BACKEND` lists the only backends the fixture applies to. On any other backend the fixture is not bound
//!   to a test; the generator records it as an explicit exclusion instead.
//! - `IGNORE_BACKEND` keeps the test but expects it to fail on the listed backends.
//!
//! `ANY` is accepted as a value for both directives. Repeated directives accumulate.

use std::fs;
use std::io;
use std::path::Path;

use fixsuite_core::BackendId;

pub const TARGET_BACKEND: &str = "TARGET_BACKEND";
pub const IGNORE_BACKEND: &str = "IGNORE_BACKEND";

/// Directives found in one fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub target_backends: Vec<String>,
    pub ignored_backends: Vec<String>,
}

impl Directives {
    /// Parse every `// NAME: values` comment line in `source`.
    pub fn parse(source: &str) -> Self {
        let mut directives = Self::default();
        for line in source.lines() {
            let Some(comment) = line.trim_start().strip_prefix("//") else {
                continue;
            };
            let Some((name, values)) = comment.split_once(':') else {
                continue;
            };
            let target = match name.trim() {
                TARGET_BACKEND => &mut directives.target_backends,
                IGNORE_BACKEND => &mut directives.ignored_backends,
                _ => continue,
            };
            target.extend(
                values
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            );
        }
        directives
    }

    /// Read and parse a fixture file.
    pub fn read(path: &Path) -> io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// `true` unless a `TARGET_BACKEND` list exists and does not name `backend`.
    pub fn applies_to(&self, backend: &BackendId) -> bool {
        self.target_backends.is_empty() || self.target_backends.iter().any(|v| backend.matches(v))
    }

    /// `true` when `IGNORE_BACKEND` names `backend`.
    pub fn is_ignored_on(&self, backend: &BackendId) -> bool {
        self.ignored_backends.iter().any(|v| backend.matches(v))
    }
}

//! Persisted suite declarations.
//!
//! `fixsuite generate` writes one JSON manifest per suite and backend (`<suite>_<backend>.json`). A manifest records
//! everything the test-time completeness check needs: the fixture root, the pattern, the effective exclusions and
//! the declared group/test tree (hence the recorded fixture set). The Rust emitter renders the same manifest into a
//! test module, so both artifacts always describe one generation.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fixsuite_core::{BackendId, ExclusionSet, FixturePath};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::suite::Expectation;
use crate::version::FIXSUITE_VERSION;

/// Bumped whenever the manifest layout changes incompatibly.
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Failure reading or writing a manifest.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("failed to read manifest `{}`", path.display())]
    #[diagnostic(code(fixsuite::manifest::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write manifest `{}`", path.display())]
    #[diagnostic(code(fixsuite::manifest::write))]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("manifest `{}` is malformed", path.display())]
    #[diagnostic(code(fixsuite::manifest::parse), help("regenerate it with `fixsuite generate`"))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest `{}` has format version {found}, expected {expected}", path.display())]
    #[diagnostic(code(fixsuite::manifest::version), help("regenerate it with `fixsuite generate`"))]
    UnsupportedVersion { path: PathBuf, found: u32, expected: u32 },

    #[error("failed to serialize manifest")]
    #[diagnostic(code(fixsuite::manifest::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// One generated suite, as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteManifest {
    pub format_version: u32,
    /// `fixsuite <version>` of the generator that wrote the manifest.
    pub generator: String,
    pub backend: BackendId,
    /// Fixture root, `/`-separated, relative to the project configuration when possible.
    pub root: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "ExclusionSet::is_empty")]
    pub exclusions: ExclusionSet,
    pub suite: GroupDecl,
}

/// A declared group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDecl {
    pub ident: String,
    pub path: FixturePath,
    #[serde(default)]
    pub children: Vec<DeclNode>,
}

/// A declared child of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclNode {
    Group(GroupDecl),
    Test(TestDecl),
}

/// A declared test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDecl {
    pub ident: String,
    pub fixture: FixturePath,
    #[serde(default, skip_serializing_if = "Expectation::is_pass")]
    pub expectation: Expectation,
}

impl SuiteManifest {
    pub fn new(backend: BackendId, root: String, pattern: String, exclusions: ExclusionSet, suite: GroupDecl) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            generator: format!("fixsuite {FIXSUITE_VERSION}"),
            backend,
            root,
            pattern,
            exclusions,
            suite,
        }
    }

    /// Conventional file name for a suite/backend pair.
    pub fn file_name(suite_name: &str, backend: &BackendId) -> String {
        format!("{}_{}.json", suite_name, backend.as_str().to_ascii_lowercase())
    }

    /// Fixture paths of every declared test.
    pub fn recorded_paths(&self) -> BTreeSet<FixturePath> {
        self.suite.recorded_paths()
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(path: &Path, json: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(json).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if manifest.format_version != MANIFEST_FORMAT_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: manifest.format_version,
                expected: MANIFEST_FORMAT_VERSION,
            });
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let json = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &json)
    }

    /// Write the manifest, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json()?;
        let write_err = |source: io::Error| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, json).map_err(write_err)
    }
}

impl GroupDecl {
    /// Fixture paths of every test in this group and below.
    pub fn recorded_paths(&self) -> BTreeSet<FixturePath> {
        let mut out = BTreeSet::new();
        self.collect_fixtures(&mut out);
        out
    }

    fn collect_fixtures(&self, out: &mut BTreeSet<FixturePath>) {
        for child in &self.children {
            match child {
                DeclNode::Group(group) => group.collect_fixtures(out),
                DeclNode::Test(test) => {
                    out.insert(test.fixture.clone());
                }
            }
        }
    }
}

//! Project configuration (`fixsuite.toml`).
//!
//! ```toml
//! [[suite]]
//! name = "ir_text"
//! root = "testData/ir/irText"
//! pattern = '^(.+)\.kt$'
//! exclude = ["legacy/", "dynamic/broken.kt"]
//! backends = ["jvm", "js_ir"]
//! output_dir = "tests/generated"
//! runner = "crate::run_fixture"
//! directives = true
//! ```
//!
//! Relative `root` and `output_dir` values are resolved against the directory containing the configuration file.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fixsuite_core::{BackendId, ExclusionSet, PathError};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codegen::{DEFAULT_RUNNER, EmitOptions};
use crate::matcher::{PathMatcher, PatternError};

/// Conventional configuration file name.
pub const CONFIG_FILE_NAME: &str = "fixsuite.toml";
/// Default directory for manifests and emitted source.
pub const DEFAULT_OUTPUT_DIR: &str = "tests/generated";

/// Failure loading or validating the configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read `{}`", path.display())]
    #[diagnostic(code(fixsuite::config::read), help("create a fixsuite.toml or pass --config"))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse `{}`", path.display())]
    #[diagnostic(code(fixsuite::config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no suites configured")]
    #[diagnostic(code(fixsuite::config::empty), help("add at least one [[suite]] table"))]
    NoSuites,

    #[error("suite name `{name}` is not usable")]
    #[diagnostic(
        code(fixsuite::config::name),
        help("suite names must be non-empty and contain only ASCII letters, digits, `_` or `-`")
    )]
    InvalidName { name: String },

    #[error("suite `{name}` is declared more than once")]
    #[diagnostic(code(fixsuite::config::duplicate))]
    DuplicateSuite { name: String },

    #[error("suite `{name}` declares no backends")]
    #[diagnostic(code(fixsuite::config::backends), help("add e.g. `backends = [\"jvm\"]`"))]
    NoBackends { name: String },

    #[error("suite `{name}` declares backend `{backend}` more than once")]
    #[diagnostic(
        code(fixsuite::config::duplicate_backend),
        help("backend names are compared case-insensitively; generated files use the lowercase name")
    )]
    DuplicateBackend { name: String, backend: String },

    #[error("suite `{name}` has an invalid pattern")]
    #[diagnostic(code(fixsuite::config::pattern))]
    Pattern {
        name: String,
        #[source]
        #[diagnostic_source]
        source: PatternError,
    },

    #[error("suite `{name}` has an invalid exclusion")]
    #[diagnostic(code(fixsuite::config::exclude), help("use `dir/file.ext` or `dir/` (trailing slash for a subtree)"))]
    Exclusion {
        name: String,
        #[source]
        source: PathError,
    },

    #[error("suite `{name}` not found")]
    #[diagnostic(code(fixsuite::config::unknown_suite))]
    UnknownSuite { name: String },
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_runner() -> String {
    DEFAULT_RUNNER.to_string()
}

fn default_directives() -> bool {
    true
}

/// One `[[suite]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Suite name; prefixes manifest and emitted file names.
    pub name: String,
    /// Fixture root directory.
    pub root: PathBuf,
    /// Filename regex (anchored).
    pub pattern: String,
    /// Exact paths, or subtree prefixes ending in `/`.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub backends: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_runner")]
    pub runner: String,
    /// Honour `TARGET_BACKEND` / `IGNORE_BACKEND` directives.
    #[serde(default = "default_directives")]
    pub directives: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            name: "fixtures".to_string(),
            root: PathBuf::from("fixtures"),
            pattern: r"^(.+)\.kt$".to_string(),
            exclude: Vec::new(),
            backends: vec!["default".to_string()],
            output_dir: default_output_dir(),
            runner: default_runner(),
            directives: default_directives(),
        }
    }
}

impl SuiteConfig {
    /// Create a new suite config with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Replace the exclusion entries
    pub fn with_exclusions<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = entries.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the backend list with a single backend
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backends = vec![backend.into()];
        self
    }

    /// Replace the backend list
    pub fn with_backends<I, S>(mut self, backends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backends = backends.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    pub fn with_directives(mut self, enabled: bool) -> Self {
        self.directives = enabled;
        self
    }

    /// Compile the pattern together with the configured exclusions.
    pub fn matcher(&self) -> Result<PathMatcher, ConfigError> {
        let exclusions = self.exclusions()?;
        let matcher = PathMatcher::new(&self.pattern).map_err(|source| ConfigError::Pattern {
            name: self.name.clone(),
            source,
        })?;
        Ok(matcher.with_exclusions(exclusions))
    }

    pub fn exclusions(&self) -> Result<ExclusionSet, ConfigError> {
        ExclusionSet::parse_all(&self.exclude).map_err(|source| ConfigError::Exclusion {
            name: self.name.clone(),
            source,
        })
    }

    pub fn backend_ids(&self) -> Vec<BackendId> {
        self.backends.iter().map(|b| BackendId::new(b.as_str())).collect()
    }

    /// The fixture root, resolved against `base_dir`.
    pub fn resolved_root(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.root)
    }

    /// The output directory, resolved against `base_dir`.
    pub fn resolved_output_dir(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.output_dir)
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions::new().with_runner(self.runner.clone())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let usable = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !usable {
            return Err(ConfigError::InvalidName {
                name: self.name.clone(),
            });
        }
        if self.backends.iter().all(|b| b.trim().is_empty()) {
            return Err(ConfigError::NoBackends {
                name: self.name.clone(),
            });
        }
        let mut seen = BTreeSet::new();
        for backend in &self.backends {
            if !seen.insert(backend.trim().to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateBackend {
                    name: self.name.clone(),
                    backend: backend.clone(),
                });
            }
        }
        self.matcher().map(|_| ())
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default, rename = "suite")]
    pub suites: Vec<SuiteConfig>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl ProjectConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml_str(path, &source, base_dir)
    }

    /// Parse and validate configuration text; `path` is only used in error messages.
    pub fn from_toml_str(path: &Path, source: &str, base_dir: PathBuf) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.base_dir = base_dir;
        config.validate()?;
        tracing::debug!(suites = config.suites.len(), "loaded configuration");
        Ok(config)
    }

    pub fn with_suite(mut self, suite: SuiteConfig) -> Self {
        self.suites.push(suite);
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.suites.is_empty() {
            return Err(ConfigError::NoSuites);
        }
        let mut seen = BTreeSet::new();
        for suite in &self.suites {
            suite.validate()?;
            if !seen.insert(suite.name.as_str()) {
                return Err(ConfigError::DuplicateSuite {
                    name: suite.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// All suites, or only the one named `name`.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<&SuiteConfig>, ConfigError> {
        match name {
            None => Ok(self.suites.iter().collect()),
            Some(name) => self
                .suites
                .iter()
                .find(|s| s.name == name)
                .map(|s| vec![s])
                .ok_or_else(|| ConfigError::UnknownSuite { name: name.to_string() }),
        }
    }
}

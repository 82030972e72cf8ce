//! Configured suite workflows: generate artifacts, check them, verify and reload persisted suites.
//!
//! For each configured suite and backend the pipeline produces two artifacts in the suite's `output_dir`:
//!
//! - `<suite>_<backend>.json`: the [`SuiteManifest`],
//! - `<suite>_<backend>.rs`: the emitted Rust test module.
//!
//! The manifest root is written as configured (relative to the configuration file), so the emitted module and the
//! CLI resolve the same directory when `fixsuite.toml` sits next to `Cargo.toml`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fixsuite_core::{BackendId, CompletenessReport};
use miette::Diagnostic;
use thiserror::Error;

use crate::codegen::{self, EmitError};
use crate::completeness::CompletenessChecker;
use crate::config::{ConfigError, SuiteConfig};
use crate::manifest::{ManifestError, SuiteManifest};
use crate::matcher::{PathMatcher, PatternError};
use crate::scanner::{self, FixtureNode, ScanError};
use crate::suite::{ExecutionFailure, FixtureExecutor, GenerateError, GeneratedSuite, Outcome, SuiteGenerator};

/// Any failure of a configured workflow.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pattern(#[from] PatternError),

    #[error("failed to access `{}`", path.display())]
    #[diagnostic(code(fixsuite::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Generated files for one suite and backend.
#[derive(Debug, Clone)]
pub struct SuiteArtifacts {
    pub backend: BackendId,
    pub manifest_path: PathBuf,
    pub manifest: SuiteManifest,
    pub source_path: PathBuf,
    pub source: String,
}

/// What writing (or checking) one file did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Unchanged,
    Created,
    Updated,
}

impl ArtifactStatus {
    pub fn is_change(&self) -> bool {
        !matches!(self, ArtifactStatus::Unchanged)
    }
}

/// Emitted source file name for a suite/backend pair.
pub fn source_file_name(suite_name: &str, backend: &BackendId) -> String {
    format!("{}_{}.rs", suite_name, backend.as_str().to_ascii_lowercase())
}

/// Executor for workflows that bind suites but never run them.
pub fn unbound_executor() -> Arc<dyn FixtureExecutor> {
    Arc::new(|_: &fixsuite_core::FixturePath, _: &BackendId| -> Outcome {
        Err(ExecutionFailure::new("no executor bound to this suite"))
    })
}

/// Scan a configured suite's fixture root.
pub fn scan_suite(config: &SuiteConfig, base_dir: &Path) -> Result<FixtureNode, PipelineError> {
    let matcher = config.matcher()?;
    Ok(scanner::scan(&config.resolved_root(base_dir), &matcher)?)
}

/// Scan, generate and render every backend of a configured suite. Nothing is written.
#[tracing::instrument(skip_all, fields(suite = %config.name))]
pub fn generate_artifacts(config: &SuiteConfig, base_dir: &Path) -> Result<Vec<SuiteArtifacts>, PipelineError> {
    let root = config.resolved_root(base_dir);
    let matcher = config.matcher()?;
    let tree = scanner::scan(&root, &matcher)?;
    let suites = SuiteGenerator::new(&root, &matcher)
        .with_directives(config.directives)
        .generate_all(&tree, &config.backend_ids(), unbound_executor())?;

    let root_label = config.root.to_string_lossy().replace('\\', "/");
    let output_dir = config.resolved_output_dir(base_dir);
    let options = config.emit_options();

    suites
        .iter()
        .map(|suite| -> Result<SuiteArtifacts, PipelineError> {
            let manifest = suite.to_manifest(&root_label);
            let source = codegen::emit_suite(&manifest, &options)?;
            Ok(SuiteArtifacts {
                backend: suite.backend().clone(),
                manifest_path: output_dir.join(SuiteManifest::file_name(&config.name, suite.backend())),
                manifest,
                source_path: output_dir.join(source_file_name(&config.name, suite.backend())),
                source,
            })
        })
        .collect()
}

/// Write (or, with `check`, only compare) the artifacts. Unchanged files are never rewritten.
pub fn write_artifacts(artifacts: &SuiteArtifacts, check: bool) -> Result<Vec<(PathBuf, ArtifactStatus)>, PipelineError> {
    let manifest_json = artifacts.manifest.to_json()?;
    let mut statuses = Vec::with_capacity(2);
    for (path, contents) in [
        (&artifacts.manifest_path, manifest_json.as_str()),
        (&artifacts.source_path, artifacts.source.as_str()),
    ] {
        let status = match fs::read_to_string(path) {
            Ok(existing) if existing == contents => ArtifactStatus::Unchanged,
            Ok(_) => ArtifactStatus::Updated,
            Err(e) if e.kind() == io::ErrorKind::NotFound => ArtifactStatus::Created,
            Err(source) => {
                return Err(PipelineError::Io {
                    path: path.clone(),
                    source,
                });
            }
        };
        if status.is_change() && !check {
            write_file(path, contents)?;
            tracing::info!(path = %path.display(), ?status, "wrote artifact");
        }
        statuses.push((path.clone(), status));
    }
    Ok(statuses)
}

fn write_file(path: &Path, contents: &str) -> Result<(), PipelineError> {
    let io_err = |source: io::Error| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

/// Load the persisted manifests of every backend of a configured suite.
pub fn load_manifests(config: &SuiteConfig, base_dir: &Path) -> Result<Vec<SuiteManifest>, PipelineError> {
    let output_dir = config.resolved_output_dir(base_dir);
    config
        .backend_ids()
        .iter()
        .map(|backend| -> Result<SuiteManifest, PipelineError> {
            Ok(SuiteManifest::load(&output_dir.join(SuiteManifest::file_name(&config.name, backend)))?)
        })
        .collect()
}

/// Re-check every persisted manifest of a configured suite against the disk.
#[tracing::instrument(skip_all, fields(suite = %config.name))]
pub fn verify_suite(
    config: &SuiteConfig,
    base_dir: &Path,
) -> Result<Vec<(BackendId, CompletenessReport)>, PipelineError> {
    load_manifests(config, base_dir)?
        .into_iter()
        .map(|manifest| -> Result<(BackendId, CompletenessReport), PipelineError> {
            let checker = CompletenessChecker::new(base_dir.join(&manifest.root), PathMatcher::new(&manifest.pattern)?);
            let report = checker.verify(&manifest.recorded_paths(), &manifest.exclusions)?;
            Ok((manifest.backend, report))
        })
        .collect()
}

/// Re-bind the persisted suites of a configured suite to an executor.
pub fn load_suites(
    config: &SuiteConfig,
    base_dir: &Path,
    executor: Arc<dyn FixtureExecutor>,
) -> Result<Vec<GeneratedSuite>, PipelineError> {
    load_manifests(config, base_dir)?
        .iter()
        .map(|manifest| -> Result<GeneratedSuite, PipelineError> {
            Ok(GeneratedSuite::from_manifest(manifest, base_dir, Arc::clone(&executor))?)
        })
        .collect()
}

//! Rust test source emission.
//!
//! [`emit_suite`] renders a [`SuiteManifest`] into one Rust file:
//!
//! ```text
//! pub const FIXTURE_ROOT: &str = ...;      // root, pattern, backend, effective exclusions
//! pub mod ir_text {                         // one module per group
//!     #[test] fn all_files_present() {..}   // per-group completeness check
//!     #[test] fn test_top() {..}            // one test per fixture, calling the configured runner
//!     pub mod dynamic { .. }
//! }
//! ```
//!
//! ## Notes
//!
//! - Tokens are built with `quote`, parsed back with `syn` and formatted with `prettyplease`, so unchanged manifests
//!   produce byte-identical output.
//! - The runner is any function `fn(&str, &str, &str)` taking the fixture root, the root-relative fixture path and
//!   the backend; it must panic on failure. [`crate::harness::run_command`] fits that signature.
//! - Emission is codegen-only: no file or network access.

mod items;

use miette::Diagnostic;
use thiserror::Error;

use crate::manifest::SuiteManifest;
use crate::version::FIXSUITE_VERSION;

/// Default runner path called by emitted tests.
pub const DEFAULT_RUNNER: &str = "crate::run_fixture";
/// Default crate name under which emitted tests reach [`crate::harness`].
pub const DEFAULT_HARNESS_CRATE: &str = "fixsuite";

/// Error during Rust emission.
#[derive(Debug, Error, Diagnostic)]
pub enum EmitError {
    #[error("`{ident}` is not a valid Rust identifier")]
    #[diagnostic(code(fixsuite::emit::ident), help("regenerate the manifest; identifiers are derived by fixsuite"))]
    InvalidIdent { ident: String },

    #[error("`{value}` is not a valid Rust path for `{option}`")]
    #[diagnostic(code(fixsuite::emit::path), help("use a path such as `crate::run_fixture`"))]
    InvalidPath { option: &'static str, value: String },

    #[error("emitted tokens do not parse: {0}")]
    #[diagnostic(code(fixsuite::emit::syntax))]
    Syntax(String),
}

/// Options controlling emitted source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Path of the function each fixture test calls.
    pub runner: String,
    /// Crate providing `harness::assert_all_files_present`.
    pub harness_crate: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            runner: DEFAULT_RUNNER.to_string(),
            harness_crate: DEFAULT_HARNESS_CRATE.to_string(),
        }
    }
}

impl EmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    pub fn with_harness_crate(mut self, harness_crate: impl Into<String>) -> Self {
        self.harness_crate = harness_crate.into();
        self
    }
}

/// Render `manifest` as a formatted Rust test module.
#[tracing::instrument(skip_all, fields(backend = %manifest.backend, root = %manifest.root))]
pub fn emit_suite(manifest: &SuiteManifest, options: &EmitOptions) -> Result<String, EmitError> {
    let tokens = items::SuiteEmitter::new(manifest, options)?.emit()?;
    let syntax_tree: syn::File = syn::parse2(tokens).map_err(|e| EmitError::Syntax(e.to_string()))?;
    let formatted = prettyplease::unparse(&syntax_tree);

    let header = format!(
        "// This file is generated by fixsuite v{FIXSUITE_VERSION} from `{}` (backend `{}`).\n\
         // DO NOT MODIFY MANUALLY. Regenerate with `fixsuite generate`.\n\n",
        manifest.root, manifest.backend
    );
    Ok(format!("{header}{formatted}"))
}

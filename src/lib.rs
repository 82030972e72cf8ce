#![forbid(unsafe_code)]
//! fixsuite: keep fixture-driven test suites in sync with the fixture tree on disk
//!
//! Large compiler test suites keep hundreds of small input programs ("fixtures") on disk and need one executable
//! test per fixture, plus a guarantee that the test set never silently drifts from the fixture set. This crate
//! provides the scan → generate → verify pipeline:
//!
//! - [`matcher`] and [`scanner`] turn a fixture root into a deterministic tree,
//! - [`suite`] binds each fixture to a named test (one suite per backend),
//! - [`manifest`] and [`codegen`] persist a suite as JSON and as a Rust test module,
//! - [`completeness`] and [`harness`] re-check the disk at test time,
//! - [`runner`] executes suites in-process with pytest-style reporting.
//!
//! The IO-free data model (fixture paths, exclusions, naming, the completeness diff) lives in `fixsuite_core`.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Harness code**: [`harness`] panics on purpose; it runs inside `#[test]` functions.

pub mod cli;
pub mod codegen;
pub mod completeness;
pub mod config;
pub mod directives;
pub mod harness;
pub mod manifest;
pub mod matcher;
pub mod pipeline;
pub mod runner;
pub mod scanner;
pub mod suite;
pub mod version;

pub use fixsuite_core::{BackendId, CompletenessReport, ExclusionRule, ExclusionSet, FixturePath};

pub use codegen::{EmitOptions, emit_suite};
pub use completeness::CompletenessChecker;
pub use config::{ProjectConfig, SuiteConfig};
pub use manifest::SuiteManifest;
pub use matcher::PathMatcher;
pub use runner::{ConsoleReporter, RunOptions, SuiteRunner, TestReporter, TestResult, TestSummary};
pub use scanner::{FixtureNode, scan};
pub use suite::{CommandExecutor, Expectation, FixtureExecutor, GeneratedSuite, SuiteGenerator};

//! Runtime support for emitted test modules.
//!
//! Emitted suites depend on this module only; everything here panics on failure, because it runs inside `#[test]`
//! functions and a panic is how a test fails.

use fixsuite_core::{BackendId, ExclusionSet, FixturePath};

use crate::completeness::CompletenessChecker;
use crate::matcher::PathMatcher;
use crate::suite::{CommandExecutor, FixtureExecutor};

/// Assert that every fixture below `scope` has a generated test.
///
/// `recorded` lists the root-relative fixtures the emitted group covers and `exclusions` the suite's effective
/// exclusion rules. Panics with the completeness report when a fixture was added or deleted since generation.
#[track_caller]
pub fn assert_all_files_present(root: &str, pattern: &str, scope: &str, recorded: &[&str], exclusions: &[&str]) {
    let matcher = PathMatcher::new(pattern).unwrap_or_else(|e| panic!("invalid fixture pattern `{pattern}`: {e}"));
    let scope = parse_path(scope);
    let recorded: Vec<FixturePath> = recorded.iter().map(|p| parse_path(p)).collect();
    let exclusions =
        ExclusionSet::parse_all(exclusions).unwrap_or_else(|e| panic!("invalid exclusion list {exclusions:?}: {e}"));

    let report = CompletenessChecker::new(root, matcher)
        .verify_subtree(&scope, &recorded, &exclusions)
        .unwrap_or_else(|e| panic!("cannot scan fixture root `{root}`: {e}"));

    assert!(
        report.is_empty(),
        "generated suite for `{root}` is out of date; run `fixsuite generate`\n{report}"
    );
}

/// Execute one root-relative fixture with `executor`; panics with the executor's diagnostic on failure.
#[track_caller]
pub fn run_fixture_with(executor: &dyn FixtureExecutor, fixture: &str, backend: &str) {
    let fixture = parse_path(fixture);
    let backend = BackendId::new(backend);
    if let Err(failure) = executor.execute(&fixture, &backend) {
        panic!("{fixture} failed on {backend}: {failure}");
    }
}

/// Execute one fixture with an external command template (see [`CommandExecutor`]).
///
/// Matches the signature emitted tests call the configured runner with, so a runner can be a one-line wrapper:
///
/// ```rust,no_run
/// pub fn run_fixture(root: &str, fixture: &str, backend: &str) {
///     fixsuite::harness::run_command("kotlinc-check --backend {backend} {fixture}", root, fixture, backend);
/// }
/// ```
#[track_caller]
pub fn run_command(template: &str, root: &str, fixture: &str, backend: &str) {
    let executor =
        CommandExecutor::from_template(template, root).unwrap_or_else(|e| panic!("invalid command `{template}`: {e}"));
    run_fixture_with(&executor, fixture, backend);
}

#[track_caller]
fn parse_path(raw: &str) -> FixturePath {
    FixturePath::parse(raw).unwrap_or_else(|e| panic!("invalid fixture path `{raw}`: {e}"))
}

//! In-process suite runner (pytest-style).
//!
//! [`SuiteRunner`] executes a [`GeneratedSuite`] in declaration order. Each group contributes an `all_files_present`
//! check over its own directory, followed by its tests and subgroups, mirroring the emitted Rust module layout.
//!
//! ## TestReporter Trait
//!
//! Reporting is separated from execution by the [`TestReporter`] trait; [`ConsoleReporter`] is the default
//! pytest-style output. Implement the trait for other formats.
//!
//! ## Failure isolation
//!
//! A panicking executor fails only its own test: every test body runs under `catch_unwind`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use fixsuite_core::{BackendId, FixturePath, naming::ALL_FILES_PRESENT};

use crate::completeness::CompletenessChecker;
use crate::suite::{Expectation, GeneratedSuite, GroupBinding, PATH_SEPARATOR, SuiteNode, TestBinding};

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting suite execution results.
pub trait TestReporter {
    /// Called once the tests to run are known (after filtering).
    fn on_collection_complete(&mut self, test_count: usize);

    /// Called when a test begins.
    fn on_test_start(&mut self, _test: &TestInfo) {}

    /// Called when a test completes.
    fn on_test_complete(&mut self, test: &TestInfo, result: &TestResult);

    /// Called when all tests have completed (or the run stopped early).
    fn on_run_complete(&mut self, summary: &TestSummary);
}

/// What a collected test checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestKind {
    /// Executes one fixture through the suite's executor.
    Fixture(FixturePath),
    /// Re-scans one group's directory against the generated tests.
    Completeness(FixturePath),
}

/// Information about a collected test.
#[derive(Debug, Clone)]
pub struct TestInfo {
    /// Qualified name, e.g. `ir_text::dynamic::test_dynamic_call`.
    pub name: String,
    pub backend: BackendId,
    pub kind: TestKind,
}

/// Result of running a single test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed(Duration),
    Failed(Duration, String),
    /// Expected failure that failed.
    XFailed(Duration, String),
    /// Expected failure that passed; counts as a failure.
    XPassed(Duration),
}

impl TestResult {
    /// `true` for results that fail the run.
    pub fn is_failure(&self) -> bool {
        matches!(self, TestResult::Failed(..) | TestResult::XPassed(_))
    }
}

/// Summary of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub xfailed: usize,
    pub xpassed: usize,
    pub duration: Duration,
}

impl TestSummary {
    fn record(&mut self, result: &TestResult) {
        self.total += 1;
        match result {
            TestResult::Passed(_) => self.passed += 1,
            TestResult::Failed(..) => self.failed += 1,
            TestResult::XFailed(..) => self.xfailed += 1,
            TestResult::XPassed(_) => self.xpassed += 1,
        }
    }

    /// Fold another summary (e.g. another backend's run) into this one.
    pub fn merge(&mut self, other: &TestSummary) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.xfailed += other.xfailed;
        self.xpassed += other.xpassed;
        self.duration += other.duration;
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.xpassed == 0
    }
}

/// Default console reporter (pytest-style).
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    failures: Vec<(String, String)>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            failures: Vec::new(),
        }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, test_count: usize) {
        if test_count == 0 {
            eprintln!("No tests collected");
            return;
        }
        println!("\x1b[1m=================== test session starts ===================\x1b[0m");
        println!("collected {} item(s)", test_count);
        println!();
    }

    fn on_test_complete(&mut self, test: &TestInfo, result: &TestResult) {
        let status = match result {
            TestResult::Passed(d) => {
                if self.verbose {
                    format!("\x1b[32mPASSED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[32mPASSED\x1b[0m".to_string()
                }
            }
            TestResult::Failed(d, _) => {
                if self.verbose {
                    format!("\x1b[31mFAILED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[31mFAILED\x1b[0m".to_string()
                }
            }
            TestResult::XFailed(_, reason) => {
                if reason.is_empty() || !self.verbose {
                    "\x1b[33mXFAIL\x1b[0m".to_string()
                } else {
                    format!("\x1b[33mXFAIL\x1b[0m ({})", reason)
                }
            }
            TestResult::XPassed(_) => "\x1b[31mXPASS\x1b[0m".to_string(),
        };
        println!("[{}] {} {}", test.backend, test.name, status);

        match result {
            TestResult::Failed(_, message) => self.failures.push((test.name.clone(), message.clone())),
            TestResult::XPassed(_) => self.failures.push((
                test.name.clone(),
                "\x1b[33mTest passed but was expected to fail (xfail)\x1b[0m".to_string(),
            )),
            _ => {}
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        if !self.failures.is_empty() {
            println!();
            println!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
            for (name, message) in self.failures.drain(..) {
                println!();
                println!("\x1b[1m___________ {} ___________\x1b[0m", name);
                println!();
                for line in message.lines() {
                    println!("    {}", line);
                }
            }
        }

        println!();
        let summary_color = if summary.is_success() { "\x1b[1;32m" } else { "\x1b[1;31m" };
        print!("{}===================", summary_color);

        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("{} passed", summary.passed));
        }
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed));
        }
        if summary.xfailed > 0 {
            parts.push(format!("{} xfailed", summary.xfailed));
        }
        if summary.xpassed > 0 {
            parts.push(format!("{} xpassed", summary.xpassed));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        print!(" {} in {:.2}s ", parts.join(", "), summary.duration.as_secs_f64());
        println!("===================\x1b[0m");
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Options for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after the first failing test.
    pub stop_on_fail: bool,
    /// Only run tests whose qualified name contains this keyword.
    pub filter: Option<String>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_on_fail(mut self, stop_on_fail: bool) -> Self {
        self.stop_on_fail = stop_on_fail;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// A collected test, borrowed from the suite.
#[derive(Clone, Copy)]
enum Planned<'a> {
    Completeness(&'a GroupBinding),
    Fixture(&'a TestBinding),
}

/// Executes generated suites.
#[derive(Debug, Clone, Default)]
pub struct SuiteRunner {
    options: RunOptions,
}

impl SuiteRunner {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Run every collected test of `suite`, reporting as it goes.
    #[tracing::instrument(skip_all, fields(backend = %suite.backend(), root = %suite.root().display()))]
    pub fn run(&self, suite: &GeneratedSuite, reporter: &mut dyn TestReporter) -> TestSummary {
        let start = Instant::now();
        let mut plan = Vec::new();
        collect(suite.group(), &mut Vec::new(), &mut plan);
        plan.retain(|(name, _)| match &self.options.filter {
            Some(keyword) => name.contains(keyword.as_str()),
            None => true,
        });
        reporter.on_collection_complete(plan.len());

        let checker = CompletenessChecker::new(suite.root(), suite.matcher().clone());
        let mut summary = TestSummary::default();
        for (name, planned) in plan {
            let info = TestInfo {
                name,
                backend: suite.backend().clone(),
                kind: match planned {
                    Planned::Completeness(group) => TestKind::Completeness(group.path.clone()),
                    Planned::Fixture(test) => TestKind::Fixture(test.fixture.clone()),
                },
            };
            reporter.on_test_start(&info);
            let result = match planned {
                Planned::Completeness(group) => run_completeness(&checker, suite, group),
                Planned::Fixture(test) => run_fixture(test),
            };
            tracing::debug!(test = %info.name, failed = result.is_failure(), "test finished");
            reporter.on_test_complete(&info, &result);
            summary.record(&result);

            if self.options.stop_on_fail && result.is_failure() {
                tracing::info!(test = %info.name, "stopping after first failure");
                break;
            }
        }

        summary.duration = start.elapsed();
        reporter.on_run_complete(&summary);
        summary
    }
}

/// Flatten a group in emitted order: completeness check, then children.
fn collect<'a>(group: &'a GroupBinding, trail: &mut Vec<&'a str>, out: &mut Vec<(String, Planned<'a>)>) {
    trail.push(&group.ident);
    out.push((qualify(trail, ALL_FILES_PRESENT), Planned::Completeness(group)));
    for child in &group.children {
        match child {
            SuiteNode::Test(test) => out.push((qualify(trail, &test.ident), Planned::Fixture(test))),
            SuiteNode::Group(child) => collect(child, trail, out),
        }
    }
    trail.pop();
}

fn qualify(trail: &[&str], leaf: &str) -> String {
    let mut name = trail.join(PATH_SEPARATOR);
    name.push_str(PATH_SEPARATOR);
    name.push_str(leaf);
    name
}

fn run_completeness(checker: &CompletenessChecker, suite: &GeneratedSuite, group: &GroupBinding) -> TestResult {
    let start = Instant::now();
    let recorded = group.recorded_paths();
    match checker.verify_subtree(&group.path, &recorded, suite.exclusions()) {
        Ok(report) if report.is_empty() => TestResult::Passed(start.elapsed()),
        Ok(report) => TestResult::Failed(start.elapsed(), report.to_string()),
        Err(e) => TestResult::Failed(start.elapsed(), e.to_string()),
    }
}

fn run_fixture(test: &TestBinding) -> TestResult {
    let start = Instant::now();
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| test.run())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(failure)) => Err(failure.to_string()),
        Err(payload) => Err(format!("executor panicked: {}", panic_message(payload.as_ref()))),
    };
    let elapsed = start.elapsed();

    match (test.expectation, outcome) {
        (Expectation::Pass, Ok(())) => TestResult::Passed(elapsed),
        (Expectation::Pass, Err(message)) => TestResult::Failed(elapsed, message),
        (Expectation::Fail, Ok(())) => TestResult::XPassed(elapsed),
        (Expectation::Fail, Err(message)) => TestResult::XFailed(elapsed, message),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::matcher::PathMatcher;
    use crate::scanner::scan;
    use crate::suite::{ExecutionFailure, FixtureExecutor, Outcome, SuiteGenerator};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingReporter {
        collected: Option<usize>,
        results: Vec<(String, TestResult)>,
        summary: Option<TestSummary>,
    }

    impl TestReporter for RecordingReporter {
        fn on_collection_complete(&mut self, test_count: usize) {
            self.collected = Some(test_count);
        }

        fn on_test_complete(&mut self, test: &TestInfo, result: &TestResult) {
            self.results.push((test.name.clone(), result.clone()));
        }

        fn on_run_complete(&mut self, summary: &TestSummary) {
            self.summary = Some(summary.clone());
        }
    }

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn suite_for(root: &Path, executor: Arc<dyn FixtureExecutor>) -> GeneratedSuite {
        let matcher = PathMatcher::new(r"^(.+)\.kt$").unwrap();
        let tree = scan(root, &matcher).unwrap();
        SuiteGenerator::new(root, &matcher)
            .with_directives(true)
            .generate(&tree, BackendId::new("jvm"), executor)
            .unwrap()
    }

    /// Fails fixtures whose file name contains `bad`, panics on `panic`.
    fn selective() -> Arc<dyn FixtureExecutor> {
        Arc::new(|fixture: &FixturePath, _: &BackendId| -> Outcome {
            let name = fixture.file_name().unwrap_or_default();
            if name.contains("panic") {
                panic!("executor blew up on {fixture}");
            }
            if name.contains("bad") {
                return Err(ExecutionFailure::new(format!("{fixture} produced wrong output")));
            }
            Ok(())
        })
    }

    fn names(reporter: &RecordingReporter) -> Vec<&str> {
        reporter.results.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[test]
    fn test_runs_in_emitted_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        write(&root, "a/x.kt", "");
        write(&root, "top.kt", "");
        let suite = suite_for(&root, selective());

        let mut reporter = RecordingReporter::default();
        let summary = SuiteRunner::default().run(&suite, &mut reporter);

        assert_eq!(
            names(&reporter),
            vec![
                "data::all_files_present",
                "data::a::all_files_present",
                "data::a::test_x",
                "data::test_top",
            ]
        );
        assert_eq!(reporter.collected, Some(4));
        assert_eq!(summary.passed, 4);
        assert!(summary.is_success());
        assert_eq!(reporter.summary, Some(summary));
    }

    #[test]
    fn test_failures_and_panics_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.kt", "");
        write(dir.path(), "good.kt", "");
        write(dir.path(), "panic.kt", "");
        let suite = suite_for(dir.path(), selective());

        let mut reporter = RecordingReporter::default();
        let summary = SuiteRunner::default().run(&suite, &mut reporter);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.passed, 2);
        let panicked = reporter
            .results
            .iter()
            .find(|(name, _)| name.ends_with("test_panic"))
            .map(|(_, result)| result.clone())
            .unwrap();
        match panicked {
            TestResult::Failed(_, message) => assert!(message.contains("executor blew up on panic.kt"), "{message}"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_expected_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.kt", "// IGNORE_BACKEND: JVM\n");
        write(dir.path(), "fixed.kt", "// IGNORE_BACKEND: JVM\n");
        let suite = suite_for(dir.path(), selective());

        let mut reporter = RecordingReporter::default();
        let summary = SuiteRunner::default().run(&suite, &mut reporter);

        assert_eq!(summary.xfailed, 1);
        assert_eq!(summary.xpassed, 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_filter_and_stop_on_fail() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/bad.kt", "");
        write(dir.path(), "a/good.kt", "");
        write(dir.path(), "b/other.kt", "");
        let suite = suite_for(dir.path(), selective());

        let mut reporter = RecordingReporter::default();
        let options = RunOptions::new().with_filter("::a::").with_stop_on_fail(true);
        let summary = SuiteRunner::new(options).run(&suite, &mut reporter);

        assert_eq!(reporter.collected, Some(3));
        let group = &suite.group().ident;
        assert_eq!(
            names(&reporter),
            vec![format!("{group}::a::all_files_present"), format!("{group}::a::test_bad")]
        );
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_completeness_failure_after_fixture_added() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/x.kt", "");
        let suite = suite_for(dir.path(), selective());
        write(dir.path(), "a/y.kt", "");

        let mut reporter = RecordingReporter::default();
        let summary = SuiteRunner::default().run(&suite, &mut reporter);

        assert_eq!(summary.failed, 2);
        let (_, result) = &reporter.results[0];
        match result {
            TestResult::Failed(_, message) => assert!(message.contains("+ a/y.kt"), "{message}"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_summary_merge() {
        let mut total = TestSummary {
            total: 2,
            passed: 2,
            ..TestSummary::default()
        };
        total.merge(&TestSummary {
            total: 1,
            xpassed: 1,
            ..TestSummary::default()
        });
        assert_eq!(total.total, 3);
        assert!(!total.is_success());
    }
}

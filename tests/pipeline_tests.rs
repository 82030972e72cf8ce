//! End-to-end tests: scan a fixture tree, generate suites, persist them and verify them against the disk.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use fixsuite::completeness;
use fixsuite::pipeline::{self, ArtifactStatus};
use fixsuite::suite::{ExecutionFailure, Outcome};
use fixsuite::{
    BackendId, CompletenessChecker, ExclusionSet, Expectation, FixtureNode, FixturePath, GeneratedSuite, PathMatcher,
    SuiteConfig, SuiteGenerator, SuiteManifest, emit_suite, scan,
};

const KT: &str = r"^(.+)\.kt$";

fn touch(root: &Path, rel: &str) {
    write(root, rel, "");
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn paths(items: &[&str]) -> Vec<FixturePath> {
    items.iter().map(|s| FixturePath::parse(s).unwrap()).collect()
}

fn ok_executor() -> Arc<dyn fixsuite::FixtureExecutor> {
    Arc::new(|_: &FixturePath, _: &BackendId| -> Outcome { Ok(()) })
}

fn generate(root: &Path, matcher: &PathMatcher, backend: &str) -> GeneratedSuite {
    let tree = scan(root, matcher).unwrap();
    SuiteGenerator::new(root, matcher)
        .generate(&tree, BackendId::new(backend), ok_executor())
        .unwrap()
}

#[test]
fn test_scan_drops_directories_without_matches() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a/x.kt");
    touch(dir.path(), "a/y.kt");
    touch(dir.path(), "b/z.txt");

    let tree = scan(dir.path(), &PathMatcher::new(KT).unwrap()).unwrap();
    let FixtureNode::Group { children, .. } = &tree else {
        panic!("root must be a group");
    };
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].path().as_str(), "a");
    assert_eq!(children[0].children().len(), 2);
    assert!(children[0].children().iter().all(FixtureNode::is_leaf));
}

#[test]
fn test_deleted_fixture_is_stale() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a/x.kt");
    touch(dir.path(), "a/y.kt");
    let matcher = PathMatcher::new(KT).unwrap();
    let recorded = generate(dir.path(), &matcher, "jvm").recorded_paths();
    assert_eq!(recorded.len(), 2);

    fs::remove_file(dir.path().join("a/y.kt")).unwrap();
    let report = completeness::verify(dir.path(), &matcher, &recorded, &ExclusionSet::new()).unwrap();
    assert_eq!(report.stale, paths(&["a/y.kt"]));
    assert!(report.orphans.is_empty());
}

#[test]
fn test_added_fixture_is_orphan() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a/x.kt");
    touch(dir.path(), "a/y.kt");
    let matcher = PathMatcher::new(KT).unwrap();
    let recorded = generate(dir.path(), &matcher, "jvm").recorded_paths();

    touch(dir.path(), "a/w.kt");
    let report = completeness::verify(dir.path(), &matcher, &recorded, &ExclusionSet::new()).unwrap();
    assert_eq!(report.orphans, paths(&["a/w.kt"]));
    assert!(report.stale.is_empty());
}

#[test]
fn test_regenerated_suite_is_complete() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a/x.kt");
    touch(dir.path(), "b/c/deep.kt");
    touch(dir.path(), "top.kt");
    let matcher = PathMatcher::new(KT).unwrap();
    let suite = generate(dir.path(), &matcher, "jvm");

    let checker = CompletenessChecker::new(dir.path(), PathMatcher::new(KT).unwrap());
    let report = checker.verify(&suite.recorded_paths(), suite.exclusions()).unwrap();
    assert!(report.is_empty(), "{report}");
}

#[test]
fn test_excluded_fixture_is_neither_bound_nor_reported() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a/x.kt");
    touch(dir.path(), "a/broken.kt");
    touch(dir.path(), "wip/one.kt");
    let exclusions = ExclusionSet::parse_all(["a/broken.kt", "wip/"]).unwrap();
    let matcher = PathMatcher::new(KT).unwrap().with_exclusions(exclusions.clone());

    let suite = generate(dir.path(), &matcher, "jvm");
    assert_eq!(suite.recorded_paths().into_iter().collect::<Vec<_>>(), paths(&["a/x.kt"]));

    let report = completeness::verify(dir.path(), &PathMatcher::new(KT).unwrap(), &suite.recorded_paths(), &exclusions)
        .unwrap();
    assert!(report.is_empty(), "{report}");
}

#[test]
fn test_backends_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "common.kt");
    write(dir.path(), "jvm_only.kt", "// TARGET_BACKEND: JVM\nfun box() = \"OK\"\n");
    write(dir.path(), "flaky.kt", "// IGNORE_BACKEND: JS_IR\nfun box() = \"OK\"\n");
    let matcher = PathMatcher::new(KT).unwrap();
    let tree = scan(dir.path(), &matcher).unwrap();

    let suites = SuiteGenerator::new(dir.path(), &matcher)
        .with_directives(true)
        .generate_all(&tree, &[BackendId::new("jvm"), BackendId::new("js_ir")], ok_executor())
        .unwrap();
    let [jvm, js] = suites.as_slice() else {
        panic!("expected one suite per backend");
    };

    assert_eq!(jvm.test_count(), 3);
    assert_eq!(js.test_count(), 2);
    assert!(js.exclusions().is_excluded(&FixturePath::parse("jvm_only.kt").unwrap()));
    assert!(jvm.exclusions().is_empty());

    let expectation = |suite: &GeneratedSuite, fixture: &str| {
        suite
            .tests()
            .into_iter()
            .find(|(_, t)| t.fixture.as_str() == fixture)
            .map(|(_, t)| t.expectation)
            .unwrap()
    };
    assert_eq!(expectation(jvm, "flaky.kt"), Expectation::Pass);
    assert_eq!(expectation(js, "flaky.kt"), Expectation::Fail);

    // both suites verify clean against the same tree with their own exclusions
    for suite in &suites {
        let report = completeness::verify(dir.path(), &matcher, &suite.recorded_paths(), suite.exclusions()).unwrap();
        assert!(report.is_empty(), "{}: {report}", suite.backend());
    }
}

#[test]
fn test_manifest_round_trip_rebinds_tests() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "fixtures/a/x.kt");
    touch(dir.path(), "fixtures/a/y.kt");
    let root = dir.path().join("fixtures");
    let matcher = PathMatcher::new(KT).unwrap();
    let manifest = generate(&root, &matcher, "jvm").to_manifest("fixtures");

    let path = dir.path().join("out").join(SuiteManifest::file_name("box", &manifest.backend));
    manifest.save(&path).unwrap();
    let loaded = SuiteManifest::load(&path).unwrap();
    assert_eq!(loaded, manifest);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let executor = Arc::new(move |fixture: &FixturePath, _: &BackendId| -> Outcome {
        sink.lock().unwrap().push(fixture.to_string());
        Err(ExecutionFailure::new("boom"))
    });
    let suite = GeneratedSuite::from_manifest(&loaded, dir.path(), executor).unwrap();
    assert_eq!(suite.root(), root);
    for (_, test) in suite.tests() {
        assert!(test.run().is_err());
    }
    assert_eq!(*seen.lock().unwrap(), vec!["a/x.kt", "a/y.kt"]);
}

#[test]
fn test_emitted_module_parses() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "irText/dynamic/dynamicArrayAccess.kt");
    touch(dir.path(), "irText/dynamic/dynamic_array_access.kt");
    let root = dir.path().join("irText");
    let manifest = generate(&root, &PathMatcher::new(KT).unwrap(), "jvm").to_manifest("irText");

    let source = emit_suite(&manifest, &Default::default()).unwrap();
    let file = syn::parse_file(&source).unwrap();
    assert!(!file.items.is_empty());
    assert!(source.contains("fn test_dynamic_array_access()"));
    assert!(source.contains("fn test_dynamic_array_access_2()"));
}

#[test]
fn test_configured_generate_then_verify() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "data/a/x.kt");
    let config = SuiteConfig::new("box")
        .with_root("data")
        .with_pattern(KT)
        .with_backends(["jvm", "js_ir"]);

    for artifacts in pipeline::generate_artifacts(&config, dir.path()).unwrap() {
        let statuses = pipeline::write_artifacts(&artifacts, false).unwrap();
        assert!(statuses.iter().all(|(_, status)| *status == ArtifactStatus::Created));
    }
    for (_, report) in pipeline::verify_suite(&config, dir.path()).unwrap() {
        assert!(report.is_empty());
    }

    touch(dir.path(), "data/b/new.kt");
    fs::remove_file(dir.path().join("data/a/x.kt")).unwrap();
    for (backend, report) in pipeline::verify_suite(&config, dir.path()).unwrap() {
        assert_eq!(report.orphans, paths(&["b/new.kt"]), "{backend}");
        assert_eq!(report.stale, paths(&["a/x.kt"]), "{backend}");
    }
}

//! Generated suites: the group/test bindings produced from a fixture tree.
//!
//! A [`GeneratedSuite`] is a tree isomorphic to the scanned [`crate::scanner::FixtureNode`] tree:
//!
//! - every directory group becomes a [`GroupBinding`] (identifier + ordered children),
//! - every bound fixture becomes a [`TestBinding`] (identifier, fixture path, backend identity, executor).
//!
//! ## Invariant
//!
//! The fixture paths reachable from the suite's tests, unioned with the suite's effective exclusion set, cover every
//! leaf of the tree the suite was generated from. [`crate::completeness`] re-checks this against the disk at test
//! time.
//!
//! Suites share no mutable state: two suites generated from the same tree (e.g. one per backend) can run
//! concurrently.

mod executor;
mod generator;

pub use executor::{
    BACKEND_PLACEHOLDER, CommandExecutor, ExecutionFailure, ExecutorError, FIXTURE_PLACEHOLDER, FixtureExecutor,
    Outcome, PATH_PLACEHOLDER,
};
pub use generator::{GenerateError, SuiteGenerator};

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fixsuite_core::{BackendId, ExclusionSet, FixturePath};
use serde::{Deserialize, Serialize};

use crate::manifest::{DeclNode, GroupDecl, SuiteManifest, TestDecl};
use crate::matcher::{PathMatcher, PatternError};

/// Separator used in qualified test names (`ir_text::dynamic::test_call`).
pub const PATH_SEPARATOR: &str = "::";

/// Whether a test is expected to pass or fail on its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    #[default]
    Pass,
    /// The fixture is known-broken on this backend (`IGNORE_BACKEND`). A failure is reported as XFAIL and an
    /// unexpected pass fails the test.
    Fail,
}

impl Expectation {
    pub fn is_pass(&self) -> bool {
        matches!(self, Expectation::Pass)
    }
}

/// One generated test.
#[derive(Clone)]
pub struct TestBinding {
    pub ident: String,
    pub fixture: FixturePath,
    pub backend: BackendId,
    pub expectation: Expectation,
    executor: Arc<dyn FixtureExecutor>,
}

impl TestBinding {
    pub fn new(
        ident: String,
        fixture: FixturePath,
        backend: BackendId,
        expectation: Expectation,
        executor: Arc<dyn FixtureExecutor>,
    ) -> Self {
        Self {
            ident,
            fixture,
            backend,
            expectation,
            executor,
        }
    }

    /// Invoke the bound executor. Expectation handling is left to the runner.
    pub fn run(&self) -> Outcome {
        self.executor.execute(&self.fixture, &self.backend)
    }
}

impl fmt::Debug for TestBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestBinding")
            .field("ident", &self.ident)
            .field("fixture", &self.fixture)
            .field("backend", &self.backend)
            .field("expectation", &self.expectation)
            .finish_non_exhaustive()
    }
}

/// A child of a group.
#[derive(Debug, Clone)]
pub enum SuiteNode {
    Group(GroupBinding),
    Test(TestBinding),
}

/// One generated group (one per fixture directory).
#[derive(Debug, Clone)]
pub struct GroupBinding {
    pub ident: String,
    pub path: FixturePath,
    pub children: Vec<SuiteNode>,
}

impl GroupBinding {
    /// Fixture paths of every test in this group and below.
    pub fn recorded_paths(&self) -> BTreeSet<FixturePath> {
        let mut out = BTreeSet::new();
        self.visit(&mut Vec::new(), &mut |_, node| {
            if let SuiteNode::Test(test) = node {
                out.insert(test.fixture.clone());
            }
        });
        out
    }

    /// Direct child tests.
    pub fn tests(&self) -> impl Iterator<Item = &TestBinding> {
        self.children.iter().filter_map(|child| match child {
            SuiteNode::Test(test) => Some(test),
            SuiteNode::Group(_) => None,
        })
    }

    /// Direct child groups.
    pub fn groups(&self) -> impl Iterator<Item = &GroupBinding> {
        self.children.iter().filter_map(|child| match child {
            SuiteNode::Group(group) => Some(group),
            SuiteNode::Test(_) => None,
        })
    }

    /// Depth-first, in declaration order. `f` receives the identifiers of the enclosing groups (including this one)
    /// and each child.
    fn visit<'a>(&'a self, trail: &mut Vec<&'a str>, f: &mut dyn FnMut(&[&'a str], &'a SuiteNode)) {
        trail.push(&self.ident);
        for child in &self.children {
            f(trail, child);
            if let SuiteNode::Group(group) = child {
                group.visit(trail, f);
            }
        }
        trail.pop();
    }

    fn to_decl(&self) -> GroupDecl {
        GroupDecl {
            ident: self.ident.clone(),
            path: self.path.clone(),
            children: self
                .children
                .iter()
                .map(|child| match child {
                    SuiteNode::Group(group) => DeclNode::Group(group.to_decl()),
                    SuiteNode::Test(test) => DeclNode::Test(TestDecl {
                        ident: test.ident.clone(),
                        fixture: test.fixture.clone(),
                        expectation: test.expectation,
                    }),
                })
                .collect(),
        }
    }

    fn from_decl(decl: &GroupDecl, backend: &BackendId, executor: &Arc<dyn FixtureExecutor>) -> Self {
        Self {
            ident: decl.ident.clone(),
            path: decl.path.clone(),
            children: decl
                .children
                .iter()
                .map(|child| match child {
                    DeclNode::Group(group) => SuiteNode::Group(Self::from_decl(group, backend, executor)),
                    DeclNode::Test(test) => SuiteNode::Test(TestBinding::new(
                        test.ident.clone(),
                        test.fixture.clone(),
                        backend.clone(),
                        test.expectation,
                        Arc::clone(executor),
                    )),
                })
                .collect(),
        }
    }
}

/// The output of [`SuiteGenerator::generate`] for one backend.
#[derive(Debug, Clone)]
pub struct GeneratedSuite {
    backend: BackendId,
    root: PathBuf,
    matcher: PathMatcher,
    group: GroupBinding,
}

impl GeneratedSuite {
    pub(crate) fn new(backend: BackendId, root: PathBuf, matcher: PathMatcher, group: GroupBinding) -> Self {
        Self {
            backend,
            root,
            matcher,
            group,
        }
    }

    /// Re-bind a persisted suite to an executor. `base_dir` resolves a relative manifest root.
    pub fn from_manifest(
        manifest: &SuiteManifest,
        base_dir: &Path,
        executor: Arc<dyn FixtureExecutor>,
    ) -> Result<Self, PatternError> {
        let matcher = PathMatcher::new(&manifest.pattern)?.with_exclusions(manifest.exclusions.clone());
        Ok(Self {
            backend: manifest.backend.clone(),
            root: base_dir.join(&manifest.root),
            matcher,
            group: GroupBinding::from_decl(&manifest.suite, &manifest.backend, &executor),
        })
    }

    /// Persistable declarations of this suite. `root_label` is the root as it should be written (usually relative
    /// to the project configuration).
    pub fn to_manifest(&self, root_label: &str) -> SuiteManifest {
        SuiteManifest::new(
            self.backend.clone(),
            root_label.replace('\\', "/"),
            self.matcher.pattern().to_string(),
            self.matcher.exclusions().clone(),
            self.group.to_decl(),
        )
    }

    pub fn backend(&self) -> &BackendId {
        &self.backend
    }

    /// The directory the suite was generated from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Pattern plus effective exclusions (configured exclusions and directive-excluded fixtures).
    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        self.matcher.exclusions()
    }

    pub fn group(&self) -> &GroupBinding {
        &self.group
    }

    /// Fixture paths of every generated test; persisted alongside the suite for later verification.
    pub fn recorded_paths(&self) -> BTreeSet<FixturePath> {
        self.group.recorded_paths()
    }

    pub fn test_count(&self) -> usize {
        self.recorded_paths().len()
    }

    /// Every test with its qualified name, in declaration order.
    pub fn tests(&self) -> Vec<(String, &TestBinding)> {
        let mut out = Vec::new();
        self.group.visit(&mut Vec::new(), &mut |trail, node| {
            if let SuiteNode::Test(test) = node {
                let mut name = trail.join(PATH_SEPARATOR);
                name.push_str(PATH_SEPARATOR);
                name.push_str(&test.ident);
                out.push((name, test));
            }
        });
        out
    }

    /// Every group with its qualified name, outermost first.
    pub fn groups(&self) -> Vec<(String, &GroupBinding)> {
        let mut out = vec![(self.group.ident.clone(), &self.group)];
        self.group.visit(&mut Vec::new(), &mut |trail, node| {
            if let SuiteNode::Group(group) = node {
                let mut name = trail.join(PATH_SEPARATOR);
                name.push_str(PATH_SEPARATOR);
                name.push_str(&group.ident);
                out.push((name, group));
            }
        });
        out
    }
}

//! Suite generation: fixture tree → group/test bindings.
//!
//! The generator walks the scanned tree in scanner order and assigns identifiers with one
//! [`SiblingScope`] per group, so regenerating an unchanged tree reproduces the same identifiers.
//!
//! For each leaf it decides, per backend:
//!
//! - skip it when the configured exclusions cover it (trees scanned with a looser matcher may still contain it),
//! - skip it and record an exact exclusion when its `TARGET_BACKEND` directive excludes the backend,
//! - otherwise bind a test, expected to fail when `IGNORE_BACKEND` names the backend.

use std::path::Path;
use std::sync::Arc;

use fixsuite_core::naming::{self, NameKind};
use fixsuite_core::{BackendId, ExclusionSet, FixturePath, NameCollisionExhausted, SiblingScope};
use miette::Diagnostic;
use thiserror::Error;

use super::{Expectation, FixtureExecutor, GeneratedSuite, GroupBinding, SuiteNode, TestBinding};
use crate::directives::Directives;
use crate::matcher::PathMatcher;
use crate::scanner::FixtureNode;

/// Fallback identifier for the root group when the root directory has no usable name.
pub const FALLBACK_ROOT_GROUP: &str = "fixtures";

/// Generation failure.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    #[error("cannot derive a unique test name for `{path}`")]
    #[diagnostic(
        code(fixsuite::generate::name_collision),
        help("too many sibling fixtures normalise to the same identifier; rename some of them")
    )]
    NameCollision {
        path: FixturePath,
        #[source]
        source: NameCollisionExhausted,
    },

    #[error("the fixture tree passed to the generator is a leaf, not a group")]
    #[diagnostic(code(fixsuite::generate::not_a_group))]
    NotAGroup,
}

/// Builds [`GeneratedSuite`]s from a scanned tree.
#[derive(Debug, Clone, Copy)]
pub struct SuiteGenerator<'a> {
    root: &'a Path,
    matcher: &'a PathMatcher,
    read_directives: bool,
}

impl<'a> SuiteGenerator<'a> {
    /// A generator for fixtures under `root`, named with `matcher`'s capture group and excluded with its exclusions.
    /// Directive reading is off by default.
    pub fn new(root: &'a Path, matcher: &'a PathMatcher) -> Self {
        Self {
            root,
            matcher,
            read_directives: false,
        }
    }

    /// Honour `TARGET_BACKEND` / `IGNORE_BACKEND` directives in fixture files.
    pub fn with_directives(mut self, enabled: bool) -> Self {
        self.read_directives = enabled;
        self
    }

    /// Generate the suite of one backend.
    #[tracing::instrument(skip_all, fields(backend = %backend, root = %self.root.display()))]
    pub fn generate(
        &self,
        tree: &FixtureNode,
        backend: BackendId,
        executor: Arc<dyn FixtureExecutor>,
    ) -> Result<GeneratedSuite, GenerateError> {
        let FixtureNode::Group { path, children } = tree else {
            return Err(GenerateError::NotAGroup);
        };

        let mut pass = GenerationPass {
            generator: self,
            backend: &backend,
            executor: &executor,
            exclusions: self.matcher.exclusions().clone(),
        };
        let group = pass.bind_group(path, root_identifier(self.root, path), children)?;
        let exclusions = pass.exclusions;

        let suite = GeneratedSuite::new(
            backend,
            self.root.to_path_buf(),
            self.matcher.clone().with_exclusions(exclusions),
            group,
        );
        tracing::info!(tests = suite.test_count(), "generated suite");
        Ok(suite)
    }

    /// Generate one independent suite per backend over the same tree.
    pub fn generate_all(
        &self,
        tree: &FixtureNode,
        backends: &[BackendId],
        executor: Arc<dyn FixtureExecutor>,
    ) -> Result<Vec<GeneratedSuite>, GenerateError> {
        backends
            .iter()
            .map(|backend| self.generate(tree, backend.clone(), Arc::clone(&executor)))
            .collect()
    }

    fn directives_for(&self, fixture: &FixturePath) -> Directives {
        if !self.read_directives {
            return Directives::default();
        }
        let file = fixture.segments().fold(self.root.to_path_buf(), |acc, seg| acc.join(seg));
        match Directives::read(&file) {
            Ok(directives) => directives,
            Err(e) => {
                // The test is still generated; executing it will surface the problem.
                tracing::warn!(%fixture, error = %e, "could not read fixture directives");
                Directives::default()
            }
        }
    }
}

/// State of one `generate` call.
struct GenerationPass<'g, 'a> {
    generator: &'g SuiteGenerator<'a>,
    backend: &'g BackendId,
    executor: &'g Arc<dyn FixtureExecutor>,
    exclusions: ExclusionSet,
}

impl GenerationPass<'_, '_> {
    fn bind_group(
        &mut self,
        path: &FixturePath,
        ident: String,
        children: &[FixtureNode],
    ) -> Result<GroupBinding, GenerateError> {
        let mut scope = SiblingScope::new();
        let mut bound = Vec::with_capacity(children.len());

        for child in children {
            match child {
                FixtureNode::Leaf(fixture) => {
                    if let Some(test) = self.bind_test(fixture, &mut scope)? {
                        bound.push(SuiteNode::Test(test));
                    }
                }
                FixtureNode::Group {
                    path: child_path,
                    children: grandchildren,
                } => {
                    let segment = child_path.file_name().unwrap_or_default();
                    let child_ident =
                        scope
                            .resolve(segment, NameKind::Group)
                            .map_err(|source| GenerateError::NameCollision {
                                path: child_path.clone(),
                                source,
                            })?;
                    bound.push(SuiteNode::Group(self.bind_group(child_path, child_ident, grandchildren)?));
                }
            }
        }

        Ok(GroupBinding {
            ident,
            path: path.clone(),
            children: bound,
        })
    }

    fn bind_test(
        &mut self,
        fixture: &FixturePath,
        scope: &mut SiblingScope,
    ) -> Result<Option<TestBinding>, GenerateError> {
        let matcher = self.generator.matcher;
        if matcher.exclusions().is_excluded(fixture) {
            return Ok(None);
        }

        let directives = self.generator.directives_for(fixture);
        if !directives.applies_to(self.backend) {
            tracing::debug!(%fixture, backend = %self.backend, "fixture targets other backends");
            self.exclusions.exclude_exact(fixture.clone());
            return Ok(None);
        }

        let file_name = fixture.file_name().unwrap_or_default();
        let resolved = match matcher.name_stem(file_name) {
            Some(stem) => scope.resolve_stem(stem, NameKind::Test),
            None => scope.resolve(file_name, NameKind::Test),
        };
        let ident = resolved.map_err(|source| GenerateError::NameCollision {
            path: fixture.clone(),
            source,
        })?;

        let expectation = if directives.is_ignored_on(self.backend) {
            Expectation::Fail
        } else {
            Expectation::Pass
        };

        Ok(Some(TestBinding::new(
            ident,
            fixture.clone(),
            self.backend.clone(),
            expectation,
            Arc::clone(self.executor),
        )))
    }
}

/// Identifier of the root group: the scanned directory's own name (`testData/ir/js` → `js`).
fn root_identifier(root: &Path, path: &FixturePath) -> String {
    let name = path
        .file_name()
        .or_else(|| root.file_name().and_then(|name| name.to_str()));
    match name {
        Some(name) => naming::base_identifier(name, NameKind::Group),
        None => FALLBACK_ROOT_GROUP.to_string(),
    }
}

//! Test-time completeness checking.
//!
//! The generated suite records which fixture paths it covers. At test time the [`CompletenessChecker`] re-scans the
//! fixture root with the same pattern and reports:
//!
//! - orphans: fixtures on disk that match the pattern, are not excluded, and have no generated test,
//! - stale entries: recorded fixtures that no longer exist.
//!
//! A non-empty [`CompletenessReport`] is the "suite out of date" signal; only scan failures are errors.

use std::path::{Path, PathBuf};

use fixsuite_core::{ExclusionSet, FixturePath};

pub use fixsuite_core::CompletenessReport;

use crate::matcher::PathMatcher;
use crate::scanner::{self, ScanError};

/// Re-scans a fixture root and diffs it against a recorded fixture set.
#[derive(Debug, Clone)]
pub struct CompletenessChecker {
    root: PathBuf,
    matcher: PathMatcher,
}

impl CompletenessChecker {
    /// `matcher` supplies the pattern; its own exclusions are ignored in favour of the ones passed to `verify`.
    pub fn new(root: impl Into<PathBuf>, matcher: PathMatcher) -> Self {
        Self {
            root: root.into(),
            matcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check the whole tree.
    pub fn verify<'a, R>(&self, recorded: R, exclusions: &ExclusionSet) -> Result<CompletenessReport, ScanError>
    where
        R: IntoIterator<Item = &'a FixturePath>,
    {
        self.verify_subtree(&FixturePath::root(), recorded, exclusions)
    }

    /// Check only fixtures below `scope`. Recorded paths outside `scope` are ignored, so each generated group can
    /// verify its own directory.
    #[tracing::instrument(skip_all, fields(root = %self.root.display(), scope = %scope))]
    pub fn verify_subtree<'a, R>(
        &self,
        scope: &FixturePath,
        recorded: R,
        exclusions: &ExclusionSet,
    ) -> Result<CompletenessReport, ScanError>
    where
        R: IntoIterator<Item = &'a FixturePath>,
    {
        // Scan without exclusions: excluded fixtures are live but explained, which the report accounts for.
        let pattern_only = self.matcher.clone().with_exclusions(ExclusionSet::new());
        let tree = scanner::scan_subtree(&self.root, scope, &pattern_only)?;
        let live = tree.leaves();
        let recorded: Vec<&FixturePath> = recorded.into_iter().filter(|path| path.starts_with(scope)).collect();

        let report = CompletenessReport::compute(live, recorded, exclusions);
        if report.is_empty() {
            tracing::debug!("fixture tree matches the generated suite");
        } else {
            tracing::warn!(
                orphans = report.orphans.len(),
                stale = report.stale.len(),
                "generated suite is out of date"
            );
        }
        Ok(report)
    }
}

/// One-shot check of a whole fixture root.
pub fn verify<'a, R>(
    root: &Path,
    matcher: &PathMatcher,
    recorded: R,
    exclusions: &ExclusionSet,
) -> Result<CompletenessReport, ScanError>
where
    R: IntoIterator<Item = &'a FixturePath>,
{
    CompletenessChecker::new(root, matcher.clone()).verify(recorded, exclusions)
}

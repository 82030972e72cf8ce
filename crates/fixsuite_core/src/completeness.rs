//! The completeness set difference.
//!
//! Given the live fixture set `L` (scanned from disk now), the recorded set `R` (captured when the suite was
//! generated) and the exclusion set `E`:
//!
//! - `orphans = L − R − E`: fixtures on disk with no generated test and no exclusion explaining the gap,
//! - `stale = R − L`: generated tests whose fixture no longer exists.
//!
//! Both lists are sorted in fixture-path order. The report is empty iff generation and disk agree.

use std::collections::BTreeSet;
use std::fmt;

use crate::exclusions::ExclusionSet;
use crate::path::FixturePath;

/// Outcome of one completeness check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletenessReport {
    pub orphans: Vec<FixturePath>,
    pub stale: Vec<FixturePath>,
}

impl CompletenessReport {
    /// Compute the report from the live and recorded sets.
    pub fn compute<'a, L, R>(live: L, recorded: R, exclusions: &ExclusionSet) -> Self
    where
        L: IntoIterator<Item = &'a FixturePath>,
        R: IntoIterator<Item = &'a FixturePath>,
    {
        let live: BTreeSet<&FixturePath> = live.into_iter().collect();
        let recorded: BTreeSet<&FixturePath> = recorded.into_iter().collect();

        let orphans = live
            .iter()
            .filter(|path| !recorded.contains(*path) && !exclusions.is_excluded(path))
            .map(|path| (*path).clone())
            .collect();
        let stale = recorded
            .iter()
            .filter(|path| !live.contains(*path))
            .map(|path| (*path).clone())
            .collect();

        Self { orphans, stale }
    }

    /// `true` when disk and generated suite agree.
    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty() && self.stale.is_empty()
    }
}

impl fmt::Display for CompletenessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "all fixtures have generated tests");
        }
        if !self.orphans.is_empty() {
            writeln!(
                f,
                "{} fixture(s) on disk have no generated test (regenerate, or add an exclusion):",
                self.orphans.len()
            )?;
            for path in &self.orphans {
                writeln!(f, "  + {path}")?;
            }
        }
        if !self.stale.is_empty() {
            writeln!(
                f,
                "{} generated test(s) point at fixtures that no longer exist (regenerate):",
                self.stale.len()
            )?;
            for path in &self.stale {
                writeln!(f, "  - {path}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<FixturePath> {
        items.iter().map(|s| FixturePath::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_matching_sets_are_clean() {
        let live = paths(&["a/x.kt", "a/y.kt"]);
        let report = CompletenessReport::compute(&live, &live, &ExclusionSet::new());
        assert!(report.is_empty());
    }

    #[test]
    fn test_removed_fixture_is_stale() {
        let live = paths(&["a/x.kt"]);
        let recorded = paths(&["a/x.kt", "a/y.kt"]);
        let report = CompletenessReport::compute(&live, &recorded, &ExclusionSet::new());
        assert_eq!(report.stale, paths(&["a/y.kt"]));
        assert!(report.orphans.is_empty());
    }

    #[test]
    fn test_added_fixture_is_orphan() {
        let live = paths(&["a/w.kt", "a/x.kt", "a/y.kt"]);
        let recorded = paths(&["a/x.kt", "a/y.kt"]);
        let report = CompletenessReport::compute(&live, &recorded, &ExclusionSet::new());
        assert_eq!(report.orphans, paths(&["a/w.kt"]));
        assert!(report.stale.is_empty());
    }

    #[test]
    fn test_excluded_fixture_is_never_orphan() {
        let live = paths(&["a/x.kt", "legacy/old.kt", "b/skip.kt"]);
        let recorded = paths(&["a/x.kt"]);
        let exclusions = ExclusionSet::parse_all(["legacy/", "b/skip.kt"]).unwrap();
        let report = CompletenessReport::compute(&live, &recorded, &exclusions);
        assert!(report.is_empty(), "{report}");
    }

    #[test]
    fn test_report_lists_are_sorted() {
        let live = paths(&["b/z.kt", "a/z.kt", "a/b/z.kt"]);
        let report = CompletenessReport::compute(&live, &Vec::new(), &ExclusionSet::new());
        assert_eq!(report.orphans, paths(&["a/b/z.kt", "a/z.kt", "b/z.kt"]));
    }

    #[test]
    fn test_display_mentions_every_path() {
        let report = CompletenessReport {
            orphans: paths(&["a/w.kt"]),
            stale: paths(&["a/y.kt"]),
        };
        let rendered = report.to_string();
        assert!(rendered.contains("+ a/w.kt"));
        assert!(rendered.contains("- a/y.kt"));
    }
}

//! Fixture tree scanning.
//!
//! [`scan`] walks a fixture root and returns a [`FixtureNode::Group`] mirroring the directory hierarchy:
//!
//! - entries are visited in lexicographic order of their names, so two scans of an unchanged tree produce identical
//!   trees (and identical generated output),
//! - a file becomes a [`FixtureNode::Leaf`] iff the [`PathMatcher`] accepts it,
//! - a subdirectory becomes a group iff it contains at least one leaf, directly or transitively.
//!
//! ## Errors
//!
//! A missing or unreadable root, or an unreadable entry anywhere below it, aborts the scan with [`ScanError`]; no
//! partial tree is returned. So does a file the pattern accepts whose path has no [`FixturePath`] spelling (a
//! non UTF-8 name, or a `\` inside a name): it could neither be bound to a test nor excluded. Such names are fine
//! on files the pattern rejects.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use fixsuite_core::FixturePath;
use miette::Diagnostic;
use thiserror::Error;
use walkdir::WalkDir;

use crate::matcher::PathMatcher;

/// Fatal scan failure.
#[derive(Debug, Error, Diagnostic)]
pub enum ScanError {
    #[error("fixture root `{}` does not exist", path.display())]
    #[diagnostic(code(fixsuite::scan::missing_root), help("check the `root` of the suite in fixsuite.toml"))]
    MissingRoot { path: PathBuf },

    #[error("fixture root `{}` is not a directory", path.display())]
    #[diagnostic(code(fixsuite::scan::not_a_directory))]
    NotADirectory { path: PathBuf },

    #[error("failed to read `{}`", path.display())]
    #[diagnostic(code(fixsuite::scan::unreadable))]
    Unreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("fixture `{}` cannot be expressed as a fixture path", path.display())]
    #[diagnostic(
        code(fixsuite::scan::path),
        help("rename it: fixture and directory names must be UTF-8 and must not contain `\\`")
    )]
    Unrepresentable { path: PathBuf },
}

/// One node of a scanned fixture tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureNode {
    /// A fixture file accepted by the matcher.
    Leaf(FixturePath),
    /// A directory with at least one leaf below it (the root group may be empty).
    Group {
        path: FixturePath,
        children: Vec<FixtureNode>,
    },
}

impl FixtureNode {
    pub fn path(&self) -> &FixturePath {
        match self {
            FixtureNode::Leaf(path) => path,
            FixtureNode::Group { path, .. } => path,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, FixtureNode::Leaf(_))
    }

    pub fn children(&self) -> &[FixtureNode] {
        match self {
            FixtureNode::Leaf(_) => &[],
            FixtureNode::Group { children, .. } => children,
        }
    }

    /// All leaf paths in visiting order.
    pub fn leaves(&self) -> Vec<&FixturePath> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FixturePath>) {
        match self {
            FixtureNode::Leaf(path) => out.push(path),
            FixtureNode::Group { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Find the group for a directory path.
    pub fn find_group(&self, dir: &FixturePath) -> Option<&FixtureNode> {
        match self {
            FixtureNode::Leaf(_) => None,
            FixtureNode::Group { path, children } => {
                if path == dir {
                    return Some(self);
                }
                if !dir.starts_with(path) {
                    return None;
                }
                children.iter().find_map(|child| child.find_group(dir))
            }
        }
    }

    /// Render the tree as an indented listing (`a/` for groups, file names for leaves).
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            FixtureNode::Leaf(path) => {
                let _ = writeln!(out, "{indent}{}", path.file_name().unwrap_or_default());
            }
            FixtureNode::Group { path, children } => {
                let name = path.file_name().unwrap_or(".");
                let _ = writeln!(out, "{indent}{name}/");
                for child in children {
                    child.render_into(out, depth + 1);
                }
            }
        }
    }
}

/// Frame of the directory currently being filled while walking.
struct OpenGroup {
    path: FixturePath,
    /// The directory (or an ancestor) has no fixture-path spelling; `path` is then its nearest representable
    /// ancestor and no leaf may be added.
    unrepresentable: bool,
    children: Vec<FixtureNode>,
}

impl OpenGroup {
    fn new(path: FixturePath) -> Self {
        Self {
            path,
            unrepresentable: false,
            children: Vec::new(),
        }
    }

    /// The fixture path of a child entry, if it has one.
    fn child_path(&self, name: Option<&str>) -> Option<FixturePath> {
        match name {
            Some(name) if !self.unrepresentable => self.path.join(name).ok(),
            _ => None,
        }
    }

    fn close(self) -> Option<FixtureNode> {
        if self.unrepresentable {
            return None;
        }
        if self.children.is_empty() {
            tracing::debug!(dir = %self.path, "pruning directory without fixtures");
            return None;
        }
        Some(FixtureNode::Group {
            path: self.path,
            children: self.children,
        })
    }
}

/// Scan `root` and return the group representing it (possibly empty).
#[tracing::instrument(skip_all, fields(root = %root.display(), pattern = matcher.pattern()))]
pub fn scan(root: &Path, matcher: &PathMatcher) -> Result<FixtureNode, ScanError> {
    scan_subtree(root, &FixturePath::root(), matcher)
}

/// Scan only the `scope` directory below `root`; leaf paths stay relative to `root`.
///
/// A scope directory that no longer exists yields an empty group (its fixtures were all deleted); a missing root is
/// still an error.
pub fn scan_subtree(root: &Path, scope: &FixturePath, matcher: &PathMatcher) -> Result<FixtureNode, ScanError> {
    check_root(root)?;

    let start = scope.segments().fold(root.to_path_buf(), |acc, seg| acc.join(seg));
    if !scope.is_root() && !start.is_dir() {
        return Ok(FixtureNode::Group {
            path: scope.clone(),
            children: Vec::new(),
        });
    }

    let mut stack = vec![OpenGroup::new(scope.clone())];

    for entry in WalkDir::new(&start).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| ScanError::Unreadable {
            path: source.path().map(Path::to_path_buf).unwrap_or_else(|| start.clone()),
            source,
        })?;

        // Close every directory the walk has left.
        while stack.len() > entry.depth() {
            close_top(&mut stack);
        }

        let top = stack.len() - 1;
        let path = stack[top].child_path(entry.file_name().to_str());

        if entry.file_type().is_dir() {
            let group = match path {
                Some(path) => OpenGroup::new(path),
                None => {
                    tracing::debug!(dir = %entry.path().display(), "directory has no fixture path spelling");
                    OpenGroup {
                        unrepresentable: true,
                        ..OpenGroup::new(stack[top].path.clone())
                    }
                }
            };
            stack.push(group);
            continue;
        }

        if !matcher.matches_file_name(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let Some(path) = path else {
            return Err(ScanError::Unrepresentable {
                path: entry.path().to_path_buf(),
            });
        };
        if matcher.matches(&path) {
            stack[top].children.push(FixtureNode::Leaf(path));
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    let root_group = stack.pop().map(|g| FixtureNode::Group {
        path: g.path,
        children: g.children,
    });
    Ok(root_group.unwrap_or(FixtureNode::Group {
        path: scope.clone(),
        children: Vec::new(),
    }))
}

fn close_top(stack: &mut Vec<OpenGroup>) {
    if let Some(group) = stack.pop() {
        if let (Some(node), Some(parent)) = (group.close(), stack.last_mut()) {
            parent.children.push(node);
        }
    }
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    if !root.exists() {
        return Err(ScanError::MissingRoot {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "fun box() = \"OK\"\n").unwrap();
    }

    fn kt() -> PathMatcher {
        PathMatcher::new(r"^(.+)\.kt$").unwrap()
    }

    fn p(s: &str) -> FixturePath {
        FixturePath::parse(s).unwrap()
    }

    #[test]
    fn test_scan_groups_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/x.kt");
        touch(dir.path(), "a/y.kt");
        touch(dir.path(), "b/z.txt");

        let tree = scan(dir.path(), &kt()).unwrap();
        assert_eq!(
            tree,
            FixtureNode::Group {
                path: FixturePath::root(),
                children: vec![FixtureNode::Group {
                    path: p("a"),
                    children: vec![FixtureNode::Leaf(p("a/x.kt")), FixtureNode::Leaf(p("a/y.kt"))],
                }],
            }
        );
    }

    #[test]
    fn test_scan_is_sorted_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["c.kt", "b/deep/q.kt", "a.kt", "b/p.kt", "b/deep/empty/readme.md"] {
            touch(dir.path(), rel);
        }
        let first = scan(dir.path(), &kt()).unwrap();
        let second = scan(dir.path(), &kt()).unwrap();
        assert_eq!(first, second);
        let leaves: Vec<&str> = first.leaves().into_iter().map(|p| p.as_str()).collect();
        assert_eq!(leaves, vec!["a.kt", "b/deep/q.kt", "b/p.kt", "c.kt"]);
        assert!(first.find_group(&p("b/deep/empty")).is_none());
        assert!(first.find_group(&p("b/deep")).is_some());
    }

    #[test]
    fn test_scan_empty_root_is_empty_group() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "notes.txt");
        let tree = scan(dir.path(), &kt()).unwrap();
        assert!(tree.children().is_empty());
        assert!(tree.path().is_root());
    }

    #[test]
    fn test_scan_respects_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/x.kt");
        touch(dir.path(), "legacy/old.kt");
        let matcher = kt().with_exclusions(fixsuite_core::ExclusionSet::parse_all(["legacy/"]).unwrap());
        let tree = scan(dir.path(), &matcher).unwrap();
        let leaves: Vec<&str> = tree.leaves().into_iter().map(|p| p.as_str()).collect();
        assert_eq!(leaves, vec!["a/x.kt"]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan(&dir.path().join("nope"), &kt()).unwrap_err();
        assert!(matches!(err, ScanError::MissingRoot { .. }));
    }

    #[test]
    fn test_scan_file_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "x.kt");
        let err = scan(&dir.path().join("x.kt"), &kt()).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[test]
    fn test_scan_subtree_keeps_root_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/b/x.kt");
        touch(dir.path(), "c/y.kt");
        let tree = scan_subtree(dir.path(), &p("a"), &kt()).unwrap();
        let leaves: Vec<&str> = tree.leaves().into_iter().map(|p| p.as_str()).collect();
        assert_eq!(leaves, vec!["a/b/x.kt"]);
        assert_eq!(tree.path(), &p("a"));
    }

    #[test]
    fn test_scan_subtree_of_deleted_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "c/y.kt");
        let tree = scan_subtree(dir.path(), &p("gone"), &kt()).unwrap();
        assert!(tree.leaves().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_name_outside_pattern_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/x.kt");
        touch(dir.path(), "a/notes\\old.txt");
        touch(dir.path(), "odd\\dir/readme.md");
        let tree = scan(dir.path(), &kt()).unwrap();
        let leaves: Vec<&str> = tree.leaves().into_iter().map(|p| p.as_str()).collect();
        assert_eq!(leaves, vec!["a/x.kt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_name_matching_pattern_fails() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/x.kt");
        touch(dir.path(), "a/bad\\name.kt");
        let err = scan(dir.path(), &kt()).unwrap_err();
        assert!(matches!(&err, ScanError::Unrepresentable { path } if path.ends_with("bad\\name.kt")));
    }

    #[cfg(unix)]
    #[test]
    fn test_fixture_below_backslash_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "odd\\dir/y.kt");
        let err = scan(dir.path(), &kt()).unwrap_err();
        assert!(matches!(err, ScanError::Unrepresentable { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/x.kt");
        fs::write(dir.path().join("a").join(OsStr::from_bytes(b"\xffnotes.txt")), "").unwrap();
        let leaves: Vec<String> = scan(dir.path(), &kt())
            .unwrap()
            .leaves()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(leaves, vec!["a/x.kt"]);

        fs::write(dir.path().join("a").join(OsStr::from_bytes(b"\xff.kt")), "").unwrap();
        let err = scan(dir.path(), &kt()).unwrap_err();
        assert!(matches!(err, ScanError::Unrepresentable { .. }));
    }

    #[test]
    fn test_render_lists_groups_and_leaves() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/x.kt");
        touch(dir.path(), "top.kt");
        let rendered = scan(dir.path(), &kt()).unwrap().render();
        assert_eq!(rendered, "./\n  a/\n    x.kt\n  top.kt\n");
    }
}

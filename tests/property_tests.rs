//! Property-based tests for fixsuite
//!
//! These tests use proptest to verify naming invariants across many randomly
//! generated fixture names, catching edge cases that hand-written tests might miss.

use proptest::prelude::*;

use fixsuite_core::naming::{self, ALL_FILES_PRESENT, NameKind, SiblingScope};

/// File names as they show up in real fixture trees: mixed case, digits, separators, dots.
fn fixture_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{1,24}"
}

fn resolve_all(names: &[String], kind: NameKind) -> Vec<String> {
    let mut scope = SiblingScope::new();
    names.iter().map(|n| scope.resolve(n, kind).unwrap()).collect()
}

// =============================================================================
// Identifier Properties
// =============================================================================

#[cfg(test)]
mod identifier_tests {
    use super::*;

    proptest! {
        /// Property: every generated test identifier is a valid Rust identifier
        #[test]
        fn test_fn_identifiers_are_valid_rust(name in fixture_name()) {
            let ident = naming::base_identifier(&name, NameKind::Test);
            prop_assert!(syn::parse_str::<syn::Ident>(&ident).is_ok(), "`{}` from `{}`", ident, name);
            prop_assert!(ident.starts_with("test_"));
        }

        /// Property: every generated group identifier is a valid Rust identifier
        #[test]
        fn group_identifiers_are_valid_rust(name in fixture_name()) {
            let ident = naming::base_identifier(&name, NameKind::Group);
            prop_assert!(syn::parse_str::<syn::Ident>(&ident).is_ok(), "`{}` from `{}`", ident, name);
        }

        /// Property: naming is a pure function of the segment
        #[test]
        fn naming_is_deterministic(name in fixture_name()) {
            prop_assert_eq!(
                naming::base_identifier(&name, NameKind::Test),
                naming::base_identifier(&name, NameKind::Test)
            );
        }
    }
}

// =============================================================================
// Sibling Scope Properties
// =============================================================================

#[cfg(test)]
mod scope_tests {
    use super::*;
    use std::collections::BTreeSet;

    proptest! {
        /// Property: siblings never share an identifier, however many names collide
        #[test]
        fn siblings_are_unique(names in prop::collection::vec(fixture_name(), 0..40)) {
            let idents = resolve_all(&names, NameKind::Test);
            let unique: BTreeSet<&String> = idents.iter().collect();
            prop_assert_eq!(unique.len(), idents.len());
        }

        /// Property: the completeness test name is never handed out
        #[test]
        fn all_files_present_is_reserved(names in prop::collection::vec(fixture_name(), 0..20)) {
            for ident in resolve_all(&names, NameKind::Group) {
                prop_assert_ne!(ident, ALL_FILES_PRESENT);
            }
        }

        /// Property: resolving the same sequence twice gives the same identifiers
        #[test]
        fn scope_resolution_is_deterministic(names in prop::collection::vec(fixture_name(), 0..40)) {
            prop_assert_eq!(resolve_all(&names, NameKind::Test), resolve_all(&names, NameKind::Test));
        }
    }

    #[test]
    fn colliding_names_get_counters() {
        let names: Vec<String> = ["fooBar.kt", "foo_bar.kt", "foo-bar.kt"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            resolve_all(&names, NameKind::Test),
            vec!["test_foo_bar", "test_foo_bar_2", "test_foo_bar_3"]
        );
    }
}

//! Provide the pure data model shared by the fixsuite scanner, generator and checker.
//!
//! This crate is intentionally small and dependency-light. It contains deterministic helpers that both:
//! - the generator can use to name and record the tests it emits, and
//! - the checker can use at test time to prove the recorded set still matches the disk.
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no global state, and no filesystem types.
//! - Current scope: canonical fixture paths, exclusion rules (exact + subtree prefix), backend identities,
//!   identifier naming with deterministic collision handling, and the completeness set difference.
//! - Enable the `serde` feature to persist these values in suite manifests.

pub mod backend;
pub mod completeness;
pub mod exclusions;
pub mod naming;
pub mod path;
pub mod rust_keywords;

pub use backend::BackendId;
pub use completeness::CompletenessReport;
pub use exclusions::{ExclusionRule, ExclusionSet};
pub use naming::{NameCollisionExhausted, NameKind, SiblingScope};
pub use path::{FixturePath, PathError};

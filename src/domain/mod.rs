//! Domain layer: situation trees, the ordered multi-map and the merge engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod document;
pub mod error;
pub mod merge;
pub mod multimap;
pub mod situation;

pub use builder::{build_situation, build_tree, body_name};
pub use document::ConfigNode;
pub use error::{DomainError, DomainResult};
pub use merge::{merge, merge_all, merge_all_with, merge_with, MergeListener};
pub use multimap::{MultiEntry, MultiMap};
pub use situation::{RawPair, SituationNode};

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
///
/// Uses shellexpand crate for robust expansion. Unknown variables leave the
/// input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

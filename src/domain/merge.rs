//! Flattens situation trees into an ordered multi-valued map.
//!
//! Keys are built by concatenating ancestor names without a separator. For a
//! node the output order is: everything its children produce, then its raw
//! pairs, then its literal values.
//!
//! The merge is not transactional. When a nameless node is reached the error is
//! returned immediately and entries appended before that point stay in the
//! output map. Callers that need all-or-nothing semantics merge into a fresh map
//! and adopt it only on success.

use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::multimap::MultiMap;
use crate::domain::situation::SituationNode;

/// Observer notified for every entry the merge appends.
pub trait MergeListener {
    fn entry_added(&mut self, key: &str, value: &str);
}

/// No-op listener.
impl MergeListener for () {
    fn entry_added(&mut self, _key: &str, _value: &str) {}
}

/// Merges a single tree into `output` below `prefix`.
///
/// A `None` root is a no-op.
pub fn merge(
    root: Option<&SituationNode>,
    output: &mut MultiMap<String, String>,
    prefix: &str,
) -> DomainResult<()> {
    merge_with(root, output, prefix, &mut ())
}

/// Like [`merge`], reporting every appended entry to `listener`.
pub fn merge_with(
    root: Option<&SituationNode>,
    output: &mut MultiMap<String, String>,
    prefix: &str,
    listener: &mut dyn MergeListener,
) -> DomainResult<()> {
    match root {
        Some(node) => merge_node(node, output, prefix, listener),
        None => Ok(()),
    }
}

/// Merges a list of sibling trees in order.
pub fn merge_all(
    nodes: &[SituationNode],
    output: &mut MultiMap<String, String>,
    prefix: &str,
) -> DomainResult<()> {
    merge_all_with(nodes, output, prefix, &mut ())
}

/// Like [`merge_all`], reporting every appended entry to `listener`.
#[instrument(level = "debug", skip(nodes, output, listener), fields(roots = nodes.len()))]
pub fn merge_all_with(
    nodes: &[SituationNode],
    output: &mut MultiMap<String, String>,
    prefix: &str,
    listener: &mut dyn MergeListener,
) -> DomainResult<()> {
    for node in nodes {
        merge_node(node, output, prefix, listener)?;
    }
    Ok(())
}

fn merge_node(
    node: &SituationNode,
    output: &mut MultiMap<String, String>,
    prefix: &str,
    listener: &mut dyn MergeListener,
) -> DomainResult<()> {
    if node.name.is_empty() {
        return Err(DomainError::InvalidNode {
            prefix: prefix.to_string(),
        });
    }
    let key = format!("{}{}", prefix, node.name);

    for child in &node.children {
        merge_node(child, output, &key, listener)?;
    }

    for pair in &node.raw_pairs {
        let raw_key = format!("{}{}", key, pair.suffix);
        append(output, raw_key, &pair.value, listener);
    }

    for value in &node.values {
        append(output, key.clone(), value, listener);
    }
    Ok(())
}

fn append(
    output: &mut MultiMap<String, String>,
    key: String,
    value: &str,
    listener: &mut dyn MergeListener,
) {
    trace!(key = %key, value, "adding entry");
    listener.entry_added(&key, value);
    output.add(key, value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl MergeListener for Recorder {
        fn entry_added(&mut self, key: &str, value: &str) {
            self.0.push(format!("{key}={value}"));
        }
    }

    #[test]
    fn given_listener_when_merging_then_sees_entries_in_output_order() {
        let tree = SituationNode::new("R")
            .with_value("r1")
            .with_child(SituationNode::new("C").with_value("c1"));
        let mut output = MultiMap::new();
        let mut recorder = Recorder::default();

        merge_with(Some(&tree), &mut output, "", &mut recorder).unwrap();

        assert_eq!(recorder.0, vec!["RC=c1", "R=r1"]);
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn given_none_root_when_merging_then_noop() {
        let mut output = MultiMap::new();
        merge(None, &mut output, "prefix").unwrap();
        assert!(output.is_empty());
    }
}

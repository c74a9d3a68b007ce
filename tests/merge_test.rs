//! Tests for the merge engine

use rstest::rstest;

use sitmerge::domain::{merge, merge_all, DomainError, MultiMap, SituationNode};

fn pairs(map: &MultiMap<String, String>) -> Vec<(String, String)> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn pair(k: &str, v: &str) -> (String, String) {
    (k.to_string(), v.to_string())
}

#[test]
fn given_empty_tree_when_merging_then_output_stays_empty() {
    let root = SituationNode::new("Empty");
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, "").unwrap();

    assert!(output.is_empty());
}

#[test]
fn given_parent_and_child_when_merging_then_names_concatenate_without_separator() {
    let root = SituationNode::new("A").with_child(SituationNode::new("B").with_value("v"));
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, "").unwrap();

    assert_eq!(pairs(&output), vec![pair("AB", "v")]);
}

#[test]
fn given_duplicate_sibling_names_when_merging_then_both_entries_kept_in_order() {
    let roots = vec![
        SituationNode::new("X").with_value("1"),
        SituationNode::new("X").with_value("2"),
    ];
    let mut output = MultiMap::new();

    merge_all(&roots, &mut output, "").unwrap();

    assert_eq!(pairs(&output), vec![pair("X", "1"), pair("X", "2")]);
    assert!(output.contains_key("X"));
    assert_eq!(output.get("X").unwrap(), "1");
}

#[test]
fn given_duplicate_children_when_merging_then_both_contribute() {
    let root = SituationNode::new("Kerbin")
        .with_child(SituationNode::new("SrfLanded").with_value("0.5"))
        .with_child(SituationNode::new("SrfLanded").with_value("0.7"));
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, "").unwrap();

    assert_eq!(
        output.get_all("KerbinSrfLanded").collect::<Vec<_>>(),
        vec!["0.5", "0.7"]
    );
}

#[test]
fn given_values_on_parent_and_child_when_merging_then_children_come_first() {
    let root = SituationNode::new("R")
        .with_value("r1")
        .with_child(SituationNode::new("C").with_value("c1"));
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, "").unwrap();

    assert_eq!(pairs(&output), vec![pair("RC", "c1"), pair("R", "r1")]);
}

#[test]
fn given_raw_pair_when_merging_then_suffix_is_appended_to_key() {
    let root = SituationNode::new("N").with_raw_pair(".extra", "42");
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, "").unwrap();

    assert_eq!(pairs(&output), vec![pair("N.extra", "42")]);
}

#[test]
fn given_raw_pairs_and_values_when_merging_then_raw_pairs_precede_values() {
    let root = SituationNode::new("N")
        .with_value("plain")
        .with_raw_pair("", "raw-empty")
        .with_raw_pair("Suffix", "raw");
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, "").unwrap();

    assert_eq!(
        pairs(&output),
        vec![pair("N", "raw-empty"), pair("NSuffix", "raw"), pair("N", "plain")]
    );
}

#[test]
fn given_deep_tree_when_merging_then_emits_post_order() {
    let root = SituationNode::new("A")
        .with_value("a")
        .with_child(
            SituationNode::new("B")
                .with_value("b")
                .with_child(SituationNode::new("C").with_value("c")),
        )
        .with_child(SituationNode::new("D").with_value("d"));
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, "").unwrap();

    assert_eq!(
        pairs(&output),
        vec![
            pair("ABC", "c"),
            pair("AB", "b"),
            pair("AD", "d"),
            pair("A", "a"),
        ]
    );
}

#[rstest]
#[case("", "Kerbin")]
#[case("Body", "BodyKerbin")]
fn given_prefix_when_merging_then_keys_start_with_prefix(
    #[case] prefix: &str,
    #[case] expected: &str,
) {
    let root = SituationNode::new("Kerbin").with_value("v");
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, prefix).unwrap();

    assert_eq!(output.get(expected).unwrap(), "v");
}

#[test]
fn given_absent_root_when_merging_then_noop() {
    let mut output: MultiMap<String, String> =
        vec![("seed".to_string(), "1".to_string())].into_iter().collect();

    merge(None, &mut output, "").unwrap();

    assert_eq!(output.len(), 1);
}

#[test]
fn given_unnamed_root_when_merging_then_invalid_node_and_no_output() {
    let root = SituationNode::new("").with_child(SituationNode::new("C").with_value("c"));
    let mut output = MultiMap::new();

    let err = merge(Some(&root), &mut output, "P").unwrap_err();

    assert_eq!(
        err,
        DomainError::InvalidNode {
            prefix: "P".to_string()
        }
    );
    assert!(output.is_empty());
}

#[test]
fn given_unnamed_node_after_valid_sibling_when_merging_then_earlier_writes_remain() {
    let root = SituationNode::new("R")
        .with_value("r")
        .with_child(SituationNode::new("Ok").with_value("1"))
        .with_child(SituationNode::new("").with_value("lost"))
        .with_child(SituationNode::new("Later").with_value("2"));
    let mut output = MultiMap::new();

    let err = merge(Some(&root), &mut output, "").unwrap_err();

    assert!(matches!(err, DomainError::InvalidNode { ref prefix } if prefix == "R"));
    assert_eq!(pairs(&output), vec![pair("ROk", "1")]);
}

#[test]
fn given_tree_when_merging_then_input_is_not_mutated() {
    let root = SituationNode::new("R")
        .with_value("r")
        .with_child(SituationNode::new("C").with_raw_pair("x", "1"));
    let snapshot = root.clone();
    let mut output = MultiMap::new();

    merge(Some(&root), &mut output, "").unwrap();
    merge(Some(&root), &mut output, "").unwrap();

    assert_eq!(root, snapshot);
    assert_eq!(output.len(), 4);
}

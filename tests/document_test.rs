//! Tests for ConfigNode parsing and serialization

use rstest::rstest;

use sitmerge::domain::{ConfigNode, DomainError};

const DEFINITION: &str = r#"
// science definitions
EXPERIMENT_DEFINITION
{
    id = crewReport
    title = Crew Report
    RESULTS
    {
        default = You record the crew's assessment.
        default = Another default.  // trailing comment
        Situation { name = Kerbin  }
        Situation
        {
            name = Mun
            value = Grey.
        }
    }
}
"#;

#[test]
fn given_definition_when_parsing_then_builds_nested_nodes() {
    let root = ConfigNode::parse(DEFINITION).unwrap();

    assert_eq!(root.name, "");
    assert_eq!(root.nodes.len(), 1);

    let definition = root.get_node("EXPERIMENT_DEFINITION").unwrap();
    assert_eq!(definition.get_value("id"), Some("crewReport"));
    assert_eq!(definition.get_value("title"), Some("Crew Report"));

    let results = definition.get_node("RESULTS").unwrap();
    assert_eq!(
        results.values.get_all("default").collect::<Vec<_>>(),
        vec!["You record the crew's assessment.", "Another default."]
    );
    let names: Vec<_> = results
        .get_nodes("Situation")
        .filter_map(|n| n.get_value("name"))
        .collect();
    assert_eq!(names, vec!["Kerbin", "Mun"]);
}

#[test]
fn given_value_with_equals_sign_when_parsing_then_splits_at_first() {
    let root = ConfigNode::parse("formula = a = b\nempty =\n").unwrap();

    assert_eq!(root.get_value("formula"), Some("a = b"));
    assert_eq!(root.get_value("empty"), Some(""));
}

#[test]
fn given_brace_on_same_line_when_parsing_then_opens_node() {
    let root = ConfigNode::parse("NODE {\n  key = v\n}\n").unwrap();

    assert_eq!(root.get_node("NODE").unwrap().get_value("key"), Some("v"));
}

#[rstest]
#[case("}", 1, "unbalanced")]
#[case("NODE\n{\n  a = 1\n", 3, "unclosed node 'NODE'")]
#[case("{\n}", 1, "without a node name")]
#[case("NODE\nkey = value", 1, "expected '{' after node name 'NODE'")]
#[case("NODE", 1, "expected '{'")]
#[case(" = value", 1, "value without a key")]
fn given_malformed_input_when_parsing_then_reports_line(
    #[case] input: &str,
    #[case] expected_line: usize,
    #[case] fragment: &str,
) {
    let err = ConfigNode::parse(input).unwrap_err();

    match err {
        DomainError::Parse { line, message } => {
            assert_eq!(line, expected_line, "message: {message}");
            assert!(
                message.contains(fragment),
                "'{message}' should contain '{fragment}'"
            );
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn given_parsed_document_when_serializing_and_reparsing_then_structure_is_kept() {
    let root = ConfigNode::parse(DEFINITION).unwrap();

    let text = root.to_cfg_string();
    let reparsed = ConfigNode::parse(&text).unwrap();

    assert_eq!(reparsed, root);
    assert!(text.starts_with("EXPERIMENT_DEFINITION\n{\n\tid = crewReport\n"));
}

#[test]
fn given_nodes_when_removing_by_name_then_returns_count() {
    let mut root = ConfigNode::parse("A {\n}\nB {\n}\nA {\n}\n").unwrap();

    assert_eq!(root.remove_nodes("A"), 2);
    assert_eq!(root.remove_nodes("A"), 0);
    assert_eq!(root.nodes.len(), 1);
    assert_eq!(root.nodes[0].name, "B");
}

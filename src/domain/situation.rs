//! Situation tree: named override nodes carrying values, raw pairs and children.

use std::fmt;

use termtree::Tree;

/// A key-suffix/value override attached directly to a situation.
///
/// The effective key is the situation's computed key followed by `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    pub suffix: String,
    pub value: String,
}

impl RawPair {
    pub fn new(suffix: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            value: value.into(),
        }
    }
}

/// Named node of the override tree.
///
/// Sibling names are not required to be unique: two children called `SrfLanded`
/// both contribute to the flattened output. Children are owned by value, so a
/// tree cannot refer back to one of its ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SituationNode {
    pub name: String,
    pub values: Vec<String>,
    pub raw_pairs: Vec<RawPair>,
    pub children: Vec<SituationNode>,
}

impl SituationNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn with_raw_pair(mut self, suffix: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw_pairs.push(RawPair::new(suffix, value));
        self
    }

    pub fn with_child(mut self, child: SituationNode) -> Self {
        self.children.push(child);
        self
    }

    /// True when the node carries nothing that would produce output.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.raw_pairs.is_empty() && self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Levels in this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Self::depth)
            .max()
            .unwrap_or(0)
    }

    /// Renders the subtree for terminal display.
    pub fn to_tree(&self) -> Tree<String> {
        let mut tree = Tree::new(self.to_string());
        for pair in &self.raw_pairs {
            tree.push(Tree::new(format!("+{} = {}", pair.suffix, pair.value)));
        }
        for child in &self.children {
            tree.push(child.to_tree());
        }
        tree
    }
}

impl fmt::Display for SituationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            "<unnamed>"
        } else {
            self.name.as_str()
        };
        if self.values.is_empty() {
            write!(f, "{}", name)
        } else {
            write!(f, "{} [{}]", name, self.values.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_nodes_when_counting_then_includes_all_levels() {
        let tree = SituationNode::new("Kerbin")
            .with_child(SituationNode::new("SrfLanded").with_value("a"))
            .with_child(
                SituationNode::new("InSpaceLow").with_child(SituationNode::new("Deep")),
            );

        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.depth(), 3);
        assert!(!tree.is_empty());
    }

    #[test]
    fn given_node_with_values_when_rendering_then_shows_name_and_values() {
        let node = SituationNode::new("Mun").with_value("x").with_value("y");
        assert_eq!(node.to_string(), "Mun [x, y]");
        assert_eq!(SituationNode::default().to_string(), "<unnamed>");
    }
}

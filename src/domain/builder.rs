//! Builds situation trees from the `RESULTS` node of an experiment definition.
//!
//! Schema:
//!
//! ```text
//! RESULTS
//! {
//!     Situation            // zero or more
//!     {
//!         name = Kerbin    // required
//!         value = ...      // zero or more literal values
//!         Raw { suffix = value }  // zero or more raw pairs
//!         Situation { ... }       // nested situations
//!     }
//!     Body { name = Squad/Kerbin ... }  // situation named by body identifier
//! }
//! ```

use tracing::{debug, instrument};

use crate::domain::document::ConfigNode;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::situation::{RawPair, SituationNode};

pub const SITUATION_NODE: &str = "Situation";
pub const BODY_NODE: &str = "Body";
pub const RAW_NODE: &str = "Raw";
pub const NAME_KEY: &str = "name";
pub const VALUE_KEY: &str = "value";

/// Builds the root situation list of a `RESULTS` node.
///
/// Situations come first in document order, followed by all bodies.
#[instrument(level = "debug", skip(results), fields(node = %results.name))]
pub fn build_tree(results: &ConfigNode) -> DomainResult<Vec<SituationNode>> {
    let mut roots = results
        .get_nodes(SITUATION_NODE)
        .map(build_situation)
        .collect::<DomainResult<Vec<_>>>()?;

    for body in results.get_nodes(BODY_NODE) {
        let mut node = build_situation_as(body, BODY_NODE)?;
        node.name = body_name(&node.name).to_string();
        roots.push(node);
    }

    debug!("built {} root situations", roots.len());
    Ok(roots)
}

/// Builds one situation and its descendants.
pub fn build_situation(node: &ConfigNode) -> DomainResult<SituationNode> {
    build_situation_as(node, SITUATION_NODE)
}

fn build_situation_as(node: &ConfigNode, kind: &str) -> DomainResult<SituationNode> {
    let name = node
        .get_value(NAME_KEY)
        .ok_or_else(|| DomainError::MissingField {
            node: kind.to_string(),
            field: NAME_KEY.to_string(),
        })?;

    let values = node.values.get_all(VALUE_KEY).cloned().collect();

    let raw_pairs = node
        .get_nodes(RAW_NODE)
        .flat_map(|raw| raw.values.iter())
        .map(|(suffix, value)| RawPair::new(suffix.as_str(), value.as_str()))
        .collect();

    let children = node
        .get_nodes(SITUATION_NODE)
        .map(build_situation)
        .collect::<DomainResult<Vec<_>>>()?;

    Ok(SituationNode {
        name: name.to_string(),
        values,
        raw_pairs,
        children,
    })
}

/// Resolves a universal body identifier (`Squad/Kerbin`, `Kopernicus:Kerbin`)
/// to the bare body name.
pub fn body_name(identifier: &str) -> &str {
    identifier
        .rsplit(['/', ':'])
        .next()
        .map(str::trim)
        .unwrap_or(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_identifiers_when_resolving_body_name_then_strips_namespace() {
        assert_eq!(body_name("Squad/Kerbin"), "Kerbin");
        assert_eq!(body_name("Kopernicus:Minmus"), "Minmus");
        assert_eq!(body_name("Mun"), "Mun");
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Graph Relation Entity
//!
//! A directed, typed edge between two documents (spec §3). Per spec §9,
//! the in-memory relation set is treated as an arena of edge records keyed
//! by their canonical hash ([`RelationId`]) rather than a graph of owning
//! pointers, so cycles (which are expected, not an error) never cause a
//! traversal to recurse unboundedly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;
use crate::value_objects::{DocumentId, RelationId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRelation {
    pub relation_id: RelationId,
    pub source: DocumentId,
    pub target: DocumentId,
    pub relation_type: String,
    pub strength: f32,
    pub confidence: f32,
    pub metadata: BTreeMap<String, String>,
}

impl GraphRelation {
    pub fn new(
        source: DocumentId,
        target: DocumentId,
        relation_type: impl Into<String>,
        strength: f32,
        confidence: f32,
    ) -> Result<Self, CoordinatorError> {
        if source == target {
            return Err(CoordinatorError::InvalidRelation("self-loops are not permitted".into()));
        }
        if !(0.0..=1.0).contains(&strength) {
            return Err(CoordinatorError::InvalidRelation(format!("strength {strength} out of [0,1]")));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CoordinatorError::InvalidRelation(format!("confidence {confidence} out of [0,1]")));
        }
        let relation_type = relation_type.into();
        let relation_id = RelationId::new(&source, &target, &relation_type);
        Ok(Self { relation_id, source, target, relation_type, strength, confidence, metadata: BTreeMap::new() })
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Explicit visited-set traversal (spec §9) that reports whether `target`
/// is reachable from `start` through the given edge arena, never recursing
/// through owning pointers and terminating safely on cycles.
pub fn is_reachable(edges: &[GraphRelation], start: &DocumentId, target: &DocumentId) -> bool {
    let mut visited = std::collections::HashSet::new();
    let mut frontier = vec![*start];
    while let Some(node) = frontier.pop() {
        if node == *target {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        for edge in edges.iter().filter(|e| e.source == node) {
            if !visited.contains(&edge.target) {
                frontier.push(edge.target);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_loops_are_rejected() {
        let a = DocumentId::new();
        assert!(GraphRelation::new(a, a, "cites", 0.5, 0.9).is_err());
    }

    #[test]
    fn strength_and_confidence_must_be_unit_interval() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        assert!(GraphRelation::new(a, b, "cites", 1.5, 0.9).is_err());
        assert!(GraphRelation::new(a, b, "cites", 0.5, -0.1).is_err());
        assert!(GraphRelation::new(a, b, "cites", 0.0, 1.0).is_ok());
    }

    #[test]
    fn reachability_terminates_on_a_cycle() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        let c = DocumentId::new();
        let edges = vec![
            GraphRelation::new(a, b, "cites", 1.0, 1.0).unwrap(),
            GraphRelation::new(b, c, "cites", 1.0, 1.0).unwrap(),
            GraphRelation::new(c, a, "cites", 1.0, 1.0).unwrap(),
        ];
        assert!(is_reachable(&edges, &a, &c));
        let d = DocumentId::new();
        assert!(!is_reachable(&edges, &a, &d));
    }
}

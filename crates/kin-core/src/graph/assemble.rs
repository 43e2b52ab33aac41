//! Node/edge projection of one tree.
//!
//! Nodes are every person of the tree ordered by birth date (unknown dates
//! last, ties by id). Edges are every relationship whose parent belongs to
//! the tree. No rules are re-checked here; the graph mirrors what is stored.
//!
//! The graph carries a BLAKE3 content hash over its nodes and edges so
//! callers can tell whether anything changed between two reads.

#![allow(clippy::module_name_repetitions)]

use crate::db;
use crate::db::person::PersonOrder;
use crate::error::{KinError, KinResult};
use crate::model::{Person, Relationship, RelationshipType};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,
    pub is_male: bool,
}

impl From<Person> for GraphNode {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            first_name: person.first_name,
            last_name: person.last_name,
            birth_date: person.birth_date,
            death_date: person.death_date,
            is_male: person.is_male,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub parent_id: i64,
    pub child_id: i64,
    pub relationship_type: RelationshipType,
}

impl From<Relationship> for GraphEdge {
    fn from(rel: Relationship) -> Self {
        Self {
            parent_id: rel.parent_id,
            child_id: rel.child_id,
            relationship_type: rel.relationship_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeGraph {
    pub tree_id: i64,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// BLAKE3 hash of the node and edge lists, prefixed with `blake3:`.
    pub content_hash: String,
}

impl TreeGraph {
    #[must_use]
    pub fn node(&self, person_id: i64) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == person_id)
    }
}

/// Assemble the full graph of `tree_id`.
///
/// # Errors
///
/// `TreeNotFound` if the tree does not exist; `Storage` on query failure.
#[instrument(skip(conn))]
pub fn build_graph(conn: &Connection, tree_id: i64) -> KinResult<TreeGraph> {
    crate::validate::validate_id("tree_id", tree_id)?;
    if !db::tree::tree_exists(conn, tree_id)? {
        return Err(KinError::TreeNotFound(tree_id));
    }

    let nodes: Vec<GraphNode> = db::person::list_persons(conn, tree_id, PersonOrder::BirthAsc)?
        .into_iter()
        .map(GraphNode::from)
        .collect();
    let edges: Vec<GraphEdge> = db::relationship::list_by_tree(conn, tree_id)?
        .into_iter()
        .map(GraphEdge::from)
        .collect();

    let content_hash = compute_content_hash(&nodes, &edges);
    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        %content_hash,
        "assembled tree graph"
    );

    Ok(TreeGraph {
        tree_id,
        nodes,
        edges,
        content_hash,
    })
}

fn compute_content_hash(nodes: &[GraphNode], edges: &[GraphEdge]) -> String {
    let mut hasher = blake3::Hasher::new();
    for node in nodes {
        hasher.update(&node.id.to_le_bytes());
        hasher.update(node.first_name.as_bytes());
        hasher.update(b"\x00");
        hasher.update(node.last_name.as_bytes());
        hasher.update(b"\x00");
        for date in [node.birth_date, node.death_date] {
            if let Some(date) = date {
                hasher.update(date.to_string().as_bytes());
            }
            hasher.update(b"\x00");
        }
        hasher.update(&[u8::from(node.is_male)]);
    }
    hasher.update(b"\xff");
    for edge in edges {
        hasher.update(&edge.parent_id.to_le_bytes());
        hasher.update(&edge.child_id.to_le_bytes());
        hasher.update(edge.relationship_type.as_str().as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

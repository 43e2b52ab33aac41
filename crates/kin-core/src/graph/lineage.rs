//! Ancestor and descendant walks over an assembled [`TreeGraph`].
//!
//! Edges point parent → child. Without birth dates nothing stops a cycle
//! from being stored, so every walk tracks visited nodes.

use super::TreeGraph;
use crate::model::RelationshipType;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug)]
pub struct Lineage {
    /// Nodes are person ids; edges point parent → child.
    pub graph: DiGraph<i64, RelationshipType>,
    pub node_map: HashMap<i64, NodeIndex>,
}

impl Lineage {
    #[must_use]
    pub fn from_tree_graph(tree: &TreeGraph) -> Self {
        let mut graph = DiGraph::<i64, RelationshipType>::with_capacity(
            tree.nodes.len(),
            tree.edges.len(),
        );
        let mut node_map: HashMap<i64, NodeIndex> = HashMap::with_capacity(tree.nodes.len());

        for node in &tree.nodes {
            let idx = graph.add_node(node.id);
            node_map.insert(node.id, idx);
        }

        for edge in &tree.edges {
            let parent = *node_map
                .entry(edge.parent_id)
                .or_insert_with(|| graph.add_node(edge.parent_id));
            let child = *node_map
                .entry(edge.child_id)
                .or_insert_with(|| graph.add_node(edge.child_id));
            graph.add_edge(parent, child, edge.relationship_type);
        }

        Self { graph, node_map }
    }

    /// Ancestors of `person_id` as `(id, generation)` pairs, parents being
    /// generation 1. `max_depth` of `None` walks to the roots.
    #[must_use]
    pub fn ancestors(&self, person_id: i64, max_depth: Option<u32>) -> Vec<(i64, u32)> {
        self.walk(person_id, Direction::Incoming, max_depth)
    }

    /// Descendants of `person_id` as `(id, generation)` pairs, children being
    /// generation 1.
    #[must_use]
    pub fn descendants(&self, person_id: i64, max_depth: Option<u32>) -> Vec<(i64, u32)> {
        self.walk(person_id, Direction::Outgoing, max_depth)
    }

    fn walk(&self, person_id: i64, direction: Direction, max_depth: Option<u32>) -> Vec<(i64, u32)> {
        let Some(&start) = self.node_map.get(&person_id) else {
            return Vec::new();
        };

        let mut seen: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<(NodeIndex, u32)> = VecDeque::from([(start, 0)]);
        let mut found = Vec::new();

        while let Some((idx, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for next in self.graph.neighbors_directed(idx, direction) {
                if seen.insert(next) {
                    found.push((self.graph[next], depth + 1));
                    queue.push_back((next, depth + 1));
                }
            }
        }

        found.sort_by_key(|&(id, generation)| (generation, id));
        found
    }
}

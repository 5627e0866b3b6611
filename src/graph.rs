//! Graph data structures for the note link graph.
//!
//! - [`GraphNode`]: a real note, or a phantom standing in for an unresolved reference
//! - [`GraphLink`]: a directed reference from one note to another, duplicates kept
//! - [`GraphData`]: nodes in discovery order plus links in occurrence order
//! - [`GroupRules`]: path-prefix classification into visual groups
//!
//! The serialized shape (`nodes`, `links`, per-node `val`) is what force-directed graph viewers
//! consume directly.
use petgraph::{algo::dijkstra, graph::NodeIndex, Directed, Direction, Graph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{diagnostic::ScanDiagnostic, paths::NoteIdentity};

/// Group for notes that match no classification rule.
pub const DEFAULT_GROUP: i32 = 0;

/// Reserved group for phantom nodes. Classification rules may not use negative groups.
pub const PHANTOM_GROUP: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRule {
    pub prefix: String,
    pub group: i32,
}

impl GroupRule {
    pub fn new(prefix: &str, group: i32) -> GroupRule {
        GroupRule {
            prefix: prefix.to_string(),
            group,
        }
    }
}

/// Ordered prefix table; the first matching prefix decides the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupRules(pub Vec<GroupRule>);

impl Default for GroupRules {
    fn default() -> Self {
        GroupRules(vec![
            GroupRule::new("log/", 1),
            GroupRule::new("diary/", 2),
            GroupRule::new("sketch/", 3),
            GroupRule::new("projects/", 4),
            GroupRule::new("database/", 5),
        ])
    }
}

impl GroupRules {
    pub fn classify(&self, path: &str) -> i32 {
        self.0
            .iter()
            .find(|rule| path.starts_with(&rule.prefix))
            .map(|rule| rule.group)
            .unwrap_or(DEFAULT_GROUP)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NoteIdentity,
    pub name: String,
    pub path: String,
    pub group: i32,
    /// Visual weight; grows with incoming links.
    #[serde(rename = "val")]
    pub size_hint: f64,
    /// `false` marks a phantom: a reference target with no backing note.
    pub exists: bool,
}

impl GraphNode {
    pub fn is_phantom(&self) -> bool {
        !self.exists
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: NoteIdentity,
    pub target: NoteIdentity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    /// Notes that were skipped while building this graph.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ScanDiagnostic>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub links: usize,
    pub phantoms: usize,
    /// Nodes with neither incoming nor outgoing links.
    pub orphans: usize,
    pub skipped: usize,
}

impl GraphData {
    pub fn node(&self, id: &NoteIdentity) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// True when at least one note was skipped and the graph is a best-effort partial result.
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Links with an endpoint missing from `nodes`. Always empty for engine output.
    pub fn dangling_links(&self) -> Vec<&GraphLink> {
        let ids = self
            .nodes
            .iter()
            .map(|node| &node.id)
            .collect::<std::collections::HashSet<_>>();
        self.links
            .iter()
            .filter(|link| !ids.contains(&link.source) || !ids.contains(&link.target))
            .collect()
    }

    /// A petgraph view of the graph. Node weights are identities; dangling links are skipped.
    pub fn to_digraph(&self) -> Graph<NoteIdentity, (), Directed> {
        let mut graph = Graph::with_capacity(self.nodes.len(), self.links.len());
        let mut index = HashMap::<&NoteIdentity, NodeIndex>::new();
        for node in self.nodes.iter() {
            index.insert(&node.id, graph.add_node(node.id.clone()));
        }
        for link in self.links.iter() {
            if let (Some(source), Some(target)) = (index.get(&link.source), index.get(&link.target))
            {
                graph.add_edge(*source, *target, ());
            }
        }
        graph
    }

    /// Shortest reference distance from `start` to every reachable node.
    pub fn hop_distances(&self, start: &NoteIdentity) -> BTreeMap<NoteIdentity, usize> {
        let graph = self.to_digraph();
        let Some(start_idx) = graph.node_indices().find(|idx| &graph[*idx] == start) else {
            return BTreeMap::new();
        };
        dijkstra(&graph, start_idx, None, |_| 1usize)
            .into_iter()
            .map(|(idx, dist)| (graph[idx].clone(), dist))
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let graph = self.to_digraph();
        let orphans = graph
            .node_indices()
            .filter(|idx| {
                graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .next()
                    .is_none()
                    && graph
                        .neighbors_directed(*idx, Direction::Outgoing)
                        .next()
                        .is_none()
            })
            .count();
        GraphStats {
            nodes: self.nodes.len(),
            links: self.links.len(),
            phantoms: self.nodes.iter().filter(|node| node.is_phantom()).count(),
            orphans,
            skipped: self.diagnostics.len(),
        }
    }
}

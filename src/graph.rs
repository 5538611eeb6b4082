//! Declaration graph.
//!
//! Nodes are declared resources; an edge runs from a dependency to the
//! resource that depends on it. Edges come from two places:
//!
//! - data references between declarations (a route refers to its table)
//! - explicit `DependsOn` edges added where no data reference exists
//!
//! The graph answers ordering questions: is there a cycle, what is a valid
//! provisioning order, what does a resource (transitively) depend on.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::resources::{LogicalId, ResourceKind};
use crate::stack::Stack;

/// A declared resource in the graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    /// Logical id
    pub id: String,
    /// Resource kind
    pub kind: ResourceKind,
    /// Declaration position
    pub sequence: usize,
}

/// Where an edge comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// A property of the dependent refers to the dependency
    Reference,
    /// Declared with `add_dependency`
    Explicit,
}

/// An ordering constraint: `dependency` before `dependent`.
#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    /// Resource provisioned first
    pub dependency: String,
    /// Resource provisioned after
    pub dependent: String,
    /// Origin of the edge
    pub edge_type: EdgeType,
    /// Referencing property, for reference edges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<&'static str>,
}

/// Serializable snapshot of the graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    /// Nodes in declaration order
    pub nodes: Vec<GraphNode>,
    /// Edges in insertion order
    pub edges: Vec<GraphEdge>,
}

/// The declaration graph of one stack.
#[derive(Debug, Clone, Default)]
pub struct DeclarationGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    node_indices: HashMap<String, NodeIndex>,
}

impl DeclarationGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of a stack.
    ///
    /// References to undeclared ids produce no edge; they are reported by
    /// validation instead.
    pub fn from_stack(stack: &Stack) -> Self {
        let mut graph = Self::new();
        for (id, resource) in stack.resources() {
            graph.add_node(id, resource.kind());
        }
        for (id, resource) in stack.resources() {
            for reference in resource.references() {
                graph.add_edge(GraphEdge {
                    dependency: reference.target.to_string(),
                    dependent: id.to_string(),
                    edge_type: EdgeType::Reference,
                    property: Some(reference.property),
                });
            }
        }
        for (dependent, dependency) in stack.dependencies() {
            graph.add_edge(GraphEdge {
                dependency: dependency.to_string(),
                dependent: dependent.to_string(),
                edge_type: EdgeType::Explicit,
                property: None,
            });
        }
        graph
    }

    /// Add a node; re-adding an id keeps the first node.
    pub fn add_node(&mut self, id: &LogicalId, kind: ResourceKind) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(id.as_str()) {
            return idx;
        }
        let node = GraphNode {
            id: id.to_string(),
            kind,
            sequence: self.graph.node_count(),
        };
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id.to_string(), idx);
        idx
    }

    /// Add an edge between two known nodes. Returns false if either end is unknown.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        let (Some(&from), Some(&to)) = (
            self.node_indices.get(&edge.dependency),
            self.node_indices.get(&edge.dependent),
        ) else {
            return false;
        };
        self.graph.add_edge(from, to, edge);
        true
    }

    /// Check for dependency cycles.
    pub fn has_cycles(&self) -> bool {
        !self.get_cycles().is_empty()
    }

    /// Get all cycles, each as the ids of one strongly connected component.
    pub fn get_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || scc.iter().any(|&n| self.graph.contains_edge(n, n)))
            .map(|scc| {
                let mut ids: Vec<&GraphNode> =
                    scc.into_iter().filter_map(|idx| self.graph.node_weight(idx)).collect();
                ids.sort_by_key(|n| n.sequence);
                ids.into_iter().map(|n| n.id.clone()).collect()
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Topological provisioning order.
    ///
    /// Among resources whose dependencies are all satisfied, the earliest
    /// declared goes first, so the order only changes when declarations do.
    pub fn provisioning_order(&self) -> Result<Vec<String>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.edges_directed(idx, Direction::Incoming).count())
            .collect();

        let mut ready: BTreeSet<usize> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .map(NodeIndex::index)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(next) = ready.pop_first() {
            let idx = NodeIndex::new(next);
            order.push(self.graph[idx].id.clone());
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                let target = edge.target().index();
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.insert(target);
                }
            }
        }

        if order.len() != self.graph.node_count() {
            let cycles = self
                .get_cycles()
                .iter()
                .map(|c| c.join(" -> "))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::DependencyCycle(cycles));
        }
        Ok(order)
    }

    /// All resources `id` depends on, directly or transitively, in declaration order.
    pub fn get_dependencies(&self, id: &str) -> Vec<String> {
        self.reachable(id, Direction::Incoming)
    }

    /// All resources depending on `id`, directly or transitively, in declaration order.
    pub fn get_dependents(&self, id: &str) -> Vec<String> {
        self.reachable(id, Direction::Outgoing)
    }

    fn reachable(&self, id: &str, direction: Direction) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(&start) = self.node_indices.get(id) {
            queue.push_back(start);
            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors_directed(current, direction) {
                    if neighbor != start && seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        let mut nodes: Vec<&GraphNode> =
            seen.into_iter().filter_map(|idx| self.graph.node_weight(idx)).collect();
        nodes.sort_by_key(|n| n.sequence);
        nodes.into_iter().map(|n| n.id.clone()).collect()
    }

    /// Direct edges into `id`.
    pub fn direct_dependencies(&self, id: &str) -> Vec<&GraphEdge> {
        self.node_indices
            .get(id)
            .map(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|e| e.weight())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `dependent` carries an explicit edge to `dependency`.
    pub fn has_explicit_dependency(&self, dependent: &str, dependency: &str) -> bool {
        self.direct_dependencies(dependent)
            .iter()
            .any(|e| e.edge_type == EdgeType::Explicit && e.dependency == dependency)
    }

    /// Get a node by id.
    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.node_indices
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Snapshot for JSON output.
    pub fn export(&self) -> GraphExport {
        GraphExport {
            nodes: self.graph.node_weights().cloned().collect(),
            edges: self.graph.edge_weights().cloned().collect(),
        }
    }

    /// Generate a DOT format representation for visualization.
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph declarations {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box];\n\n");

        for node in self.graph.node_weights() {
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n{}\"];\n",
                node.id,
                node.id,
                node.kind.cfn_type()
            ));
        }

        output.push('\n');

        for edge in self.graph.edge_weights() {
            let style = match edge.edge_type {
                EdgeType::Reference => "dashed",
                EdgeType::Explicit => "solid",
            };
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [style={}];\n",
                edge.dependency, edge.dependent, style
            ));
        }

        output.push_str("}\n");
        output
    }
}

// Graph Runtime - petgraph based
// Linear StateGraph execution engine

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

use super::node::{GraphError, Node, NodeContext, NodeOutput};
use super::state::PipelineState;

/// petgraph-based StateGraph runtime
///
/// Every node has at most one outgoing edge and the graph is acyclic, so a
/// run visits each node at most once and always terminates.
pub struct GraphRuntime {
    /// The underlying directed graph
    graph: DiGraph<Box<dyn Node>, ()>,
    /// Map from node ID to NodeIndex for lookup
    node_indices: HashMap<String, NodeIndex>,
    /// Entry point node ID
    entry_node_id: String,
    /// Maximum execution steps (recursion limit)
    max_steps: usize,
}

impl GraphRuntime {
    fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            entry_node_id: String::new(),
            max_steps: 8,
        }
    }

    fn add_node(&mut self, node: Box<dyn Node>) -> Result<NodeIndex, GraphError> {
        let id = node.id().to_string();
        if self.node_indices.contains_key(&id) {
            return Err(GraphError::new(&id, format!("Duplicate node id: {}", id)));
        }
        let index = self.graph.add_node(node);
        self.node_indices.insert(id, index);
        Ok(index)
    }

    fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let from_idx = *self
            .node_indices
            .get(from)
            .ok_or_else(|| GraphError::new(from, format!("Source node not found: {}", from)))?;
        let to_idx = *self
            .node_indices
            .get(to)
            .ok_or_else(|| GraphError::new(to, format!("Target node not found: {}", to)))?;

        if self
            .graph
            .neighbors_directed(from_idx, Direction::Outgoing)
            .next()
            .is_some()
        {
            return Err(GraphError::new(
                from,
                format!("Node already has an outgoing edge: {}", from),
            ));
        }

        self.graph.add_edge(from_idx, to_idx, ());
        Ok(())
    }

    /// Get all node IDs in insertion order
    pub fn node_ids(&self) -> Vec<&str> {
        self.graph.node_weights().map(|node| node.id()).collect()
    }

    pub fn entry(&self) -> &str {
        &self.entry_node_id
    }

    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Execute the graph from the entry node until a node returns `Final`.
    pub async fn run(
        &self,
        state: &mut PipelineState,
        ctx: &NodeContext<'_>,
    ) -> Result<(), GraphError> {
        let mut current_idx = *self.node_indices.get(&self.entry_node_id).ok_or_else(|| {
            GraphError::new(
                "runtime",
                format!("Entry node not found: {}", self.entry_node_id),
            )
        })?;

        let mut step = 0;

        loop {
            if step >= self.max_steps {
                return Err(GraphError::new(
                    "runtime",
                    format!("Maximum steps ({}) exceeded", self.max_steps),
                )
                .with_trace(&state.visited));
            }

            let node = self
                .graph
                .node_weight(current_idx)
                .ok_or_else(|| GraphError::new("runtime", "Node not found in graph"))?;

            let node_id = node.id();
            tracing::debug!(
                request_id = %state.request_id,
                "Executing node: {} (step {})",
                node_id,
                step
            );
            state.visited.push(node_id.to_string());

            let output = node
                .execute(state, ctx)
                .await
                .map_err(|err| err.with_trace(&state.visited))?;

            match output {
                NodeOutput::Final => {
                    tracing::debug!("Graph execution complete at node: {}", node_id);
                    return Ok(());
                }
                NodeOutput::Continue => {
                    current_idx = self
                        .graph
                        .neighbors_directed(current_idx, Direction::Outgoing)
                        .next()
                        .ok_or_else(|| {
                            GraphError::new(
                                node_id,
                                format!("No outgoing edge from node: {}", node_id),
                            )
                            .with_trace(&state.visited)
                        })?;
                }
            }

            step += 1;
        }
    }
}

/// Builder for constructing graphs fluently
pub struct GraphBuilder {
    runtime: GraphRuntime,
    pending_nodes: Vec<Box<dyn Node>>,
    pending_edges: Vec<(String, String)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            runtime: GraphRuntime::new(),
            pending_nodes: Vec::new(),
            pending_edges: Vec::new(),
        }
    }

    pub fn entry(mut self, node_id: impl Into<String>) -> Self {
        self.runtime.entry_node_id = node_id.into();
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.runtime.max_steps = max_steps;
        self
    }

    pub fn node(mut self, node: Box<dyn Node>) -> Self {
        self.pending_nodes.push(node);
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pending_edges.push((from.into(), to.into()));
        self
    }

    pub fn build(mut self) -> Result<GraphRuntime, GraphError> {
        for node in self.pending_nodes {
            self.runtime.add_node(node)?;
        }
        for (from, to) in self.pending_edges {
            self.runtime.add_edge(&from, &to)?;
        }

        if self.runtime.entry_node_id.is_empty() {
            return Err(GraphError::new("runtime", "No entry node set"));
        }
        if !self
            .runtime
            .node_indices
            .contains_key(&self.runtime.entry_node_id)
        {
            return Err(GraphError::new(
                "runtime",
                format!("Entry node not found: {}", self.runtime.entry_node_id),
            ));
        }
        if self.runtime.has_cycle() {
            return Err(GraphError::new("runtime", "Graph contains a cycle"));
        }

        Ok(self.runtime)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

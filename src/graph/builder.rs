// Graph Builder
// Constructs the retrieve → generate graph using petgraph

use super::node::GraphError;
use super::nodes::{GenerateNode, RetrieveNode};
use super::runtime::{GraphBuilder, GraphRuntime};

/// Build the RAG graph: `retrieve` always flows into `generate`, which ends
/// the run. There are no conditional edges and no way back to `retrieve`.
pub fn build_rag_graph(max_steps: usize) -> Result<GraphRuntime, GraphError> {
    GraphBuilder::new()
        .entry("retrieve")
        .max_steps(max_steps)
        .node(Box::new(RetrieveNode::new()))
        .node(Box::new(GenerateNode::new()))
        .edge("retrieve", "generate")
        .build()
}

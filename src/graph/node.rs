// Node trait and types
// Base abstraction for graph nodes

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::PipelineSettings;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;
use crate::rag::Retriever;

use super::extract::PayloadExtractor;
use super::state::PipelineState;

/// Capabilities injected into the pipeline at process start.
///
/// `retriever` is `None` when the document store could not be opened; the
/// retrieval stage then degrades every request to an empty context.
#[derive(Clone)]
pub struct PipelineServices {
    pub retriever: Option<Arc<dyn Retriever>>,
    pub llm: Arc<dyn LlmProvider>,
    pub extractor: Arc<dyn PayloadExtractor>,
    pub settings: PipelineSettings,
}

/// Context passed to nodes during execution
pub struct NodeContext<'a> {
    pub services: &'a PipelineServices,
}

/// Output from a node execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutput {
    /// Follow the node's outgoing edge
    Continue,
    /// Graph execution complete
    Final,
}

/// Graph execution error
///
/// Includes an optional `execution_trace` to record the sequence of node IDs
/// visited before the error occurred.
#[derive(Debug, Clone)]
pub struct GraphError {
    pub node_id: String,
    pub message: String,
    /// Ordered list of node IDs executed before this error, most-recent last.
    pub execution_trace: Vec<String>,
}

impl GraphError {
    pub fn new(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            message: message.into(),
            execution_trace: Vec::new(),
        }
    }

    pub fn with_trace(mut self, trace: &[String]) -> Self {
        self.execution_trace = trace.to_vec();
        self
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        ApiError::internal(err)
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.execution_trace.is_empty() {
            write!(f, "GraphError in {}: {}", self.node_id, self.message)
        } else {
            write!(
                f,
                "GraphError in {} (trace: {}): {}",
                self.node_id,
                self.execution_trace.join(" -> "),
                self.message
            )
        }
    }
}

impl std::error::Error for GraphError {}

/// Node trait - all graph nodes implement this
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique identifier for this node
    fn id(&self) -> &'static str;

    /// Human-readable name for display
    fn name(&self) -> &'static str {
        self.id()
    }

    /// Execute the node logic
    async fn execute(
        &self,
        state: &mut PipelineState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_trace_when_present() {
        let err = GraphError::new("generate", "boom");
        assert_eq!(err.to_string(), "GraphError in generate: boom");

        let err = err.with_trace(&["retrieve".to_string(), "generate".to_string()]);
        assert_eq!(
            err.to_string(),
            "GraphError in generate (trace: retrieve -> generate): boom"
        );
    }
}

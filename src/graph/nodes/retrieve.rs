// Retrieve Node
// Fills the state's context with the top-k reference fragments

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::PipelineState;
use crate::rag::RetrievalError;

use super::isolate::{isolated, IsolationError};

pub struct RetrieveNode;

impl RetrieveNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RetrieveNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RetrieveNode {
    fn id(&self) -> &'static str {
        "retrieve"
    }

    fn name(&self) -> &'static str {
        "Retrieve Node"
    }

    /// Never fails: every retrieval problem degrades to an empty context.
    async fn execute(
        &self,
        state: &mut PipelineState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let settings = &ctx.services.settings;

        let Some(retriever) = ctx.services.retriever.clone() else {
            tracing::warn!(
                request_id = %state.request_id,
                "Retrieval service not configured; continuing without references"
            );
            state.record_degraded_retrieval(RetrievalError::Unavailable);
            return Ok(NodeOutput::Continue);
        };

        let query = state.latest_text().to_string();
        let k = settings.top_k;

        let result = isolated(
            async move { retriever.retrieve(&query, k).await },
            settings.retrieval_timeout,
        )
        .await;

        let fragments = match result {
            Ok(Ok(fragments)) => fragments,
            Ok(Err(err)) => {
                return Ok(self.degrade(state, err));
            }
            Err(IsolationError::TimedOut(_)) => {
                return Ok(self.degrade(state, RetrievalError::Timeout));
            }
            Err(err) => {
                return Ok(self.degrade(state, RetrievalError::backend(err)));
            }
        };

        let fragments: Vec<String> = fragments.into_iter().take(k).collect();
        tracing::debug!(
            request_id = %state.request_id,
            "Retrieved {} reference fragment(s)",
            fragments.len()
        );
        state.record_retrieval(fragments);
        Ok(NodeOutput::Continue)
    }
}

impl RetrieveNode {
    fn degrade(&self, state: &mut PipelineState, err: RetrievalError) -> NodeOutput {
        tracing::warn!(
            request_id = %state.request_id,
            "Retrieval failed, continuing without references: {}",
            err
        );
        state.record_degraded_retrieval(err);
        NodeOutput::Continue
    }
}

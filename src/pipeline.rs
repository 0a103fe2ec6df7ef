// RAG pipeline facade
// Owns the compiled graph and its injected services; one call per request

use tracing::Instrument;
use uuid::Uuid;

use crate::graph::{
    build_rag_graph, CanvasPayload, GenerationOutcome, GraphError, GraphRuntime, Mode,
    NodeContext, PipelineServices, PipelineState, RetrievalOutcome,
};

/// One inbound interaction.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub message: String,
    pub mode: Mode,
}

impl PipelineRequest {
    pub fn new(message: impl Into<String>, mode: Mode) -> Self {
        Self {
            message: message.into(),
            mode,
        }
    }
}

/// Final outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub request_id: String,
    pub answer: String,
    pub canvas: Option<CanvasPayload>,
    pub retrieval: Option<RetrievalOutcome>,
    pub generation: GenerationOutcome,
}

pub struct RagPipeline {
    runtime: GraphRuntime,
    services: PipelineServices,
}

impl RagPipeline {
    pub fn new(services: PipelineServices) -> Result<Self, GraphError> {
        let runtime = build_rag_graph(services.settings.max_steps)?;
        Ok(Self { runtime, services })
    }

    pub fn services(&self) -> &PipelineServices {
        &self.services
    }

    pub fn retrieval_available(&self) -> bool {
        self.services.retriever.is_some()
    }

    /// Runs retrieve then generate for a single message.
    ///
    /// Never fails: a structural graph error is reported as an
    /// `Error: ...` answer with no canvas, the same shape as a failed
    /// completion.
    pub async fn run(&self, request: PipelineRequest) -> PipelineResult {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "pipeline",
            request_id = %request_id,
            mode = request.mode.as_str()
        );

        async move {
            let mut state = PipelineState::new(&request_id, request.message, request.mode);
            let ctx = NodeContext {
                services: &self.services,
            };

            if let Err(err) = self.runtime.run(&mut state, &ctx).await {
                tracing::error!("Pipeline aborted: {}", err);
                return PipelineResult {
                    request_id,
                    answer: format!("Error: {}", err.message),
                    canvas: None,
                    retrieval: state.retrieval,
                    generation: GenerationOutcome::Failed(err.message),
                };
            }

            let answer = state.answer().unwrap_or_default().to_string();
            let generation = state.generation.clone().unwrap_or_else(|| {
                GenerationOutcome::Failed("generation did not run".to_string())
            });
            tracing::info!(
                "Pipeline finished: retrieval={:?} generation={:?}",
                state.retrieval,
                generation
            );

            PipelineResult {
                request_id,
                answer,
                canvas: state.canvas,
                retrieval: state.retrieval,
                generation,
            }
        }
        .instrument(span)
        .await
    }
}

// Generate Node
// Builds the mode prompt, calls the model once and post-processes the output

use async_trait::async_trait;

use crate::graph::canvas::CanvasPayload;
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput, PipelineServices};
use crate::graph::prompt::{build_prompt, QUIZ_READY_MESSAGE};
use crate::graph::state::{GenerationOutcome, Mode, PipelineState};
use crate::llm::{ChatMessage, ChatRequest};

use super::isolate::isolated;

pub struct GenerateNode;

/// Result of post-processing one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub answer: String,
    pub canvas: Option<CanvasPayload>,
    pub outcome: GenerationOutcome,
}

impl Generation {
    fn failed(message: String) -> Self {
        Self {
            answer: format!("Error: {}", message),
            canvas: None,
            outcome: GenerationOutcome::Failed(message),
        }
    }
}

impl GenerateNode {
    pub fn new() -> Self {
        Self
    }

    async fn complete(
        &self,
        services: &PipelineServices,
        prompt: String,
    ) -> Result<String, String> {
        let settings = &services.settings;
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens);
        let llm = services.llm.clone();

        match isolated(async move { llm.chat(request).await }, settings.completion_timeout).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(err)) => Err(err.to_string()),
            Err(err) => Err(format!("completion {}", err)),
        }
    }
}

impl Default for GenerateNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Mode-specific handling of the raw completion text.
pub fn post_process(
    mode: Mode,
    query: &str,
    raw: String,
    services: &PipelineServices,
) -> Generation {
    match mode {
        Mode::Chat => Generation {
            answer: raw,
            canvas: None,
            outcome: GenerationOutcome::Answered,
        },
        Mode::Visual => Generation {
            answer: raw,
            canvas: Some(CanvasPayload::image(query, &services.settings.canvas)),
            outcome: GenerationOutcome::Answered,
        },
        Mode::Quiz => match services.extractor.extract(&raw) {
            // An empty object carries no quiz; treat it as a miss.
            Some(fields) if !fields.is_empty() => Generation {
                answer: QUIZ_READY_MESSAGE.to_string(),
                canvas: Some(CanvasPayload::quiz(fields)),
                outcome: GenerationOutcome::QuizExtracted,
            },
            _ => {
                tracing::info!("No quiz JSON found in completion; returning raw text");
                Generation {
                    answer: raw,
                    canvas: None,
                    outcome: GenerationOutcome::QuizFallback,
                }
            }
        },
    }
}

#[async_trait]
impl Node for GenerateNode {
    fn id(&self) -> &'static str {
        "generate"
    }

    fn name(&self) -> &'static str {
        "Generate Node"
    }

    /// Never fails: errors become an `Error: ...` answer with no canvas.
    async fn execute(
        &self,
        state: &mut PipelineState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let query = state.latest_text().to_string();
        let prompt = build_prompt(state.mode, &state.context, &query);

        let generation = match self.complete(ctx.services, prompt).await {
            Ok(raw) => post_process(state.mode, &query, raw, ctx.services),
            Err(message) => {
                tracing::error!(
                    request_id = %state.request_id,
                    mode = state.mode.as_str(),
                    model = %ctx.services.settings.model,
                    "Generation failed: {}",
                    message
                );
                Generation::failed(message)
            }
        };

        state.record_generation(generation.answer, generation.canvas, generation.outcome);
        Ok(NodeOutput::Final)
    }
}

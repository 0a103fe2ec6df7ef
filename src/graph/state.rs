// Graph State
// PipelineState and the stage outcome types recorded on it

use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;
use crate::rag::RetrievalError;

use super::canvas::CanvasPayload;

/// Interaction mode requested per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Chat,
    Visual,
    Quiz,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Chat => "chat",
            Mode::Visual => "visual",
            Mode::Quiz => "quiz",
        }
    }
}

/// Position in the fixed retrieve → generate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Start,
    Retrieved,
    Done,
}

/// How the retrieval stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// The service answered; `fragments` may be zero.
    Retrieved { fragments: usize },
    /// The service was absent or failed; context was left empty.
    Degraded(RetrievalError),
}

/// How the generation stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Raw completion used verbatim (chat and visual).
    Answered,
    /// Quiz JSON found; the answer is the confirmation text.
    QuizExtracted,
    /// No quiz JSON found; raw completion used verbatim.
    QuizFallback,
    /// Completion or post-processing failed; the answer carries the error.
    Failed(String),
}

/// Per-request state threaded through the graph.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub request_id: String,
    pub messages: Vec<ChatMessage>,
    pub context: Vec<String>,
    pub mode: Mode,
    pub canvas: Option<CanvasPayload>,
    pub stage: Stage,
    pub retrieval: Option<RetrievalOutcome>,
    pub generation: Option<GenerationOutcome>,
    /// Node ids in execution order.
    pub visited: Vec<String>,
}

impl PipelineState {
    pub fn new(request_id: impl Into<String>, message: impl Into<String>, mode: Mode) -> Self {
        Self {
            request_id: request_id.into(),
            messages: vec![ChatMessage::user(message)],
            context: Vec::new(),
            mode,
            canvas: None,
            stage: Stage::Start,
            retrieval: None,
            generation: None,
            visited: Vec::new(),
        }
    }

    /// Text of the most recent message; the query both stages work from.
    pub fn latest_text(&self) -> &str {
        self.messages
            .last()
            .map(|message| message.content.as_str())
            .unwrap_or("")
    }

    pub fn record_retrieval(&mut self, fragments: Vec<String>) {
        self.retrieval = Some(RetrievalOutcome::Retrieved {
            fragments: fragments.len(),
        });
        self.context = fragments;
        self.stage = Stage::Retrieved;
    }

    pub fn record_degraded_retrieval(&mut self, err: RetrievalError) {
        self.retrieval = Some(RetrievalOutcome::Degraded(err));
        self.context.clear();
        self.stage = Stage::Retrieved;
    }

    /// Appends the single response message and closes the state.
    pub fn record_generation(
        &mut self,
        answer: String,
        canvas: Option<CanvasPayload>,
        outcome: GenerationOutcome,
    ) {
        self.messages.push(ChatMessage::assistant(answer));
        self.canvas = canvas;
        self.generation = Some(outcome);
        self.stage = Stage::Done;
    }

    /// The response appended by the generation stage, if it ran.
    pub fn answer(&self) -> Option<&str> {
        if self.stage != Stage::Done {
            return None;
        }
        self.messages
            .last()
            .filter(|message| message.role == "assistant")
            .map(|message| message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_default_is_chat() {
        assert_eq!(Mode::default(), Mode::Chat);
    }

    #[test]
    fn mode_deserializes_lowercase_names() {
        let mode: Mode = serde_json::from_str("\"quiz\"").unwrap();
        assert_eq!(mode, Mode::Quiz);
        let mode: Mode = serde_json::from_str("\"visual\"").unwrap();
        assert_eq!(mode, Mode::Visual);
    }

    #[test]
    fn mode_rejects_unknown_names() {
        assert!(serde_json::from_str::<Mode>("\"agent\"").is_err());
        assert!(serde_json::from_str::<Mode>("\"QUIZ\"").is_err());
    }

    #[test]
    fn mode_as_str_matches_wire_name() {
        for mode in [Mode::Chat, Mode::Visual, Mode::Quiz] {
            let wire = serde_json::to_string(&mode).unwrap();
            assert_eq!(wire, format!("\"{}\"", mode.as_str()));
        }
    }

    #[test]
    fn new_state_holds_only_the_user_message() {
        let state = PipelineState::new("r1", "What is mitosis?", Mode::Chat);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.latest_text(), "What is mitosis?");
        assert!(state.context.is_empty());
        assert_eq!(state.stage, Stage::Start);
        assert_eq!(state.answer(), None);
    }

    #[test]
    fn degraded_retrieval_clears_context() {
        let mut state = PipelineState::new("r1", "q", Mode::Chat);
        state.context.push("stale".to_string());
        state.record_degraded_retrieval(RetrievalError::Unavailable);

        assert!(state.context.is_empty());
        assert_eq!(state.stage, Stage::Retrieved);
        assert_eq!(
            state.retrieval,
            Some(RetrievalOutcome::Degraded(RetrievalError::Unavailable))
        );
    }

    #[test]
    fn generation_appends_exactly_one_message() {
        let mut state = PipelineState::new("r1", "q", Mode::Chat);
        state.record_retrieval(vec!["ctx".to_string()]);
        state.record_generation("answer".to_string(), None, GenerationOutcome::Answered);

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.answer(), Some("answer"));
        assert_eq!(state.stage, Stage::Done);
    }
}

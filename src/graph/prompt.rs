// Prompt templates
// One base prompt shared by every mode plus a per-mode instruction

use super::state::Mode;

pub const NO_REFERENCES: &str = "No references available.";

pub const QUIZ_READY_MESSAGE: &str =
    "✅ **Quiz ready!**\n\nOpen the panel on the right to take the interactive quiz.";

const CHAT_INSTRUCTION: &str = "\nAnswer in an academic register (Markdown).";

const VISUAL_INSTRUCTION: &str = "\nBriefly describe the visual.";

const QUIZ_INSTRUCTION: &str = r#"
INSTRUCTION: Write exactly 1 multiple-choice quiz question as a single JSON object:
{"question": "...", "options": ["A", "B", "C", "D"], "correct_answer": "...", "explanation": "..."}
The "options" array must contain 4 choices and "correct_answer" must repeat one of them."#;

impl Mode {
    /// Mode-specific instruction appended to the base prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            Mode::Chat => CHAT_INSTRUCTION,
            Mode::Visual => VISUAL_INSTRUCTION,
            Mode::Quiz => QUIZ_INSTRUCTION,
        }
    }
}

/// Fragments separated by a blank line, or the no-references marker.
pub fn context_block(context: &[String]) -> String {
    let joined = context.join("\n\n");
    if joined.is_empty() {
        NO_REFERENCES.to_string()
    } else {
        joined
    }
}

pub fn base_prompt(context: &[String], query: &str) -> String {
    format!(
        "Answer based on:\n{}\n\nQuestion: {}",
        context_block(context),
        query
    )
}

pub fn build_prompt(mode: Mode, context: &[String], query: &str) -> String {
    let mut prompt = base_prompt(context, query);
    prompt.push_str(mode.instruction());
    prompt
}

pub mod openai;
pub mod provider;
pub mod types;


pub use openai::OpenAiCompatProvider;
pub use provider::{EmbeddingProvider, LlmProvider};
pub use types::{ChatMessage, ChatRequest};

// Graph Module
// LangGraph-style StateGraph architecture for Rust

pub mod builder;
pub mod canvas;
pub mod extract;
pub mod node;
pub mod nodes;
pub mod prompt;
pub mod runtime;
pub mod state;


pub use builder::build_rag_graph;
pub use canvas::CanvasPayload;
pub use extract::{BraceSpanExtractor, PayloadExtractor};
pub use node::{GraphError, Node, NodeContext, NodeOutput, PipelineServices};
pub use runtime::GraphRuntime;
pub use state::{GenerationOutcome, Mode, PipelineState, RetrievalOutcome, Stage};

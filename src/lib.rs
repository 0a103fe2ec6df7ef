pub mod core;
pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod rag;
pub mod server;
pub mod state;

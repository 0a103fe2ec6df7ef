//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `Retriever`: the retrieval capability injected into the pipeline
//! - `VectorRetriever`: query embedding + similarity search over a `RagStore`
//! - `SqliteRagStore`: the in-process chunk store

mod retriever;
mod sqlite;
mod store;

pub use retriever::{RetrievalError, Retriever, VectorRetriever};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};

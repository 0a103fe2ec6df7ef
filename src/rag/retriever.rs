//! Retrieval capability consumed by the `retrieve` graph node.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::store::RagStore;
use crate::llm::EmbeddingProvider;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("retrieval service unavailable")]
    Unavailable,
    #[error("retrieval timed out")]
    Timeout,
    #[error("retrieval backend error: {0}")]
    Backend(String),
}

impl RetrievalError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        RetrievalError::Backend(err.to_string())
    }
}

/// Returns up to `k` reference fragments for a query, most relevant first.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError>;
}

/// Embeds the query and runs a similarity search against a `RagStore`.
pub struct VectorRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn RagStore>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn RagStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        let embeddings = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(RetrievalError::backend)?;

        let query_embedding = embeddings
            .into_iter()
            .next()
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| RetrievalError::Backend("empty query embedding".to_string()))?;

        let results = self
            .store
            .search(&query_embedding, k)
            .await
            .map_err(RetrievalError::backend)?;

        Ok(results
            .into_iter()
            .take(k)
            .map(|result| result.chunk.content)
            .collect())
    }
}

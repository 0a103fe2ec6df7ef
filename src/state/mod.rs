use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::graph::{BraceSpanExtractor, PipelineServices};
use crate::llm::{LlmProvider, OpenAiCompatProvider};
use crate::pipeline::RagPipeline;
use crate::rag::{RagStore, Retriever, SqliteRagStore, VectorRetriever};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
///
/// Contains references to:
/// - Configuration and paths
/// - The compiled RAG pipeline and the capabilities injected into it
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Settings,
    pub pipeline: Arc<RagPipeline>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// `paths` are resolved by the caller so logging can be installed
    /// before anything here emits events.
    ///
    /// This process includes:
    /// 1. Loading configuration
    /// 2. Opening the RAG store (a failure here only disables retrieval)
    /// 3. Building the chat and embedding providers
    /// 4. Compiling the retrieve → generate graph
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let llm: Arc<dyn LlmProvider> = Arc::new(
            OpenAiCompatProvider::for_chat(&settings.llm)
                .map_err(|e| InitializationError::Llm(e.into()))?,
        );
        let retriever = open_retriever(&settings).await?;

        let services = PipelineServices {
            retriever,
            llm,
            extractor: Arc::new(BraceSpanExtractor),
            settings: settings.pipeline.clone(),
        };

        Self::from_parts(paths, config, settings, services)
    }

    /// Assembles state around already-built services.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: Settings,
        services: PipelineServices,
    ) -> Result<Arc<Self>, InitializationError> {
        let pipeline = Arc::new(
            RagPipeline::new(services).map_err(|e| InitializationError::Graph(e.into()))?,
        );

        Ok(Arc::new(AppState {
            paths,
            config,
            settings,
            pipeline,
            started_at: Utc::now(),
        }))
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.pipeline.services().llm
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

/// Opens the vector store behind the retrieval stage.
///
/// Returns `Ok(None)` when retrieval is disabled or the store cannot be
/// opened; requests then run with an empty context.
async fn open_retriever(
    settings: &Settings,
) -> Result<Option<Arc<dyn Retriever>>, InitializationError> {
    if !settings.rag.enabled {
        tracing::info!("Retrieval disabled by configuration");
        return Ok(None);
    }

    let store = match SqliteRagStore::with_path(settings.rag.db_path.clone()).await {
        Ok(store) => store,
        Err(err) => {
            tracing::warn!(
                "Failed to open RAG store at {}: {}; continuing without retrieval",
                settings.rag.db_path.display(),
                err
            );
            return Ok(None);
        }
    };

    match store.count().await {
        Ok(count) => tracing::info!(
            "RAG store ready at {} ({} chunks)",
            store.db_path().display(),
            count
        ),
        Err(err) => tracing::warn!("Failed to count RAG chunks: {}", err),
    }

    let embedder = OpenAiCompatProvider::for_embeddings(&settings.embedding, settings.rag.timeout)
        .map_err(|e| InitializationError::Rag(e.into()))?;

    Ok(Some(Arc::new(VectorRetriever::new(
        Arc::new(embedder),
        Arc::new(store),
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn initialize_uses_caller_paths() {
        let dir = tempdir().unwrap();
        let paths = Arc::new(AppPaths::rooted_at(dir.path()));

        let state = AppState::initialize(paths.clone()).await.unwrap();

        assert_eq!(state.paths.log_dir, paths.log_dir);
        assert!(state.pipeline.retrieval_available());
        assert!(dir.path().join("rag.db").exists());
    }

    #[tokio::test]
    async fn disabled_rag_yields_no_retriever() {
        let dir = tempdir().unwrap();
        let paths = AppPaths::rooted_at(dir.path());
        let settings = Settings::from_config(&json!({"rag": {"enabled": false}}), &paths);

        let retriever = open_retriever(&settings).await.unwrap();
        assert!(retriever.is_none());
    }

    #[tokio::test]
    async fn unopenable_store_degrades_instead_of_failing() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let paths = AppPaths::rooted_at(dir.path());
        let mut settings = Settings::from_config(&json!({}), &paths);
        settings.rag.enabled = true;
        settings.rag.db_path = blocker.join("rag.db");

        let retriever = open_retriever(&settings).await.unwrap();
        assert!(retriever.is_none());
    }

    #[tokio::test]
    async fn fresh_store_yields_retriever() {
        let dir = tempdir().unwrap();
        let paths = AppPaths::rooted_at(dir.path());
        let mut settings = Settings::from_config(&json!({}), &paths);
        settings.rag.enabled = true;
        settings.rag.db_path = dir.path().join("rag.db");

        let retriever = open_retriever(&settings).await.unwrap();
        assert!(retriever.is_some());
    }
}

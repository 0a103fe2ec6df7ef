//! Typed views over the merged YAML configuration.
//!
//! Every field has a default so an empty document produces a runnable
//! service. Values are read after `validate_config` has accepted the
//! document, so lookups here only fall back on absence.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use super::paths::AppPaths;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://placehold.co/600x400/png";
pub const DEFAULT_PLACEHOLDER_KEYWORD: &str = "Img";

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub enabled: bool,
    pub db_path: PathBuf,
    pub top_k: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CanvasSettings {
    pub image_base_url: String,
    pub placeholder_keyword: String,
}

/// Knobs the graph nodes read at request time.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub retrieval_timeout: Duration,
    pub completion_timeout: Duration,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub model: String,
    pub canvas: CanvasSettings,
    pub max_steps: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            retrieval_timeout: Duration::from_secs(10),
            completion_timeout: Duration::from_secs(60),
            temperature: 0.3,
            max_tokens: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            canvas: CanvasSettings::default(),
            max_steps: 8,
        }
    }
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            placeholder_keyword: DEFAULT_PLACEHOLDER_KEYWORD.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub pipeline: PipelineSettings,
}

impl Settings {
    pub fn from_config(config: &Value, paths: &AppPaths) -> Self {
        let server = config.get("server");
        let llm = config.get("llm");
        let embedding = config.get("embedding");
        let rag = config.get("rag");
        let canvas = config.get("canvas");
        let pipeline = config.get("pipeline");

        let port = env::var("PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .or_else(|| get_u64(server, "port").map(|v| v as u16))
            .unwrap_or(DEFAULT_PORT);

        let cors_allowed_origins = server
            .and_then(|v| v.get("cors_allowed_origins"))
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str())
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let llm_settings = LlmSettings {
            base_url: get_str(llm, "base_url").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: get_str(llm, "model").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: llm
                .and_then(|v| v.get("temperature"))
                .and_then(|v| v.as_f64())
                .unwrap_or(0.3),
            max_tokens: get_u64(llm, "max_tokens").map(|v| v as u32),
            timeout: Duration::from_secs(get_u64(llm, "timeout_secs").unwrap_or(60)),
            api_key: env::var("AICADEMICS_LLM_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .or_else(|| get_str(llm, "api_key")),
        };

        let embedding_settings = EmbeddingSettings {
            base_url: get_str(embedding, "base_url").unwrap_or_else(|| llm_settings.base_url.clone()),
            model: get_str(embedding, "model")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            api_key: get_str(embedding, "api_key").or_else(|| llm_settings.api_key.clone()),
        };

        let rag_settings = RagSettings {
            enabled: rag
                .and_then(|v| v.get("enabled"))
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            db_path: get_str(rag, "db_path")
                .map(|raw| {
                    let candidate = PathBuf::from(raw);
                    if candidate.is_absolute() {
                        candidate
                    } else {
                        paths.user_data_dir.join(candidate)
                    }
                })
                .unwrap_or_else(|| paths.rag_db_path.clone()),
            top_k: get_u64(rag, "top_k").map(|v| v as usize).unwrap_or(DEFAULT_TOP_K),
            timeout: Duration::from_secs(get_u64(rag, "timeout_secs").unwrap_or(10)),
        };

        let canvas_settings = CanvasSettings {
            image_base_url: get_str(canvas, "image_base_url")
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
            placeholder_keyword: get_str(canvas, "placeholder_keyword")
                .filter(|keyword| !keyword.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER_KEYWORD.to_string()),
        };

        let pipeline_settings = PipelineSettings {
            top_k: rag_settings.top_k,
            retrieval_timeout: rag_settings.timeout,
            completion_timeout: llm_settings.timeout,
            temperature: llm_settings.temperature,
            max_tokens: llm_settings.max_tokens,
            model: llm_settings.model.clone(),
            canvas: canvas_settings,
            max_steps: get_u64(pipeline, "max_steps").map(|v| v as usize).unwrap_or(8),
        };

        Settings {
            server: ServerSettings {
                host: get_str(server, "host").unwrap_or_else(|| "127.0.0.1".to_string()),
                port,
                cors_allowed_origins,
            },
            llm: llm_settings,
            embedding: embedding_settings,
            rag: rag_settings,
            pipeline: pipeline_settings,
        }
    }
}

fn get_str(section: Option<&Value>, key: &str) -> Option<String> {
    section
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn get_u64(section: Option<&Value>, key: &str) -> Option<u64> {
    section.and_then(|v| v.get(key)).and_then(|v| v.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::rooted_at(tmp.path());
        let settings = Settings::from_config(&json!({}), &paths);

        assert_eq!(settings.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(settings.llm.temperature, 0.3);
        assert_eq!(settings.rag.top_k, 3);
        assert!(settings.rag.enabled);
        assert_eq!(settings.rag.db_path, paths.rag_db_path);
        assert_eq!(settings.embedding.base_url, settings.llm.base_url);
        assert_eq!(settings.pipeline.canvas.placeholder_keyword, "Img");
        assert_eq!(settings.pipeline.max_steps, 8);
    }

    #[test]
    fn sections_override_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::rooted_at(tmp.path());
        let settings = Settings::from_config(
            &json!({
                "llm": { "model": "qwen", "timeout_secs": 5, "max_tokens": 256 },
                "embedding": { "base_url": "http://embed:9000" },
                "rag": { "top_k": 5, "db_path": "store/chunks.db" },
                "canvas": { "placeholder_keyword": "  " }
            }),
            &paths,
        );

        assert_eq!(settings.pipeline.model, "qwen");
        assert_eq!(settings.pipeline.completion_timeout, Duration::from_secs(5));
        assert_eq!(settings.pipeline.max_tokens, Some(256));
        assert_eq!(settings.embedding.base_url, "http://embed:9000");
        assert_eq!(settings.pipeline.top_k, 5);
        assert_eq!(settings.rag.db_path, tmp.path().join("store/chunks.db"));
        assert_eq!(settings.pipeline.canvas.placeholder_keyword, "Img");
    }
}

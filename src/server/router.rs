use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, health};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// This function sets up:
/// - CORS middleware
/// - Liveness and health endpoints
/// - The chat endpoint backed by the RAG pipeline
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_allowed_origins);
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let allow_origin = if configured.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins = if configured.is_empty() {
            default_local_origins()
        } else {
            configured.to_vec()
        };
        AllowOrigin::list(
            origins
                .into_iter()
                .filter_map(|origin| HeaderValue::from_str(&origin).ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8000".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::core::config::{AppPaths, ConfigService, Settings};
    use crate::graph::prompt::QUIZ_READY_MESSAGE;
    use crate::graph::tests::{fake_services, FakeRetriever, QUIZ_JSON};
    use crate::graph::PipelineServices;

    fn app_with(services: PipelineServices, config: Value) -> (TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::rooted_at(dir.path()));
        let settings = Settings::from_config(&config, &paths);
        let state = AppState::from_parts(
            paths.clone(),
            ConfigService::new(paths),
            settings,
            services,
        )
        .unwrap();
        (dir, router(state))
    }

    fn app(reply: &str) -> (TempDir, Router) {
        app_with(fake_services(None, reply), json!({}))
    }

    async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn root_reports_running() {
        let (_dir, app) = app("unused");
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "Backend Running"}));
    }

    #[tokio::test]
    async fn health_reports_retrieval_and_model() {
        let (_dir, app) = app_with(
            fake_services(Some(FakeRetriever::with_fragments(&[])), "unused"),
            json!({}),
        );
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["retrieval_available"], true);
        assert_eq!(body["model"], "fake-model");
    }

    #[tokio::test]
    async fn chat_defaults_to_chat_mode() {
        let (_dir, app) = app("Mitosis is cell division.");
        let (status, body) = post_chat(
            app,
            json!({"user_id": "student-1", "message": "What is mitosis?"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"answer": "Mitosis is cell division.", "canvas_data": null})
        );
    }

    #[tokio::test]
    async fn quiz_mode_returns_canvas_object() {
        let (_dir, app) = app(&format!("Sure: {}", QUIZ_JSON));
        let (status, body) =
            post_chat(app, json!({"message": "mitosis", "mode": "quiz"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], QUIZ_READY_MESSAGE);
        assert_eq!(body["canvas_data"]["type"], "quiz");
        assert_eq!(body["canvas_data"]["options"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn visual_mode_returns_image_canvas() {
        let (_dir, app) = app("A diagram of a cell.");
        let (_, body) =
            post_chat(app, json!({"message": "show a plant cell", "mode": "visual"})).await;

        assert_eq!(body["canvas_data"]["type"], "image");
        assert_eq!(body["canvas_data"]["caption"], "Visual: show a plant cell");
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let (_dir, app) = app("unused");
        let (status, _) = post_chat(app, json!({"message": "q", "mode": "agent"})).await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn missing_message_is_rejected() {
        let (_dir, app) = app("unused");
        let (status, _) = post_chat(app, json!({"mode": "chat"})).await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let (_dir, app) = app("unused");
        let message = "a".repeat(chat::MAX_MESSAGE_CHARS + 1);
        let (status, body) = post_chat(app, json!({"message": message})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("20000"));
    }

    #[tokio::test]
    async fn wildcard_origin_allows_any_origin() {
        let (_dir, app) = app_with(
            fake_services(None, "unused"),
            json!({"server": {"cors_allowed_origins": ["*"]}}),
        );
        let request = Request::get("/")
            .header(header::ORIGIN, "https://aicademics.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
    }

    #[tokio::test]
    async fn default_origins_reject_unknown_sites() {
        let (_dir, app) = app("unused");
        let request = Request::get("/")
            .header(header::ORIGIN, "https://elsewhere.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}

//! HTTP API in front of the pipeline orchestrator.
//!
//! Generated files are streamed from the asset directory under `/assets/`.
//! Every route answers cross-origin requests from any origin.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::pipeline::{PipelineError, PipelineOrchestrator};

/// API state shared by every handler.
#[derive(Clone)]
pub struct ApiState {
    orchestrator: Arc<PipelineOrchestrator>,
    assets_dir: PathBuf,
}

impl ApiState {
    /// Creates new API state; artifacts are served from the orchestrator's
    /// asset directory.
    pub fn new(orchestrator: Arc<PipelineOrchestrator>) -> Self {
        let assets_dir = orchestrator.assets_dir().to_path_buf();
        Self {
            orchestrator,
            assets_dir,
        }
    }
}

/// Creates the gateway router.
pub fn create_router(state: ApiState) -> Router {
    let assets = ServeDir::new(&state.assets_dir);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .nest_service("/assets", assets)
        .with_state(state)
        .layer(CorsLayer::permissive())
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Error response rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        log::error!("api: pipeline aborted: {e}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    text: String,
}

/// Liveness banner.
async fn root() -> impl IntoResponse {
    Json(json!({"message": "Creator's Studio Agent API is running!"}))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Run the full pipeline for one script.
async fn generate(
    State(state): State<ApiState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    if request.text.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "`text` must not be empty",
        ));
    }

    let result = state.orchestrator.run(&request.text).await?;
    Ok(Json(json!({"message": "Success!", "data": result})))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::narration::MockSynthesizer;
    use crate::publish::{MockPublisher, PLACEHOLDER_MINT_ID};
    use crate::script::MockRefiner;
    use crate::video::MockComposer;

    async fn spawn(orchestrator: PipelineOrchestrator) -> String {
        let router = create_router(ApiState::new(Arc::new(orchestrator)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn mock_orchestrator(assets: &std::path::Path) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            Arc::new(MockRefiner::Ok("Dogs are great.".into())),
            Arc::new(MockSynthesizer::Ok(b"mp3".to_vec())),
            Arc::new(MockComposer::Ok),
            Arc::new(MockPublisher::Skipped),
            assets,
        )
    }

    #[tokio::test]
    async fn root_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(mock_orchestrator(dir.path())).await;

        let root: serde_json::Value = reqwest::get(format!("{base}/"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(root["message"], "Creator's Studio Agent API is running!");

        let health: serde_json::Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
    }

    #[tokio::test]
    async fn generate_returns_result_record() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(mock_orchestrator(dir.path())).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/generate"))
            .json(&json!({"text": "dogs are great"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Success!");
        let data = &body["data"];
        assert_eq!(data["refined_script"], "Dogs are great.");
        assert!(data["audio_path"].is_string());
        assert!(data["video_path"].is_string());
        assert_eq!(data["mint_id"], PLACEHOLDER_MINT_ID);
    }

    #[tokio::test]
    async fn blank_text_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(mock_orchestrator(dir.path())).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/generate"))
            .json(&json!({"text": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn malformed_payloads_are_client_errors() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(mock_orchestrator(dir.path())).await;
        let client = reqwest::Client::new();

        let syntax = client
            .post(format!("{base}/generate"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(syntax.status(), reqwest::StatusCode::BAD_REQUEST);

        let missing_field = client
            .post(format!("{base}/generate"))
            .json(&json!({"script": "dogs"}))
            .send()
            .await
            .unwrap();
        assert_eq!(
            missing_field.status(),
            reqwest::StatusCode::UNPROCESSABLE_ENTITY
        );
        let body: serde_json::Value = missing_field.json().await.unwrap();
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn asset_dir_failure_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let base = spawn(mock_orchestrator(&blocker.join("assets"))).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/generate"))
            .json(&json!({"text": "dogs"}))
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("asset directory"));
    }

    #[tokio::test]
    async fn serves_generated_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("narration-abc.mp3"), b"ID3").unwrap();
        let base = spawn(mock_orchestrator(dir.path())).await;

        let response = reqwest::get(format!("{base}/assets/narration-abc.mp3"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "audio/mpeg");
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"ID3");

        let missing = reqwest::get(format!("{base}/assets/nope.mp4")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        let escape = reqwest::get(format!("{base}/assets/..%2Fsecret"))
            .await
            .unwrap();
        assert_eq!(escape.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cross_origin_requests_are_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(mock_orchestrator(dir.path())).await;
        let client = reqwest::Client::new();

        let preflight = client
            .request(reqwest::Method::OPTIONS, format!("{base}/generate"))
            .header("origin", "https://studio.example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .send()
            .await
            .unwrap();
        assert!(preflight.status().is_success());
        assert_eq!(preflight.headers()["access-control-allow-origin"], "*");
        assert!(preflight
            .headers()
            .contains_key("access-control-allow-methods"));

        let simple = client
            .get(format!("{base}/health"))
            .header("origin", "https://studio.example.com")
            .send()
            .await
            .unwrap();
        assert_eq!(simple.headers()["access-control-allow-origin"], "*");
    }
}

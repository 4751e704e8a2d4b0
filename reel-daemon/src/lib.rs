//! recruit-reel daemon library: app builder for testing and serving.

mod state;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use reel_core::VideoRequest;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with the given state (used by main and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/generate-recruitment-video", post(generate_video))
        .route("/video-status/:job_id", get(video_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "recruit-reel video generator",
        "status": "running",
    }))
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    status: &'static str,
    job_id: String,
    message: &'static str,
}

/// Accept a job and return at once; the pipeline runs in the background.
async fn generate_video(State(state): State<AppState>, Json(body): Json<VideoRequest>) -> impl IntoResponse {
    let handle = state.orchestrator.submit(body);
    (
        StatusCode::OK,
        Json(SubmitResponse {
            status: "processing",
            job_id: handle.id().to_string(),
            message: "video generation started, poll for status",
        }),
    )
}

async fn video_status(State(state): State<AppState>, Path(job_id): Path<String>) -> impl IntoResponse {
    Json(state.jobs.get_str(&job_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use reel_core::{
        AudioArtifact, AvatarRenderer, BackgroundGenerator, CompositionRequest, JobStore, ScriptWriter,
        SpeechSynthesizer, StageClients, StageError, VideoComposer,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Stub {
        fail_compose: bool,
    }

    #[async_trait]
    impl ScriptWriter for Stub {
        fn provider(&self) -> &'static str {
            "stub"
        }
        async fn write_script(&self, d: &str) -> Result<String, StageError> {
            Ok(format!("script: {d}"))
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for Stub {
        fn provider(&self) -> &'static str {
            "stub"
        }
        async fn synthesize(&self, s: &str) -> Result<AudioArtifact, StageError> {
            Ok(AudioArtifact::mpeg(s.as_bytes().to_vec()))
        }
    }

    #[async_trait]
    impl AvatarRenderer for Stub {
        fn provider(&self) -> &'static str {
            "stub"
        }
        async fn render_avatar(&self, _: &str, _: &AudioArtifact) -> Result<String, StageError> {
            Ok("https://stub/avatar.mp4".into())
        }
    }

    #[async_trait]
    impl BackgroundGenerator for Stub {
        fn provider(&self) -> &'static str {
            "stub"
        }
        async fn generate_background(&self) -> Result<String, StageError> {
            Ok("https://stub/office.mp4".into())
        }
    }

    #[async_trait]
    impl VideoComposer for Stub {
        fn provider(&self) -> &'static str {
            "stub"
        }
        async fn compose(&self, _: &CompositionRequest) -> Result<String, StageError> {
            if self.fail_compose {
                return Err(StageError::Upstream {
                    provider: "creatomate",
                    status: 500,
                    detail: "render farm down".into(),
                });
            }
            Ok("https://stub/final.mp4".into())
        }
    }

    fn test_app_state(fail_compose: bool) -> AppState {
        let stub = Arc::new(Stub { fail_compose });
        let clients = StageClients {
            script: stub.clone(),
            audio: stub.clone(),
            avatar: stub.clone(),
            background: stub.clone(),
            compose: stub,
        };
        AppState::new(Arc::new(JobStore::unbounded()), clients)
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn submit_request() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate-recruitment-video")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "job_description": "Backend engineer...",
                    "company_logo_url": "https://x/logo.png",
                    "manager_photo_url": "https://x/mgr.jpg"
                })
                .to_string(),
            ))
            .unwrap()
    }

    async fn poll_until_terminal(app: &Router, job_id: &str) -> Value {
        for _ in 0..200 {
            let req = Request::builder()
                .uri(format!("/video-status/{job_id}"))
                .body(Body::empty())
                .unwrap();
            let body = json_body(app.clone().oneshot(req).await.unwrap()).await;
            if body["status"] != "processing" {
                return body;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("job {job_id} never finished");
    }

    #[tokio::test]
    async fn root_reports_running() {
        let app = build_app(test_app_state(false));
        let res = app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["status"], "running");
    }

    #[tokio::test]
    async fn status_for_unknown_job_is_not_found_record() {
        let app = build_app(test_app_state(false));
        for id in ["nonexistent-id", "7f1c2b8e-2d7a-4d4e-9a38-0d6b2f0b1a11"] {
            let req = Request::builder().uri(format!("/video-status/{id}")).body(Body::empty()).unwrap();
            let res = app.clone().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let body = json_body(res).await;
            assert_eq!(body["status"], "not_found");
            assert_eq!(body["message"], "Job not found");
        }
    }

    #[tokio::test]
    async fn submit_then_poll_to_completion() {
        let state = test_app_state(false);
        let app = build_app(state.clone());

        let res = app.clone().oneshot(submit_request()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["status"], "processing");
        let job_id = body["job_id"].as_str().unwrap().to_string();
        assert!(job_id.parse::<reel_core::JobId>().is_ok());

        let done = poll_until_terminal(&app, &job_id).await;
        assert_eq!(done["status"], "completed");
        assert_eq!(done["video_url"], "https://stub/final.mp4");
        assert_eq!(state.jobs.len(), 1);
    }

    #[tokio::test]
    async fn failed_job_reports_provider_detail() {
        let app = build_app(test_app_state(true));
        let body = json_body(app.clone().oneshot(submit_request()).await.unwrap()).await;
        let job_id = body["job_id"].as_str().unwrap().to_string();

        let done = poll_until_terminal(&app, &job_id).await;
        assert_eq!(done["status"], "failed");
        assert_eq!(done["message"], "creatomate: render farm down");
        assert!(done.get("video_url").is_none());
    }

    #[tokio::test]
    async fn malformed_submission_is_rejected() {
        let app = build_app(test_app_state(false));
        let req = Request::builder()
            .method("POST")
            .uri("/generate-recruitment-video")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"job_description": "x"}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert!(res.status().is_client_error());
    }
}

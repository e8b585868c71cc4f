//! Route handlers
//!
//! Failures before streaming starts become `500 {error, details}`. Once the
//! response headers are sent, failures can only abort the body.

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info};

use super::AppState;
use super::form::parse_generation_form;
use crate::ai::prompt::PromptAssembler;
use crate::generation::output_channel;
use crate::types::PrdError;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/generate", post(generate))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: String,
    model: String,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.name().to_string(),
        model: state.provider.model().to_string(),
    })
}

async fn generate(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| PrdError::Input(e.body_text()))?;
    let request = parse_generation_form(multipart).await?;
    let references = state.templates.load().await?;

    info!(
        topic = request.topic(),
        raw_requirements = request.raw_requirements().len(),
        images = request.images().len(),
        tech_context = request.tech_context().len(),
        "Generation request accepted"
    );

    let initial = PromptAssembler::assemble(&request, &references);
    let (sink, receiver) = output_channel(state.config.generation.sink_capacity);
    let controller = state.controller();

    tokio::spawn(async move {
        controller.run(initial, sink).await;
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(receiver.into_body_stream()),
    )
        .into_response())
}

// =============================================================================
// Error Response
// =============================================================================

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    details: String,
}

/// Error raised before any output was streamed
#[derive(Debug)]
pub struct ApiError(pub PrdError);

impl From<PrdError> for ApiError {
    fn from(e: PrdError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(kind = self.0.label(), "Generation request rejected: {}", self.0);

        let body = ErrorBody {
            error: self.0.label(),
            details: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::scripted::{ScriptRound, ScriptStep, ScriptedProvider};
    use crate::ai::provider::{StopReason, StreamEvent};
    use crate::config::Config;
    use crate::constants::templates::{REQUIREMENTS_TEMPLATE, WRITING_GUIDELINES};
    use axum::http::Request;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "deepprd-test-boundary";

    struct Part<'a> {
        name: &'a str,
        file_name: Option<&'a str>,
        content_type: Option<&'a str>,
        data: &'a [u8],
    }

    impl<'a> Part<'a> {
        fn text(name: &'a str, value: &'a str) -> Self {
            Self {
                name,
                file_name: None,
                content_type: None,
                data: value.as_bytes(),
            }
        }

        fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
            Self {
                name,
                file_name: Some(file_name),
                content_type: Some(content_type),
                data,
            }
        }
    }

    fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
            if let Some(file_name) = part.file_name {
                disposition.push_str(&format!("; filename=\"{file_name}\""));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(content_type) = part.content_type {
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn template_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(REQUIREMENTS_TEMPLATE), "# 模板\n## 7. 数据需求").unwrap();
        std::fs::write(dir.path().join(WRITING_GUIDELINES), "写作规范").unwrap();
        dir
    }

    fn app(provider: &ScriptedProvider, templates: &TempDir) -> Router {
        let mut config = Config::default();
        config.templates.dir = templates.path().to_path_buf();
        create_router(AppState::new(config, Arc::new(provider.clone())))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let templates = template_dir();
        let provider = ScriptedProvider::default();
        let response = app(&provider, &templates)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["provider"], "scripted");
    }

    #[tokio::test]
    async fn test_generate_streams_continued_document() {
        let templates = template_dir();
        let provider = ScriptedProvider::new(vec![
            ScriptRound::deltas(&["# Title\n", "## 1. Overview\n"], Some(StopReason::MaxTokens)),
            ScriptRound::deltas(&["## 8. 附录\n", "Done."], Some(StopReason::EndTurn)),
        ]);

        let request = multipart_request(&[
            Part::text("theme", "Login Flow"),
            Part::file(
                "rawRequirements",
                "notes.md",
                "text/markdown",
                "must support SSO".as_bytes(),
            ),
            Part::file("visuals", "flow.png", "image/png", &[0x89, 0x50, 0x4e, 0x47]),
        ]);
        let response = app(&provider, &templates).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()[header::CONNECTION], "keep-alive");
        assert_eq!(
            body_text(response).await,
            "# Title\n## 1. Overview\n\n## 8. 附录\nDone."
        );

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        let prompt = calls[0][0].content.text();
        assert!(prompt.contains("Login Flow"));
        assert!(prompt.contains("--- Document: notes.md ---"));
        assert!(prompt.contains("must support SSO"));
        assert!(prompt.contains("写作规范"));
    }

    #[tokio::test]
    async fn test_missing_theme_is_input_error() {
        let templates = template_dir();
        let provider = ScriptedProvider::default();
        let request = multipart_request(&[Part::file(
            "rawRequirements",
            "notes.md",
            "text/plain",
            b"text",
        )]);

        let response = app(&provider, &templates).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "Invalid Input");
        assert!(json["details"].as_str().unwrap().contains("theme"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_input_error() {
        let templates = template_dir();
        let provider = ScriptedProvider::default();
        let request = Request::post("/api/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(&provider, &templates).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "Invalid Input");
    }

    #[tokio::test]
    async fn test_missing_template_fails_before_streaming() {
        let templates = TempDir::new().unwrap();
        let provider = ScriptedProvider::default();
        let request = multipart_request(&[Part::text("theme", "Login Flow")]);

        let response = app(&provider, &templates).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "Template Error");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_theme_is_accepted() {
        let templates = template_dir();
        let provider = ScriptedProvider::new(vec![ScriptRound::deltas(
            &["ok"],
            Some(StopReason::EndTurn),
        )]);
        let request = multipart_request(&[Part::text("theme", "   ")]);

        let response = app(&provider, &templates).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_aborts_body() {
        let templates = template_dir();
        let provider = ScriptedProvider::new(vec![ScriptRound::Open(vec![
            ScriptStep::Event(StreamEvent::text("partial")),
            ScriptStep::Fail("connection reset".to_string()),
        ])]);
        let request = multipart_request(&[Part::text("theme", "Login Flow")]);

        let response = app(&provider, &templates).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await;
        assert!(body.is_err());
    }
}

//! HTTP request handlers for the document pipeline.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ErrorKind, PipelineError};
use crate::pipeline::Pipeline;
use crate::queue::QueueStatus;
use crate::tokenizer::tokenize;
use crate::types::{Document, ProcessingResult};

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// Application state shared across handlers.
pub struct AppState {
    pub pipeline: Pipeline,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn status_for(result: &ProcessingResult) -> StatusCode {
    match result.kind {
        None => StatusCode::OK,
        Some(ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::UnsupportedType) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        Some(ErrorKind::ExtractionFailure) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(ErrorKind::Busy) => StatusCode::CONFLICT,
        Some(ErrorKind::ChunkProcessing) | Some(ErrorKind::Config) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Upload a document as multipart form data.
///
/// The `file` field's content type is the declared MIME type.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<ProcessingResult>) {
    let mut document = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Malformed multipart upload");
                let err = PipelineError::extraction("Failed to read upload", e);
                let result = ProcessingResult::failure(&err);
                return (StatusCode::BAD_REQUEST, Json(result));
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().map(String::from);
        let content_type = field.content_type().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) => {
                let mut doc = Document::new(content_type, bytes.to_vec());
                doc.name = name;
                document = Some(doc);
                break;
            }
            Err(e) => {
                let err = PipelineError::extraction("Failed to read upload", e);
                return (StatusCode::BAD_REQUEST, Json(ProcessingResult::failure(&err)));
            }
        }
    }

    let result = state.pipeline.process_document(document).await;
    if result.success {
        info!(
            document_id = ?result.document_id,
            chunks = result.chunk_count(),
            "Accepted document"
        );
    }
    (status_for(&result), Json(result))
}

/// Current processing progress.
pub async fn get_progress(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    Json(state.pipeline.status())
}

/// Tokenize request.
#[derive(Debug, Deserialize)]
pub struct TokenizeRequest {
    text: String,
}

/// Tokenize response.
#[derive(Debug, Serialize)]
pub struct TokenizeResponse {
    count: usize,
    tokens: Vec<String>,
}

/// Tokenize arbitrary text.
pub async fn tokenize_text(Json(request): Json<TokenizeRequest>) -> Json<TokenizeResponse> {
    let tokens = tokenize(&request.text);
    Json(TokenizeResponse {
        count: tokens.len(),
        tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use crate::api::router;
    use crate::types::PipelineConfig;

    const BOUNDARY: &str = "docqueue-test-boundary";

    fn app() -> axum::Router {
        let config = PipelineConfig::default().with_yield_interval(Duration::ZERO);
        let pipeline = Pipeline::new(config).unwrap();
        router(Arc::new(AppState { pipeline }))
    }

    fn multipart_request(field: &str, content_type: &str, body: &str) -> Request<Body> {
        let payload = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {body}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(payload))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_upload_text() {
        let response = app()
            .oneshot(multipart_request("file", "text/plain", "Hello world. This is a test."))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["chunks"][0]["index"], 0);
        assert_eq!(json["chunks"][0]["total"], 1);
    }

    #[tokio::test]
    async fn test_upload_unsupported_type() {
        let response = app()
            .oneshot(multipart_request("file", "application/json", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "unsupported_type");
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let response = app()
            .oneshot(multipart_request("attachment", "text/plain", "Hi."))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "No file provided");
    }

    #[tokio::test]
    async fn test_progress_when_idle() {
        let response = app()
            .oneshot(Request::get("/documents/progress").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = json_body(response).await;
        assert_eq!(json["progress"], 100.0);
        assert_eq!(json["remaining"], 0);
        assert_eq!(json["draining"], false);
    }

    #[tokio::test]
    async fn test_tokenize_endpoint() {
        let request = Request::post("/tokenize")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text":"Hello, World!"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        let json = json_body(response).await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["tokens"], serde_json::json!(["hello", "world"]));
    }
}

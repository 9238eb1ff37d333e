use axum::{routing::post, Router};

use crate::features::ai::handlers::{self, AiState};

/// Create routes for the AI gateways
///
/// Note: These routes are public (no authentication required)
pub fn routes(state: AiState) -> Router {
    Router::new()
        .route("/api/ai/classify", post(handlers::classify_image))
        .route("/api/ai/transcribe", post(handlers::transcribe_audio))
        .route("/api/ai/verify-completion", post(handlers::verify_completion))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ai::clients::fake_model::FakeModel;
    use crate::features::ai::clients::GenerativeModel;
    use crate::features::ai::services::{
        ClassificationService, TranscriptionService, VerificationService,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn server(model: Option<Arc<dyn GenerativeModel>>) -> TestServer {
        let state = AiState {
            classification_service: Arc::new(ClassificationService::new(model.clone(), 0.1, 512)),
            verification_service: Arc::new(VerificationService::new(model.clone(), 0.2, 256)),
            transcription_service: Arc::new(TranscriptionService::new(model, 1024)),
        };
        TestServer::new(routes(state)).unwrap()
    }

    fn with_reply(text: &str) -> TestServer {
        server(Some(FakeModel::replying(text)))
    }

    #[tokio::test]
    async fn test_classify_ok() {
        let server = with_reply(
            r#"{"isWasteRelated": true, "topCategories": ["littering"], "confidence": 70, "description": "Wrappers on a footpath"}"#,
        );
        let response = server
            .post("/api/ai/classify")
            .json(&json!({ "imageBase64": "data:image/jpeg;base64,/9j/4AAQ" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["isWasteRelated"], true);
        assert_eq!(body["category"], "littering");
        assert_eq!(body["topCategories"], json!(["littering"]));
    }

    #[tokio::test]
    async fn test_classify_missing_image_is_400() {
        let response = with_reply("{}")
            .post("/api/ai/classify")
            .json(&json!({}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_classify_without_key_is_500_with_verdict() {
        let response = server(None)
            .post("/api/ai/classify")
            .json(&json!({ "imageBase64": "/9j/4AAQ" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["isWasteRelated"], false);
    }

    #[tokio::test]
    async fn test_classify_garbage_output_is_200_fail_open() {
        let response = with_reply("definitely true!!")
            .post("/api/ai/classify")
            .json(&json!({ "imageBase64": "/9j/4AAQ" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["isWasteRelated"], true);
        assert_eq!(body["confidence"], 0);
    }

    #[tokio::test]
    async fn test_verify_missing_proof_is_400_with_verdict() {
        let response = with_reply(r#"{"isResolved": true, "reason": "clean"}"#)
            .post("/api/ai/verify-completion")
            .json(&json!({ "originalImage": "QkVGT1JF" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["isResolved"], false);
        assert!(body["message"].as_str().unwrap().contains("proof photo"));
    }

    #[tokio::test]
    async fn test_verify_garbage_output_fails_closed() {
        let response = with_reply("isResolved: true")
            .post("/api/ai/verify-completion")
            .json(&json!({ "originalImage": "QkVGT1JF", "proofImage": "QUZURVI=" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["isResolved"], false);
    }

    #[tokio::test]
    async fn test_transcribe_never_errors() {
        let response = server(None)
            .post("/api/ai/transcribe")
            .json(&json!({ "audioBase64": "GkXf" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({ "transcript": "", "success": false }));
    }
}

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::core::middleware::bridge_cors_layer;
use crate::features::reports::handlers::{self, ReportState};

/// Cross-app report feed and submission, readable from any origin
///
/// Kept separate so the caller can mount it outside the global CORS layer.
pub fn bridge_routes(state: ReportState) -> Router {
    Router::new()
        .route(
            "/api/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .with_state(state)
        .layer(bridge_cors_layer())
}

/// Public report routes (citizen app)
pub fn public_routes(state: ReportState) -> Router {
    Router::new()
        .route("/api/reports/{id}", get(handlers::get_report))
        .route("/api/reports/{id}/images", post(handlers::upload_report_image))
        .with_state(state)
}

/// Staff report routes (require session authentication)
pub fn protected_routes(state: ReportState) -> Router {
    Router::new()
        .route(
            "/api/reports/{id}/status",
            patch(handlers::update_report_status),
        )
        .route("/api/reports/{id}/assign", post(handlers::assign_report))
        .route("/api/reports/{id}/resolve", post(handlers::resolve_report))
        .route("/api/workers/me/tasks", get(handlers::list_my_tasks))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GeocodingConfig;
    use crate::features::ai::{ClassificationService, VerificationService};
    use crate::features::geocoding::GeocodingService;
    use crate::features::reports::services::{ReportImageService, ReportService};
    use crate::features::workers::WorkerService;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::{with_authority_auth, with_worker_auth};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::PgPool;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> ReportState {
        state_with(PgPool::connect_lazy("postgres://localhost/wastewise_test").unwrap())
    }

    fn state_with(pool: PgPool) -> ReportState {
        let geocoding = GeocodingService::new(&GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "wastewise-test".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let image_service = Arc::new(ReportImageService::new(
            pool.clone(),
            Arc::new(ClassificationService::new(None, 0.1, 512)),
            Arc::new(MemoryStore::default()),
        ));
        let report_service = Arc::new(ReportService::new(
            pool.clone(),
            Arc::new(geocoding),
            Arc::new(WorkerService::new(pool)),
            Arc::clone(&image_service),
            Arc::new(VerificationService::new(None, 0.2, 512)),
        ));
        ReportState {
            report_service,
            image_service,
        }
    }

    #[tokio::test]
    async fn test_status_update_requires_session() {
        let server = TestServer::new(protected_routes(state())).unwrap();
        server
            .patch("/api/reports/RPT-2025-000001/status")
            .json(&json!({ "status": "under_review" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_assign_is_authority_only() {
        let server = TestServer::new(with_worker_auth(protected_routes(state()))).unwrap();
        server
            .post("/api/reports/RPT-2025-000001/assign")
            .json(&json!({ "workerId": uuid::Uuid::now_v7() }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_resolve_is_worker_only() {
        let server = TestServer::new(with_authority_auth(protected_routes(state()))).unwrap();
        server
            .post("/api/reports/RPT-2025-000001/resolve")
            .json(&json!({ "proofImage": "data:image/jpeg;base64,/9j/4AAQ" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_tasks_are_worker_only() {
        let server = TestServer::new(with_authority_auth(protected_routes(state()))).unwrap();
        server
            .get("/api/workers/me/tasks")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_get_report_rejects_malformed_identifier() {
        let server = TestServer::new(public_routes(state())).unwrap();
        server
            .get("/api/reports/not-a-report")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_classifier_only_category() {
        let server = TestServer::new(bridge_routes(state())).unwrap();
        let response = server
            .post("/api/reports")
            .json(&json!({
                "description": "Smoke from burning garbage",
                "category": "open_burning",
                "latitude": 12.97,
                "longitude": 77.59
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(
            body["errors"][0],
            "category: cannot be chosen when submitting a report"
        );
    }

    #[sqlx::test]
    async fn test_bridge_feed_is_not_enveloped(pool: PgPool) {
        let server = TestServer::new(bridge_routes(state_with(pool))).unwrap();
        server
            .post("/api/reports")
            .json(&json!({
                "description": "Garbage heap behind the bus stop",
                "category": "illegal_dumping",
                "latitude": 12.97,
                "longitude": 77.59,
                "address": "Bus stand, MG Road",
                "locality": "Shivajinagar",
                "city": "Bengaluru"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/reports").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert!(body.get("success").is_none());
        assert_eq!(body["reports"].as_array().unwrap().len(), 1);
        assert_eq!(body["reports"][0]["status"], "submitted");
        assert_eq!(body["stats"]["total"], 1);
        assert_eq!(body["stats"]["submitted"], 1);
        assert_eq!(body["total"], 1);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_bridge_allows_any_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/reports")
            .header("Origin", "https://worker.example.org")
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type")
            .body(Body::empty())
            .unwrap();

        let response = bridge_routes(state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}

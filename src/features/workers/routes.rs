use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::workers::handlers;
use crate::features::workers::services::WorkerService;

/// Public worker routes (no authentication required)
pub fn public_routes(service: Arc<WorkerService>) -> Router {
    Router::new()
        .route("/api/workers/register", post(handlers::register_worker))
        .with_state(service)
}

/// Protected worker routes (require auth middleware to be applied by caller)
pub fn protected_routes(service: Arc<WorkerService>) -> Router {
    Router::new()
        .route("/api/workers", get(handlers::list_workers))
        .route("/api/workers/{id}/approve", post(handlers::approve_worker))
        .route("/api/workers/{id}/reject", post(handlers::reject_worker))
        .with_state(service)
}

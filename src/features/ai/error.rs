use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::core::error::AppError;

/// Gateway failures that are reported to the caller instead of being
/// absorbed by the fail-open or fail-closed policy
#[derive(Debug, Error)]
pub enum GatewayError<V> {
    /// No model credential configured. The verdict is returned with HTTP 500.
    #[error("Generative model is not configured")]
    Misconfigured(V),

    /// A required payload is absent. Returned with HTTP 400, carrying a
    /// verdict when the gateway defines one for this case.
    #[error("{message}")]
    MissingInput { message: String, verdict: Option<V> },
}

impl<V> GatewayError<V> {
    pub fn missing(message: &str) -> Self {
        GatewayError::MissingInput {
            message: message.to_string(),
            verdict: None,
        }
    }
}

impl<V: Serialize> IntoResponse for GatewayError<V> {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Misconfigured(verdict) => {
                tracing::error!("Generative model API key is not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(verdict)).into_response()
            }
            GatewayError::MissingInput {
                verdict: Some(verdict),
                ..
            } => (StatusCode::BAD_REQUEST, Json(verdict)).into_response(),
            GatewayError::MissingInput {
                message,
                verdict: None,
            } => AppError::BadRequest(message).into_response(),
        }
    }
}

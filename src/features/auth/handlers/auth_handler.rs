use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{LoginRequestDto, LoginResponseDto};
use crate::features::auth::guards::RequireStaff;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::SessionService;
use crate::shared::types::ApiResponse;

/// Login as authority or approved worker
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Worker not approved")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<SessionService>>,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<LoginResponseDto>>> {
    dto.validate()?;

    let response = service.login(&dto).await?;
    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// Revoke the current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session revoked"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<SessionService>>,
) -> Result<Json<ApiResponse<()>>> {
    service.logout(&user).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Logged out".to_string()),
        None,
    )))
}

/// Get the current session context
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current session", body = ApiResponse<AuthenticatedUser>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_me(RequireStaff(user): RequireStaff) -> Json<ApiResponse<AuthenticatedUser>> {
    Json(ApiResponse::success(Some(user), None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::with_worker_auth;
    use axum::{http::StatusCode, routing::get, Router};
    use axum_test::TestServer;
    use serde_json::Value;

    #[tokio::test]
    async fn test_me_requires_session() {
        let server = TestServer::new(Router::new().route("/api/auth/me", get(get_me))).unwrap();
        server
            .get("/api/auth/me")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_returns_session_context() {
        let router = with_worker_auth(Router::new().route("/api/auth/me", get(get_me)));
        let server = TestServer::new(router).unwrap();

        let response = server.get("/api/auth/me").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["role"], "worker");
        assert_eq!(body["data"]["displayName"], "Test Worker");
    }
}

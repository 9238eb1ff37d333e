//! Role-based authorization guards for the application.
//!
//! These guards extract the [`AuthenticatedUser`] placed in the request
//! extensions by the auth middleware and check its role.
//!
//! - authority: municipal staff, reviews and assigns reports, approves workers
//! - worker: field staff, works on reports assigned to them

use crate::core::error::AppError;
use crate::features::auth::model::{AuthenticatedUser, Role};
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

fn session_user(parts: &Parts) -> Result<&AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Guard for authority-only endpoints.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAuthority(user): RequireAuthority) { ... }
/// ```
pub struct RequireAuthority(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAuthority
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)?;

        if user.role != Role::Authority {
            return Err(AppError::Forbidden("Authority access required".to_string()));
        }

        Ok(RequireAuthority(user.clone()))
    }
}

/// Guard for worker-only endpoints. Carries the worker's id.
pub struct RequireWorker {
    pub user: AuthenticatedUser,
    pub worker_id: Uuid,
}

impl<S> FromRequestParts<S> for RequireWorker
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)?;

        let worker_id = user
            .worker_id()
            .ok_or_else(|| AppError::Forbidden("Worker access required".to_string()))?;

        Ok(RequireWorker {
            user: user.clone(),
            worker_id,
        })
    }
}

/// Guard for endpoints open to any staff session (authority or worker).
pub struct RequireStaff(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequireStaff(session_user(parts)?.clone()))
    }
}

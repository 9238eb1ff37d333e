use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::RequireAuthority;
use crate::features::auth::password::hash_password;
use crate::features::workers::dtos::{
    RegisterWorkerDto, RejectWorkerDto, WorkerQueryParams, WorkerResponseDto,
};
use crate::features::workers::models::{CreateWorker, ReviewDecision};
use crate::features::workers::services::WorkerService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Register as a field worker
#[utoipa::path(
    post,
    path = "/api/workers/register",
    request_body = RegisterWorkerDto,
    responses(
        (status = 201, description = "Registration received, pending approval", body = ApiResponse<WorkerResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "workers"
)]
pub async fn register_worker(
    State(service): State<Arc<WorkerService>>,
    AppJson(dto): AppJson<RegisterWorkerDto>,
) -> Result<(StatusCode, Json<ApiResponse<WorkerResponseDto>>)> {
    dto.validate()?;

    let password_hash = hash_password(&dto.password).map_err(|e| {
        tracing::error!("Failed to hash worker password: {}", e);
        AppError::Internal("Failed to hash password".to_string())
    })?;

    let worker = service
        .register(&CreateWorker {
            name: dto.name.trim().to_string(),
            email: dto.email.trim().to_string(),
            phone: dto.phone,
            zone: dto.zone.trim().to_string(),
            department_id: dto.department_id,
            department_name: dto.department_name,
            password_hash,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(worker.into()),
            Some("Registration received. An authority will review it shortly.".to_string()),
            None,
        )),
    ))
}

/// List workers (authority only)
#[utoipa::path(
    get,
    path = "/api/workers",
    params(WorkerQueryParams, PaginationQuery),
    responses(
        (status = 200, description = "Workers", body = ApiResponse<Vec<WorkerResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Authority access required")
    ),
    security(("bearer_auth" = [])),
    tag = "workers"
)]
pub async fn list_workers(
    RequireAuthority(_user): RequireAuthority,
    State(service): State<Arc<WorkerService>>,
    AppQuery(params): AppQuery<WorkerQueryParams>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<WorkerResponseDto>>>> {
    let (workers, total) = service
        .list(params.status, pagination.offset(), pagination.limit())
        .await?;
    let dtos: Vec<WorkerResponseDto> = workers.into_iter().map(|w| w.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Approve a pending registration (authority only)
#[utoipa::path(
    post,
    path = "/api/workers/{id}/approve",
    params(("id" = Uuid, Path, description = "Worker ID")),
    responses(
        (status = 200, description = "Worker approved", body = ApiResponse<WorkerResponseDto>),
        (status = 403, description = "Authority access required"),
        (status = 404, description = "Worker not found"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "workers"
)]
pub async fn approve_worker(
    RequireAuthority(user): RequireAuthority,
    State(service): State<Arc<WorkerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkerResponseDto>>> {
    let worker = service
        .review(id, ReviewDecision::Approve, &user.subject_id, None)
        .await?;
    Ok(Json(ApiResponse::success(Some(worker.into()), None, None)))
}

/// Reject a pending registration (authority only)
#[utoipa::path(
    post,
    path = "/api/workers/{id}/reject",
    params(("id" = Uuid, Path, description = "Worker ID")),
    request_body = RejectWorkerDto,
    responses(
        (status = 200, description = "Worker rejected", body = ApiResponse<WorkerResponseDto>),
        (status = 403, description = "Authority access required"),
        (status = 404, description = "Worker not found"),
        (status = 409, description = "Already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "workers"
)]
pub async fn reject_worker(
    RequireAuthority(user): RequireAuthority,
    State(service): State<Arc<WorkerService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<RejectWorkerDto>,
) -> Result<Json<ApiResponse<WorkerResponseDto>>> {
    dto.validate()?;

    let reason = dto.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let worker = service
        .review(id, ReviewDecision::Reject, &user.subject_id, reason)
        .await?;
    Ok(Json(ApiResponse::success(Some(worker.into()), None, None)))
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{RequireAuthority, RequireStaff, RequireWorker};
use crate::features::reports::dtos::{
    AssignReportDto, CreateReportDto, ReportDetailResponseDto, ReportFeedDto,
    ReportImageResponseDto, ReportQueryParams, ReportResponseDto, ResolveReportDto,
    ResolveReportResponseDto, UpdateReportStatusDto, UploadReportImageDto,
    UploadReportImageResponseDto,
};
use crate::features::reports::lifecycle::Actor;
use crate::features::reports::models::CreateReport;
use crate::features::reports::reference::ReportKey;
use crate::features::reports::services::{ReportImageService, ReportService};
use crate::features::reports::sla;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// State for report handlers
#[derive(Clone)]
pub struct ReportState {
    pub report_service: Arc<ReportService>,
    pub image_service: Arc<ReportImageService>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Report feed shared by the three portals
///
/// Served bare rather than in the envelope: the portals read `reports`,
/// `stats` and `timestamp` at the top level.
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQueryParams, PaginationQuery),
    responses(
        (status = 200, description = "Reports with dashboard counters", body = ReportFeedDto)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<ReportState>,
    AppQuery(params): AppQuery<ReportQueryParams>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ReportFeedDto>> {
    let (reports, total) = state
        .report_service
        .list(params.status, pagination.offset(), pagination.limit())
        .await?;
    let stats = state.report_service.stats().await?;

    let now = Utc::now();
    let feed = ReportFeedDto {
        reports: reports
            .into_iter()
            .map(|r| ReportResponseDto::at(r, now))
            .collect(),
        stats: stats.into(),
        total,
        timestamp: now,
    };

    Ok(Json(feed))
}

/// Submit a new report
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report created", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "reports"
)]
pub async fn create_report(
    State(state): State<ReportState>,
    AppJson(dto): AppJson<CreateReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    dto.validate_submission()?;

    let severity = dto.severity.unwrap_or_default();
    let report = state
        .report_service
        .create(CreateReport {
            description: dto.description.trim().to_string(),
            category: dto.category,
            severity,
            latitude: dto.latitude,
            longitude: dto.longitude,
            address: non_blank(dto.address),
            locality: non_blank(dto.locality),
            city: non_blank(dto.city),
            reporter_name: non_blank(dto.reporter_name),
            citizen_id: non_blank(dto.citizen_id),
            sla_hours: dto.sla_hours.unwrap_or_else(|| sla::default_hours(severity)),
        })
        .await?;

    let message = format!("Report {} submitted", report.report_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(report.into()), Some(message), None)),
    ))
}

/// Get a report with its photos
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(("id" = String, Path, description = "Report UUID or report ID (RPT-2025-000001)")),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportDetailResponseDto>),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn get_report(
    State(state): State<ReportState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ReportDetailResponseDto>>> {
    let key = ReportKey::parse(&id)?;
    let (report, images) = state.report_service.get_detail(&key).await?;

    let dto = ReportDetailResponseDto {
        report: report.into(),
        images: images.into_iter().map(ReportImageResponseDto::from).collect(),
    };

    Ok(Json(ApiResponse::success(Some(dto), None, None)))
}

/// Attach an evidence photo to a report
///
/// The photo is classified first; photos that do not show a waste problem
/// are refused with the classifier's reason.
#[utoipa::path(
    post,
    path = "/api/reports/{id}/images",
    params(("id" = String, Path, description = "Report UUID or report ID")),
    request_body = UploadReportImageDto,
    responses(
        (status = 201, description = "Photo stored", body = ApiResponse<UploadReportImageResponseDto>),
        (status = 400, description = "Missing or malformed image"),
        (status = 404, description = "Report not found"),
        (status = 422, description = "Photo is not waste related")
    ),
    tag = "reports"
)]
pub async fn upload_report_image(
    State(state): State<ReportState>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UploadReportImageDto>,
) -> Result<(StatusCode, Json<ApiResponse<UploadReportImageResponseDto>>)> {
    dto.validate()?;

    let key = ReportKey::parse(&id)?;
    let report = state.report_service.get(&key).await?;
    let (image, classification) = state
        .image_service
        .add_evidence(report.id, &dto.image_base64)
        .await?;

    let response = UploadReportImageResponseDto {
        image: image.into(),
        classification,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(response), None, None)),
    ))
}

/// Change a report's status
///
/// Authorities review, reject and close; the assigned worker starts work.
/// Assignment and resolution have their own endpoints.
#[utoipa::path(
    patch,
    path = "/api/reports/{id}/status",
    params(("id" = String, Path, description = "Report UUID or report ID")),
    request_body = UpdateReportStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ReportResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not permitted for this actor"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Illegal transition or concurrent update"),
        (status = 422, description = "Use the dedicated operation, or a reason is missing")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn update_report_status(
    RequireStaff(user): RequireStaff,
    State(state): State<ReportState>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdateReportStatusDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    dto.validate()?;

    let key = ReportKey::parse(&id)?;
    let report = state
        .report_service
        .transition(
            &key,
            dto.status,
            Actor::from(user.role),
            user.worker_id(),
            dto.reason.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Assign an approved worker (authority only)
#[utoipa::path(
    post,
    path = "/api/reports/{id}/assign",
    params(("id" = String, Path, description = "Report UUID or report ID")),
    request_body = AssignReportDto,
    responses(
        (status = 200, description = "Report assigned", body = ApiResponse<ReportResponseDto>),
        (status = 403, description = "Authority access required"),
        (status = 404, description = "Report or worker not found"),
        (status = 409, description = "Report is not under review"),
        (status = 422, description = "Worker is not approved")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn assign_report(
    RequireAuthority(_user): RequireAuthority,
    State(state): State<ReportState>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<AssignReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    dto.validate()?;

    let key = ReportKey::parse(&id)?;
    let report = state
        .report_service
        .assign(
            &key,
            dto.worker_id,
            non_blank(dto.department_id),
            non_blank(dto.department_name),
        )
        .await?;

    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Resolve a report with proof of cleanup (assigned worker only)
///
/// Returns 200 either way; `verification.isResolved` says whether the
/// report moved to `resolved`.
#[utoipa::path(
    post,
    path = "/api/reports/{id}/resolve",
    params(("id" = String, Path, description = "Report UUID or report ID")),
    request_body = ResolveReportDto,
    responses(
        (status = 200, description = "Verification outcome", body = ApiResponse<ResolveReportResponseDto>),
        (status = 400, description = "Missing or malformed proof photo"),
        (status = 403, description = "Report is not assigned to this worker"),
        (status = 409, description = "Report is not in progress")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn resolve_report(
    RequireWorker { worker_id, .. }: RequireWorker,
    State(state): State<ReportState>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<ResolveReportDto>,
) -> Result<Json<ApiResponse<ResolveReportResponseDto>>> {
    dto.validate()?;

    let key = ReportKey::parse(&id)?;
    let resolution = state
        .report_service
        .resolve(
            &key,
            worker_id,
            dto.proof_image.as_deref(),
            dto.original_image.as_deref(),
            dto.notes.as_deref(),
        )
        .await?;

    let message = resolution.verification.message.clone();
    let response = ResolveReportResponseDto {
        verification: resolution.verification,
        report: resolution.report.map(ReportResponseDto::from),
    };

    Ok(Json(ApiResponse::success(
        Some(response),
        Some(message),
        None,
    )))
}

/// Reports assigned to the calling worker
#[utoipa::path(
    get,
    path = "/api/workers/me/tasks",
    params(ReportQueryParams, PaginationQuery),
    responses(
        (status = 200, description = "Assigned reports, most urgent first", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 403, description = "Worker access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_my_tasks(
    RequireWorker { worker_id, .. }: RequireWorker,
    State(state): State<ReportState>,
    AppQuery(params): AppQuery<ReportQueryParams>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = state
        .report_service
        .list_for_worker(
            worker_id,
            params.status,
            pagination.offset(),
            pagination.limit(),
        )
        .await?;

    let now = Utc::now();
    let dtos: Vec<ReportResponseDto> = reports
        .into_iter()
        .map(|r| ReportResponseDto::at(r, now))
        .collect();

    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

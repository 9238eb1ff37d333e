use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::ai::{dtos as ai_dtos, handlers as ai_handlers, models as ai_models};
use crate::features::auth::{dtos as auth_dtos, handlers as auth_handlers, model as auth_model};
use crate::features::geocoding::{dtos as geocoding_dtos, handlers as geocoding_handlers};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::features::workers::{
    dtos as workers_dtos, handlers as workers_handlers, models as workers_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // AI gateways (public)
        ai_handlers::classify_image,
        ai_handlers::transcribe_audio,
        ai_handlers::verify_completion,
        // Reports
        reports_handlers::list_reports,
        reports_handlers::create_report,
        reports_handlers::get_report,
        reports_handlers::upload_report_image,
        reports_handlers::update_report_status,
        reports_handlers::assign_report,
        reports_handlers::resolve_report,
        reports_handlers::list_my_tasks,
        // Workers
        workers_handlers::register_worker,
        workers_handlers::list_workers,
        workers_handlers::approve_worker,
        workers_handlers::reject_worker,
        // Auth
        auth_handlers::login,
        auth_handlers::logout,
        auth_handlers::get_me,
        // Geocoding (public)
        geocoding_handlers::reverse_geocode,
    ),
    components(
        schemas(
            Meta,
            // AI
            ai_dtos::ClassifyImageDto,
            ai_dtos::TranscribeAudioDto,
            ai_dtos::VerifyCompletionDto,
            ai_models::ClassificationVerdict,
            ai_models::VerificationVerdict,
            ai_models::VerificationConfidence,
            ai_models::TranscriptionResult,
            // Reports
            reports_models::ReportStatus,
            reports_models::ReportSeverity,
            reports_models::WasteCategory,
            reports_models::ReportImageKind,
            reports_models::ImageAnalysis,
            reports_dtos::CreateReportDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::ReportStatsDto,
            reports_dtos::ReportFeedDto,
            reports_dtos::ReportImageResponseDto,
            reports_dtos::ReportDetailResponseDto,
            reports_dtos::UploadReportImageDto,
            reports_dtos::UploadReportImageResponseDto,
            reports_dtos::UpdateReportStatusDto,
            reports_dtos::AssignReportDto,
            reports_dtos::ResolveReportDto,
            reports_dtos::ResolveReportResponseDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            ApiResponse<reports_dtos::ReportDetailResponseDto>,
            ApiResponse<reports_dtos::UploadReportImageResponseDto>,
            ApiResponse<reports_dtos::ResolveReportResponseDto>,
            // Workers
            workers_models::WorkerStatus,
            workers_dtos::RegisterWorkerDto,
            workers_dtos::RejectWorkerDto,
            workers_dtos::WorkerResponseDto,
            ApiResponse<workers_dtos::WorkerResponseDto>,
            ApiResponse<Vec<workers_dtos::WorkerResponseDto>>,
            // Auth
            auth_model::Role,
            auth_model::AuthenticatedUser,
            auth_dtos::LoginRequestDto,
            auth_dtos::LoginResponseDto,
            ApiResponse<auth_dtos::LoginResponseDto>,
            ApiResponse<auth_model::AuthenticatedUser>,
            // Geocoding
            geocoding_dtos::ReverseGeocodeDto,
            geocoding_dtos::PlaceAddressDto,
        )
    ),
    tags(
        (name = "ai", description = "Image classification, completion verification and transcription"),
        (name = "reports", description = "Waste reports and their lifecycle"),
        (name = "workers", description = "Field-worker registration and approval"),
        (name = "auth", description = "Staff sessions for authorities and workers"),
        (name = "geocoding", description = "Reverse geocoding proxy"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "WasteWise API",
        version = "0.1.0",
        description = "API documentation for the WasteWise civic waste-reporting platform",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

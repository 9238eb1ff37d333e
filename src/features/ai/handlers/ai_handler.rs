use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::extractor::AppJson;
use crate::features::ai::dtos::{ClassifyImageDto, TranscribeAudioDto, VerifyCompletionDto};
use crate::features::ai::error::GatewayError;
use crate::features::ai::models::{
    ClassificationVerdict, TranscriptionResult, VerificationVerdict,
};
use crate::features::ai::services::{
    ClassificationService, TranscriptionService, VerificationRequest, VerificationService,
};

/// State for AI gateway handlers
#[derive(Clone)]
pub struct AiState {
    pub classification_service: Arc<ClassificationService>,
    pub verification_service: Arc<VerificationService>,
    pub transcription_service: Arc<TranscriptionService>,
}

/// Classify a photo for a new report
///
/// Never blocks the citizen: upstream failures return a permissive verdict
/// with zero confidence.
#[utoipa::path(
    post,
    path = "/api/ai/classify",
    request_body = ClassifyImageDto,
    responses(
        (status = 200, description = "Classification verdict", body = ClassificationVerdict),
        (status = 400, description = "Missing image"),
        (status = 500, description = "Model not configured", body = ClassificationVerdict)
    ),
    tag = "ai"
)]
pub async fn classify_image(
    State(state): State<AiState>,
    AppJson(dto): AppJson<ClassifyImageDto>,
) -> Result<Json<ClassificationVerdict>, GatewayError<ClassificationVerdict>> {
    let verdict = state
        .classification_service
        .classify(dto.image_base64.as_deref())
        .await?;
    Ok(Json(verdict))
}

/// Transcribe a voice note into text
#[utoipa::path(
    post,
    path = "/api/ai/transcribe",
    request_body = TranscribeAudioDto,
    responses(
        (status = 200, description = "Transcript, empty on failure", body = TranscriptionResult)
    ),
    tag = "ai"
)]
pub async fn transcribe_audio(
    State(state): State<AiState>,
    AppJson(dto): AppJson<TranscribeAudioDto>,
) -> Json<TranscriptionResult> {
    Json(
        state
            .transcription_service
            .transcribe(dto.audio_base64.as_deref())
            .await,
    )
}

/// Check a worker's proof photo against the original report
#[utoipa::path(
    post,
    path = "/api/ai/verify-completion",
    request_body = VerifyCompletionDto,
    responses(
        (status = 200, description = "Verification verdict", body = VerificationVerdict),
        (status = 400, description = "Missing proof image", body = VerificationVerdict),
        (status = 500, description = "Model not configured", body = VerificationVerdict)
    ),
    tag = "ai"
)]
pub async fn verify_completion(
    State(state): State<AiState>,
    AppJson(dto): AppJson<VerifyCompletionDto>,
) -> Result<Json<VerificationVerdict>, GatewayError<VerificationVerdict>> {
    let verdict = state
        .verification_service
        .verify(VerificationRequest {
            proof_image: dto.proof_image.as_deref(),
            original_image: dto.original_image.as_deref(),
            category: dto.category.as_deref(),
            description: dto.description.as_deref(),
        })
        .await?;
    Ok(Json(verdict))
}

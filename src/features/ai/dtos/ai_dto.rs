use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request DTO for image classification
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyImageDto {
    /// Base64 image, optionally as a `data:image/...;base64,` URL
    pub image_base64: Option<String>,
}

/// Request DTO for voice-note transcription
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeAudioDto {
    /// Base64 audio, optionally as a `data:audio/...;base64,` URL
    pub audio_base64: Option<String>,
}

/// Request DTO for completion verification
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCompletionDto {
    /// The citizen's photo of the issue
    pub original_image: Option<String>,
    /// The worker's photo after cleanup
    pub proof_image: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

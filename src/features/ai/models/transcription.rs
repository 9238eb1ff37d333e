use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of transcribing a voice note. Never an error for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TranscriptionResult {
    pub transcript: String,
    pub success: bool,
}

impl TranscriptionResult {
    pub fn ok(transcript: String) -> Self {
        Self {
            transcript,
            success: true,
        }
    }

    pub fn failed() -> Self {
        Self {
            transcript: String::new(),
            success: false,
        }
    }
}

use std::sync::Arc;

use crate::features::ai::clients::{GenerationRequest, GenerativeModel, InlineMedia};
use crate::features::ai::models::TranscriptionResult;
use crate::shared::constants::DEFAULT_AUDIO_MIME;
use crate::shared::media;
use crate::shared::prompts::render_transcription_prompt;

/// Voice-note transcription for report descriptions
///
/// Best effort: every failure is an empty, unsuccessful transcript.
pub struct TranscriptionService {
    model: Option<Arc<dyn GenerativeModel>>,
    max_output_tokens: u32,
}

impl TranscriptionService {
    pub fn new(model: Option<Arc<dyn GenerativeModel>>, max_output_tokens: u32) -> Self {
        Self {
            model,
            max_output_tokens,
        }
    }

    pub async fn transcribe(&self, audio_base64: Option<&str>) -> TranscriptionResult {
        let Some(model) = &self.model else {
            tracing::warn!("Transcription requested but the generative model is not configured");
            return TranscriptionResult::failed();
        };

        let Some(audio) =
            audio_base64.and_then(|raw| media::normalize(raw, DEFAULT_AUDIO_MIME).ok())
        else {
            return TranscriptionResult::failed();
        };

        let prompt = match render_transcription_prompt() {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Failed to render transcription prompt: {}", e);
                return TranscriptionResult::failed();
            }
        };

        let request = GenerationRequest {
            prompt,
            media: vec![InlineMedia {
                mime_type: audio.mime_type,
                data: audio.data.to_string(),
            }],
            temperature: 0.0,
            max_output_tokens: self.max_output_tokens,
        };

        match model.generate(request).await {
            Ok(Some(text)) => TranscriptionResult::ok(text.trim().to_string()),
            Ok(None) => TranscriptionResult::failed(),
            Err(e) => {
                tracing::warn!("Transcription failed: {}", e);
                TranscriptionResult::failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ai::clients::fake_model::FakeModel;
    use crate::features::ai::clients::ModelError;

    #[tokio::test]
    async fn test_transcribes_audio() {
        let model = FakeModel::replying("  Garbage has been piling up near the market.\n");
        let service = TranscriptionService::new(Some(model.clone()), 1024);

        let result = service
            .transcribe(Some("data:audio/webm;codecs=opus;base64,GkXfo59C"))
            .await;

        assert_eq!(
            result,
            TranscriptionResult::ok("Garbage has been piling up near the market.".to_string())
        );
        assert_eq!(model.last_request().unwrap().media[0].mime_type, "audio/webm");
    }

    #[tokio::test]
    async fn test_failures_are_empty_transcripts() {
        let unconfigured = TranscriptionService::new(None, 1024);
        assert_eq!(
            unconfigured.transcribe(Some("GkXf")).await,
            TranscriptionResult::failed()
        );

        let model = FakeModel::replying("text");
        let service = TranscriptionService::new(Some(model.clone()), 1024);
        assert_eq!(service.transcribe(None).await, TranscriptionResult::failed());
        assert_eq!(model.calls(), 0);

        let failing = TranscriptionService::new(
            Some(FakeModel::failing(ModelError::Transport("reset".into()))),
            1024,
        );
        assert_eq!(
            failing.transcribe(Some("GkXf")).await,
            TranscriptionResult::failed()
        );

        let empty = TranscriptionService::new(Some(FakeModel::empty()), 1024);
        assert_eq!(empty.transcribe(Some("GkXf")).await, TranscriptionResult::failed());
    }
}

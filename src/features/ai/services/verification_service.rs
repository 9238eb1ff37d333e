use std::sync::Arc;

use crate::features::ai::clients::{GenerationRequest, GenerativeModel, InlineMedia};
use crate::features::ai::error::GatewayError;
use crate::features::ai::models::{VerificationOutput, VerificationVerdict};
use crate::shared::constants::DEFAULT_IMAGE_MIME;
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::media::{self, MediaError};
use crate::shared::prompts::render_verification_prompt;

/// Input for a completion check
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationRequest<'a> {
    pub proof_image: Option<&'a str>,
    pub original_image: Option<&'a str>,
    pub category: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Completion verification gateway
///
/// Fails CLOSED: anything short of a parsed `isResolved: true` from the
/// model is reported as not resolved.
pub struct VerificationService {
    model: Option<Arc<dyn GenerativeModel>>,
    temperature: f32,
    max_output_tokens: u32,
}

impl VerificationService {
    pub fn new(
        model: Option<Arc<dyn GenerativeModel>>,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            model,
            temperature,
            max_output_tokens,
        }
    }

    pub async fn verify(
        &self,
        request: VerificationRequest<'_>,
    ) -> Result<VerificationVerdict, GatewayError<VerificationVerdict>> {
        let proof = request
            .proof_image
            .map_or(Err(MediaError::Empty), |raw| {
                media::normalize(raw, DEFAULT_IMAGE_MIME)
            })
            .map_err(|e| GatewayError::MissingInput {
                message: e.for_field("proofImage"),
                verdict: Some(VerificationVerdict::missing_proof()),
            })?;

        let Some(model) = &self.model else {
            return Err(GatewayError::Misconfigured(
                VerificationVerdict::misconfigured(),
            ));
        };

        let original = match request.original_image {
            Some(raw) => match media::normalize(raw, DEFAULT_IMAGE_MIME) {
                Ok(original) => Some(original),
                Err(MediaError::Empty) => None,
                Err(e) => return Err(GatewayError::missing(&e.for_field("originalImage"))),
            },
            None => None,
        };

        if original.as_ref().is_some_and(|o| o.data == proof.data) {
            tracing::info!("Proof photo is identical to the original, rejecting");
            return Ok(VerificationVerdict::identical_images());
        }

        let category = request.category.map(str::trim).filter(|c| !c.is_empty());
        let description = request.description.map(str::trim).filter(|d| !d.is_empty());

        let prompt = match render_verification_prompt(
            category,
            description,
            original.is_some(),
            &VerificationOutput::json_schema_string(),
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Failed to render verification prompt: {}", e);
                return Ok(VerificationVerdict::unavailable());
            }
        };

        // Before photo first, matching the prompt
        let mut images = Vec::with_capacity(2);
        if let Some(original) = original {
            images.push(InlineMedia {
                mime_type: original.mime_type,
                data: original.data.to_string(),
            });
        }
        images.push(InlineMedia {
            mime_type: proof.mime_type,
            data: proof.data.to_string(),
        });

        let generation = GenerationRequest {
            prompt,
            media: images,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        };

        let verdict = match model.generate(generation).await {
            Ok(Some(text)) => {
                let output = parse_with_fallback::<VerificationOutput>(&text);
                if output.is_success() {
                    VerificationVerdict::from_output(output)
                } else {
                    VerificationVerdict::unavailable()
                }
            }
            Ok(None) => {
                tracing::warn!("Verifier returned no candidate text");
                VerificationVerdict::unavailable()
            }
            Err(e) => {
                tracing::warn!("Verification failed, failing closed: {}", e);
                VerificationVerdict::unavailable()
            }
        };

        Ok(verdict)
    }
}

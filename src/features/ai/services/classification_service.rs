use std::sync::Arc;

use crate::features::ai::clients::{GenerationRequest, GenerativeModel, InlineMedia, ModelError};
use crate::features::ai::error::GatewayError;
use crate::features::ai::models::{ClassificationOutput, ClassificationVerdict};
use crate::features::reports::models::{ReportSeverity, WasteCategory};
use crate::shared::constants::DEFAULT_IMAGE_MIME;
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::media::{self, MediaError};
use crate::shared::prompts::render_classification_prompt;

/// Image classification gateway
///
/// Fails OPEN: apart from a missing API key, a missing image, or a rejected
/// API key, every failure yields [`ClassificationVerdict::fail_open`] so a
/// citizen is never blocked from submitting a report.
pub struct ClassificationService {
    model: Option<Arc<dyn GenerativeModel>>,
    temperature: f32,
    max_output_tokens: u32,
}

impl ClassificationService {
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

    pub async fn classify(
        &self,
        image_base64: Option<&str>,
    ) -> Result<ClassificationVerdict, GatewayError<ClassificationVerdict>> {
        let Some(model) = &self.model else {
            return Err(GatewayError::Misconfigured(
                ClassificationVerdict::misconfigured(),
            ));
        };

        let image = image_base64
            .map_or(Err(MediaError::Empty), |raw| {
                media::normalize(raw, DEFAULT_IMAGE_MIME)
            })
            .map_err(|e| {
                GatewayError::<ClassificationVerdict>::missing(&e.for_field("imageBase64"))
            })?;

        let prompt = match build_prompt() {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Failed to render classification prompt: {}", e);
                return Ok(ClassificationVerdict::fail_open());
            }
        };

        let request = GenerationRequest {
            prompt,
            media: vec![InlineMedia {
                mime_type: image.mime_type,
                data: image.data.to_string(),
            }],
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        };

        let verdict = match model.generate(request).await {
            Ok(Some(text)) => {
                let output = parse_with_fallback::<ClassificationOutput>(&text);
                if output.is_success() {
                    ClassificationVerdict::from_output(output)
                } else {
                    ClassificationVerdict::fail_open()
                }
            }
            Ok(None) => {
                tracing::warn!("Classifier returned no candidate text");
                ClassificationVerdict::no_candidate()
            }
            Err(ModelError::InvalidCredential(detail)) => {
                tracing::error!("Classifier API key rejected: {}", detail);
                ClassificationVerdict::invalid_credential()
            }
            Err(e) => {
                tracing::warn!("Classification failed, failing open: {}", e);
                ClassificationVerdict::fail_open()
            }
        };

        tracing::debug!(
            "Classified image: waste={} category={:?} confidence={}",
            verdict.is_waste_related,
            verdict.category,
            verdict.confidence
        );

        Ok(verdict)
    }
}

fn build_prompt() -> Result<String, crate::shared::prompts::TemplateError> {
    let categories: Vec<(&str, &str)> = WasteCategory::ALL
        .iter()
        .map(|c| (c.as_str(), c.label()))
        .collect();
    let severities: Vec<&str> = ReportSeverity::ALL.iter().map(|s| s.as_str()).collect();

    render_classification_prompt(
        &categories,
        &severities,
        &ClassificationOutput::json_schema_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ai::clients::fake_model::FakeModel;

    const JPEG: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==";

    fn service(model: Arc<FakeModel>) -> ClassificationService {
        ClassificationService::new(Some(model), 0.1, 512)
    }

    #[tokio::test]
    async fn test_missing_key_returns_error_verdict_before_checking_image() {
        let service = ClassificationService::new(None, 0.1, 512);
        match service.classify(None).await {
            Err(GatewayError::Misconfigured(verdict)) => {
                assert!(!verdict.is_waste_related);
                assert!(verdict.description.contains("API key"));
            }
            other => panic!("expected misconfigured, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_image_is_rejected_without_call() {
        let model = FakeModel::replying("{}");
        let service = service(model.clone());

        for image in [None, Some(""), Some("data:image/png;base64,")] {
            assert!(matches!(
                service.classify(image).await,
                Err(GatewayError::MissingInput { verdict: None, .. })
            ));
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_base64_data_url_is_rejected_without_call() {
        let model = FakeModel::replying("{}");
        let service = service(model.clone());

        match service.classify(Some("data:image/jpeg,%FF%D8%FF%E0")).await {
            Err(GatewayError::MissingInput { message, .. }) => {
                assert_eq!(message, "imageBase64 must be base64 or a base64 data URL");
            }
            other => panic!("expected missing input, got {:?}", other),
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_request_uses_stripped_payload_and_low_temperature() {
        let model = FakeModel::empty();
        service(model.clone()).classify(Some(JPEG)).await.unwrap();

        let request = model.last_request().unwrap();
        assert_eq!(
            request.media,
            vec![InlineMedia {
                mime_type: "image/jpeg".to_string(),
                data: "/9j/4AAQSkZJRgABAQ==".to_string(),
            }]
        );
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_output_tokens, 512);
        assert!(request.prompt.contains("overflowing_bin"));
        assert!(request.prompt.contains("isWasteRelated"));
    }

    #[tokio::test]
    async fn test_overflowing_bin_scenario() {
        let model = FakeModel::replying(
            "```json\n{\"isWasteRelated\": true, \"isAppropriate\": true, \"category\": \"overflowing_bin\", \"topCategories\": [\"overflowing_bin\"], \"severity\": \"medium\", \"confidence\": 88, \"description\": \"Overflowing municipal bin\", \"rejectionReason\": null, \"detectedObjects\": [\"bin\", \"garbage bags\"]}\n```",
        );
        let verdict = service(model).classify(Some(JPEG)).await.unwrap();

        assert!(verdict.is_waste_related);
        assert_eq!(verdict.category, Some(WasteCategory::OverflowingBin));
        assert!(verdict.confidence > 0);
    }

    #[tokio::test]
    async fn test_selfie_scenario() {
        let model = FakeModel::replying(
            r#"{"isWasteRelated": false, "isAppropriate": true, "category": null, "topCategories": [], "confidence": 95, "description": "A smiling person in front of a wall", "rejectionReason": "This looks like a selfie. Please photograph the waste instead.", "detectedObjects": ["person"]}"#,
        );
        let verdict = service(model).classify(Some(JPEG)).await.unwrap();

        assert!(!verdict.is_waste_related);
        assert!(!verdict.rejection_reason.is_empty());
    }

    #[tokio::test]
    async fn test_empty_candidate_fails_open() {
        let verdict = service(FakeModel::empty()).classify(Some(JPEG)).await.unwrap();
        assert!(verdict.is_waste_related);
        assert_eq!(verdict.confidence, 0);
        assert!(verdict.top_categories.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_output_fails_open() {
        for raw in ["I think this is true", "{\"isWasteRelated\": tru", "null"] {
            let verdict = service(FakeModel::replying(raw))
                .classify(Some(JPEG))
                .await
                .unwrap();
            assert_eq!(verdict, ClassificationVerdict::fail_open(), "{:?}", raw);
        }
    }

    #[tokio::test]
    async fn test_invalid_credential_returns_safe_false() {
        let model = FakeModel::failing(ModelError::InvalidCredential("API_KEY_INVALID".into()));
        let verdict = service(model).classify(Some(JPEG)).await.unwrap();
        assert!(!verdict.is_waste_related);
        assert!(!verdict.rejection_reason.is_empty());
    }

    #[tokio::test]
    async fn test_other_upstream_errors_fail_open() {
        let errors = [
            ModelError::Upstream {
                status: 503,
                body: "overloaded".into(),
            },
            ModelError::Transport("operation timed out".into()),
            ModelError::Decode("expected value".into()),
        ];
        for error in errors {
            let verdict = service(FakeModel::failing(error))
                .classify(Some(JPEG))
                .await
                .unwrap();
            assert_eq!(verdict, ClassificationVerdict::fail_open());
        }
    }
}

//! Verdicts produced by the AI gateways.
//!
//! Each gateway has two types: the `*Output` the model is asked to produce
//! (parsed strictly through [`LlmResponse`]) and the `*Verdict` returned to
//! callers. Every degraded path maps to one of the fixed verdict
//! constructors below, so the fail-open and fail-closed policies live here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::reports::models::{ImageAnalysis, ReportSeverity, WasteCategory};
use crate::shared::llm::LlmResponse;

fn default_true() -> bool {
    true
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// JSON the classifier model must return
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationOutput {
    /// Whether the photo shows a waste or sanitation problem
    pub is_waste_related: bool,
    /// False for nudity, violence or other inappropriate content
    #[serde(default = "default_true")]
    pub is_appropriate: bool,
    /// Most likely category value, or null when not waste related
    #[serde(default)]
    pub category: Option<String>,
    /// Up to three category values, most likely first
    #[serde(default)]
    pub top_categories: Vec<String>,
    #[serde(default)]
    pub severity: Option<ReportSeverity>,
    /// Integer from 0 to 100
    pub confidence: f64,
    /// One-sentence description of what the photo shows
    #[serde(default)]
    pub description: String,
    /// Why the photo is not acceptable, addressed to the citizen
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub detected_objects: Vec<String>,

    #[serde(skip, default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(skip)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for ClassificationOutput {
    fn fallback() -> Self {
        Self {
            is_waste_related: true,
            is_appropriate: true,
            category: None,
            top_categories: Vec::new(),
            severity: None,
            confidence: 0.0,
            description: String::new(),
            rejection_reason: None,
            detected_objects: Vec::new(),
            is_llm_success: true,
            llm_error_message: None,
        }
    }

    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }

    fn validate(&self) -> Result<(), String> {
        if !self.confidence.is_finite() {
            return Err("confidence must be a number".to_string());
        }
        Ok(())
    }
}

/// Result of classifying one photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationVerdict {
    pub is_waste_related: bool,
    pub is_appropriate: bool,
    pub category: Option<WasteCategory>,
    pub top_categories: Vec<WasteCategory>,
    pub severity: Option<ReportSeverity>,
    /// 0 to 100
    pub confidence: u8,
    pub description: String,
    pub rejection_reason: String,
    pub detected_objects: Vec<String>,
}

impl ClassificationVerdict {
    /// No API key configured. Returned with HTTP 500.
    pub fn misconfigured() -> Self {
        Self {
            is_waste_related: false,
            is_appropriate: true,
            category: None,
            top_categories: Vec::new(),
            severity: None,
            confidence: 0,
            description: "AI classification is not configured: the generative model API key is missing".to_string(),
            rejection_reason: String::new(),
            detected_objects: Vec::new(),
        }
    }

    /// The upstream rejected our API key
    pub fn invalid_credential() -> Self {
        Self {
            is_waste_related: false,
            is_appropriate: true,
            category: None,
            top_categories: Vec::new(),
            severity: None,
            confidence: 0,
            description: "AI classification is unavailable: the generative model API key was rejected".to_string(),
            rejection_reason: "The image could not be analysed right now. Please try again later.".to_string(),
            detected_objects: Vec::new(),
        }
    }

    /// Upstream succeeded but produced no text. Fails open.
    pub fn no_candidate() -> Self {
        Self {
            description: "The AI model returned no analysis. Please choose a category manually."
                .to_string(),
            ..Self::fail_open()
        }
    }

    /// Unparseable output or any other failure. Fails open so the citizen
    /// can still submit and classify manually.
    pub fn fail_open() -> Self {
        Self {
            is_waste_related: true,
            is_appropriate: true,
            category: None,
            top_categories: Vec::new(),
            severity: None,
            confidence: 0,
            description: "AI analysis is unavailable. Please choose a category manually."
                .to_string(),
            rejection_reason: String::new(),
            detected_objects: Vec::new(),
        }
    }

    /// Normalise a successfully parsed model output
    pub fn from_output(output: ClassificationOutput) -> Self {
        let mut top_categories: Vec<WasteCategory> = Vec::new();
        for label in output.category.iter().chain(output.top_categories.iter()) {
            match label.parse::<WasteCategory>() {
                Ok(category) if !top_categories.contains(&category) => {
                    top_categories.push(category)
                }
                Ok(_) => {}
                Err(_) => tracing::warn!("Dropping unknown category from classifier: {}", label),
            }
        }
        top_categories.truncate(3);

        let is_waste_related = output.is_waste_related && output.is_appropriate;
        let category = if is_waste_related {
            top_categories.first().copied()
        } else {
            None
        };

        let rejection_reason = if is_waste_related {
            String::new()
        } else {
            output
                .rejection_reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| {
                    if output.is_appropriate {
                        "The photo does not appear to show a waste or sanitation problem."
                            .to_string()
                    } else {
                        "The photo contains inappropriate content.".to_string()
                    }
                })
        };

        Self {
            is_waste_related,
            is_appropriate: output.is_appropriate,
            category,
            top_categories: if is_waste_related {
                top_categories
            } else {
                Vec::new()
            },
            severity: output.severity.filter(|_| is_waste_related),
            confidence: output.confidence.round().clamp(0.0, 100.0) as u8,
            description: output.description.trim().to_string(),
            rejection_reason,
            detected_objects: output.detected_objects,
        }
    }

    /// Compact form stored with an uploaded image
    pub fn analysis(&self) -> ImageAnalysis {
        ImageAnalysis {
            is_waste_related: self.is_waste_related,
            category: self.category,
            confidence: self.confidence,
            detected_objects: self.detected_objects.clone(),
        }
    }
}

// =============================================================================
// VERIFICATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, JsonSchema)]
pub enum VerificationConfidence {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

/// JSON the verification model must return
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutput {
    /// True only if the reported waste has clearly been cleared
    pub is_resolved: bool,
    #[serde(default)]
    pub confidence: Option<VerificationConfidence>,
    /// Short explanation the worker can act on
    pub reason: String,

    #[serde(skip, default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(skip)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for VerificationOutput {
    fn fallback() -> Self {
        Self {
            is_resolved: false,
            confidence: None,
            reason: String::new(),
            is_llm_success: true,
            llm_error_message: None,
        }
    }

    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}

/// Result of checking a worker's proof photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationVerdict {
    pub is_resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<VerificationConfidence>,
    pub message: String,
}

impl VerificationVerdict {
    pub fn missing_proof() -> Self {
        Self {
            is_resolved: false,
            confidence: None,
            message: "A proof photo of the cleaned-up site is required.".to_string(),
        }
    }

    pub fn misconfigured() -> Self {
        Self {
            is_resolved: false,
            confidence: None,
            message: "AI verification is not configured: the generative model API key is missing"
                .to_string(),
        }
    }

    /// Proof photo byte-identical to the citizen's photo
    pub fn identical_images() -> Self {
        Self {
            is_resolved: false,
            confidence: Some(VerificationConfidence::High),
            message: "Cleanup not verified: the proof photo is identical to the original report photo. Please take a new photo of the cleaned site.".to_string(),
        }
    }

    /// Unparseable output, no candidate, or any upstream failure. Fails closed.
    pub fn unavailable() -> Self {
        Self {
            is_resolved: false,
            confidence: None,
            message: "Could not verify the cleanup right now. Please retake the proof photo and try again.".to_string(),
        }
    }

    pub fn from_output(output: VerificationOutput) -> Self {
        let reason = output.reason.trim();
        let message = match (output.is_resolved, reason.is_empty()) {
            (true, false) => format!("Cleanup verified: {}", reason),
            (true, true) => "Cleanup verified.".to_string(),
            (false, false) => format!("Cleanup not verified: {}", reason),
            (false, true) => {
                "Cleanup not verified. Please make sure the site is fully cleared and retake the proof photo.".to_string()
            }
        };

        Self {
            is_resolved: output.is_resolved,
            confidence: output.confidence,
            message,
        }
    }
}

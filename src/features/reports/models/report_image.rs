use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::reports::models::WasteCategory;

/// Image kind enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_image_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportImageKind {
    /// Uploaded by the citizen with the report
    Evidence,
    /// Uploaded by the worker when resolving
    Proof,
}

/// Classifier output stored with an uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    pub is_waste_related: bool,
    pub category: Option<WasteCategory>,
    pub confidence: u8,
    #[serde(default)]
    pub detected_objects: Vec<String>,
}

/// Database model for report image
#[derive(Debug, Clone, FromRow)]
pub struct ReportImage {
    pub id: Uuid,
    pub report_id: Uuid,
    pub kind: ReportImageKind,
    pub storage_path: String,
    pub public_url: String,
    pub content_type: String,
    pub ai_analysis: Option<Json<ImageAnalysis>>,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new report image
#[derive(Debug)]
pub struct CreateReportImage {
    pub id: Uuid,
    pub report_id: Uuid,
    pub kind: ReportImageKind,
    pub storage_path: String,
    pub public_url: String,
    pub content_type: String,
    pub ai_analysis: Option<ImageAnalysis>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::ai::models::{ClassificationVerdict, VerificationVerdict};
use crate::features::reports::models::{
    ImageAnalysis, Report, ReportImage, ReportImageKind, ReportSeverity, ReportStats,
    ReportStatus, WasteCategory,
};
use crate::shared::constants::MAX_SLA_HOURS;

/// Request DTO for a citizen report submission
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportDto {
    #[validate(length(min = 5, max = 2000, message = "must be between 5 and 2000 characters"))]
    pub description: String,

    pub category: WasteCategory,

    /// Defaults to medium
    pub severity: Option<ReportSeverity>,

    pub latitude: f64,

    pub longitude: f64,

    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub address: Option<String>,

    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub locality: Option<String>,

    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub city: Option<String>,

    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub reporter_name: Option<String>,

    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub citizen_id: Option<String>,

    /// Overrides the severity default
    pub sla_hours: Option<i32>,
}

impl CreateReportDto {
    /// Field validation plus the rules the derive cannot express
    pub fn validate_submission(&self) -> Result<(), AppError> {
        let mut messages = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match AppError::from(errors) {
                AppError::Validation(messages) => messages,
                other => return Err(other),
            },
        };

        if !self.category.is_reportable() {
            messages.push("category: cannot be chosen when submitting a report".to_string());
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            messages.push("latitude: must be between -90 and 90".to_string());
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            messages.push("longitude: must be between -180 and 180".to_string());
        }
        if self
            .sla_hours
            .is_some_and(|h| !(1..=MAX_SLA_HOURS).contains(&h))
        {
            messages.push(format!(
                "sla_hours: must be between 1 and {} hours",
                MAX_SLA_HOURS
            ));
        }

        if messages.is_empty() {
            Ok(())
        } else {
            messages.sort();
            Err(AppError::Validation(messages))
        }
    }
}

/// Query parameters for listing reports
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ReportQueryParams {
    /// Only reports in this status
    pub status: Option<ReportStatus>,
}

/// Response DTO for report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub report_id: String,
    pub description: String,
    pub category: WasteCategory,
    pub severity: ReportSeverity,
    pub status: ReportStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub locality: Option<String>,
    pub city: Option<String>,
    pub reporter_name: Option<String>,
    pub citizen_id: Option<String>,
    pub sla_hours: i32,
    pub sla_due_at: DateTime<Utc>,
    pub is_sla_breach: bool,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub assigned_worker_id: Option<Uuid>,
    pub assigned_worker_name: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportResponseDto {
    /// Build the DTO, deriving the breach flag at `now`
    pub fn at(r: Report, now: DateTime<Utc>) -> Self {
        Self {
            is_sla_breach: r.is_sla_breach_at(now),
            id: r.id,
            report_id: r.report_id,
            description: r.description,
            category: r.category,
            severity: r.severity,
            status: r.status,
            latitude: r.latitude,
            longitude: r.longitude,
            address: r.address,
            locality: r.locality,
            city: r.city,
            reporter_name: r.reporter_name,
            citizen_id: r.citizen_id,
            sla_hours: r.sla_hours,
            sla_due_at: r.sla_due_at,
            department_id: r.department_id,
            department_name: r.department_name,
            assigned_worker_id: r.assigned_worker_id,
            assigned_worker_name: r.assigned_worker_name,
            assigned_at: r.assigned_at,
            rejection_reason: r.rejection_reason,
            resolution_notes: r.resolution_notes,
            resolved_at: r.resolved_at,
            closed_at: r.closed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self::at(r, Utc::now())
    }
}

/// Dashboard counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatsDto {
    pub total: i64,
    pub submitted: i64,
    pub under_review: i64,
    pub assigned: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    pub rejected: i64,
    pub sla_breached: i64,
}

impl From<ReportStats> for ReportStatsDto {
    fn from(s: ReportStats) -> Self {
        Self {
            total: s.total,
            submitted: s.submitted,
            under_review: s.under_review,
            assigned: s.assigned,
            in_progress: s.in_progress,
            resolved: s.resolved,
            closed: s.closed,
            rejected: s.rejected,
            sla_breached: s.sla_breached,
        }
    }
}

/// Payload of the cross-app report feed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportFeedDto {
    pub reports: Vec<ReportResponseDto>,
    pub stats: ReportStatsDto,
    /// Reports matching the status filter, ignoring pagination
    pub total: i64,
    pub timestamp: DateTime<Utc>,
}

/// Response DTO for report image
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportImageResponseDto {
    pub id: Uuid,
    pub kind: ReportImageKind,
    pub public_url: String,
    pub content_type: String,
    pub ai_analysis: Option<ImageAnalysis>,
    pub created_at: DateTime<Utc>,
}

impl From<ReportImage> for ReportImageResponseDto {
    fn from(i: ReportImage) -> Self {
        Self {
            id: i.id,
            kind: i.kind,
            public_url: i.public_url,
            content_type: i.content_type,
            ai_analysis: i.ai_analysis.map(|a| a.0),
            created_at: i.created_at,
        }
    }
}

/// Response DTO for a report with its images
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetailResponseDto {
    #[serde(flatten)]
    pub report: ReportResponseDto,
    pub images: Vec<ReportImageResponseDto>,
}

/// Request DTO for an evidence photo
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadReportImageDto {
    /// Base64 image, optionally as a data URL
    #[validate(length(min = 1, message = "is required"))]
    pub image_base64: String,
}

/// Response DTO for an accepted evidence photo
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadReportImageResponseDto {
    pub image: ReportImageResponseDto,
    pub classification: Option<ClassificationVerdict>,
}

/// Request DTO for a status change
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportStatusDto {
    pub status: ReportStatus,

    /// Required when rejecting
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub reason: Option<String>,
}

/// Request DTO for assigning a worker
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignReportDto {
    pub worker_id: Uuid,

    /// Defaults to the worker's own department
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub department_id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub department_name: Option<String>,
}

/// Request DTO for resolving with proof of cleanup
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReportDto {
    /// Base64 photo taken after cleanup
    pub proof_image: Option<String>,

    /// Base64 photo to compare against; defaults to the first evidence photo
    pub original_image: Option<String>,

    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Response DTO for a resolve attempt
///
/// `report` is present only when the cleanup was verified.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReportResponseDto {
    pub verification: VerificationVerdict,
    pub report: Option<ReportResponseDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn valid_create() -> CreateReportDto {
        serde_json::from_value(serde_json::json!({
            "description": "Garbage piling up next to the bus stop",
            "category": "illegal_dumping",
            "latitude": 12.97,
            "longitude": 77.59
        }))
        .unwrap()
    }

    #[test]
    fn test_create_report_accepts_minimal_payload() {
        let dto = valid_create();
        assert!(dto.validate_submission().is_ok());
        assert!(dto.severity.is_none());
    }

    #[test]
    fn test_create_report_rejects_classifier_only_category() {
        let dto = CreateReportDto {
            category: WasteCategory::OpenBurning,
            ..valid_create()
        };
        match dto.validate_submission() {
            Err(AppError::Validation(messages)) => {
                assert_eq!(
                    messages,
                    vec!["category: cannot be chosen when submitting a report"]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_report_rejects_bad_coordinates_and_sla() {
        let dto = CreateReportDto {
            latitude: 91.0,
            sla_hours: Some(0),
            ..valid_create()
        };
        match dto.validate_submission() {
            Err(AppError::Validation(messages)) => {
                assert_eq!(messages.len(), 2);
                assert!(messages[0].starts_with("latitude:"));
                assert!(messages[1].starts_with("sla_hours:"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_report_dto_derives_breach_flag() {
        let now = Utc::now();
        let created_at = now - Duration::hours(10);
        let report = Report {
            id: Uuid::now_v7(),
            report_id: "RPT-2025-000001".to_string(),
            description: "Overflowing bin".to_string(),
            category: WasteCategory::OverflowingBin,
            severity: ReportSeverity::Critical,
            status: ReportStatus::Submitted,
            latitude: 12.97,
            longitude: 77.59,
            address: None,
            locality: None,
            city: None,
            reporter_name: None,
            citizen_id: None,
            sla_hours: 6,
            sla_due_at: created_at + Duration::hours(6),
            department_id: None,
            department_name: None,
            assigned_worker_id: None,
            assigned_worker_name: None,
            assigned_at: None,
            rejection_reason: None,
            resolution_notes: None,
            resolved_at: None,
            closed_at: None,
            created_at,
            updated_at: created_at,
        };

        let dto = ReportResponseDto::at(report, now);
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["isSlaBreach"], true);
        assert_eq!(json["reportId"], "RPT-2025-000001");
        assert_eq!(json["category"], "overflowing_bin");
    }
}

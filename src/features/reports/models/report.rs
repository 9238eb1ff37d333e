use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Report status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Submitted,
    UnderReview,
    Assigned,
    InProgress,
    Resolved,
    Closed,
    Rejected,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 7] = [
        ReportStatus::Submitted,
        ReportStatus::UnderReview,
        ReportStatus::Assigned,
        ReportStatus::InProgress,
        ReportStatus::Resolved,
        ReportStatus::Closed,
        ReportStatus::Rejected,
    ];
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Submitted => write!(f, "submitted"),
            ReportStatus::UnderReview => write!(f, "under_review"),
            ReportStatus::Assigned => write!(f, "assigned"),
            ReportStatus::InProgress => write!(f, "in_progress"),
            ReportStatus::Resolved => write!(f, "resolved"),
            ReportStatus::Closed => write!(f, "closed"),
            ReportStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Report severity enum matching database enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type, ToSchema, JsonSchema,
)]
#[sqlx(type_name = "report_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl ReportSeverity {
    pub const ALL: [ReportSeverity; 4] = [
        ReportSeverity::Low,
        ReportSeverity::Medium,
        ReportSeverity::High,
        ReportSeverity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSeverity::Low => "low",
            ReportSeverity::Medium => "medium",
            ReportSeverity::High => "high",
            ReportSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ReportSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Waste taxonomy shared by citizen submissions and the image classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "waste_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WasteCategory {
    IllegalDumping,
    OverflowingBin,
    Littering,
    ConstructionDebris,
    EWaste,
    OrganicWaste,
    HazardousWaste,
    // Only produced by the classifier
    OpenBurning,
    DrainBlockage,
    DeadAnimal,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 10] = [
        WasteCategory::IllegalDumping,
        WasteCategory::OverflowingBin,
        WasteCategory::Littering,
        WasteCategory::ConstructionDebris,
        WasteCategory::EWaste,
        WasteCategory::OrganicWaste,
        WasteCategory::HazardousWaste,
        WasteCategory::OpenBurning,
        WasteCategory::DrainBlockage,
        WasteCategory::DeadAnimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::IllegalDumping => "illegal_dumping",
            WasteCategory::OverflowingBin => "overflowing_bin",
            WasteCategory::Littering => "littering",
            WasteCategory::ConstructionDebris => "construction_debris",
            WasteCategory::EWaste => "e_waste",
            WasteCategory::OrganicWaste => "organic_waste",
            WasteCategory::HazardousWaste => "hazardous_waste",
            WasteCategory::OpenBurning => "open_burning",
            WasteCategory::DrainBlockage => "drain_blockage",
            WasteCategory::DeadAnimal => "dead_animal",
        }
    }

    /// Human-readable label used in prompts and dashboards
    pub fn label(&self) -> &'static str {
        match self {
            WasteCategory::IllegalDumping => "Illegal dumping of garbage in an open area",
            WasteCategory::OverflowingBin => "Public bin or container overflowing",
            WasteCategory::Littering => "Scattered litter on streets or public spaces",
            WasteCategory::ConstructionDebris => "Construction or demolition debris",
            WasteCategory::EWaste => "Discarded electronics, batteries or cables",
            WasteCategory::OrganicWaste => "Food, garden or other organic waste",
            WasteCategory::HazardousWaste => "Chemicals, medical or other hazardous waste",
            WasteCategory::OpenBurning => "Waste being burned in the open",
            WasteCategory::DrainBlockage => "Drain or gutter blocked by waste",
            WasteCategory::DeadAnimal => "Dead animal carcass",
        }
    }

    /// Whether citizens may pick this category when submitting a report
    pub fn is_reportable(&self) -> bool {
        !matches!(
            self,
            WasteCategory::OpenBurning | WasteCategory::DrainBlockage | WasteCategory::DeadAnimal
        )
    }
}

impl std::fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WasteCategory {
    type Err = String;

    /// Accepts the snake_case value case-insensitively, with spaces or
    /// hyphens in place of underscores
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        WasteCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown waste category: {}", s))
    }
}

/// Database model for report
#[derive(Debug, Clone, FromRow)]
pub struct Report {
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

impl Report {
    pub fn is_sla_breach_at(&self, now: DateTime<Utc>) -> bool {
        crate::features::reports::sla::is_breached(self.sla_due_at, now)
    }
}

/// Data for creating a new report
#[derive(Debug)]
pub struct CreateReport {
    pub description: String,
    pub category: WasteCategory,
    pub severity: ReportSeverity,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub locality: Option<String>,
    pub city: Option<String>,
    pub reporter_name: Option<String>,
    pub citizen_id: Option<String>,
    pub sla_hours: i32,
}

/// Aggregate counters shown on the dashboards
#[derive(Debug, Clone, Default, FromRow)]
pub struct ReportStats {
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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Worker approval status matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "worker_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    PendingApproval,
    Approved,
    Rejected,
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerStatus::PendingApproval => write!(f, "pending_approval"),
            WorkerStatus::Approved => write!(f, "approved"),
            WorkerStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// An authority's decision on a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl WorkerStatus {
    /// Status after an authority review. Registrations are reviewed once.
    pub fn review(self, decision: ReviewDecision) -> Option<WorkerStatus> {
        match (self, decision) {
            (WorkerStatus::PendingApproval, ReviewDecision::Approve) => Some(WorkerStatus::Approved),
            (WorkerStatus::PendingApproval, ReviewDecision::Reject) => Some(WorkerStatus::Rejected),
            _ => None,
        }
    }
}

/// Database model for worker
#[derive(Debug, Clone, FromRow)]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub zone: String,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub password_hash: String,
    pub status: WorkerStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new worker
#[derive(Debug)]
pub struct CreateWorker {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub zone: String,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub password_hash: String,
}

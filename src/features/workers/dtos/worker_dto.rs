use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::workers::models::{Worker, WorkerStatus};
use crate::shared::constants::MIN_PASSWORD_LENGTH;
use crate::shared::validation::validate_phone;

/// Request DTO for worker self-registration
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWorkerDto {
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: String,

    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub zone: String,

    #[validate(length(max = 50))]
    pub department_id: Option<String>,

    #[validate(length(max = 100))]
    pub department_name: Option<String>,

    #[validate(length(min = MIN_PASSWORD_LENGTH, message = "must be at least 8 characters"))]
    pub password: String,
}

/// Request DTO for rejecting a registration
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectWorkerDto {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Query parameters for listing workers
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct WorkerQueryParams {
    pub status: Option<WorkerStatus>,
}

/// Response DTO for worker (never exposes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponseDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub zone: String,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub status: WorkerStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Worker> for WorkerResponseDto {
    fn from(w: Worker) -> Self {
        Self {
            id: w.id,
            name: w.name,
            email: w.email,
            phone: w.phone,
            zone: w.zone,
            department_id: w.department_id,
            department_name: w.department_name,
            status: w.status,
            rejection_reason: w.rejection_reason,
            reviewed_at: w.reviewed_at,
            reviewed_by: w.reviewed_by,
            created_at: w.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RegisterWorkerDto {
        RegisterWorkerDto {
            name: "Ravi Kumar".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "+91 98765 43210".to_string(),
            zone: "Ward 12".to_string(),
            department_id: Some("SWM".to_string()),
            department_name: Some("Solid Waste Management".to_string()),
            password: "brooms-and-bins".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_invalid_registration_fields() {
        let dto = RegisterWorkerDto {
            email: "not-an-email".to_string(),
            phone: "12".to_string(),
            password: "short".to_string(),
            ..valid()
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn test_response_hides_password_hash() {
        let now = Utc::now();
        let worker = Worker {
            id: Uuid::now_v7(),
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "9876543210".to_string(),
            zone: "Ward 12".to_string(),
            department_id: None,
            department_name: None,
            password_hash: "$argon2id$secret".to_string(),
            status: WorkerStatus::PendingApproval,
            rejection_reason: None,
            reviewed_at: None,
            reviewed_by: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&WorkerResponseDto::from(worker)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"status\":\"pending_approval\""));
    }
}

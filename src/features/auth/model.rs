use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Staff role carried by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "session_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Authority,
    Worker,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Authority => write!(f, "authority"),
            Role::Worker => write!(f, "worker"),
        }
    }
}

/// Session context resolved from a bearer token, passed to handlers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub session_id: Uuid,
    pub role: Role,
    /// Authority email or worker UUID
    pub subject_id: String,
    pub display_name: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn is_authority(&self) -> bool {
        self.role == Role::Authority
    }

    /// The worker's id, for worker sessions
    pub fn worker_id(&self) -> Option<Uuid> {
        match self.role {
            Role::Worker => Uuid::parse_str(&self.subject_id).ok(),
            Role::Authority => None,
        }
    }
}

/// Database model for session
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub role: Role,
    pub subject_id: String,
    pub display_name: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

impl From<Session> for AuthenticatedUser {
    fn from(s: Session) -> Self {
        Self {
            session_id: s.id,
            role: s.role,
            subject_id: s.subject_id,
            display_name: s.display_name,
            expires_at: s.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(revoked: bool, expires_in_hours: i64) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::now_v7(),
            role: Role::Worker,
            subject_id: Uuid::nil().to_string(),
            display_name: "Asha".to_string(),
            expires_at: now + chrono::Duration::hours(expires_in_hours),
            revoked_at: revoked.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn test_session_activity() {
        let now = Utc::now();
        assert!(session(false, 1).is_active_at(now));
        assert!(!session(true, 1).is_active_at(now));
        assert!(!session(false, -1).is_active_at(now));
    }

    #[test]
    fn test_worker_id_only_for_workers() {
        let worker: AuthenticatedUser = session(false, 1).into();
        assert_eq!(worker.worker_id(), Some(Uuid::nil()));

        let authority = AuthenticatedUser {
            role: Role::Authority,
            subject_id: "ops@city.gov".to_string(),
            ..worker
        };
        assert_eq!(authority.worker_id(), None);
        assert!(authority.is_authority());
    }
}

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::config::{AuthorityConfig, SessionConfig};
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{LoginRequestDto, LoginResponseDto};
use crate::features::auth::model::{AuthenticatedUser, Role, Session};
use crate::features::auth::password::verify_password;
use crate::features::auth::session_token::{SessionClaims, SessionTokens};
use crate::features::workers::models::WorkerStatus;
use crate::features::workers::WorkerService;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Issues, validates and revokes staff sessions
///
/// A session is a row in `sessions` plus a signed token naming it. Both must
/// be valid for a request to authenticate.
pub struct SessionService {
    pool: PgPool,
    tokens: SessionTokens,
    ttl: chrono::Duration,
    authority: AuthorityConfig,
    workers: Arc<WorkerService>,
}

/// Who a successful credential check identified
struct Principal {
    role: Role,
    subject_id: String,
    display_name: String,
}

impl SessionService {
    pub fn new(
        pool: PgPool,
        session: &SessionConfig,
        authority: AuthorityConfig,
        workers: Arc<WorkerService>,
    ) -> Self {
        Self {
            pool,
            tokens: SessionTokens::new(&session.secret),
            ttl: chrono::Duration::from_std(session.ttl)
                .unwrap_or_else(|_| chrono::Duration::hours(12)),
            authority,
            workers,
        }
    }

    /// Check credentials for the requested role and open a session
    pub async fn login(&self, dto: &LoginRequestDto) -> Result<LoginResponseDto> {
        let principal = match dto.role {
            Role::Authority => self.check_authority(&dto.email, &dto.password)?,
            Role::Worker => self.check_worker(&dto.email, &dto.password).await?,
        };

        let now = Utc::now();
        let expires_at = now + self.ttl;
        let session = self.insert_session(&principal, expires_at).await?;

        let token = self
            .tokens
            .issue(&SessionClaims {
                sub: session.subject_id.clone(),
                role: session.role,
                sid: session.id,
                iat: now.timestamp(),
                exp: expires_at.timestamp(),
            })
            .map_err(|e| {
                tracing::error!("Failed to sign session token: {:?}", e);
                AppError::Internal("Failed to issue session".to_string())
            })?;

        tracing::info!("Opened {} session {}", session.role, session.id);

        Ok(LoginResponseDto {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
            user: session.into(),
        })
    }

    /// Resolve a bearer token to its live session
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!("Rejected session token: {:?}", e);
            AppError::Unauthorized("Invalid or expired session".to_string())
        })?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, role, subject_id, display_name, expires_at, revoked_at, created_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(claims.sid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load session: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::Unauthorized("Session not found".to_string()))?;

        if session.role != claims.role || session.subject_id != claims.sub {
            return Err(AppError::Unauthorized("Invalid session".to_string()));
        }

        if !session.is_active_at(Utc::now()) {
            return Err(AppError::Unauthorized(
                "Session has expired or been revoked".to_string(),
            ));
        }

        Ok(session.into())
    }

    /// Revoke the caller's session
    pub async fn logout(&self, user: &AuthenticatedUser) -> Result<()> {
        sqlx::query("UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL")
            .bind(user.session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to revoke session: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!("Revoked {} session {}", user.role, user.session_id);
        Ok(())
    }

    fn check_authority(&self, email: &str, password: &str) -> Result<Principal> {
        if !email.trim().eq_ignore_ascii_case(&self.authority.email) {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !self.password_matches(password, &self.authority.password_hash)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(Principal {
            role: Role::Authority,
            subject_id: self.authority.email.clone(),
            display_name: self.authority.display_name.clone(),
        })
    }

    async fn check_worker(&self, email: &str, password: &str) -> Result<Principal> {
        let worker = self
            .workers
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !self.password_matches(password, &worker.password_hash)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        match worker.status {
            WorkerStatus::Approved => Ok(Principal {
                role: Role::Worker,
                subject_id: worker.id.to_string(),
                display_name: worker.name,
            }),
            WorkerStatus::PendingApproval => Err(AppError::Forbidden(
                "Your registration is still awaiting approval".to_string(),
            )),
            WorkerStatus::Rejected => Err(AppError::Forbidden(
                "Your registration was not approved".to_string(),
            )),
        }
    }

    fn password_matches(&self, password: &str, hash: &str) -> Result<bool> {
        verify_password(password, hash).map_err(|e| {
            tracing::error!("Stored password hash is unusable: {}", e);
            AppError::Internal("Failed to verify credentials".to_string())
        })
    }

    async fn insert_session(
        &self,
        principal: &Principal,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, role, subject_id, display_name, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, role, subject_id, display_name, expires_at, revoked_at, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(principal.role)
        .bind(&principal.subject_id)
        .bind(&principal.display_name)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create session: {:?}", e);
            AppError::Database(e)
        })
    }
}

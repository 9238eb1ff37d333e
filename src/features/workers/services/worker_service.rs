use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::workers::models::{
    CreateWorker, ReviewDecision, Worker, WorkerStatus,
};

const WORKER_COLUMNS: &str = r#"
    id, name, email, phone, zone, department_id, department_name, password_hash,
    status, rejection_reason, reviewed_at, reviewed_by, created_at, updated_at
"#;

/// Convert database error to more specific AppError with user-friendly messages
fn handle_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // Unique constraint violation on LOWER(email)
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
            return AppError::Conflict(
                "A worker with this email is already registered".to_string(),
            );
        }
    }
    tracing::error!("Worker query failed: {:?}", e);
    AppError::Database(e)
}

/// Service for field-worker accounts
pub struct WorkerService {
    pool: PgPool,
}

impl WorkerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new worker awaiting authority approval
    pub async fn register(&self, data: &CreateWorker) -> Result<Worker> {
        let sql = format!(
            r#"
            INSERT INTO workers (id, name, email, phone, zone, department_id, department_name, password_hash)
            VALUES ($1, $2, LOWER($3), $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            WORKER_COLUMNS
        );

        let worker = sqlx::query_as::<_, Worker>(&sql)
            .bind(Uuid::now_v7())
            .bind(&data.name)
            .bind(&data.email)
            .bind(&data.phone)
            .bind(&data.zone)
            .bind(&data.department_id)
            .bind(&data.department_name)
            .bind(&data.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        tracing::info!("Registered worker {} ({})", worker.id, worker.zone);

        Ok(worker)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Worker> {
        let sql = format!("SELECT {} FROM workers WHERE id = $1", WORKER_COLUMNS);

        sqlx::query_as::<_, Worker>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Worker {} not found", id)))
    }

    /// Case-insensitive lookup used at login
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Worker>> {
        let sql = format!(
            "SELECT {} FROM workers WHERE LOWER(email) = LOWER($1)",
            WORKER_COLUMNS
        );

        sqlx::query_as::<_, Worker>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    /// List workers with optional status filter and pagination
    pub async fn list(
        &self,
        status: Option<WorkerStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Worker>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workers WHERE ($1::worker_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(handle_db_error)?;

        let sql = format!(
            r#"
            SELECT {}
            FROM workers
            WHERE ($1::worker_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            WORKER_COLUMNS
        );

        let workers = sqlx::query_as::<_, Worker>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(handle_db_error)?;

        Ok((workers, total))
    }

    /// Approve or reject a pending registration
    ///
    /// The update only applies while the worker is still pending, so two
    /// authorities reviewing at once cannot both succeed.
    pub async fn review(
        &self,
        id: Uuid,
        decision: ReviewDecision,
        reviewer: &str,
        reason: Option<&str>,
    ) -> Result<Worker> {
        let Some(target) = WorkerStatus::PendingApproval.review(decision) else {
            return Err(AppError::Internal("Invalid review decision".to_string()));
        };

        let sql = format!(
            r#"
            UPDATE workers
            SET status = $2,
                rejection_reason = $3,
                reviewed_at = $4,
                reviewed_by = $5,
                updated_at = $4
            WHERE id = $1 AND status = 'pending_approval'
            RETURNING {}
            "#,
            WORKER_COLUMNS
        );

        let updated = sqlx::query_as::<_, Worker>(&sql)
            .bind(id)
            .bind(target)
            .bind(reason.filter(|_| decision == ReviewDecision::Reject))
            .bind(Utc::now())
            .bind(reviewer)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?;

        match updated {
            Some(worker) => {
                tracing::info!("Worker {} {} by {}", worker.id, worker.status, reviewer);
                Ok(worker)
            }
            None => {
                let current = self.get_by_id(id).await?;
                Err(AppError::Conflict(format!(
                    "Worker {} has already been reviewed ({})",
                    id, current.status
                )))
            }
        }
    }
}

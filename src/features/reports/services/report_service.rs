use chrono::{Datelike, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::ai::error::GatewayError;
use crate::features::ai::models::VerificationVerdict;
use crate::features::ai::services::{VerificationRequest, VerificationService};
use crate::features::geocoding::dtos::ReverseGeocodeDto;
use crate::features::geocoding::GeocodingService;
use crate::features::reports::lifecycle::{self, Actor, Operation};
use crate::features::reports::models::{
    CreateReport, Report, ReportImage, ReportStats, ReportStatus,
};
use crate::features::reports::reference::{format_report_id, ReportKey};
use crate::features::reports::services::{PreparedImage, ReportImageService};
use crate::features::reports::sla;
use crate::features::workers::models::WorkerStatus;
use crate::features::workers::WorkerService;

const REPORT_COLUMNS: &str = r#"
    id, report_id, description, category, severity, status,
    latitude, longitude, address, locality, city, reporter_name, citizen_id,
    sla_hours, sla_due_at, department_id, department_name,
    assigned_worker_id, assigned_worker_name, assigned_at,
    rejection_reason, resolution_notes, resolved_at, closed_at,
    created_at, updated_at
"#;

fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| {
        tracing::error!("{}: {:?}", context, e);
        AppError::Database(e)
    }
}

/// Raised when a compare-and-set status write finds the report moved on
fn concurrent_update(report: &Report) -> AppError {
    AppError::Conflict(format!(
        "Report {} was changed by someone else while it was {}; reload and try again",
        report.report_id, report.status
    ))
}

/// Workers may only act on reports assigned to them
fn ensure_assigned_to(report: &Report, worker_id: Uuid) -> Result<()> {
    if report.assigned_worker_id == Some(worker_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Report {} is not assigned to you",
            report.report_id
        )))
    }
}

/// Fill location fields the citizen left blank from a geocoding result
///
/// The coordinates-only fallback carries no address and changes nothing.
fn apply_place(data: &mut CreateReport, place: ReverseGeocodeDto) {
    let Some(address) = place.address else {
        return;
    };

    data.address.get_or_insert(place.display_name);
    if data.locality.is_none() {
        data.locality = address.locality;
    }
    if data.city.is_none() {
        data.city = address.city;
    }
}

/// Outcome of a resolve attempt
#[derive(Debug)]
pub struct Resolution {
    pub verification: VerificationVerdict,
    /// The updated report, only when the cleanup was verified
    pub report: Option<Report>,
}

/// Service for report operations
///
/// All status writes go through [`lifecycle::authorize`] and are applied as
/// compare-and-set updates on the status that was authorized.
pub struct ReportService {
    pool: PgPool,
    geocoding: Arc<GeocodingService>,
    workers: Arc<WorkerService>,
    images: Arc<ReportImageService>,
    verification: Arc<VerificationService>,
}

impl ReportService {
    pub fn new(
        pool: PgPool,
        geocoding: Arc<GeocodingService>,
        workers: Arc<WorkerService>,
        images: Arc<ReportImageService>,
        verification: Arc<VerificationService>,
    ) -> Self {
        Self {
            pool,
            geocoding,
            workers,
            images,
            verification,
        }
    }

    /// Create a report with the next `RPT-<year>-NNNNNN` identifier
    ///
    /// The identifier is minted in the same transaction as the insert, so a
    /// failed insert does not burn a sequence number.
    pub async fn create(&self, mut data: CreateReport) -> Result<Report> {
        if data.address.is_none() || data.locality.is_none() || data.city.is_none() {
            match self.geocoding.reverse(data.latitude, data.longitude).await {
                Ok(place) => apply_place(&mut data, place),
                Err(e) => tracing::warn!("Skipping address lookup for new report: {}", e),
            }
        }

        let now = Utc::now();
        let year = now.year();
        let sla_due_at = sla::due_at(now, data.sla_hours);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start report transaction"))?;

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO report_sequences (year, last_value)
            VALUES ($1, 1)
            ON CONFLICT (year) DO UPDATE SET last_value = report_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(year)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to mint report sequence"))?;

        let sql = format!(
            r#"
            INSERT INTO reports (
                id, report_id, description, category, severity, status,
                latitude, longitude, address, locality, city, reporter_name, citizen_id,
                sla_hours, sla_due_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, 'submitted', $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );

        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(Uuid::now_v7())
            .bind(format_report_id(year, sequence))
            .bind(&data.description)
            .bind(data.category)
            .bind(data.severity)
            .bind(data.latitude)
            .bind(data.longitude)
            .bind(&data.address)
            .bind(&data.locality)
            .bind(&data.city)
            .bind(&data.reporter_name)
            .bind(&data.citizen_id)
            .bind(data.sla_hours)
            .bind(sla_due_at)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to create report"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit report"))?;

        tracing::info!(
            "Created report {} ({}, {}, SLA {}h)",
            report.report_id,
            report.category,
            report.severity,
            report.sla_hours
        );

        Ok(report)
    }

    /// List reports, newest first, with optional status filter
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Report>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE ($1::report_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count reports"))?;

        let sql = format!(
            r#"
            SELECT {}
            FROM reports
            WHERE ($1::report_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            REPORT_COLUMNS
        );

        let reports = sqlx::query_as::<_, Report>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list reports"))?;

        Ok((reports, total))
    }

    /// Reports assigned to a worker, most urgent first
    pub async fn list_for_worker(
        &self,
        worker_id: Uuid,
        status: Option<ReportStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Report>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reports
            WHERE assigned_worker_id = $1 AND ($2::report_status IS NULL OR status = $2)
            "#,
        )
        .bind(worker_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count worker tasks"))?;

        let sql = format!(
            r#"
            SELECT {}
            FROM reports
            WHERE assigned_worker_id = $1 AND ($2::report_status IS NULL OR status = $2)
            ORDER BY sla_due_at ASC
            LIMIT $3 OFFSET $4
            "#,
            REPORT_COLUMNS
        );

        let reports = sqlx::query_as::<_, Report>(&sql)
            .bind(worker_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list worker tasks"))?;

        Ok((reports, total))
    }

    /// Counters per status plus SLA breaches
    pub async fn stats(&self) -> Result<ReportStats> {
        sqlx::query_as::<_, ReportStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'submitted') AS submitted,
                COUNT(*) FILTER (WHERE status = 'under_review') AS under_review,
                COUNT(*) FILTER (WHERE status = 'assigned') AS assigned,
                COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'resolved') AS resolved,
                COUNT(*) FILTER (WHERE status = 'closed') AS closed,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected,
                COUNT(*) FILTER (WHERE sla_due_at < NOW()) AS sla_breached
            FROM reports
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to compute report stats"))
    }

    /// Get a report by UUID or by `reportId`
    pub async fn get(&self, key: &ReportKey) -> Result<Report> {
        let found = match key {
            ReportKey::Id(id) => {
                let sql = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);
                sqlx::query_as::<_, Report>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
            }
            ReportKey::ReportId(report_id) => {
                let sql = format!(
                    "SELECT {} FROM reports WHERE report_id = $1",
                    REPORT_COLUMNS
                );
                sqlx::query_as::<_, Report>(&sql)
                    .bind(report_id)
                    .fetch_optional(&self.pool)
                    .await
            }
        };

        found
            .map_err(db_error("Failed to get report"))?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", key)))
    }

    /// A report together with its photos
    pub async fn get_detail(&self, key: &ReportKey) -> Result<(Report, Vec<ReportImage>)> {
        let report = self.get(key).await?;
        let images = self.images.list(report.id).await?;
        Ok((report, images))
    }

    /// Apply a plain status change for an authority or the assigned worker
    pub async fn transition(
        &self,
        key: &ReportKey,
        to: ReportStatus,
        actor: Actor,
        worker_id: Option<Uuid>,
        reason: Option<&str>,
    ) -> Result<Report> {
        let report = self.get(key).await?;

        lifecycle::authorize(report.status, to, actor, Operation::StatusUpdate)?;
        if actor == Actor::Worker {
            let worker_id = worker_id
                .ok_or_else(|| AppError::Forbidden("Worker access required".to_string()))?;
            ensure_assigned_to(&report, worker_id)?;
        }
        lifecycle::require_reason(to, reason)?;

        let now = Utc::now();
        let rejection_reason = reason
            .map(str::trim)
            .filter(|_| to == ReportStatus::Rejected);
        let closed_at = (to == ReportStatus::Closed).then_some(now);

        let sql = format!(
            r#"
            UPDATE reports
            SET status = $3,
                rejection_reason = COALESCE($4, rejection_reason),
                closed_at = COALESCE($5, closed_at),
                updated_at = $6
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );

        let updated = sqlx::query_as::<_, Report>(&sql)
            .bind(report.id)
            .bind(report.status)
            .bind(to)
            .bind(rejection_reason)
            .bind(closed_at)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update report status"))?
            .ok_or_else(|| concurrent_update(&report))?;

        tracing::info!(
            "Report {} moved {} -> {} by {}",
            updated.report_id,
            report.status,
            updated.status,
            actor
        );

        Ok(updated)
    }

    /// Assign an approved worker, moving the report to `assigned`
    ///
    /// The department defaults to the worker's own.
    pub async fn assign(
        &self,
        key: &ReportKey,
        worker_id: Uuid,
        department_id: Option<String>,
        department_name: Option<String>,
    ) -> Result<Report> {
        let report = self.get(key).await?;
        lifecycle::authorize(
            report.status,
            ReportStatus::Assigned,
            Actor::Authority,
            Operation::Assign,
        )?;

        let worker = self.workers.get_by_id(worker_id).await?;
        if worker.status != WorkerStatus::Approved {
            return Err(AppError::UnprocessableEntity(format!(
                "Worker {} is not approved ({})",
                worker.name, worker.status
            )));
        }

        let now = Utc::now();
        let sql = format!(
            r#"
            UPDATE reports
            SET status = 'assigned',
                assigned_worker_id = $3,
                assigned_worker_name = $4,
                department_id = $5,
                department_name = $6,
                assigned_at = $7,
                updated_at = $7
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );

        let updated = sqlx::query_as::<_, Report>(&sql)
            .bind(report.id)
            .bind(report.status)
            .bind(worker.id)
            .bind(&worker.name)
            .bind(department_id.or(worker.department_id))
            .bind(department_name.or(worker.department_name))
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to assign report"))?
            .ok_or_else(|| concurrent_update(&report))?;

        tracing::info!(
            "Report {} assigned to worker {}",
            updated.report_id,
            worker.id
        );

        Ok(updated)
    }

    /// Submit proof of cleanup for a report in progress
    ///
    /// The proof is checked by the verification gateway first. Only a
    /// verified cleanup stores the photo and resolves the report; otherwise
    /// the verdict is returned and the report is left untouched.
    pub async fn resolve(
        &self,
        key: &ReportKey,
        worker_id: Uuid,
        proof_image: Option<&str>,
        original_image: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Resolution> {
        let report = self.get(key).await?;
        lifecycle::authorize(
            report.status,
            ReportStatus::Resolved,
            Actor::Worker,
            Operation::Resolve,
        )?;
        ensure_assigned_to(&report, worker_id)?;

        let proof = proof_image.map(PreparedImage::decode).transpose()?;
        let original = match original_image {
            Some(raw) => Some(PreparedImage::decode(raw)?),
            None => self.images.original_evidence(report.id).await,
        };

        let proof_url = proof.as_ref().map(PreparedImage::to_data_url);
        let original_url = original.as_ref().map(PreparedImage::to_data_url);
        let category = report.category.as_str();

        let verification = self
            .verification
            .verify(VerificationRequest {
                proof_image: proof_url.as_deref(),
                original_image: original_url.as_deref(),
                category: Some(category),
                description: Some(&report.description),
            })
            .await
            .map_err(|e| match e {
                GatewayError::Misconfigured(_) => {
                    AppError::Internal("Completion verification is not configured".to_string())
                }
                GatewayError::MissingInput { message, .. } => AppError::BadRequest(message),
            })?;

        let Some(proof) = proof.filter(|_| verification.is_resolved) else {
            tracing::info!(
                "Cleanup of report {} not verified: {}",
                report.report_id,
                verification.message
            );
            return Ok(Resolution {
                verification,
                report: None,
            });
        };

        let now = Utc::now();
        let sql = format!(
            r#"
            UPDATE reports
            SET status = 'resolved',
                resolution_notes = $3,
                resolved_at = $4,
                updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start resolve transaction"))?;

        let updated = sqlx::query_as::<_, Report>(&sql)
            .bind(report.id)
            .bind(report.status)
            .bind(notes.map(str::trim).filter(|n| !n.is_empty()))
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to resolve report"))?
            .ok_or_else(|| concurrent_update(&report))?;

        // Proof is stored only once the status write has won
        self.images.add_proof(&mut *tx, report.id, proof).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit resolve"))?;

        tracing::info!(
            "Report {} resolved by worker {}",
            updated.report_id,
            worker_id
        );

        Ok(Resolution {
            verification,
            report: Some(updated),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    use crate::core::config::GeocodingConfig;
    use crate::features::ai::clients::fake_model::FakeModel;
    use crate::features::ai::clients::{GenerationRequest, GenerativeModel, ModelError};
    use crate::features::ai::ClassificationService;
    use crate::features::geocoding::dtos::PlaceAddressDto;
    use crate::features::reports::models::{ReportSeverity, WasteCategory};
    use crate::features::workers::models::{CreateWorker, ReviewDecision};
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::TEST_WORKER_ID;

    const PROOF: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==";
    const RESOLVED: &str = r#"{"isResolved": true, "confidence": "High", "reason": "Pavement is clear"}"#;

    fn new_report() -> CreateReport {
        CreateReport {
            description: "Bin overflowing onto the footpath".to_string(),
            category: WasteCategory::OverflowingBin,
            severity: ReportSeverity::High,
            latitude: 12.97,
            longitude: 77.59,
            address: None,
            locality: None,
            city: None,
            reporter_name: None,
            citizen_id: None,
            sla_hours: 12,
        }
    }

    fn place() -> ReverseGeocodeDto {
        ReverseGeocodeDto {
            display_name: "MG Road, Shivajinagar, Bengaluru".to_string(),
            lat: 12.97,
            lon: 77.59,
            address: Some(PlaceAddressDto {
                road: Some("MG Road".to_string()),
                locality: Some("Shivajinagar".to_string()),
                city: Some("Bengaluru".to_string()),
                state: None,
                postcode: None,
                country: None,
            }),
        }
    }

    #[test]
    fn test_apply_place_fills_only_missing_fields() {
        let mut data = CreateReport {
            city: Some("Bangalore".to_string()),
            ..new_report()
        };
        apply_place(&mut data, place());

        assert_eq!(
            data.address.as_deref(),
            Some("MG Road, Shivajinagar, Bengaluru")
        );
        assert_eq!(data.locality.as_deref(), Some("Shivajinagar"));
        assert_eq!(data.city.as_deref(), Some("Bangalore"));
    }

    #[test]
    fn test_apply_place_ignores_coordinate_fallback() {
        let mut data = new_report();
        apply_place(&mut data, ReverseGeocodeDto::coordinates_only(12.97, 77.59));
        assert!(data.address.is_none());
        assert!(data.locality.is_none());
    }

    #[test]
    fn test_ensure_assigned_to() {
        let now = Utc::now();
        let mut report = Report {
            id: Uuid::now_v7(),
            report_id: "RPT-2025-000007".to_string(),
            description: "Debris".to_string(),
            category: WasteCategory::ConstructionDebris,
            severity: ReportSeverity::Medium,
            status: ReportStatus::Assigned,
            latitude: 0.0,
            longitude: 0.0,
            address: None,
            locality: None,
            city: None,
            reporter_name: None,
            citizen_id: None,
            sla_hours: 24,
            sla_due_at: now,
            department_id: None,
            department_name: None,
            assigned_worker_id: Some(TEST_WORKER_ID),
            assigned_worker_name: Some("Test Worker".to_string()),
            assigned_at: Some(now),
            rejection_reason: None,
            resolution_notes: None,
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };

        assert!(ensure_assigned_to(&report, TEST_WORKER_ID).is_ok());
        assert!(matches!(
            ensure_assigned_to(&report, Uuid::now_v7()),
            Err(AppError::Forbidden(_))
        ));

        report.assigned_worker_id = None;
        assert!(ensure_assigned_to(&report, TEST_WORKER_ID).is_err());
    }

    struct Harness {
        pool: PgPool,
        reports: ReportService,
        storage: Arc<MemoryStore>,
    }

    fn harness(pool: PgPool, verifier: Arc<dyn GenerativeModel>) -> Harness {
        // Nothing listens on the discard port, so lookups fail fast
        let geocoding = GeocodingService::new(&GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "wastewise-test".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        let storage = Arc::new(MemoryStore::default());
        let images = ReportImageService::new(
            pool.clone(),
            Arc::new(ClassificationService::new(None, 0.1, 512)),
            storage.clone(),
        );

        Harness {
            reports: ReportService::new(
                pool.clone(),
                Arc::new(geocoding),
                Arc::new(WorkerService::new(pool.clone())),
                Arc::new(images),
                Arc::new(VerificationService::new(Some(verifier), 0.2, 256)),
            ),
            pool,
            storage,
        }
    }

    fn located_report() -> CreateReport {
        CreateReport {
            address: Some("12 Station Road".to_string()),
            locality: Some("Shivajinagar".to_string()),
            city: Some("Bengaluru".to_string()),
            ..new_report()
        }
    }

    async fn registered_worker(pool: &PgPool, email: &str) -> Uuid {
        WorkerService::new(pool.clone())
            .register(&CreateWorker {
                name: "Ravi Kumar".to_string(),
                email: email.to_string(),
                phone: "+919876543210".to_string(),
                zone: "Ward 12".to_string(),
                department_id: Some("swm".to_string()),
                department_name: Some("Solid Waste Management".to_string()),
                password_hash: "$argon2id$unused".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn approved_worker(pool: &PgPool) -> Uuid {
        let id = registered_worker(pool, "ravi@example.com").await;
        WorkerService::new(pool.clone())
            .review(id, ReviewDecision::Approve, "authority", None)
            .await
            .unwrap()
            .id
    }

    async fn report_in_progress(h: &Harness, worker_id: Uuid) -> ReportKey {
        let report = h.reports.create(located_report()).await.unwrap();
        let key = ReportKey::Id(report.id);

        h.reports
            .transition(&key, ReportStatus::UnderReview, Actor::Authority, None, None)
            .await
            .unwrap();
        h.reports.assign(&key, worker_id, None, None).await.unwrap();
        h.reports
            .transition(&key, ReportStatus::InProgress, Actor::Worker, Some(worker_id), None)
            .await
            .unwrap();

        key
    }

    async fn proof_rows(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM report_images WHERE kind = 'proof'")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    /// Verifier that moves the report back to `assigned` before answering
    struct RacingVerifier {
        pool: PgPool,
    }

    #[async_trait]
    impl GenerativeModel for RacingVerifier {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> std::result::Result<Option<String>, ModelError> {
            sqlx::query("UPDATE reports SET status = 'assigned' WHERE status = 'in_progress'")
                .execute(&self.pool)
                .await
                .unwrap();
            Ok(Some(RESOLVED.to_string()))
        }
    }

    #[sqlx::test]
    async fn test_create_mints_sequential_ids(pool: PgPool) {
        let h = harness(pool, FakeModel::empty());

        let first = h.reports.create(located_report()).await.unwrap();
        let second = h.reports.create(located_report()).await.unwrap();

        let year = Utc::now().year();
        assert_eq!(first.report_id, format!("RPT-{}-000001", year));
        assert_eq!(second.report_id, format!("RPT-{}-000002", year));
        assert_eq!(first.status, ReportStatus::Submitted);
        assert_eq!(first.sla_due_at, first.created_at + chrono::Duration::hours(12));
    }

    #[sqlx::test]
    async fn test_create_keeps_location_when_geocoding_is_down(pool: PgPool) {
        let h = harness(pool, FakeModel::empty());

        let report = h.reports.create(new_report()).await.unwrap();
        assert!(report.address.is_none());
        assert!(report.city.is_none());

        let by_reference = h
            .reports
            .get(&ReportKey::ReportId(report.report_id.clone()))
            .await
            .unwrap();
        assert_eq!(by_reference.id, report.id);
    }

    #[sqlx::test]
    async fn test_concurrent_transitions_apply_once(pool: PgPool) {
        let h = harness(pool, FakeModel::empty());
        let report = h.reports.create(located_report()).await.unwrap();
        let key = ReportKey::Id(report.id);

        let (first, second) = tokio::join!(
            h.reports
                .transition(&key, ReportStatus::UnderReview, Actor::Authority, None, None),
            h.reports
                .transition(&key, ReportStatus::UnderReview, Actor::Authority, None, None),
        );

        let winner = match (first, second) {
            (Ok(report), Err(e)) | (Err(e), Ok(report)) => {
                assert!(
                    matches!(e, AppError::Conflict(_) | AppError::Transition(_)),
                    "unexpected loser error: {:?}",
                    e
                );
                report
            }
            other => panic!("expected exactly one transition to apply, got {:?}", other),
        };

        let current = h.reports.get(&key).await.unwrap();
        assert_eq!(current.status, winner.status);
    }

    #[sqlx::test]
    async fn test_assign_requires_approved_worker(pool: PgPool) {
        let h = harness(pool.clone(), FakeModel::empty());
        let report = h.reports.create(located_report()).await.unwrap();
        let key = ReportKey::Id(report.id);
        h.reports
            .transition(&key, ReportStatus::UnderReview, Actor::Authority, None, None)
            .await
            .unwrap();

        let pending = registered_worker(&pool, "pending@example.com").await;
        assert!(matches!(
            h.reports.assign(&key, pending, None, None).await,
            Err(AppError::UnprocessableEntity(_))
        ));

        let worker_id = approved_worker(&pool).await;
        let assigned = h.reports.assign(&key, worker_id, None, None).await.unwrap();
        assert_eq!(assigned.status, ReportStatus::Assigned);
        assert_eq!(assigned.assigned_worker_id, Some(worker_id));
        assert_eq!(assigned.assigned_worker_name.as_deref(), Some("Ravi Kumar"));
        assert_eq!(assigned.department_id.as_deref(), Some("swm"));
        assert!(assigned.assigned_at.is_some());
    }

    #[sqlx::test]
    async fn test_resolve_stores_proof_when_verified(pool: PgPool) {
        let h = harness(pool.clone(), FakeModel::replying(RESOLVED));
        let worker_id = approved_worker(&pool).await;
        let key = report_in_progress(&h, worker_id).await;

        let resolution = h
            .reports
            .resolve(&key, worker_id, Some(PROOF), None, Some("  Cleared by crew  "))
            .await
            .unwrap();

        assert!(resolution.verification.is_resolved);
        let report = resolution.report.unwrap();
        assert_eq!(report.status, ReportStatus::Resolved);
        assert_eq!(report.resolution_notes.as_deref(), Some("Cleared by crew"));
        assert!(report.resolved_at.is_some());
        assert_eq!(proof_rows(&h.pool).await, 1);
        assert_eq!(h.storage.keys().len(), 1);
    }

    #[sqlx::test]
    async fn test_resolve_leaves_report_when_not_verified(pool: PgPool) {
        let verifier =
            FakeModel::replying(r#"{"isResolved": false, "reason": "Bags are still visible"}"#);
        let h = harness(pool.clone(), verifier);
        let worker_id = approved_worker(&pool).await;
        let key = report_in_progress(&h, worker_id).await;

        let resolution = h
            .reports
            .resolve(&key, worker_id, Some(PROOF), None, None)
            .await
            .unwrap();

        assert!(!resolution.verification.is_resolved);
        assert!(resolution.report.is_none());
        assert_eq!(h.reports.get(&key).await.unwrap().status, ReportStatus::InProgress);
        assert_eq!(proof_rows(&h.pool).await, 0);
        assert!(h.storage.keys().is_empty());
    }

    #[sqlx::test]
    async fn test_resolve_conflict_stores_no_proof(pool: PgPool) {
        let h = harness(
            pool.clone(),
            Arc::new(RacingVerifier { pool: pool.clone() }),
        );
        let worker_id = approved_worker(&pool).await;
        let key = report_in_progress(&h, worker_id).await;

        let result = h
            .reports
            .resolve(&key, worker_id, Some(PROOF), None, None)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(h.reports.get(&key).await.unwrap().status, ReportStatus::Assigned);
        assert_eq!(proof_rows(&h.pool).await, 0);
        assert!(h.storage.keys().is_empty());
    }
}

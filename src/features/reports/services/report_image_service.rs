use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::ai::error::GatewayError;
use crate::features::ai::models::ClassificationVerdict;
use crate::features::ai::ClassificationService;
use crate::features::reports::models::{
    CreateReportImage, ImageAnalysis, ReportImage, ReportImageKind,
};
use crate::modules::storage::ObjectStore;
use crate::shared::constants::{DEFAULT_IMAGE_MIME, MAX_IMAGE_BYTES};
use crate::shared::media::{self, MediaError};

const IMAGE_COLUMNS: &str =
    "id, report_id, kind, storage_path, public_url, content_type, ai_analysis, created_at";

/// A decoded photo that passed the format and size checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PreparedImage {
    /// Decode a base64 photo, with or without a data-URL prefix
    pub fn decode(raw: &str) -> Result<Self> {
        let payload = media::normalize(raw, DEFAULT_IMAGE_MIME).map_err(|e| match e {
            MediaError::Empty => AppError::BadRequest("Image payload is empty".to_string()),
            MediaError::NotBase64 => AppError::BadRequest("Image is not valid base64".to_string()),
        })?;

        if !media::is_supported_image(&payload.mime_type) {
            return Err(AppError::BadRequest(format!(
                "Unsupported image type: {}",
                payload.mime_type
            )));
        }

        let bytes = media::decode(&payload)
            .map_err(|_| AppError::BadRequest("Image is not valid base64".to_string()))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("Image payload is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest(format!(
                "Image exceeds the {} MB limit",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }

        Ok(Self {
            mime_type: payload.mime_type,
            bytes,
        })
    }

    /// Re-encode as a data URL for the model gateways
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            media::encode(&self.bytes)
        )
    }
}

/// Whether a verdict is a model judgement that the photo is unusable
///
/// A rejected API key also yields `isWasteRelated: false`, but that says
/// nothing about the photo, so the upload goes through.
fn refuses_upload(verdict: &ClassificationVerdict) -> bool {
    !verdict.is_waste_related && *verdict != ClassificationVerdict::invalid_credential()
}

/// Service for report photos and their storage
pub struct ReportImageService {
    pool: PgPool,
    classifier: Arc<ClassificationService>,
    storage: Arc<dyn ObjectStore>,
}

impl ReportImageService {
    pub fn new(
        pool: PgPool,
        classifier: Arc<ClassificationService>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            pool,
            classifier,
            storage,
        }
    }

    /// Decode and classify a citizen photo without storing it
    ///
    /// Photos the classifier judges unrelated to waste are refused with 422.
    /// When no model is configured the photo is accepted unclassified.
    pub async fn screen_evidence(
        &self,
        raw: &str,
    ) -> Result<(PreparedImage, Option<ClassificationVerdict>)> {
        let image = PreparedImage::decode(raw)?;

        let verdict = match self.classifier.classify(Some(raw)).await {
            Ok(verdict) => Some(verdict),
            Err(GatewayError::Misconfigured(_)) => {
                tracing::warn!("Storing evidence photo without classification: no model configured");
                None
            }
            Err(GatewayError::MissingInput { message, .. }) => {
                return Err(AppError::BadRequest(message));
            }
        };

        if let Some(verdict) = verdict.as_ref().filter(|v| refuses_upload(v)) {
            tracing::info!(
                "Refused evidence photo: {} (confidence {})",
                verdict.rejection_reason,
                verdict.confidence
            );
            return Err(AppError::UnprocessableEntity(
                verdict.rejection_reason.clone(),
            ));
        }

        Ok((image, verdict))
    }

    /// Classify, store and record a citizen photo for a report
    pub async fn add_evidence(
        &self,
        report_id: Uuid,
        raw: &str,
    ) -> Result<(ReportImage, Option<ClassificationVerdict>)> {
        let (image, verdict) = self.screen_evidence(raw).await?;
        let analysis = verdict.as_ref().map(ClassificationVerdict::analysis);

        let stored = self
            .store(&self.pool, report_id, ReportImageKind::Evidence, image, analysis)
            .await?;

        tracing::info!("Added evidence photo {} to report {}", stored.id, report_id);
        Ok((stored, verdict))
    }

    /// Store and record a worker's verified proof photo
    ///
    /// The row is written on `conn`, so it is only kept if the caller's
    /// transaction commits.
    pub async fn add_proof(
        &self,
        conn: &mut PgConnection,
        report_id: Uuid,
        image: PreparedImage,
    ) -> Result<ReportImage> {
        let stored = self
            .store(conn, report_id, ReportImageKind::Proof, image, None)
            .await?;

        tracing::info!("Added proof photo {} to report {}", stored.id, report_id);
        Ok(stored)
    }

    /// All photos of a report, oldest first
    pub async fn list(&self, report_id: Uuid) -> Result<Vec<ReportImage>> {
        let sql = format!(
            "SELECT {} FROM report_images WHERE report_id = $1 ORDER BY created_at ASC",
            IMAGE_COLUMNS
        );

        sqlx::query_as::<_, ReportImage>(&sql)
            .bind(report_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list report images: {:?}", e);
                AppError::Database(e)
            })
    }

    /// The first citizen photo of a report, read back from storage
    ///
    /// Best effort: returns `None` when there is no photo or it cannot be read.
    pub async fn original_evidence(&self, report_id: Uuid) -> Option<PreparedImage> {
        let sql = format!(
            r#"
            SELECT {}
            FROM report_images
            WHERE report_id = $1 AND kind = 'evidence'
            ORDER BY created_at ASC
            LIMIT 1
            "#,
            IMAGE_COLUMNS
        );

        let image = match sqlx::query_as::<_, ReportImage>(&sql)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(image)) => image,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to look up evidence photo for {}: {:?}", report_id, e);
                return None;
            }
        };

        match self.storage.fetch(&image.storage_path).await {
            Ok(bytes) => Some(PreparedImage {
                mime_type: image.content_type,
                bytes,
            }),
            Err(e) => {
                tracing::warn!("Failed to read evidence photo {}: {}", image.id, e);
                None
            }
        }
    }

    async fn store<'e, E>(
        &self,
        executor: E,
        report_id: Uuid,
        kind: ReportImageKind,
        image: PreparedImage,
        analysis: Option<ImageAnalysis>,
    ) -> Result<ReportImage>
    where
        E: PgExecutor<'e>,
    {
        let id = Uuid::now_v7();
        let path = format!(
            "reports/{}/{}.{}",
            report_id,
            id,
            media::extension_for_mime(&image.mime_type)
        );

        let object = self
            .storage
            .put_public(&path, image.bytes, &image.mime_type)
            .await?;

        insert(
            executor,
            &CreateReportImage {
                id,
                report_id,
                kind,
                storage_path: object.key,
                public_url: object.url,
                content_type: image.mime_type,
                ai_analysis: analysis,
            },
        )
        .await
    }
}

async fn insert<'e, E>(executor: E, data: &CreateReportImage) -> Result<ReportImage>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO report_images (id, report_id, kind, storage_path, public_url, content_type, ai_analysis)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        IMAGE_COLUMNS
    );

    sqlx::query_as::<_, ReportImage>(&sql)
        .bind(data.id)
        .bind(data.report_id)
        .bind(data.kind)
        .bind(&data.storage_path)
        .bind(&data.public_url)
        .bind(&data.content_type)
        .bind(data.ai_analysis.clone().map(Json))
        .fetch_one(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record report image: {:?}", e);
            AppError::Database(e)
        })
}

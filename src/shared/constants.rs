/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 200;

// =============================================================================
// REPORT CONSTANTS
// =============================================================================

/// Prefix of the human-readable report identifier (`RPT-2025-000001`)
pub const REPORT_ID_PREFIX: &str = "RPT";

/// Width of the zero-padded per-year sequence in a report identifier
pub const REPORT_SEQUENCE_WIDTH: usize = 6;

/// Default SLA windows in hours, by severity
pub const SLA_HOURS_CRITICAL: i32 = 6;
pub const SLA_HOURS_HIGH: i32 = 12;
pub const SLA_HOURS_MEDIUM: i32 = 24;
pub const SLA_HOURS_LOW: i32 = 48;

/// Upper bound accepted for an explicit SLA override (30 days)
pub const MAX_SLA_HOURS: i32 = 720;

// =============================================================================
// MEDIA CONSTANTS
// =============================================================================

/// MIME type assumed for bare base64 images
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// MIME type assumed for bare base64 audio (browser MediaRecorder default)
pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// Largest decoded image accepted for report uploads
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// ACCOUNT CONSTANTS
// =============================================================================

/// Minimum worker password length
pub const MIN_PASSWORD_LENGTH: u64 = 8;

//! Human-readable report identifiers (`RPT-2025-000001`).

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::{REPORT_ID_PREFIX, REPORT_SEQUENCE_WIDTH};
use crate::shared::validation::REPORT_ID_REGEX;

/// Format the `sequence`-th report of `year`
pub fn format_report_id(year: i32, sequence: i64) -> String {
    format!(
        "{}-{}-{:0width$}",
        REPORT_ID_PREFIX,
        year,
        sequence,
        width = REPORT_SEQUENCE_WIDTH
    )
}

/// A report addressed either by its UUID or by its `reportId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportKey {
    Id(Uuid),
    ReportId(String),
}

impl std::fmt::Display for ReportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKey::Id(id) => write!(f, "{}", id),
            ReportKey::ReportId(report_id) => write!(f, "{}", report_id),
        }
    }
}

impl ReportKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(id) = Uuid::parse_str(raw) {
            return Ok(ReportKey::Id(id));
        }
        if REPORT_ID_REGEX.is_match(raw) {
            return Ok(ReportKey::ReportId(raw.to_string()));
        }
        Err(AppError::BadRequest(format!(
            "'{}' is neither a report UUID nor a report ID",
            raw
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_report_id() {
        assert_eq!(format_report_id(2025, 1), "RPT-2025-000001");
        assert_eq!(format_report_id(2025, 2), "RPT-2025-000002");
        assert_eq!(format_report_id(2026, 123456), "RPT-2026-123456");
        assert_eq!(format_report_id(2026, 1234567), "RPT-2026-1234567");
    }

    #[test]
    fn test_ids_sort_in_sequence_order() {
        let ids: Vec<String> = (1..=20).map(|n| format_report_id(2025, n)).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_report_key_parse() {
        let id = Uuid::now_v7();
        assert_eq!(ReportKey::parse(&id.to_string()).unwrap(), ReportKey::Id(id));
        assert_eq!(
            ReportKey::parse("RPT-2025-000042").unwrap(),
            ReportKey::ReportId("RPT-2025-000042".to_string())
        );
        assert!(ReportKey::parse("42").is_err());
    }
}

use chrono::{DateTime, Duration, Utc};

use crate::features::reports::models::ReportSeverity;
use crate::shared::constants::{SLA_HOURS_CRITICAL, SLA_HOURS_HIGH, SLA_HOURS_LOW, SLA_HOURS_MEDIUM};

/// Default handling window for a report of the given severity
pub fn default_hours(severity: ReportSeverity) -> i32 {
    match severity {
        ReportSeverity::Critical => SLA_HOURS_CRITICAL,
        ReportSeverity::High => SLA_HOURS_HIGH,
        ReportSeverity::Medium => SLA_HOURS_MEDIUM,
        ReportSeverity::Low => SLA_HOURS_LOW,
    }
}

pub fn due_at(created_at: DateTime<Utc>, sla_hours: i32) -> DateTime<Utc> {
    created_at + Duration::hours(i64::from(sla_hours))
}

/// A report is breached strictly after its deadline
pub fn is_breached(sla_due_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > sla_due_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hours_by_severity() {
        assert_eq!(default_hours(ReportSeverity::Critical), 6);
        assert_eq!(default_hours(ReportSeverity::High), 12);
        assert_eq!(default_hours(ReportSeverity::Medium), 24);
        assert_eq!(default_hours(ReportSeverity::Low), 48);
    }

    #[test]
    fn test_six_hour_sla_created_ten_hours_ago_is_breached() {
        let now = Utc::now();
        let created_at = now - Duration::hours(10);
        assert!(is_breached(due_at(created_at, 6), now));
    }

    #[test]
    fn test_not_breached_before_or_at_deadline() {
        let now = Utc::now();
        let created_at = now - Duration::hours(5);
        assert!(!is_breached(due_at(created_at, 6), now));

        let due = due_at(now - Duration::hours(6), 6);
        assert!(!is_breached(due, due));
    }
}

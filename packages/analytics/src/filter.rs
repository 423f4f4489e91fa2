//! Date-range filtering of report sets.

use chrono::{DateTime, Duration, Utc};
use incident_map_report_models::Report;

/// Keeps reports created within the last `days` days before `now`.
///
/// `None` keeps everything, as does a range reaching past the earliest
/// representable date. The cutoff is inclusive.
#[must_use]
pub fn filter_by_date_range(reports: &[Report], days: Option<u32>, now: DateTime<Utc>) -> Vec<Report> {
    let Some(days) = days else {
        return reports.to_vec();
    };

    let Some(cutoff) =
        Duration::try_days(i64::from(days)).and_then(|range| now.checked_sub_signed(range))
    else {
        log::debug!("Date range of {days} days precedes every representable date");
        return reports.to_vec();
    };
    let kept: Vec<Report> = reports
        .iter()
        .filter(|r| r.created_at >= cutoff)
        .cloned()
        .collect();

    log::debug!(
        "Date range of {days} days kept {} of {} reports",
        kept.len(),
        reports.len()
    );

    kept
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use incident_map_report_models::{Location, ReportStatus, ReportType};

    use super::*;

    fn at(id: &str, created_at: DateTime<Utc>) -> Report {
        Report {
            id: id.to_string(),
            report_type: ReportType::Police,
            location: Location::real(0.0, 0.0),
            status: ReportStatus::Pending,
            severity: None,
            description: None,
            created_at,
        }
    }

    #[test]
    fn keeps_recent_reports_only() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let reports = vec![
            at("old", Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            at("edge", Utc.with_ymd_and_hms(2024, 6, 23, 12, 0, 0).unwrap()),
            at("new", Utc.with_ymd_and_hms(2024, 6, 29, 0, 0, 0).unwrap()),
        ];

        let ids: Vec<String> = filter_by_date_range(&reports, Some(7), now)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["edge", "new"]);
    }

    #[test]
    fn no_range_keeps_everything() {
        let now = Utc::now();
        let reports = vec![at("a", now - Duration::days(400)), at("b", now)];
        assert_eq!(filter_by_date_range(&reports, None, now).len(), 2);
    }

    #[test]
    fn unrepresentable_range_keeps_everything() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let reports = vec![at("a", Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap())];
        assert_eq!(filter_by_date_range(&reports, Some(u32::MAX), now).len(), 1);
    }
}

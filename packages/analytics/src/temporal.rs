//! Peak-activity detection over report timestamps.

use chrono::{Datelike as _, FixedOffset, Offset as _, Timelike as _, Utc};
use incident_map_analytics_models::{TemporalDistributions, TemporalProfile};
use incident_map_report_models::Report;

/// Weekday names, index 0 = Sunday.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Month abbreviations, index 0 = January.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Buckets `created_at` of every report into hour, weekday and month
/// counters, in the timezone `utc_offset_minutes` east of UTC, and picks
/// the busiest bucket of each. Ties go to the lowest index, so an empty
/// input peaks at midnight, Sunday, January.
#[must_use]
pub fn temporal_profile(reports: &[Report], utc_offset_minutes: i32) -> TemporalProfile {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            log::warn!("UTC offset of {utc_offset_minutes} minutes is out of range, using UTC");
            Utc.fix()
        });

    let mut hourly = vec![0u64; 24];
    let mut weekly = vec![0u64; 7];
    let mut monthly = vec![0u64; 12];

    for report in reports {
        let local = report.created_at.with_timezone(&offset);
        hourly[local.hour() as usize] += 1;
        weekly[local.weekday().num_days_from_sunday() as usize] += 1;
        monthly[local.month0() as usize] += 1;
    }

    let peak_hour = peak_index(&hourly);
    let peak_weekday = peak_index(&weekly);
    let peak_month = peak_index(&monthly);

    TemporalProfile {
        peak_hour: to_u8(peak_hour),
        peak_weekday: to_u8(peak_weekday),
        peak_weekday_name: WEEKDAY_NAMES[peak_weekday].to_string(),
        peak_month: to_u8(peak_month),
        peak_month_name: MONTH_NAMES[peak_month].to_string(),
        distributions: TemporalDistributions {
            hourly,
            weekly,
            monthly,
        },
    }
}

/// Index of the first maximum.
fn peak_index(counts: &[u64]) -> usize {
    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }
    best
}

#[allow(clippy::cast_possible_truncation)]
const fn to_u8(index: usize) -> u8 {
    index as u8
}

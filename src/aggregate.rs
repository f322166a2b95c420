use crate::errors::AggregateError;
use crate::models::{AggregateResult, AttendanceRecord, WeekBucket};
use crate::stats::summarize;
use crate::week::{end_of_day, start_of_day, week_end_of, week_start_of};
use chrono::{Duration, Local, NaiveDate};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// A bucket layout that breaks the Monday-to-Sunday contract. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BucketIntegrityWarning {
    #[error("bucket starting {week_start} spans {days} days instead of 6")]
    Span { week_start: NaiveDate, days: i64 },
    #[error("bucket starting {next} is {days} days after the previous one ({previous})")]
    Gap {
        previous: NaiveDate,
        next: NaiveDate,
        days: i64,
    },
}

/// Longest trailing window accepted, roughly one hundred years.
pub const MAX_WINDOW_DAYS: i64 = 36_525;

pub fn aggregate(
    records: &[AttendanceRecord],
    window_days: i64,
) -> Result<AggregateResult, AggregateError> {
    aggregate_at(records, window_days, Local::now().date_naive())
}

/// Buckets `records` into the calendar weeks of the trailing window ending on
/// `today`. The window always holds `ceil(window_days / 7)` weeks, the last
/// one being the week that contains `today`.
pub fn aggregate_at(
    records: &[AttendanceRecord],
    window_days: i64,
    today: NaiveDate,
) -> Result<AggregateResult, AggregateError> {
    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
        return Err(AggregateError::InvalidArgument { window_days });
    }

    let week_count = (window_days + 6) / 7;
    let first_week = Duration::try_weeks(week_count - 1)
        .and_then(|span| week_start_of(today).checked_sub_signed(span))
        .ok_or(AggregateError::InvalidArgument { window_days })?;
    let period_end = end_of_day(today);

    let mut weeks: BTreeMap<NaiveDate, WeekBucket> = BTreeMap::new();
    let mut cursor = start_of_day(first_week);
    while cursor <= period_end {
        let week_start = week_start_of(cursor.date());
        weeks.entry(week_start).or_insert_with(|| WeekBucket {
            week_start,
            week_end: week_end_of(week_start),
            count: 0,
            dates: Vec::new(),
        });
        cursor += Duration::days(7);
    }

    let mut skipped_records = 0usize;
    for record in records {
        let date = match record.parsed_date() {
            Ok(date) => date,
            Err(err) => {
                warn!("skipping attendance record: {err}");
                skipped_records += 1;
                continue;
            }
        };

        match weeks.get_mut(&week_start_of(date)) {
            Some(bucket) => {
                bucket.count += 1;
                bucket.dates.push(date);
            }
            None => debug!(id = %record.id, %date, "record outside window"),
        }
    }

    // BTreeMap iteration is already ascending by week start
    let buckets: Vec<WeekBucket> = weeks.into_values().collect();
    for issue in check_integrity(&buckets) {
        warn!("bucket integrity: {issue}");
    }

    let summary = summarize(&buckets);
    let total_count = buckets.iter().map(|bucket| bucket.count).sum();
    let period_start = buckets.first().map_or(first_week, |bucket| bucket.week_start);
    let period_end = buckets
        .last()
        .map_or(week_end_of(first_week), |bucket| bucket.week_end);

    Ok(AggregateResult {
        buckets,
        total_count,
        weeks_total: summary.weeks_total,
        weeks_with_attendance: summary.weeks_with_attendance,
        weeks_without_attendance: summary.weeks_without_attendance,
        average_per_week: summary.average_per_week,
        window_days,
        period_start,
        period_end,
        skipped_records,
    })
}

pub fn check_integrity(buckets: &[WeekBucket]) -> Vec<BucketIntegrityWarning> {
    let mut issues = Vec::new();

    for bucket in buckets {
        let days = (bucket.ends_at() - bucket.starts_at()).num_days();
        if days != 6 {
            issues.push(BucketIntegrityWarning::Span {
                week_start: bucket.week_start,
                days,
            });
        }
    }

    for pair in buckets.windows(2) {
        let days = (pair[1].week_start - pair[0].week_start).num_days();
        if days != 7 {
            issues.push(BucketIntegrityWarning::Gap {
                previous: pair[0].week_start,
                next: pair[1].week_start,
                days,
            });
        }
    }

    issues
}

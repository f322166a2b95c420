use crate::aggregate::{aggregate_at, MAX_WINDOW_DAYS};
use crate::errors::AggregateError;
use crate::models::{AttendanceRecord, HistoryResponse, PersonHistory, WeekAttendance};
use crate::stats::{percentage, round1};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const DEFAULT_EXPECTED_PER_WEEK: u32 = 3;

/// Weekly attendance of every person against `expected_per_week` sessions.
/// Only attended records (P, PN) count; the rest still register the person.
pub fn person_history(
    records: &[AttendanceRecord],
    window_days: i64,
    expected_per_week: u32,
    today: NaiveDate,
) -> Result<HistoryResponse, AggregateError> {
    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
        return Err(AggregateError::InvalidArgument { window_days });
    }

    let mut by_person: BTreeMap<&str, (String, Vec<AttendanceRecord>)> = BTreeMap::new();
    for record in records {
        let Some(person_id) = record.person_id.as_deref() else {
            continue;
        };
        let entry = by_person
            .entry(person_id)
            .or_insert_with(|| (record.display_name(), Vec::new()));
        if record.code_or_unknown().is_attended() {
            entry.1.push(record.clone());
        }
    }

    let mut people = Vec::with_capacity(by_person.len());
    for (person_id, (name, attended)) in by_person {
        let result = aggregate_at(&attended, window_days, today)?;

        let weeks: Vec<WeekAttendance> = result
            .buckets
            .iter()
            .map(|bucket| WeekAttendance {
                week_start: bucket.week_start,
                attended: bucket.count,
                expected: expected_per_week,
                percentage: if expected_per_week == 0 {
                    0.0
                } else {
                    round1(bucket.count as f64 / f64::from(expected_per_week) * 100.0)
                },
            })
            .collect();

        let total_expected = u64::from(expected_per_week) * weeks.len() as u64;
        people.push(PersonHistory {
            person_id: person_id.to_string(),
            name,
            weeks,
            total_attended: result.total_count,
            total_expected,
            percentage: percentage(result.total_count, total_expected),
        });
    }

    people.sort_by(|a, b| b.percentage.cmp(&a.percentage).then_with(|| a.name.cmp(&b.name)));

    Ok(HistoryResponse {
        window_days,
        expected_per_week,
        people,
    })
}

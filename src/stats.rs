use crate::models::{WeekBucket, WeekSummary};

pub fn summarize(buckets: &[WeekBucket]) -> WeekSummary {
    let weeks_total = buckets.len();
    let weeks_with_attendance = buckets.iter().filter(|bucket| bucket.count > 0).count();
    let total: u64 = buckets.iter().map(|bucket| bucket.count).sum();

    let average_per_week = if weeks_total == 0 {
        0.0
    } else {
        round1(total as f64 / weeks_total as f64)
    };

    WeekSummary {
        weeks_total,
        weeks_with_attendance,
        weeks_without_attendance: weeks_total - weeks_with_attendance,
        average_per_week,
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Whole-number percentage of `part` over `whole`; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

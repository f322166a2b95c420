use crate::models::{AggregateResult, ChartPoint};
use crate::week::short_label;

pub fn chart_series(result: &AggregateResult) -> Vec<ChartPoint> {
    result
        .buckets
        .iter()
        .map(|bucket| {
            let tooltip = if bucket.dates.is_empty() {
                format!("Week of {}: no attendance", bucket.week_start.format("%d/%m/%Y"))
            } else {
                let dates: Vec<String> = bucket
                    .dates
                    .iter()
                    .map(|date| date.format("%d/%m/%Y").to_string())
                    .collect();
                format!(
                    "Week of {}: {} attended ({})",
                    bucket.week_start.format("%d/%m/%Y"),
                    bucket.count,
                    dates.join(", ")
                )
            };

            ChartPoint {
                label: short_label(bucket.week_start),
                week_start: bucket.week_start,
                value: bucket.count,
                tooltip,
            }
        })
        .collect()
}

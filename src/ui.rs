use crate::models::{AggregateResult, ChartPoint};
use std::fmt::Write;

pub fn render_index(result: &AggregateResult, chart: &[ChartPoint]) -> String {
    let peak = chart.iter().map(|point| point.value).max().unwrap_or(0).max(1);

    let mut bars = String::new();
    for point in chart {
        let height = point.value as f64 / peak as f64 * 100.0;
        let _ = writeln!(
            bars,
            r#"      <div class="bar" title="{tooltip}"><span class="fill" style="height: {height:.0}%"></span><span class="value">{value}</span><span class="label">{label}</span></div>"#,
            tooltip = escape(&point.tooltip),
            value = point.value,
            label = escape(&point.label),
        );
    }

    INDEX_HTML
        .replace("{{PERIOD_START}}", &result.period_start.format("%d/%m/%Y").to_string())
        .replace("{{PERIOD_END}}", &result.period_end.format("%d/%m/%Y").to_string())
        .replace("{{WINDOW}}", &result.window_days.to_string())
        .replace("{{TOTAL}}", &result.total_count.to_string())
        .replace("{{AVERAGE}}", &format!("{:.1}", result.average_per_week))
        .replace("{{WITH}}", &result.weeks_with_attendance.to_string())
        .replace("{{WITHOUT}}", &result.weeks_without_attendance.to_string())
        .replace("{{BARS}}", &bars)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Weekly Attendance</title>
  <style>
    :root {
      --ink: #1f2933;
      --muted: #6b7280;
      --accent: #28a745;
      --panel: #f8f9fa;
    }

    body {
      margin: 0;
      font-family: system-ui, "Segoe UI", sans-serif;
      color: var(--ink);
      background: #eef1f4;
      padding: 24px 16px;
    }

    main {
      max-width: 1000px;
      margin: 0 auto;
      background: #fff;
      border-radius: 14px;
      padding: 20px;
      box-shadow: 0 0 12px rgba(0, 0, 0, 0.15);
    }

    h1 {
      margin: 0 0 4px;
      font-size: 1.4rem;
    }

    .period {
      margin: 0 0 20px;
      color: var(--muted);
    }

    .summary {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
      margin-bottom: 24px;
    }

    .summary div {
      flex: 1;
      min-width: 140px;
      background: var(--panel);
      border-radius: 10px;
      padding: 14px;
      text-align: center;
    }

    .summary span {
      display: block;
      font-size: 0.85rem;
      color: var(--muted);
    }

    .summary strong {
      font-size: 1.6rem;
    }

    .chart {
      display: flex;
      align-items: flex-end;
      gap: 6px;
      height: 240px;
      padding-bottom: 36px;
      overflow-x: auto;
    }

    .bar {
      position: relative;
      flex: 1;
      min-width: 28px;
      height: 100%;
      display: flex;
      flex-direction: column;
      justify-content: flex-end;
      align-items: center;
    }

    .fill {
      width: 100%;
      background: var(--accent);
      border-radius: 4px 4px 0 0;
      min-height: 2px;
    }

    .value {
      font-size: 0.75rem;
      margin-top: 4px;
    }

    .label {
      position: absolute;
      bottom: -30px;
      font-size: 0.7rem;
      color: var(--muted);
    }
  </style>
</head>
<body>
  <main>
    <h1>Weekly Attendance</h1>
    <p class="period">{{PERIOD_START}} to {{PERIOD_END}} (last {{WINDOW}} days)</p>
    <section class="summary">
      <div><span>Total</span><strong>{{TOTAL}}</strong></div>
      <div><span>Average per week</span><strong>{{AVERAGE}}</strong></div>
      <div><span>Weeks attended</span><strong>{{WITH}}</strong></div>
      <div><span>Weeks missed</span><strong>{{WITHOUT}}</strong></div>
    </section>
    <section class="chart">
{{BARS}}    </section>
  </main>
</body>
</html>
"#;

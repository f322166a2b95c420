use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Monday on or before `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    let back = match date.weekday() {
        Weekday::Sun => 6,
        other => other.number_from_monday() as i64 - 1,
    };
    date - Duration::days(back)
}

/// Sunday closing the week that opens on `week_start`.
pub fn week_end_of(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59.999 is always in range, so the constructor cannot return None
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid end-of-day time");
    date.and_time(last)
}

/// Short `day/month` label used on chart axes.
pub fn short_label(date: NaiveDate) -> String {
    format!("{}/{}", date.day(), date.month())
}

/// Parses the date formats the club API hands out. Only the calendar day is
/// kept; any time-of-day component is discarded.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    const DAY_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%Y%m%d"];
    for format in DAY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S") {
        return Some(stamp.date());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(stamp.date());
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|stamp| stamp.date_naive())
}

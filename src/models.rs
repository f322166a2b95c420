use crate::errors::AggregateError;
use crate::week::{end_of_day, parse_record_date, start_of_day};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Attendance codes as the club API hands them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum AttendanceCode {
    /// Present
    P,
    /// Present, not training
    PN,
    /// Absent
    A,
    /// Absent with notice
    AA,
    /// Unknown
    #[default]
    I,
}

impl AttendanceCode {
    pub fn is_attended(self) -> bool {
        matches!(self, Self::P | Self::PN)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P => "P",
            Self::PN => "PN",
            Self::A => "A",
            Self::AA => "AA",
            Self::I => "I",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub person_name: Option<String>,
    #[serde(default)]
    pub code: Option<AttendanceCode>,
}

impl AttendanceRecord {
    pub fn new(id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            person_id: None,
            person_name: None,
            code: None,
        }
    }

    pub fn parsed_date(&self) -> Result<NaiveDate, AggregateError> {
        parse_record_date(&self.date).ok_or_else(|| AggregateError::MalformedRecord {
            id: self.id.clone(),
            date: self.date.clone(),
        })
    }

    pub fn code_or_unknown(&self) -> AttendanceCode {
        self.code.unwrap_or_default()
    }

    /// Name shown for the person, falling back to the id.
    pub fn display_name(&self) -> String {
        match (&self.person_name, &self.person_id) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(id)) => id.clone(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekBucket {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub count: u64,
    pub dates: Vec<NaiveDate>,
}

impl WeekBucket {
    pub fn starts_at(&self) -> NaiveDateTime {
        start_of_day(self.week_start)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        end_of_day(self.week_end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekSummary {
    pub weeks_total: usize,
    pub weeks_with_attendance: usize,
    pub weeks_without_attendance: usize,
    pub average_per_week: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub buckets: Vec<WeekBucket>,
    pub total_count: u64,
    pub weeks_total: usize,
    pub weeks_with_attendance: usize,
    pub weeks_without_attendance: usize,
    pub average_per_week: f64,
    pub window_days: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub skipped_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub week_start: NaiveDate,
    pub value: u64,
    pub tooltip: String,
}

#[derive(Debug, Serialize)]
pub struct WeeklyResponse {
    pub aggregate: AggregateResult,
    pub chart: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonRanking {
    pub person_id: String,
    pub name: String,
    #[serde(rename = "P")]
    pub present: u64,
    #[serde(rename = "PN")]
    pub present_not_training: u64,
    #[serde(rename = "A")]
    pub absent: u64,
    #[serde(rename = "AA")]
    pub absent_with_notice: u64,
    #[serde(rename = "I")]
    pub unknown: u64,
    pub total: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub people: Vec<PersonRanking>,
    pub average_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekAttendance {
    pub week_start: NaiveDate,
    pub attended: u64,
    pub expected: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonHistory {
    pub person_id: String,
    pub name: String,
    pub weeks: Vec<WeekAttendance>,
    pub total_attended: u64,
    pub total_expected: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryResponse {
    pub window_days: i64,
    pub expected_per_week: u32,
    pub people: Vec<PersonHistory>,
}

/// Per-event counters, one per attendance code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventTally {
    #[serde(rename = "I")]
    pub unknown: u64,
    #[serde(rename = "P")]
    pub present: u64,
    #[serde(rename = "PN")]
    pub present_not_training: u64,
    #[serde(rename = "A")]
    pub absent: u64,
    #[serde(rename = "AA")]
    pub absent_with_notice: u64,
    pub total: u64,
}

/// One stored attendance mark. `(event_id, person_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceMark {
    pub id: String,
    pub event_id: String,
    pub person_id: String,
    #[serde(default)]
    pub person_name: Option<String>,
    pub date: NaiveDate,
    pub code: AttendanceCode,
}

impl From<&AttendanceMark> for AttendanceRecord {
    fn from(mark: &AttendanceMark) -> Self {
        Self {
            id: mark.id.clone(),
            date: mark.date.format("%Y-%m-%d").to_string(),
            person_id: Some(mark.person_id.clone()),
            person_name: mark.person_name.clone(),
            code: Some(mark.code),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    pub marks: Vec<AttendanceMark>,
}

#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub event_id: String,
    pub person_id: String,
    #[serde(default)]
    pub person_name: Option<String>,
    pub date: String,
    pub code: AttendanceCode,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub event_id: String,
    pub person_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyQuery {
    pub days: Option<i64>,
    pub person: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub name: Option<String>,
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
    pub expected: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TallyQuery {
    pub event: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TallyResponse {
    pub event_id: String,
    pub tally: EventTally,
}

impl AppData {
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.marks.iter().map(AttendanceRecord::from).collect()
    }

    /// Inserts or replaces the mark for its `(event_id, person_id)` pair and
    /// returns the mark it replaced.
    pub fn upsert_mark(&mut self, mark: AttendanceMark) -> Option<AttendanceMark> {
        match self
            .marks
            .iter_mut()
            .find(|existing| existing.event_id == mark.event_id && existing.person_id == mark.person_id)
        {
            Some(existing) => Some(std::mem::replace(existing, mark)),
            None => {
                self.marks.push(mark);
                None
            }
        }
    }

    pub fn remove_mark(&mut self, event_id: &str, person_id: &str) -> Option<AttendanceMark> {
        let index = self
            .marks
            .iter()
            .position(|mark| mark.event_id == event_id && mark.person_id == person_id)?;
        Some(self.marks.remove(index))
    }
}

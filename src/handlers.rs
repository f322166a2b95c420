use crate::aggregate::{aggregate_at, MAX_WINDOW_DAYS};
use crate::chart::chart_series;
use crate::errors::{AggregateError, AppError};
use crate::history::person_history;
use crate::models::{
    AppData, AttendanceMark, AttendanceRecord, CancelRequest, EventTally, HistoryQuery,
    HistoryResponse, MarkRequest, Ranking, RankingQuery, TallyQuery, TallyResponse, WeeklyQuery,
    WeeklyResponse,
};
use crate::ranking::rank_people;
use crate::state::AppState;
use crate::storage::persist_data;
use crate::ui::render_index;
use crate::week::parse_record_date;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use chrono::{Duration, Local, NaiveDate};
use tracing::{error, info};

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    let records = attended_records(&data, None);
    let result = aggregate_at(&records, state.window_days, today())?;
    Ok(Html(render_index(&result, &chart_series(&result))))
}

pub async fn get_weekly(
    State(state): State<AppState>,
    Query(query): Query<WeeklyQuery>,
) -> Result<Json<WeeklyResponse>, AppError> {
    let window_days = query.days.unwrap_or(state.window_days);
    let data = state.data.lock().await;
    let records = attended_records(&data, query.person.as_deref());
    let aggregate = aggregate_at(&records, window_days, today())?;
    let chart = chart_series(&aggregate);
    Ok(Json(WeeklyResponse { aggregate, chart }))
}

pub async fn get_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<Ranking>, AppError> {
    let since = match query.days {
        Some(days) => Some(window_start(today(), days)?),
        None => None,
    };

    let data = state.data.lock().await;
    let records: Vec<AttendanceRecord> = data
        .marks
        .iter()
        .filter(|mark| since.is_none_or(|since| mark.date >= since))
        .map(AttendanceRecord::from)
        .collect();

    let ranking = rank_people(&records);
    let ranking = match query.name.as_deref() {
        Some(name) => ranking.filter_by_name(name),
        None => ranking,
    };
    Ok(Json(ranking))
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let window_days = query.days.unwrap_or(state.window_days);
    let expected = query.expected.unwrap_or(state.expected_per_week);
    let data = state.data.lock().await;
    let history = person_history(&data.records(), window_days, expected, today())?;
    Ok(Json(history))
}

pub async fn get_tally(
    State(state): State<AppState>,
    Query(query): Query<TallyQuery>,
) -> Json<TallyResponse> {
    let data = state.data.lock().await;
    let tally = EventTally::from_marks(&query.event, &data.marks);
    Json(TallyResponse {
        event_id: query.event,
        tally,
    })
}

pub async fn mark_attendance(
    State(state): State<AppState>,
    Json(payload): Json<MarkRequest>,
) -> Result<Json<TallyResponse>, AppError> {
    let event_id = payload.event_id.trim().to_string();
    let person_id = payload.person_id.trim().to_string();
    if event_id.is_empty() || person_id.is_empty() {
        return Err(AppError::bad_request("event_id and person_id are required"));
    }
    let date = parse_record_date(&payload.date)
        .ok_or_else(|| AppError::bad_request(format!("unparsable date {:?}", payload.date)))?;

    let mark = AttendanceMark {
        id: format!("{event_id}:{person_id}"),
        event_id: event_id.clone(),
        person_id: person_id.clone(),
        person_name: payload.person_name.filter(|name| !name.trim().is_empty()),
        date,
        code: payload.code,
    };

    let mut data = state.data.lock().await;
    let mut tally = EventTally::from_marks(&event_id, &data.marks);
    let previous = data.upsert_mark(mark);
    match &previous {
        Some(previous) => tally.apply_change(previous.code, payload.code),
        None => tally.add(payload.code),
    }

    if let Err(err) = persist_data(&state.data_path, &data).await {
        error!(%event_id, %person_id, "failed to persist mark, reverting: {}", err.message);
        match previous {
            Some(previous) => {
                data.upsert_mark(previous);
            }
            None => {
                data.remove_mark(&event_id, &person_id);
            }
        }
        return Err(err);
    }

    info!(%event_id, %person_id, code = payload.code.as_str(), "attendance marked");
    Ok(Json(TallyResponse { event_id, tally }))
}

pub async fn cancel_attendance(
    State(state): State<AppState>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<TallyResponse>, AppError> {
    let event_id = payload.event_id.trim().to_string();
    let person_id = payload.person_id.trim().to_string();

    let mut data = state.data.lock().await;
    let mut tally = EventTally::from_marks(&event_id, &data.marks);
    let removed = data
        .remove_mark(&event_id, &person_id)
        .ok_or_else(|| AppError::not_found(format!("no mark for {person_id} at {event_id}")))?;

    if let Err(err) = persist_data(&state.data_path, &data).await {
        error!(%event_id, %person_id, "failed to persist cancellation, reverting: {}", err.message);
        data.upsert_mark(removed);
        return Err(err);
    }

    tally.remove(removed.code);
    info!(%event_id, %person_id, "attendance cancelled");
    Ok(Json(TallyResponse { event_id, tally }))
}

/// Marks that count as attendance, optionally for a single person.
fn attended_records(data: &AppData, person_id: Option<&str>) -> Vec<AttendanceRecord> {
    data.marks
        .iter()
        .filter(|mark| mark.code.is_attended())
        .filter(|mark| person_id.is_none_or(|id| mark.person_id == id))
        .map(AttendanceRecord::from)
        .collect()
}

/// First day of a trailing `days` window ending on `today`.
fn window_start(today: NaiveDate, days: i64) -> Result<NaiveDate, AppError> {
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(AggregateError::InvalidArgument { window_days: days }.into());
    }
    Duration::try_days(days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| AggregateError::InvalidArgument { window_days: days }.into())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::AttendanceCode;
    use axum::http::StatusCode;

    fn seeded() -> (AttendanceMark, AppData) {
        let mark = AttendanceMark {
            id: "e1:p1".to_string(),
            event_id: "e1".to_string(),
            person_id: "p1".to_string(),
            person_name: Some("Ana".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            code: AttendanceCode::P,
        };
        let data = AppData {
            marks: vec![mark.clone()],
        };
        (mark, data)
    }

    // The parent directory never exists, so every persist fails.
    fn unwritable_state(data: AppData) -> AppState {
        let config = Config {
            data_path: std::env::temp_dir()
                .join(format!("club_attendance_absent_{}", std::process::id()))
                .join("nested")
                .join("attendance.json"),
            ..Config::default()
        };
        AppState::new(&config, data)
    }

    fn request(event_id: &str, code: AttendanceCode) -> MarkRequest {
        MarkRequest {
            event_id: event_id.to_string(),
            person_id: "p1".to_string(),
            person_name: None,
            date: "20/10/2026".to_string(),
            code,
        }
    }

    #[tokio::test]
    async fn failed_persist_restores_the_previous_mark() {
        let (seed, data) = seeded();
        let state = unwritable_state(data);

        let err = mark_attendance(State(state.clone()), Json(request("e1", AttendanceCode::A)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.data.lock().await.marks, vec![seed]);
    }

    #[tokio::test]
    async fn failed_persist_drops_a_new_mark() {
        let (seed, data) = seeded();
        let state = unwritable_state(data);

        let err = mark_attendance(State(state.clone()), Json(request("e2", AttendanceCode::P)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.data.lock().await.marks, vec![seed]);
    }

    #[tokio::test]
    async fn failed_persist_keeps_a_cancelled_mark() {
        let (seed, data) = seeded();
        let state = unwritable_state(data);

        let payload = CancelRequest {
            event_id: "e1".to_string(),
            person_id: "p1".to_string(),
        };
        let err = cancel_attendance(State(state.clone()), Json(payload))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.data.lock().await.marks, vec![seed]);
    }

    #[test]
    fn ranking_window_is_bounded() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        assert_eq!(
            window_start(today, 7).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
        );
        for days in [0, -5, MAX_WINDOW_DAYS + 1, 1_000_000_000, i64::MAX] {
            let err = window_start(today, days).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "days {days}");
        }
    }
}

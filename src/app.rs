use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/weekly", get(handlers::get_weekly))
        .route("/api/ranking", get(handlers::get_ranking))
        .route("/api/history", get(handlers::get_history))
        .route("/api/events/tally", get(handlers::get_tally))
        .route("/api/attendance", post(handlers::mark_attendance))
        .route("/api/attendance/cancel", post(handlers::cancel_attendance))
        .with_state(state)
}

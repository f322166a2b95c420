pub mod aggregate;
pub mod app;
pub mod chart;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod history;
pub mod models;
pub mod ranking;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tally;
pub mod ui;
pub mod week;

pub use aggregate::{aggregate, aggregate_at};
pub use app::router;
pub use config::Config;
pub use errors::{AggregateError, AppError};
pub use state::AppState;
pub use stats::summarize;
pub use storage::load_data;

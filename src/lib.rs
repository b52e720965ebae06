pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod utils;

use db::Session;
use middleware::rate_limit::CodeAttemptLimits;

pub use config::Config;
pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub session: Session,
    pub config: Config,
    pub code_attempts: CodeAttemptLimits,
}

impl AppState {
    pub fn new(session: Session, config: Config) -> Self {
        Self {
            code_attempts: CodeAttemptLimits::per_minute(config.code_attempts_per_minute),
            session,
            config,
        }
    }
}

/// Current time as Unix epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

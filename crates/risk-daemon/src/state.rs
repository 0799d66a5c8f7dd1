//! Shared runtime state for risk-daemon handlers.

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub service: &'static str,
    pub version: &'static str,
    pub default_max_attempts: i32,
    pub positions_snapshot_path: String,
}

impl AppState {
    pub fn new(pool: PgPool, default_max_attempts: i32, positions_snapshot_path: String) -> Self {
        Self {
            pool,
            service: "risk-daemon",
            version: env!("CARGO_PKG_VERSION"),
            default_max_attempts,
            positions_snapshot_path,
        }
    }
}

//! Shared fixtures and database bootstrap for scenario tests across the
//! risk-* crates. Not used by any production binary.

pub mod fixtures;

use anyhow::{Context, Result};
use sqlx::PgPool;

pub const ENV_TEST_DATABASE_URL: &str = "RISK_DATABASE_URL";

/// Connect and migrate against the database named by `RISK_DATABASE_URL`.
/// Scenario tests that need Postgres call this and `#[ignore]` themselves
/// when the variable is unset, rather than failing the default test run.
pub async fn connect_test_db() -> Result<PgPool> {
    let url = std::env::var(ENV_TEST_DATABASE_URL)
        .with_context(|| format!("missing env var {ENV_TEST_DATABASE_URL}"))?;
    let pool = risk_db::connect(&url).await?;
    risk_db::migrate(&pool).await?;
    Ok(pool)
}

//! risk-runtime entry point: the production worker process.
//!
//! Thin on purpose, same as risk-daemon. All startup logic (load settings,
//! connect, migrate, build a `Worker`, run until shutdown) lives in
//! `risk_worker::run_worker_from_env`, shared with `risk-cli worker run`'s
//! dev-convenience wrapper.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    risk_worker::run_worker_from_env().await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
